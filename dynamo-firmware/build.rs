//! Build script for dynamo-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates dyno.toml at compile time
//! - Generates board_config.rs constants from dyno.toml

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    let config = load_config();
    validate_config(&config);
    generate_board_config(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Linker scripts for cortex-m-rt, the RP2040 boot2 section, and defmt
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Print a boxed error report and abort the build
fn fail(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> Vec<String> {
    msg.lines()
        .map(|line| {
            if line.chars().count() > 60 {
                format!("{}...", line.chars().take(57).collect::<String>())
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// Read and parse dyno.toml
fn load_config() -> toml::Value {
    // Re-run if dyno.toml changes
    println!("cargo:rerun-if-changed=dyno.toml");

    let config_path = Path::new("dyno.toml");

    if !config_path.exists() {
        fail(
            "dyno.toml not found!",
            &[
                "The firmware requires a dyno.toml board configuration.".into(),
                "Create one in the dynamo-firmware directory.".into(),
            ],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read dyno.toml", &[e.to_string()]),
    };

    match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in dyno.toml",
            &format_error_lines(&e.to_string()),
        ),
    }
}

/// Look up `[section].key`
fn field<'a>(config: &'a toml::Value, section: &str, key: &str) -> Option<&'a toml::Value> {
    config.get(section).and_then(|s| s.get(key))
}

/// Integer field, recording an error if missing or out of `[min, max]`
fn int_in(
    config: &toml::Value,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) -> Option<i64> {
    match field(config, section, key) {
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => Some(*v),
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}..={}", section, key, min, max));
            None
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            None
        }
    }
}

/// Positive float field (integers accepted)
fn positive_float(
    config: &toml::Value,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let value = match field(config, section, key) {
        Some(toml::Value::Float(v)) => *v,
        Some(toml::Value::Integer(v)) => *v as f64,
        Some(_) => {
            errors.push(format!("[{}] {} must be a number", section, key));
            return None;
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            return None;
        }
    };
    if !(value.is_finite() && value > 0.0) {
        errors.push(format!("[{}] {} must be greater than 0", section, key));
        return None;
    }
    Some(value)
}

/// String field restricted to `allowed`
fn choice<'a>(
    config: &'a toml::Value,
    section: &str,
    key: &str,
    allowed: &[&str],
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match field(config, section, key) {
        Some(toml::Value::String(s)) if allowed.contains(&s.as_str()) => Some(s.as_str()),
        Some(_) => {
            errors.push(format!(
                "[{}] {} must be one of: {}",
                section,
                key,
                allowed.join(", ")
            ));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            None
        }
    }
}

/// Validate dyno.toml contents
fn validate_config(config: &toml::Value) {
    let mut errors = Vec::new();

    for section in ["actuator", "watchdog", "write_policy", "serial", "ina228", "hx711"] {
        match config.get(section) {
            Some(toml::Value::Table(_)) => {}
            Some(_) => errors.push(format!("[{}] must be a table", section)),
            None => errors.push(format!("Missing [{}] section", section)),
        }
    }
    if !errors.is_empty() {
        fail("Missing required sections in dyno.toml", &errors);
    }

    validate_actuator(config, &mut errors);
    validate_link(config, &mut errors);
    validate_sensors(config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid board configuration", &errors);
    }

    println!("cargo:warning=dyno.toml validated successfully");
}

fn validate_actuator(config: &toml::Value, errors: &mut Vec<String>) {
    let i32_range = (i64::from(i32::MIN), i64::from(i32::MAX));
    let kind = choice(config, "actuator", "kind", &["duty", "pulse"], errors);
    let min = int_in(config, "actuator", "min", i32_range.0, i32_range.1, errors);
    let max = int_in(config, "actuator", "max", i32_range.0, i32_range.1, errors);
    let safe = int_in(config, "actuator", "safe", i32_range.0, i32_range.1, errors);
    let period = int_in(config, "actuator", "period_us", 1, 65_536, errors);

    let (Some(min), Some(max), Some(safe)) = (min, max, safe) else {
        return;
    };
    if min > max {
        errors.push("[actuator] min must not exceed max".into());
        return;
    }
    if !(min..=max).contains(&safe) {
        errors.push("[actuator] safe must be within min..=max".into());
    }
    if field(config, "actuator", "startup").is_some() {
        int_in(config, "actuator", "startup", min, max, errors);
    }

    match (kind, period) {
        (Some("pulse"), Some(period)) if max > period => {
            errors.push("[actuator] pulse max must fit in period_us".into());
        }
        (Some("duty"), _) if max <= 0 => {
            errors.push("[actuator] duty max must be greater than 0".into());
        }
        _ => {}
    }
}

fn validate_link(config: &toml::Value, errors: &mut Vec<String>) {
    int_in(config, "watchdog", "timeout_ms", 1, i64::from(u32::MAX), errors);
    int_in(config, "serial", "baudrate", 1200, 921_600, errors);

    if choice(config, "write_policy", "mode", &["immediate", "throttled"], errors)
        == Some("throttled")
    {
        int_in(config, "write_policy", "min_interval_ms", 1, 60_000, errors);
    }
}

fn validate_sensors(config: &toml::Value, errors: &mut Vec<String>) {
    int_in(config, "ina228", "address", 0x40, 0x4F, errors);
    positive_float(config, "ina228", "max_current_a", errors);

    // SHUNT_CAL must fit its 15-bit field
    if let (Some(shunt), Some(max_current)) = (
        positive_float(config, "ina228", "shunt_ohms", errors),
        field(config, "ina228", "max_current_a").and_then(|v| {
            v.as_float().or_else(|| v.as_integer().map(|i| i as f64))
        }),
    ) {
        let cal = 13_107.2e6 * (max_current / 524_288.0) * shunt;
        if !(1.0..=32_767.0).contains(&cal) {
            errors.push(format!(
                "[ina228] shunt_ohms and max_current_a give SHUNT_CAL {:.0}",
                cal
            ));
        }
    }

    if let Some(avg) = int_in(config, "ina228", "averaging", 1, 1024, errors) {
        if ![1, 4, 16, 64, 128, 256, 512, 1024].contains(&avg) {
            errors.push("[ina228] averaging must be 1, 4, 16, 64, ... 1024".into());
        }
    }
    for key in ["bus_conversion_us", "shunt_conversion_us"] {
        if let Some(us) = int_in(config, "ina228", key, 50, 4120, errors) {
            if ![50, 84, 150, 280, 540, 1052, 2074, 4120].contains(&us) {
                errors.push(format!("[ina228] {} is not a supported conversion time", key));
            }
        }
    }

    int_in(
        config,
        "hx711",
        "offset",
        -(1 << 23),
        (1 << 23) * 16,
        errors,
    );
    if let Some(toml::Value::Float(scale)) = field(config, "hx711", "scale") {
        if *scale == 0.0 || !scale.is_finite() {
            errors.push("[hx711] scale must be non-zero".into());
        }
    } else if !matches!(field(config, "hx711", "scale"), Some(toml::Value::Integer(s)) if *s != 0) {
        errors.push("[hx711] scale must be a non-zero number".into());
    }
    int_in(config, "hx711", "samples", 1, 50, errors);
    int_in(config, "hx711", "ready_timeout_ms", 1, 10_000, errors);
    if choice(config, "hx711", "tare", &["fixed", "capture"], errors) == Some("capture") {
        int_in(config, "hx711", "tare_samples", 1, 100, errors);
    }
}

fn int(config: &toml::Value, section: &str, key: &str) -> i64 {
    field(config, section, key)
        .and_then(toml::Value::as_integer)
        .unwrap_or_default()
}

fn float(config: &toml::Value, section: &str, key: &str) -> f64 {
    field(config, section, key)
        .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
        .unwrap_or_default()
}

fn text<'a>(config: &'a toml::Value, section: &str, key: &str) -> &'a str {
    field(config, section, key)
        .and_then(toml::Value::as_str)
        .unwrap_or_default()
}

/// Write validated values as Rust constants into OUT_DIR/board_config.rs
fn generate_board_config(config: &toml::Value) {
    let safe = int(config, "actuator", "safe");
    let startup = field(config, "actuator", "startup")
        .and_then(toml::Value::as_integer)
        .unwrap_or(safe);
    let throttle_ms = if text(config, "write_policy", "mode") == "throttled" {
        int(config, "write_policy", "min_interval_ms")
    } else {
        0
    };
    let tare_samples = if text(config, "hx711", "tare") == "capture" {
        int(config, "hx711", "tare_samples")
    } else {
        0
    };

    let constants = [
        ("ACTUATOR_PULSE", "bool", (text(config, "actuator", "kind") == "pulse").to_string()),
        ("ACTUATOR_MIN", "i32", int(config, "actuator", "min").to_string()),
        ("ACTUATOR_MAX", "i32", int(config, "actuator", "max").to_string()),
        ("ACTUATOR_SAFE", "i32", safe.to_string()),
        ("ACTUATOR_STARTUP", "i32", startup.to_string()),
        ("PWM_PERIOD_US", "u32", int(config, "actuator", "period_us").to_string()),
        ("WATCHDOG_TIMEOUT_MS", "u32", int(config, "watchdog", "timeout_ms").to_string()),
        ("WRITE_THROTTLE_MS", "u32", throttle_ms.to_string()),
        ("SERIAL_BAUDRATE", "u32", int(config, "serial", "baudrate").to_string()),
        ("INA228_ADDRESS", "u8", int(config, "ina228", "address").to_string()),
        ("INA228_SHUNT_OHMS", "f32", format!("{:?}", float(config, "ina228", "shunt_ohms"))),
        ("INA228_MAX_CURRENT_A", "f32", format!("{:?}", float(config, "ina228", "max_current_a"))),
        ("INA228_AVERAGING", "u16", int(config, "ina228", "averaging").to_string()),
        ("INA228_BUS_CONVERSION_US", "u16", int(config, "ina228", "bus_conversion_us").to_string()),
        ("INA228_SHUNT_CONVERSION_US", "u16", int(config, "ina228", "shunt_conversion_us").to_string()),
        ("HX711_OFFSET", "i32", int(config, "hx711", "offset").to_string()),
        ("HX711_SCALE", "f32", format!("{:?}", float(config, "hx711", "scale"))),
        ("HX711_SAMPLES", "u8", int(config, "hx711", "samples").to_string()),
        ("HX711_READY_TIMEOUT_MS", "u32", int(config, "hx711", "ready_timeout_ms").to_string()),
        ("HX711_TARE_SAMPLES", "u8", tare_samples.to_string()),
    ];

    let mut out = String::from("// Generated from dyno.toml by build.rs\n\n");
    for (name, ty, value) in constants {
        out.push_str(&format!("pub const {}: {} = {};\n", name, ty, value));
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("board_config.rs"), out).unwrap();
}
