//! Dynamo - Dynamometer Actuator Firmware
//!
//! Drives a motor (PWM duty or ESC pulse) on command from a host over
//! serial, measures current, bus voltage and thrust, and returns the
//! actuator to its safe value whenever the host goes quiet.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use dynamo_core::control::ControlLoop;
use dynamo_drivers::actuator::ActuatorDriver;
use dynamo_drivers::sensor::{Hx711, Ina228, MissingSensor};
use dynamo_hal::{Clock, UartTx};

use crate::output::PwmOutput;
use crate::serial::{SerialRx, SerialTx};
use crate::startup::{bring_up, halt, StartupError};
use crate::tasks::{BootClock, RigActuator};

mod config;
mod output;
mod serial;
mod startup;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// I2C bus speed for the INA228
const I2C_FREQUENCY_HZ: u32 = 400_000;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Dynamo firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Host link: UART0 on GPIO0 (TX) / GPIO1 (RX)
    let link_config = config::uart_config();
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, serial::to_embassy(&link_config));
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    let (mut tx, rx) = (SerialTx(tx), SerialRx(rx));
    info!("Host link at {} baud", link_config.baudrate);

    let profile = match config::hardware_profile() {
        Ok(profile) => profile,
        Err(e) => {
            halt(StartupError::Config(e), None::<&mut RigActuator>, &mut tx).await;
            return;
        }
    };

    // Actuator on GPIO9 (PWM slice 4, channel B); the startup value is
    // written before anything else can fail
    let pwm = Pwm::new_output_b(p.PWM_SLICE4, p.PIN_9, PwmConfig::default());
    let output = PwmOutput::new(pwm, config::PWM_PERIOD_US, config::output_mapping());
    let mut actuator = ActuatorDriver::new(output, profile);
    info!(
        "Actuator range {}..={}, safe {}, startup {}",
        profile.range.min(),
        profile.range.max(),
        profile.range.safe(),
        profile.startup_value
    );

    let sensor_configs = config::ina228_config().and_then(|ina| Ok((ina, config::hx711_config()?)));
    let (ina_config, hx_config) = match sensor_configs {
        Ok(configs) => configs,
        Err(e) => {
            halt(StartupError::Config(e), Some(&mut actuator), &mut tx).await;
            return;
        }
    };

    // INA228 on I2C0: GPIO4 (SDA) / GPIO5 (SCL)
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let bus = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);
    let power = Ina228::new(bus, ina_config);

    // HX711: DOUT on GPIO2, PD_SCK on GPIO3
    let dout = Input::new(p.PIN_2, Pull::None);
    let sck = Output::new(p.PIN_3, Level::Low);
    let load = match Hx711::new(dout, sck, Delay, hx_config) {
        Ok(load) => load,
        Err(e) => {
            let error = StartupError::Sensor(MissingSensor::LoadCell(e));
            halt(error, Some(&mut actuator), &mut tx).await;
            return;
        }
    };

    let sensors = match bring_up(power, load, config::tare_mode(), &mut tx) {
        Ok(sensors) => sensors,
        Err(e) => {
            halt(e, Some(&mut actuator), &mut tx).await;
            return;
        }
    };

    if tx.write_line("Ready").is_err() {
        warn!("Host link write failed");
    }

    let clock = BootClock;
    let rig = ControlLoop::new(actuator, sensors, profile.watchdog, clock.now_ms());

    spawner
        .spawn(tasks::control_task(rig, rx, tx, clock))
        .unwrap();

    info!("Control task spawned, firmware running");
}
