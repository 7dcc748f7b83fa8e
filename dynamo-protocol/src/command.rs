//! Host command decoding
//!
//! Grammar (case-sensitive, trailing whitespace ignored):
//! - `get` → [`Command::Query`]
//! - `set <integer>` → [`Command::SetActuator`]
//!
//! Parsing is pure. Watchdog reset and responses are the caller's job.

use core::fmt;

/// Commands accepted from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Request a telemetry line
    Query,
    /// Request a new actuator target (clamped by the driver, not here)
    SetActuator(i32),
}

/// Reasons a line is not a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Blank line; ignored without a response
    Empty,
    /// Anything that is not `get` or a well-formed `set`
    Unrecognized,
}

/// Decode one line (terminator already removed) into a command
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim_end();

    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    if line == "get" {
        return Ok(Command::Query);
    }

    if let Some(arg) = line.strip_prefix("set ") {
        return parse_saturating_i32(arg.trim_start())
            .map(Command::SetActuator)
            .ok_or(ParseError::Unrecognized);
    }

    Err(ParseError::Unrecognized)
}

/// Parse an optionally signed decimal integer, saturating at the `i32` bounds
///
/// Out-of-range requests still have to reach the driver as "very large" or
/// "very small" so they clamp to the nearer bound instead of being dropped.
fn parse_saturating_i32(s: &str) -> Option<i32> {
    let bytes = s.as_bytes();
    let (negative, digits) = match bytes.first()? {
        b'-' => (true, &bytes[1..]),
        b'+' => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    if digits.is_empty() {
        return None;
    }

    let mut value: i32 = 0;
    for &d in digits {
        if !d.is_ascii_digit() {
            return None;
        }
        let digit = (d - b'0') as i32;
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }

    Some(value)
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Query => f.write_str("get"),
            Command::SetActuator(value) => write!(f, "set {}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        assert_eq!(parse("get"), Ok(Command::Query));
        assert_eq!(parse("get\r"), Ok(Command::Query));
        assert_eq!(parse("get  "), Ok(Command::Query));
    }

    #[test]
    fn test_get_is_exact() {
        assert_eq!(parse("GET"), Err(ParseError::Unrecognized));
        assert_eq!(parse("gets"), Err(ParseError::Unrecognized));
        assert_eq!(parse(" get"), Err(ParseError::Unrecognized));
    }

    #[test]
    fn test_set_values() {
        assert_eq!(parse("set 150"), Ok(Command::SetActuator(150)));
        assert_eq!(parse("set -50"), Ok(Command::SetActuator(-50)));
        assert_eq!(parse("set +7"), Ok(Command::SetActuator(7)));
        assert_eq!(parse("set 0\r"), Ok(Command::SetActuator(0)));
        assert_eq!(parse("set   1500"), Ok(Command::SetActuator(1500)));
    }

    #[test]
    fn test_set_saturates_beyond_i32() {
        assert_eq!(
            parse("set 99999999999999999999"),
            Ok(Command::SetActuator(i32::MAX))
        );
        assert_eq!(
            parse("set -99999999999999999999"),
            Ok(Command::SetActuator(i32::MIN))
        );
        assert_eq!(
            parse("set -2147483648"),
            Ok(Command::SetActuator(i32::MIN))
        );
    }

    #[test]
    fn test_malformed_set() {
        assert_eq!(parse("set"), Err(ParseError::Unrecognized));
        assert_eq!(parse("set "), Err(ParseError::Unrecognized));
        assert_eq!(parse("set abc"), Err(ParseError::Unrecognized));
        assert_eq!(parse("set 12x"), Err(ParseError::Unrecognized));
        assert_eq!(parse("set -"), Err(ParseError::Unrecognized));
        assert_eq!(parse("set 1 2"), Err(ParseError::Unrecognized));
        assert_eq!(parse("SET 10"), Err(ParseError::Unrecognized));
        assert_eq!(parse("set10"), Err(ParseError::Unrecognized));
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("\r"), Err(ParseError::Empty));
        assert_eq!(parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_display_matches_grammar() {
        use core::fmt::Write;

        let mut out: heapless::String<16> = heapless::String::new();
        write!(out, "{}", Command::SetActuator(-12)).unwrap();
        assert_eq!(parse(&out), Ok(Command::SetActuator(-12)));

        out.clear();
        write!(out, "{}", Command::Query).unwrap();
        assert_eq!(out.as_str(), "get");
    }
}
