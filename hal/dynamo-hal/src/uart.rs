//! UART serial communication abstractions
//!
//! The host link is polled, never awaited: the control loop must keep
//! running its watchdog check whether or not the host sent anything.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write all of `data` to the UART
    ///
    /// Blocks until all data has been queued or an error occurs.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Write `line` followed by a newline
    fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.write_all(line.as_bytes())?;
        self.write_all(b"\n")?;
        self.flush()
    }
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Copy already-received bytes into `buf` without waiting
    ///
    /// Returns the number of bytes copied, `0` when nothing is pending.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// 8N1 at the given baud rate
    pub const fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Buf {
        data: [u8; 32],
        len: usize,
        flushes: u8,
    }

    impl UartTx for Buf {
        type Error = ();

        fn write_all(&mut self, data: &[u8]) -> Result<(), ()> {
            let end = self.len + data.len();
            if end > self.data.len() {
                return Err(());
            }
            self.data[self.len..end].copy_from_slice(data);
            self.len = end;
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_write_line_appends_newline_and_flushes() {
        let mut buf = Buf {
            data: [0; 32],
            len: 0,
            flushes: 0,
        };
        buf.write_line("get").unwrap();
        assert_eq!(&buf.data[..buf.len], b"get\n");
        assert_eq!(buf.flushes, 1);
    }

    #[test]
    fn test_default_config_is_115200_8n1() {
        let cfg = UartConfig::default();
        assert_eq!(cfg, UartConfig::with_baudrate(115200));
        assert_eq!(cfg.data_bits, DataBits::Eight);
        assert_eq!(cfg.parity, Parity::None);
        assert_eq!(cfg.stop_bits, StopBits::One);
    }
}
