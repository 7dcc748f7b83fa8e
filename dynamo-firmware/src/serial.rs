//! Host serial link on the buffered UART
//!
//! The UART interrupt fills the ring buffer; the control task drains it
//! without waiting.

use dynamo_hal::uart::{DataBits, Parity, StopBits};
use dynamo_hal::{UartConfig, UartRx, UartTx};
use embassy_rp::uart::{self, BufferedUartRx, BufferedUartTx};
use embedded_io::{Read, ReadReady, Write};

/// Receive half of the host link
pub struct SerialRx(pub BufferedUartRx);

/// Transmit half of the host link
pub struct SerialTx(pub BufferedUartTx);

impl UartRx for SerialRx {
    type Error = uart::Error;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, uart::Error> {
        if buf.is_empty() || !self.0.read_ready()? {
            return Ok(0);
        }
        self.0.read(buf)
    }
}

impl UartTx for SerialTx {
    type Error = uart::Error;

    fn write_all(&mut self, data: &[u8]) -> Result<(), uart::Error> {
        Write::write_all(&mut self.0, data)
    }

    fn flush(&mut self) -> Result<(), uart::Error> {
        Write::flush(&mut self.0)
    }
}

/// Translate link settings into the embassy UART configuration
pub fn to_embassy(config: &UartConfig) -> uart::Config {
    let mut cfg = uart::Config::default();
    cfg.baudrate = config.baudrate;
    cfg.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    cfg.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}
