use crate::domain::ports::SampleTransport;
use crate::utils::error::Result;
use serialport::{DataBits, Parity, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

pub const DEFAULT_PORT: &str = "/dev/ttyS0";

const BAUD_RATE: u32 = 9600;
const READ_COMMAND: &[u8] = b"READ\r\n";
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial link to the scale: write the read command, get one line back.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub fn open(path: &str) -> Result<Self> {
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(READ_TIMEOUT)
            .open()?;
        tracing::info!("scale on {} ({} 8N1)", path, BAUD_RATE);
        Ok(Self { port })
    }
}

impl SampleTransport for SerialTransport {
    fn request_line(&mut self) -> Result<Option<String>> {
        self.port.write_all(READ_COMMAND)?;

        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    line.push(byte[0]);
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    if line.is_empty() {
                        return Ok(None);
                    }
                    // partial line, the sample parser will reject it
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}
