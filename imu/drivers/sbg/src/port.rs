use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Serial link to the IMU.
///
/// Reads use a short timeout so a poll never stalls the caller; a timeout is
/// reported as zero bytes read.
pub struct SerialLink {
    serial_port: Box<dyn SerialPort>,
}

impl SerialLink {
    pub const READ_TIMEOUT: Duration = Duration::from_millis(1);

    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let serial_port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Self::READ_TIMEOUT)
            .open()?;
        info!("Opened port {} at {} baud", port_name, baud_rate);
        Ok(Self { serial_port })
    }

    /// Drops whatever the device sent before we were listening.
    pub fn clear(&mut self) -> Result<(), serialport::Error> {
        let pending = self.serial_port.bytes_to_read()?;
        self.serial_port.clear(serialport::ClearBuffer::Input)?;
        debug!("Cleared {} stale bytes from port", pending);
        Ok(())
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.serial_port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.serial_port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.serial_port.flush()
    }
}
