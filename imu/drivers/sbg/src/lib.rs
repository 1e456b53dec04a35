pub mod cmd;
pub mod crc;
pub mod error;
pub mod frame;
pub mod ids;
pub mod log;
pub mod port;

pub use cmd::Ack;
pub use error::{error_code_name, SbgError};
pub use frame::{encode_frame, FrameParser, RawFrame};
pub use ids::{CmdId, LogId, MessageClass, OutputMode, OutputPort};
pub use imu_traits::{EulerAngles, ImuFrequency, Quaternion, Vector3};
pub use log::{EkfEuler, EkfQuat, EkfStatus, LogData, LogFrame, SolutionMode};
pub use port::SerialLink;

use num_traits::FromPrimitive;
use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Protocol handle over a byte link to the device.
///
/// Owns the link and the receive buffer; decoded logs are handed to a
/// caller-supplied visitor, synchronously and in arrival order.
pub struct EcomHandle<L = SerialLink> {
    link: L,
    parser: FrameParser,
    read_buffer: Vec<u8>,
    pub ack_timeout: Duration,
    pub command_attempts: u32,
}

impl EcomHandle<SerialLink> {
    /// Opens the serial device only.
    pub fn open_link(interface: &str, baud_rate: u32) -> Result<SerialLink, SbgError> {
        Ok(SerialLink::open(interface, baud_rate)?)
    }

    /// Starts a session on an opened serial link, dropping stale input.
    pub fn init(mut link: SerialLink) -> Result<Self, SbgError> {
        link.clear()?;
        Ok(EcomHandle::new(link))
    }

    pub fn open(interface: &str, baud_rate: u32) -> Result<Self, SbgError> {
        Self::init(Self::open_link(interface, baud_rate)?)
    }
}

impl<L: Read + Write> EcomHandle<L> {
    const READ_CHUNK: usize = 1024;

    pub fn new(link: L) -> Self {
        EcomHandle {
            link,
            parser: FrameParser::new(None),
            read_buffer: vec![0u8; Self::READ_CHUNK],
            ack_timeout: Duration::from_millis(500),
            command_attempts: 3,
        }
    }

    pub fn into_inner(self) -> L {
        self.link
    }

    fn fill(&mut self) -> Result<usize, SbgError> {
        let n = match self.link.read(&mut self.read_buffer) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => 0,
            Err(e) => return Err(SbgError::ReadError(e)),
        };
        if n > 0 {
            self.parser.push(&self.read_buffer[..n]);
        }
        Ok(n)
    }

    /// Reads pending bytes and dispatches every complete log to `on_log`.
    ///
    /// Returns `Err(SbgError::NotReady)` when nothing was dispatched and no
    /// fault was seen. A corrupt frame is reported even if valid logs were
    /// dispatched alongside it.
    pub fn handle_logs<F>(&mut self, mut on_log: F) -> Result<(), SbgError>
    where
        F: FnMut(&LogFrame),
    {
        self.fill()?;

        let mut dispatched = 0usize;
        let mut first_error = None;
        while let Some(next) = self.parser.next_frame() {
            let decoded = next.and_then(|raw| {
                if raw.class == MessageClass::Cmd0 as u8 {
                    trace!("Ignoring command frame {:#04x} outside of a command", raw.id);
                    return Ok(None);
                }
                LogFrame::decode(raw).map(Some)
            });
            match decoded {
                Ok(Some(log)) => {
                    on_log(&log);
                    dispatched += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    debug!("Dropping frame: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None if dispatched == 0 => Err(SbgError::NotReady),
            None => Ok(()),
        }
    }

    fn send(&mut self, class: MessageClass, id: u8, payload: &[u8]) -> Result<(), SbgError> {
        let frame = encode_frame(class as u8, id, payload)?;
        self.link.write_all(&frame).map_err(SbgError::WriteError)?;
        self.link.flush().map_err(SbgError::WriteError)
    }

    /// Waits for the acknowledgement of `cmd`, discarding logs streamed meanwhile.
    fn wait_ack(&mut self, cmd: CmdId) -> Result<Ack, SbgError> {
        let deadline = Instant::now() + self.ack_timeout;
        loop {
            while let Some(next) = self.parser.next_frame() {
                let raw = match next {
                    Ok(raw) => raw,
                    Err(e) => {
                        debug!("Corrupt frame while waiting for ack: {}", e);
                        continue;
                    }
                };
                if MessageClass::from_u8(raw.class) == Some(MessageClass::Cmd0)
                    && CmdId::from_u8(raw.id) == Some(CmdId::Ack)
                {
                    let ack = Ack::decode(&raw.payload)?;
                    if ack.acknowledges(MessageClass::Cmd0, cmd) {
                        return Ok(ack);
                    }
                    trace!("Ignoring ack for {:#04x}/{:#04x}", ack.class, ack.id);
                }
            }

            if Instant::now() >= deadline {
                return Err(SbgError::TimeOut("command acknowledgement"));
            }
            if self.fill()? == 0 {
                thread::sleep(Duration::from_millis(1));
            }
        }
    }

    /// Asks the device to emit `class`/`id` on `port` at `mode`.
    pub fn set_output_conf(
        &mut self,
        port: OutputPort,
        class: MessageClass,
        id: LogId,
        mode: OutputMode,
    ) -> Result<(), SbgError> {
        let payload = cmd::output_conf_payload(port, class, id, mode);
        let mut last_error = SbgError::TimeOut("command acknowledgement");
        for attempt in 1..=self.command_attempts.max(1) {
            self.send(MessageClass::Cmd0, CmdId::OutputConf as u8, &payload)?;
            match self.wait_ack(CmdId::OutputConf) {
                Ok(ack) => return ack.into_result(),
                Err(e @ SbgError::TimeOut(_)) => {
                    warn!("Output configuration attempt {} timed out", attempt);
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// In-memory link: bytes queued in `rx` are returned by reads, writes land in `tx`.
    #[derive(Default)]
    struct MockLink {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl Read for MockLink {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.rx.len());
            for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
                *dst = src;
            }
            Ok(n)
        }
    }

    impl Write for MockLink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn euler_bytes(roll: f32) -> Vec<u8> {
        let log = EkfEuler {
            time_stamp: 1,
            euler: EulerAngles::new(roll, 0.0, 0.0),
            std_dev: Vector3::default(),
            status: EkfStatus::ATTITUDE_VALID,
        };
        encode_frame(0x00, LogId::EkfEuler as u8, &log.to_payload()).unwrap()
    }

    fn ack_bytes(error_code: u16) -> Vec<u8> {
        let ack = Ack {
            id: CmdId::OutputConf as u8,
            class: MessageClass::Cmd0 as u8,
            error_code,
        };
        encode_frame(MessageClass::Cmd0 as u8, CmdId::Ack as u8, &ack.encode()).unwrap()
    }

    #[test]
    fn empty_link_is_not_ready() {
        let mut handle = EcomHandle::new(MockLink::default());
        let result = handle.handle_logs(|_| panic!("no log expected"));
        assert!(matches!(result, Err(SbgError::NotReady)));
    }

    #[test]
    fn dispatches_logs_in_arrival_order() {
        let mut link = MockLink::default();
        link.rx.extend(euler_bytes(0.1));
        link.rx.extend(encode_frame(0x00, LogId::Status as u8, &[0; 22]).unwrap());
        link.rx.extend(euler_bytes(0.2));

        let mut handle = EcomHandle::new(link);
        let mut seen = Vec::new();
        handle.handle_logs(|log| seen.push(log.clone())).unwrap();

        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[0].data, LogData::EkfEuler(e) if e.euler.roll == 0.1));
        assert!(matches!(seen[1].data, LogData::Unknown(_)));
        assert!(matches!(seen[2].data, LogData::EkfEuler(e) if e.euler.roll == 0.2));
    }

    #[test]
    fn corrupt_frame_is_reported() {
        let mut bad = euler_bytes(0.3);
        bad[8] ^= 0xFF;
        let mut link = MockLink::default();
        link.rx.extend(bad);

        let mut handle = EcomHandle::new(link);
        let result = handle.handle_logs(|_| {});
        assert!(matches!(result, Err(SbgError::InvalidCrc { .. })));
        assert_eq!(result.unwrap_err().name(), "SBG_INVALID_CRC");
    }

    #[test]
    fn output_conf_is_sent_and_acknowledged() {
        let mut link = MockLink::default();
        link.rx.extend(euler_bytes(0.0));
        link.rx.extend(ack_bytes(0));

        let mut handle = EcomHandle::new(link);
        handle
            .set_output_conf(
                OutputPort::A,
                MessageClass::LogEcom0,
                LogId::EkfEuler,
                OutputMode::from(ImuFrequency::Hz10),
            )
            .unwrap();

        let sent = handle.into_inner().tx;
        let mut parser = FrameParser::default();
        let frames = parser.parse(&sent);
        assert_eq!(frames.len(), 1);
        let raw = frames.into_iter().next().unwrap().unwrap();
        assert_eq!(raw.class, MessageClass::Cmd0 as u8);
        assert_eq!(raw.id, CmdId::OutputConf as u8);
        assert_eq!(raw.payload, vec![0x00, 0x00, 0x06, 20, 0x00]);
    }

    #[test]
    fn negative_ack_is_an_error() {
        let mut link = MockLink::default();
        link.rx.extend(ack_bytes(9));

        let mut handle = EcomHandle::new(link);
        let result = handle.set_output_conf(
            OutputPort::B,
            MessageClass::LogEcom0,
            LogId::EkfEuler,
            OutputMode::MainLoop,
        );
        assert!(matches!(result, Err(SbgError::Nack { code: 9 })));
    }

    #[test]
    fn missing_ack_times_out_after_retries() {
        let mut handle = EcomHandle::new(MockLink::default());
        handle.ack_timeout = Duration::from_millis(5);
        handle.command_attempts = 2;
        let result = handle.set_output_conf(
            OutputPort::A,
            MessageClass::LogEcom0,
            LogId::EkfEuler,
            OutputMode::Div2,
        );
        assert!(matches!(result, Err(SbgError::TimeOut(_))));

        let sent = handle.into_inner().tx;
        assert_eq!(FrameParser::default().parse(&sent).len(), 2);
    }
}
