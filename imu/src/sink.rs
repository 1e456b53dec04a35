use crate::format::{self, Record};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};

/// How write failures on the output are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Failures are logged and counted; recording goes on.
    #[default]
    Lenient,
    /// The first failure latches and the sink reports itself faulted.
    Strict,
}

/// Destination for the header and the orientation records.
///
/// Writes do not return errors; whether a failure matters is the sink's
/// policy, observed through [`RecordSink::is_faulted`].
pub trait RecordSink {
    fn write_header(&mut self, wall_second: i64);

    fn append(&mut self, record: &Record);

    /// Flushes and closes. Later calls are no-ops.
    fn finish(&mut self);

    fn is_faulted(&self) -> bool;

    fn records_written(&self) -> u64;

    /// Hands out the error that faulted the sink, if any.
    fn take_fault(&mut self) -> Option<io::Error> {
        None
    }
}

/// Append-only sink flushing after every write.
pub struct FileSink<W: Write = File> {
    writer: Option<W>,
    mode: WriteMode,
    records: u64,
    write_errors: u64,
    fault: Option<io::Error>,
}

impl FileSink<File> {
    /// Creates or truncates `path`.
    pub fn create<P: AsRef<Path>>(path: P, mode: WriteMode) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?, mode))
    }
}

impl<W: Write> FileSink<W> {
    pub fn new(writer: W, mode: WriteMode) -> Self {
        FileSink {
            writer: Some(writer),
            mode,
            records: 0,
            write_errors: 0,
            fault: None,
        }
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    fn write_flushed(&mut self, bytes: &[u8]) -> bool {
        if self.fault.is_some() {
            return false;
        }
        let Some(writer) = self.writer.as_mut() else {
            debug!("Dropping {} bytes written after close", bytes.len());
            return false;
        };
        match writer.write_all(bytes).and_then(|()| writer.flush()) {
            Ok(()) => true,
            Err(e) => {
                self.write_errors += 1;
                match self.mode {
                    WriteMode::Lenient => warn!("Output write failed: {}", e),
                    WriteMode::Strict => self.fault = Some(e),
                }
                false
            }
        }
    }
}

impl<W: Write> RecordSink for FileSink<W> {
    fn write_header(&mut self, wall_second: i64) {
        self.write_flushed(&format::encode_header(wall_second));
    }

    fn append(&mut self, record: &Record) {
        if self.write_flushed(&record.encode()) {
            self.records += 1;
        }
    }

    fn finish(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Final flush of output failed: {}", e);
            }
        }
    }

    fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    fn records_written(&self) -> u64 {
        self.records
    }

    fn take_fault(&mut self) -> Option<io::Error> {
        self.fault.take()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{RecordReader, HEADER_SIZE, RECORD_SIZE};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared buffer that can be told to fail.
    #[derive(Clone, Default)]
    struct Target {
        bytes: Rc<RefCell<Vec<u8>>>,
        failing: Rc<RefCell<bool>>,
        flushes: Rc<RefCell<usize>>,
    }

    impl Write for Target {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if *self.failing.borrow() {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.bytes.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            *self.flushes.borrow_mut() += 1;
            Ok(())
        }
    }

    fn record(elapsed_us: i64) -> Record {
        Record {
            elapsed_us,
            euler: [0.0, 0.5, 1.0],
        }
    }

    #[test]
    fn every_write_is_flushed() {
        let target = Target::default();
        let mut sink = FileSink::new(target.clone(), WriteMode::Lenient);
        sink.write_header(42);
        sink.append(&record(1));
        sink.append(&record(2));
        assert_eq!(*target.flushes.borrow(), 3);
        assert_eq!(target.bytes.borrow().len(), HEADER_SIZE + 2 * RECORD_SIZE);
        assert_eq!(sink.records_written(), 2);

        let bytes = target.bytes.borrow().clone();
        let reader = RecordReader::new(&bytes[..]).unwrap();
        assert_eq!(reader.wall_second(), 42);
    }

    #[test]
    fn lenient_mode_keeps_going() {
        let target = Target::default();
        let mut sink = FileSink::new(target.clone(), WriteMode::Lenient);
        sink.write_header(0);
        *target.failing.borrow_mut() = true;
        sink.append(&record(1));
        *target.failing.borrow_mut() = false;
        sink.append(&record(2));

        assert!(!sink.is_faulted());
        assert_eq!(sink.write_errors(), 1);
        assert_eq!(sink.records_written(), 1);
    }

    #[test]
    fn strict_mode_latches_first_error() {
        let target = Target::default();
        let mut sink = FileSink::new(target.clone(), WriteMode::Strict);
        *target.failing.borrow_mut() = true;
        sink.append(&record(1));
        *target.failing.borrow_mut() = false;
        sink.append(&record(2));

        assert!(sink.is_faulted());
        assert_eq!(sink.records_written(), 0);
        assert!(target.bytes.borrow().is_empty());
        assert_eq!(sink.take_fault().unwrap().to_string(), "disk full");
    }

    #[test]
    fn finish_closes_once() {
        let target = Target::default();
        let mut sink = FileSink::new(target.clone(), WriteMode::Lenient);
        sink.write_header(0);
        sink.finish();
        assert!(sink.is_closed());
        let flushes = *target.flushes.borrow();
        sink.finish();
        sink.append(&record(1));
        assert_eq!(*target.flushes.borrow(), flushes);
        assert_eq!(target.bytes.borrow().len(), HEADER_SIZE);
    }
}
