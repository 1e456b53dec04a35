pub mod acquisition;
pub mod cli;
pub mod clock;
pub mod error;
pub mod format;
pub mod recorder;
pub mod session;
pub mod shutdown;
pub mod sink;
pub mod source;
pub mod time_ref;

pub use acquisition::{AcquisitionLoop, LoopConfig, LoopState, LoopStats, StopReason};
pub use clock::{Clock, SystemClock};
pub use error::SessionError;
pub use format::{Record, RecordReader, HEADER_SIZE, RECORD_SIZE};
pub use recorder::FrameRecorder;
pub use session::{Session, SessionConfig, SessionReport};
pub use shutdown::Shutdown;
pub use sink::{FileSink, RecordSink, WriteMode};
pub use source::LogSource;
pub use time_ref::{establish_reference, TimeReference};
