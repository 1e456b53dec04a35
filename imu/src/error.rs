use sbg::SbgError;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Fatal session errors. Transient poll errors never end up here unless
/// an error-streak limit was configured.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Error while creating output file {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error while opening serial port. Encountered {name}: {0}", name = code_name(.0))]
    OpenTransport(#[source] SbgError),

    #[error("Error initialising sbg library. Encountered {name}: {0}", name = code_name(.0))]
    InitProtocol(#[source] SbgError),

    #[error("Error while configuring logs. Encountered {name}: {0}", name = code_name(.0))]
    ConfigureOutput(#[source] SbgError),

    #[error("Error installing signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error("Giving up after {streak} consecutive errors, last was {name}: {last}", name = code_name(.last))]
    ErrorStreak {
        streak: u32,
        #[source]
        last: SbgError,
    },

    #[error("Output write failed: {0}")]
    OutputFault(#[source] io::Error),
}

fn code_name(err: &SbgError) -> &'static str {
    err.name()
}
