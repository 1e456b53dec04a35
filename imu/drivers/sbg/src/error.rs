use std::io;

/// Errors reported by the sbgECom link and decoder.
///
/// Every variant maps onto the numeric code the device family uses, so
/// diagnostics can print the same identifiers the vendor documentation does.
#[derive(Debug, thiserror::Error)]
pub enum SbgError {
    #[error("no new data available")]
    NotReady,

    #[error("invalid CRC: computed {expected:#06x}, received {actual:#06x}")]
    InvalidCrc { expected: u16, actual: u16 },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("timed out waiting for {0}")]
    TimeOut(&'static str),

    #[error("write error: {0}")]
    WriteError(#[source] io::Error),

    #[error("read error: {0}")]
    ReadError(#[source] io::Error),

    #[error("receive buffer overflow, {0} bytes discarded")]
    BufferOverflow(usize),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("device rejected command with error code {code}")]
    Nack { code: u16 },

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl SbgError {
    pub fn code(&self) -> u16 {
        match self {
            SbgError::NotReady => 10,
            SbgError::InvalidCrc { .. } => 3,
            SbgError::InvalidFrame(_) => 4,
            SbgError::TimeOut(_) => 5,
            SbgError::WriteError(_) => 6,
            SbgError::ReadError(_) => 7,
            SbgError::BufferOverflow(_) => 8,
            SbgError::InvalidParameter(_) => 9,
            SbgError::Nack { code } => *code,
            SbgError::Serial(_) => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        error_code_name(self.code())
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, SbgError::NotReady)
    }
}

pub fn error_code_name(code: u16) -> &'static str {
    match code {
        0 => "SBG_NO_ERROR",
        1 => "SBG_ERROR",
        2 => "SBG_NULL_POINTER",
        3 => "SBG_INVALID_CRC",
        4 => "SBG_INVALID_FRAME",
        5 => "SBG_TIME_OUT",
        6 => "SBG_WRITE_ERROR",
        7 => "SBG_READ_ERROR",
        8 => "SBG_BUFFER_OVERFLOW",
        9 => "SBG_INVALID_PARAMETER",
        10 => "SBG_NOT_READY",
        11 => "SBG_MALLOC_FAILED",
        12 => "SBG_CALIB_MAG_NOT_ENOUGH_POINTS",
        13 => "SBG_CALIB_MAG_INVALID_TAKE",
        14 => "SBG_CALIB_MAG_SATURATION",
        15 => "SBG_CALIB_MAG_POINTS_NOT_IN_A_PLANE",
        16 => "SBG_DEVICE_NOT_FOUND",
        17 => "SBG_OPERATION_CANCELLED",
        18 => "SBG_NOT_CONTINUOUS_FRAME",
        19 => "SBG_INCOMPATIBLE_HARDWARE",
        20 => "SBG_INVALID_VERSION",
        _ => "SBG_UNKNOWN_ERROR",
    }
}
