use crate::acquisition::LoopConfig;
use crate::session::SessionConfig;
use crate::sink::WriteMode;
use clap::Parser;
use imu_traits::ImuFrequency;
use sbg::OutputPort;
use std::path::PathBuf;
use std::time::Duration;
use strum::IntoEnumIterator;

const EXAMPLE: &str = "Example:    $ softimu /dev/ttyUSB0 115200 output.bin 10";

/// Record the orientation estimates of an SBG IMU to a timestamped binary file.
#[derive(Parser, Debug)]
#[command(name = "softimu", version, after_help = EXAMPLE)]
pub struct Cli {
    /// Serial port on which the IMU is plugged.
    pub port: String,

    /// Baud rate of the serial connection, normally 115200.
    pub baud: u32,

    /// Output file (absolute path recommended). Created if missing, truncated otherwise.
    pub output: PathBuf,

    /// Sampling frequency in Hz: one of 200, 100, 50, 40, 25, 20, 10, 5, 1.
    #[arg(value_parser = parse_frequency)]
    pub frequency: ImuFrequency,

    /// Device output port the log is requested on.
    #[arg(long, default_value = "A")]
    pub output_port: OutputPort,

    /// Sleep in milliseconds when no data was available.
    #[arg(long, default_value_t = 1)]
    pub backoff_ms: u64,

    /// Stop after this many consecutive read errors (0: never).
    #[arg(long, default_value_t = 0)]
    pub max_error_streak: u32,

    /// Abort the recording on the first failed write to the output file.
    #[arg(long)]
    pub strict_io: bool,
}

fn parse_frequency(s: &str) -> Result<ImuFrequency, String> {
    s.trim()
        .parse::<u32>()
        .ok()
        .and_then(ImuFrequency::from_hz)
        .ok_or_else(|| {
            let allowed: Vec<String> = ImuFrequency::iter().map(|f| f.to_string()).collect();
            format!("invalid frequency, possible values are {}", allowed.join(", "))
        })
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            port: self.port.clone(),
            baud: self.baud,
            output: self.output.clone(),
            frequency: self.frequency,
            output_port: self.output_port,
            write_mode: if self.strict_io {
                WriteMode::Strict
            } else {
                WriteMode::Lenient
            },
            loop_config: LoopConfig {
                backoff: Duration::from_millis(self.backoff_ms),
                max_error_streak: self.max_error_streak,
            },
        }
    }
}
