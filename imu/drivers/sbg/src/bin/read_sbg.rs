use clap::Parser;
use sbg::{EcomHandle, ImuFrequency, LogData, LogId, MessageClass, OutputMode, OutputPort, SbgError};
use std::thread;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Print the orientation estimates streamed by an SBG IMU.
#[derive(Parser, Debug)]
struct Args {
    /// Serial port on which the IMU is plugged.
    #[arg(default_value = "/dev/ttyUSB0")]
    port: String,

    #[arg(default_value_t = 115200)]
    baud: u32,

    /// Output rate in Hz.
    #[arg(short, long, default_value = "10")]
    frequency: ImuFrequency,

    #[arg(long, default_value = "A")]
    output_port: OutputPort,
}

fn main() -> Result<(), SbgError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut handle = EcomHandle::open(&args.port, args.baud)?;
    handle.set_output_conf(
        args.output_port,
        MessageClass::LogEcom0,
        LogId::EkfEuler,
        OutputMode::from(args.frequency),
    )?;
    println!("Streaming EKF Euler angles at {} Hz", args.frequency);

    loop {
        let result = handle.handle_logs(|log| {
            if let LogData::EkfEuler(e) = &log.data {
                println!(
                    "t: {: >10} us  roll: {: >10.4} pitch: {: >10.4} yaw: {: >10.4}  mode: {:?}",
                    e.time_stamp,
                    e.euler.roll.to_degrees(),
                    e.euler.pitch.to_degrees(),
                    e.euler.yaw.to_degrees(),
                    e.status.solution_mode(),
                );
            }
        });

        match result {
            Ok(()) => {}
            Err(SbgError::NotReady) => thread::sleep(Duration::from_millis(1)),
            Err(e) => error!("{}: {}", e.name(), e),
        }
    }
}
