//! One recording from startup to teardown.

use crate::acquisition::{AcquisitionLoop, LoopConfig, LoopStats, StopReason};
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, SessionError};
use crate::recorder::FrameRecorder;
use crate::shutdown::Shutdown;
use crate::sink::{FileSink, RecordSink, WriteMode};
use crate::source::LogSource;
use crate::time_ref::establish_reference;
use imu_traits::ImuFrequency;
use sbg::{EcomHandle, OutputPort};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub port: String,
    pub baud: u32,
    pub output: PathBuf,
    pub frequency: ImuFrequency,
    pub output_port: OutputPort,
    pub write_mode: WriteMode,
    pub loop_config: LoopConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub wall_second: i64,
    pub records_written: u64,
    pub frames_dropped: u64,
    pub stats: LoopStats,
}

/// A configured source wired to its output, ready to loop.
pub struct Session<Src, S, C> {
    acquisition: AcquisitionLoop<Src, S, C>,
}

impl<Src, S, C> Session<Src, S, C>
where
    Src: LogSource,
    S: RecordSink,
    C: Clock,
{
    /// Applies the output configuration and registers the recorder.
    ///
    /// The recorder's sink must already hold the header. On failure the sink
    /// is finished before the error is returned.
    pub fn start(
        mut source: Src,
        mut recorder: FrameRecorder<S, C>,
        output_port: OutputPort,
        frequency: ImuFrequency,
        shutdown: Shutdown,
        loop_config: LoopConfig,
    ) -> Result<Self> {
        if let Err(e) = source.configure_output(output_port, frequency) {
            recorder.sink_mut().finish();
            return Err(SessionError::ConfigureOutput(e));
        }
        info!(
            "Recording EKF Euler angles at {} Hz on output port {}",
            frequency, output_port
        );

        Ok(Session {
            acquisition: AcquisitionLoop::new(source, recorder, shutdown, loop_config),
        })
    }

    /// Loops until stopped, then finishes the sink and releases the source.
    pub fn run(mut self) -> Result<SessionReport> {
        let reason = self.acquisition.run();
        info!("Acquisition stopped: {:?}", reason);

        let stats = self.acquisition.stats();
        let (source, recorder, reason) = self.acquisition.into_parts();
        drop(source);

        let wall_second = recorder.reference().wall_second;
        let frames_dropped = recorder.dropped();
        let mut sink = recorder.into_sink();
        sink.finish();

        let report = SessionReport {
            wall_second,
            records_written: sink.records_written(),
            frames_dropped,
            stats,
        };
        info!(
            "Wrote {} records, dropped {} frames, {} transient errors over {} polls",
            report.records_written,
            report.frames_dropped,
            report.stats.transient_errors,
            report.stats.iterations
        );

        match reason {
            Some(StopReason::ErrorStreak { streak, last }) => {
                Err(SessionError::ErrorStreak { streak, last })
            }
            Some(StopReason::SinkFault) => Err(SessionError::OutputFault(
                sink.take_fault().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "output sink faulted")
                }),
            )),
            _ => Ok(report),
        }
    }
}

/// Runs a full recording against the serial device named in `config`.
///
/// Startup order: time reference, output file and header, serial port,
/// protocol handle, output configuration.
pub fn run(config: &SessionConfig, shutdown: Shutdown) -> Result<SessionReport> {
    let clock = SystemClock;

    info!("Waiting for the next wall-clock second");
    let reference = establish_reference(&clock);
    info!("Time reference set at {}", reference.wall_second);

    let mut sink = FileSink::create(&config.output, config.write_mode).map_err(|source| {
        SessionError::CreateOutput {
            path: config.output.clone(),
            source,
        }
    })?;
    sink.write_header(reference.wall_second);

    let link = EcomHandle::open_link(&config.port, config.baud)
        .map_err(SessionError::OpenTransport)?;
    let handle = EcomHandle::init(link).map_err(SessionError::InitProtocol)?;

    let recorder = FrameRecorder::new(sink, clock, reference);
    let session = Session::start(
        handle,
        recorder,
        config.output_port,
        config.frequency,
        shutdown,
        config.loop_config,
    )?;
    session.run()
}
