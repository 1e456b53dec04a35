//! The poll / dispatch loop.
//!
//! Each iteration polls the source once, letting it push frames into the
//! recorder, backs off briefly when nothing was available, and then checks
//! whether it should stop.

use crate::clock::Clock;
use crate::recorder::FrameRecorder;
use crate::shutdown::Shutdown;
use crate::sink::RecordSink;
use crate::source::LogSource;
use sbg::SbgError;
use std::thread;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Sleep after a poll that found nothing.
    pub backoff: Duration,
    /// Consecutive poll errors tolerated before giving up, 0 for no limit.
    pub max_error_streak: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            backoff: Duration::from_millis(1),
            max_error_streak: 0,
        }
    }
}

#[derive(Debug)]
pub enum StopReason {
    Shutdown,
    ErrorStreak { streak: u32, last: SbgError },
    SinkFault,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub not_ready: u64,
    pub transient_errors: u64,
}

pub struct AcquisitionLoop<Src, S, C> {
    source: Src,
    recorder: FrameRecorder<S, C>,
    shutdown: Shutdown,
    config: LoopConfig,
    state: LoopState,
    stats: LoopStats,
    error_streak: u32,
    stop_reason: Option<StopReason>,
}

impl<Src, S, C> AcquisitionLoop<Src, S, C>
where
    Src: LogSource,
    S: RecordSink,
    C: Clock,
{
    pub fn new(
        source: Src,
        recorder: FrameRecorder<S, C>,
        shutdown: Shutdown,
        config: LoopConfig,
    ) -> Self {
        AcquisitionLoop {
            source,
            recorder,
            shutdown,
            config,
            state: LoopState::Running,
            stats: LoopStats::default(),
            error_streak: 0,
            stop_reason: None,
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn recorder(&self) -> &FrameRecorder<S, C> {
        &self.recorder
    }

    /// Runs one iteration. Once stopped, further calls do nothing.
    pub fn step(&mut self) -> LoopState {
        if self.state == LoopState::Stopped {
            return self.state;
        }
        self.stats.iterations += 1;

        let recorder = &mut self.recorder;
        let result = self.source.poll(&mut |frame| recorder.on_frame(frame));

        match result {
            Ok(()) => self.error_streak = 0,
            Err(SbgError::NotReady) => {
                self.error_streak = 0;
                self.stats.not_ready += 1;
                if !self.config.backoff.is_zero() {
                    thread::sleep(self.config.backoff);
                }
            }
            Err(e) => {
                self.stats.transient_errors += 1;
                self.error_streak += 1;
                error!(
                    code = e.code(),
                    "{}: Unable to process incoming sbgECom logs: {}",
                    e.name(),
                    e
                );
                let limit = self.config.max_error_streak;
                if limit > 0 && self.error_streak >= limit {
                    self.stop(StopReason::ErrorStreak {
                        streak: self.error_streak,
                        last: e,
                    });
                    return self.state;
                }
            }
        }

        if self.shutdown.is_set() {
            self.stop(StopReason::Shutdown);
        } else if self.recorder.sink().is_faulted() {
            self.stop(StopReason::SinkFault);
        }
        self.state
    }

    fn stop(&mut self, reason: StopReason) {
        debug!("Acquisition loop stopping: {:?}", reason);
        self.state = LoopState::Stopped;
        self.stop_reason = Some(reason);
    }

    /// Iterates until stopped and reports why.
    pub fn run(&mut self) -> &StopReason {
        while self.step() == LoopState::Running {}
        // `step` only returns Stopped after recording a reason.
        self.stop_reason.get_or_insert(StopReason::Shutdown)
    }

    pub fn into_parts(self) -> (Src, FrameRecorder<S, C>, Option<StopReason>) {
        (self.source, self.recorder, self.stop_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::sink::testing::VecSink;
    use crate::time_ref::TimeReference;
    use sbg::{EkfEuler, EkfStatus, EulerAngles, ImuFrequency, LogFrame, OutputPort, Vector3};
    use std::collections::VecDeque;
    use std::time::Instant;

    enum Step {
        Frames(Vec<LogFrame>),
        Fail(fn() -> SbgError),
        NotReady,
    }

    /// Replays scripted poll outcomes, then reports not-ready forever.
    struct Script {
        steps: VecDeque<Step>,
        polls: u64,
        trigger_after: Option<(u64, Shutdown)>,
    }

    impl Script {
        fn new(steps: Vec<Step>) -> Self {
            Script {
                steps: steps.into(),
                polls: 0,
                trigger_after: None,
            }
        }
    }

    impl LogSource for Script {
        fn configure_output(&mut self, _: OutputPort, _: ImuFrequency) -> Result<(), SbgError> {
            Ok(())
        }

        fn poll(&mut self, on_frame: &mut dyn FnMut(&LogFrame)) -> Result<(), SbgError> {
            self.polls += 1;
            if let Some((n, shutdown)) = &self.trigger_after {
                if self.polls >= *n {
                    shutdown.trigger();
                }
            }
            match self.steps.pop_front().unwrap_or(Step::NotReady) {
                Step::Frames(frames) => {
                    frames.iter().for_each(|f| on_frame(f));
                    Ok(())
                }
                Step::Fail(make) => Err(make()),
                Step::NotReady => Err(SbgError::NotReady),
            }
        }
    }

    fn frame(roll: f32) -> LogFrame {
        LogFrame::ekf_euler(EkfEuler {
            time_stamp: 0,
            euler: EulerAngles::new(roll, 0.0, 0.0),
            std_dev: Vector3::default(),
            status: EkfStatus::empty(),
        })
    }

    fn make_loop(
        script: Script,
        shutdown: &Shutdown,
        max_error_streak: u32,
    ) -> AcquisitionLoop<Script, VecSink, SystemClock> {
        let reference = TimeReference {
            wall_second: 0,
            instant: Instant::now(),
        };
        let recorder = FrameRecorder::new(VecSink::default(), SystemClock, reference);
        let config = LoopConfig {
            backoff: Duration::ZERO,
            max_error_streak,
        };
        AcquisitionLoop::new(script, recorder, shutdown.clone(), config)
    }

    #[test]
    fn not_ready_alone_never_stops_the_loop() {
        let shutdown = Shutdown::new();
        let mut acq = make_loop(Script::new(vec![]), &shutdown, 0);
        for _ in 0..1000 {
            assert_eq!(acq.step(), LoopState::Running);
        }
        assert_eq!(acq.stats().not_ready, 1000);
        assert!(acq.recorder().sink().records.is_empty());

        shutdown.trigger();
        assert_eq!(acq.step(), LoopState::Stopped);
        assert!(matches!(acq.into_parts().2, Some(StopReason::Shutdown)));
    }

    #[test]
    fn transient_errors_are_tolerated_without_limit() {
        let shutdown = Shutdown::new();
        let steps = (0..50)
            .map(|_| Step::Fail(|| SbgError::InvalidFrame("bad".into())))
            .chain(std::iter::once(Step::Frames(vec![frame(0.5)])))
            .collect();
        let mut script = Script::new(steps);
        script.trigger_after = Some((51, shutdown.clone()));

        let mut acq = make_loop(script, &shutdown, 0);
        assert!(matches!(acq.run(), StopReason::Shutdown));
        assert_eq!(acq.stats().transient_errors, 50);
        assert_eq!(acq.stats().iterations, 51);
        assert_eq!(acq.recorder().sink().records.len(), 1);
    }

    #[test]
    fn shutdown_is_observed_after_the_poll() {
        let shutdown = Shutdown::new();
        let mut script = Script::new(vec![Step::Frames(vec![frame(0.1), frame(0.2)])]);
        script.trigger_after = Some((1, shutdown.clone()));

        let mut acq = make_loop(script, &shutdown, 0);
        assert!(matches!(acq.run(), StopReason::Shutdown));
        // The frames delivered by the final poll are still recorded.
        assert_eq!(acq.recorder().sink().records.len(), 2);
        assert_eq!(acq.stats().iterations, 1);
        assert_eq!(acq.step(), LoopState::Stopped);
        assert_eq!(acq.stats().iterations, 1);
    }

    #[test]
    fn error_streak_limit_stops_the_loop() {
        let shutdown = Shutdown::new();
        let steps = vec![
            Step::Fail(|| SbgError::InvalidFrame("a".into())),
            Step::Fail(|| SbgError::InvalidFrame("b".into())),
            Step::NotReady,
            Step::Fail(|| SbgError::InvalidFrame("c".into())),
            Step::Fail(|| SbgError::InvalidFrame("d".into())),
            Step::Fail(|| SbgError::TimeOut("read")),
        ];
        let mut acq = make_loop(Script::new(steps), &shutdown, 3);
        match acq.run() {
            StopReason::ErrorStreak { streak, last } => {
                assert_eq!(*streak, 3);
                assert!(matches!(last, SbgError::TimeOut(_)));
            }
            other => panic!("unexpected stop reason {:?}", other),
        }
        assert_eq!(acq.stats().iterations, 6);
    }

    #[test]
    fn faulted_sink_stops_the_loop() {
        let shutdown = Shutdown::new();
        let mut acq = make_loop(Script::new(vec![]), &shutdown, 0);
        acq.recorder.sink_mut().faulted = true;
        assert_eq!(acq.step(), LoopState::Stopped);
        assert!(matches!(acq.into_parts().2, Some(StopReason::SinkFault)));
    }
}
