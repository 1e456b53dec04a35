use crate::clock::Clock;
use crate::format::Record;
use crate::sink::RecordSink;
use crate::time_ref::TimeReference;
use sbg::{LogData, LogFrame, LogId, MessageClass};

/// Turns EKF Euler frames into timestamped records; every other frame is
/// dropped without a trace.
pub struct FrameRecorder<S, C> {
    sink: S,
    clock: C,
    reference: TimeReference,
    accepted: u64,
    dropped: u64,
}

impl<S: RecordSink, C: Clock> FrameRecorder<S, C> {
    pub fn new(sink: S, clock: C, reference: TimeReference) -> Self {
        FrameRecorder {
            sink,
            clock,
            reference,
            accepted: 0,
            dropped: 0,
        }
    }

    pub fn on_frame(&mut self, frame: &LogFrame) {
        let euler = match &frame.data {
            LogData::EkfEuler(log) if frame.is(MessageClass::LogEcom0, LogId::EkfEuler) => {
                log.euler
            }
            _ => {
                self.dropped += 1;
                return;
            }
        };

        let elapsed_us = self.reference.elapsed_micros(self.clock.now());
        self.sink.append(&Record {
            elapsed_us,
            euler: euler.to_array(),
        });
        self.accepted += 1;
    }

    pub fn reference(&self) -> &TimeReference {
        &self.reference
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
