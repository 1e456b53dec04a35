use imu_traits::ImuFrequency;
use sbg::{EcomHandle, LogFrame, LogId, MessageClass, OutputMode, OutputPort, SbgError};
use std::io::{Read, Write};

/// The protocol side of an acquisition: configures the device stream and
/// hands decoded frames over one poll at a time.
pub trait LogSource {
    /// Asks the device to stream orientation estimates at `frequency`.
    fn configure_output(
        &mut self,
        port: OutputPort,
        frequency: ImuFrequency,
    ) -> Result<(), SbgError>;

    /// Processes pending input, calling `on_frame` synchronously for each
    /// decoded frame. `Err(SbgError::NotReady)` means nothing was available.
    fn poll(&mut self, on_frame: &mut dyn FnMut(&LogFrame)) -> Result<(), SbgError>;
}

impl<L: Read + Write> LogSource for EcomHandle<L> {
    fn configure_output(
        &mut self,
        port: OutputPort,
        frequency: ImuFrequency,
    ) -> Result<(), SbgError> {
        self.set_output_conf(
            port,
            MessageClass::LogEcom0,
            LogId::EkfEuler,
            OutputMode::from(frequency),
        )
    }

    fn poll(&mut self, on_frame: &mut dyn FnMut(&LogFrame)) -> Result<(), SbgError> {
        self.handle_logs(on_frame)
    }
}
