use crate::{CaptureConfig, CaptureEvent, Result, SpeechError, Utterance};

/// An exclusive microphone session producing transcript events.
pub trait SpeechCapture: Send {
    /// Open the capture session. Fails if the device is unavailable.
    fn start(&mut self, config: &CaptureConfig) -> Result<()>;

    /// Close the session and release the device. Safe to call when inactive.
    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// Next pending event, if any. Inactive sessions yield nothing.
    fn poll(&mut self) -> Option<CaptureEvent>;
}

/// A text-to-speech engine that plays one utterance at a time.
pub trait SpeechOutput: Send {
    /// Begin playing `utterance`. The host reports completion back to the
    /// caller out of band.
    fn speak(&mut self, utterance: &Utterance) -> core::result::Result<(), SpeechError>;

    /// Stop whatever is audible right now.
    fn cancel(&mut self);
}
