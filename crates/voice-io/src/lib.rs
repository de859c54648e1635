//! voice-io: speech capture and speech output boundaries
//!
//! The assistant treats speech-to-text and text-to-speech engines as black
//! boxes. This crate defines the start/stop/poll contract for capture, the
//! speak/cancel contract for output, and ships in-process backends so hosts
//! and tests can run without audio hardware.

mod types;
pub use types::{CaptureConfig, CaptureEvent, Transcript, Utterance};

mod error;
pub use error::{CaptureError, Result, SpeechError};

mod traits;
pub use traits::{SpeechCapture, SpeechOutput};

mod channel;
pub use channel::ChannelCapture;

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{MockCapture, MockCaptureHandle, MockSpeech, MockSpeechHandle};
