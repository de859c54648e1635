use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// BCP-47 tag handed to the recognizer, e.g. "en-IN".
    pub language: Option<String>,
    #[serde(default = "default_continuous")]
    pub continuous: bool,
    #[serde(default)]
    pub interim_results: bool,
}

fn default_continuous() -> bool {
    true
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            language: None,
            continuous: default_continuous(),
            interim_results: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub is_final: bool,
    pub ts: Option<OffsetDateTime>,
}

impl Transcript {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            ts: Some(OffsetDateTime::now_utc()),
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            ts: Some(OffsetDateTime::now_utc()),
        }
    }
}

/// Events a capture session emits while it is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaptureEvent {
    Transcript(Transcript),
    /// The recognizer's keyword spotter fired.
    WakeWord,
}

/// A single spoken response handed to the output engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    /// Preferred voice name; engines fall back to their default when absent.
    pub voice: Option<String>,
}
