use crate::{
    CaptureConfig, CaptureError, CaptureEvent, Result, SpeechCapture, SpeechError, SpeechOutput,
    Utterance,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct CaptureState {
    active: bool,
    starts: usize,
    stops: usize,
    script: VecDeque<CaptureEvent>,
    fail_with: Option<CaptureError>,
}

/// Scripted in-process capture. Clone the handle before boxing the capture to
/// inspect or feed it afterwards.
pub struct MockCapture {
    state: Arc<Mutex<CaptureState>>,
}

#[derive(Clone)]
pub struct MockCaptureHandle {
    state: Arc<Mutex<CaptureState>>,
}

impl MockCapture {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState::default())),
        }
    }

    /// A capture whose every `start` fails, e.g. a denied microphone prompt.
    pub fn failing(error: CaptureError) -> Self {
        let capture = Self::new();
        lock(&capture.state).fail_with = Some(error);
        capture
    }

    pub fn handle(&self) -> MockCaptureHandle {
        MockCaptureHandle {
            state: self.state.clone(),
        }
    }
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCaptureHandle {
    pub fn push(&self, event: CaptureEvent) {
        lock(&self.state).script.push_back(event);
    }

    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    pub fn starts(&self) -> usize {
        lock(&self.state).starts
    }

    pub fn stops(&self) -> usize {
        lock(&self.state).stops
    }
}

impl SpeechCapture for MockCapture {
    fn start(&mut self, _config: &CaptureConfig) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(err) = state.fail_with.clone() {
            return Err(err);
        }
        if state.active {
            return Err(CaptureError::AlreadyActive);
        }
        state.active = true;
        state.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = lock(&self.state);
        if state.active {
            state.active = false;
            state.stops += 1;
        }
    }

    fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    fn poll(&mut self) -> Option<CaptureEvent> {
        let mut state = lock(&self.state);
        if !state.active {
            return None;
        }
        state.script.pop_front()
    }
}

#[derive(Debug, Default)]
struct SpeechState {
    audible: Option<Utterance>,
    started: Vec<Utterance>,
    cancelled: Vec<u64>,
}

/// Records what would have been played instead of producing audio.
pub struct MockSpeech {
    state: Arc<Mutex<SpeechState>>,
}

#[derive(Clone)]
pub struct MockSpeechHandle {
    state: Arc<Mutex<SpeechState>>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SpeechState::default())),
        }
    }

    pub fn handle(&self) -> MockSpeechHandle {
        MockSpeechHandle {
            state: self.state.clone(),
        }
    }
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpeechHandle {
    /// The utterance currently playing.
    pub fn audible(&self) -> Option<Utterance> {
        lock(&self.state).audible.clone()
    }

    /// Every utterance that was started, in order.
    pub fn started(&self) -> Vec<Utterance> {
        lock(&self.state).started.clone()
    }

    /// Ids of utterances cut off before they finished.
    pub fn cancelled(&self) -> Vec<u64> {
        lock(&self.state).cancelled.clone()
    }

    /// Simulate natural end of playback.
    pub fn finish(&self) -> Option<Utterance> {
        lock(&self.state).audible.take()
    }
}

impl SpeechOutput for MockSpeech {
    fn speak(&mut self, utterance: &Utterance) -> core::result::Result<(), SpeechError> {
        if utterance.text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let mut state = lock(&self.state);
        if let Some(previous) = state.audible.take() {
            state.cancelled.push(previous.id);
        }
        state.audible = Some(utterance.clone());
        state.started.push(utterance.clone());
        Ok(())
    }

    fn cancel(&mut self) {
        let mut state = lock(&self.state);
        if let Some(current) = state.audible.take() {
            state.cancelled.push(current.id);
        }
    }
}
