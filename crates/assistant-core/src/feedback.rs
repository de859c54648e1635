//! Spoken feedback arbitration
//!
//! One utterance is audible at a time. Priorities decide what happens when
//! a new request meets one already playing:
//!
//! - `Manual` cuts off anything and clears the backlog.
//! - `Essential` cuts off `Optional`, otherwise waits its turn (FIFO).
//! - `Optional` is dropped unless the queue is completely silent.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use voice_io::{SpeechOutput, Utterance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Essential,
    Optional,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Started(u64),
    Queued(u64),
    Dropped,
}

pub struct SpeechQueue {
    output: Box<dyn SpeechOutput>,
    current: Option<(u64, Priority)>,
    pending: VecDeque<(Utterance, Priority)>,
    voice: Option<String>,
    next_id: u64,
}

impl SpeechQueue {
    pub fn new(output: Box<dyn SpeechOutput>) -> Self {
        Self {
            output,
            current: None,
            pending: VecDeque::new(),
            voice: None,
            next_id: 0,
        }
    }

    /// Applies to utterances enqueued from now on.
    pub fn set_voice_preference(&mut self, voice: Option<String>) {
        self.voice = voice;
    }

    pub fn voice_preference(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_id(&self) -> Option<u64> {
        self.current.map(|(id, _)| id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn enqueue(&mut self, text: &str, priority: Priority) -> EnqueueOutcome {
        let text = text.trim();
        if text.is_empty() {
            return EnqueueOutcome::Dropped;
        }

        let busy = self.current.is_some() || !self.pending.is_empty();
        match priority {
            Priority::Manual => {
                self.pending.clear();
                self.interrupt();
            }
            Priority::Essential => match self.current {
                Some((_, Priority::Optional)) => self.interrupt(),
                Some(_) => {
                    let utterance = self.utterance(text);
                    let id = utterance.id;
                    self.pending.push_back((utterance, priority));
                    return EnqueueOutcome::Queued(id);
                }
                None => {}
            },
            Priority::Optional if busy => {
                tracing::debug!("optional speech dropped; queue busy");
                return EnqueueOutcome::Dropped;
            }
            Priority::Optional => {}
        }

        let utterance = self.utterance(text);
        if self.start(utterance, priority) {
            self.current_id()
                .map(EnqueueOutcome::Started)
                .unwrap_or(EnqueueOutcome::Dropped)
        } else {
            EnqueueOutcome::Dropped
        }
    }

    /// The engine finished `id`. Ends for anything other than the current
    /// utterance (e.g. one that was cancelled) are ignored. Returns whether
    /// something is still audible.
    pub fn on_playback_ended(&mut self, id: u64) -> bool {
        if self.current_id() != Some(id) {
            return self.is_speaking();
        }
        self.current = None;
        while let Some((utterance, priority)) = self.pending.pop_front() {
            if self.start(utterance, priority) {
                break;
            }
        }
        self.is_speaking()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
        self.interrupt();
    }

    fn interrupt(&mut self) {
        if self.current.take().is_some() {
            self.output.cancel();
        }
    }

    fn utterance(&mut self, text: &str) -> Utterance {
        self.next_id += 1;
        Utterance {
            id: self.next_id,
            text: text.to_string(),
            voice: self.voice.clone(),
        }
    }

    fn start(&mut self, utterance: Utterance, priority: Priority) -> bool {
        match self.output.speak(&utterance) {
            Ok(()) => {
                self.current = Some((utterance.id, priority));
                true
            }
            Err(e) => {
                tracing::warn!("speech output failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_io::{MockSpeech, MockSpeechHandle};

    fn queue() -> (SpeechQueue, MockSpeechHandle) {
        let speech = MockSpeech::new();
        let handle = speech.handle();
        (SpeechQueue::new(Box::new(speech)), handle)
    }

    fn finish(queue: &mut SpeechQueue, handle: &MockSpeechHandle) -> bool {
        let done = handle.finish().map(|u| u.id).unwrap_or_default();
        queue.on_playback_ended(done)
    }

    #[test]
    fn test_optional_dropped_during_essential() {
        let (mut q, handle) = queue();
        assert!(matches!(q.enqueue("Opening notes.", Priority::Essential), EnqueueOutcome::Started(_)));
        assert_eq!(q.enqueue("Notes page", Priority::Optional), EnqueueOutcome::Dropped);
        assert_eq!(handle.started().len(), 1);
        assert_eq!(handle.audible().unwrap().text, "Opening notes.");
    }

    #[test]
    fn test_essential_preempts_optional_and_queues_behind_essential() {
        let (mut q, handle) = queue();
        let first = q.enqueue("Dashboard", Priority::Optional);
        let EnqueueOutcome::Started(first_id) = first else {
            panic!("optional should start on a silent queue");
        };
        assert!(matches!(q.enqueue("One", Priority::Essential), EnqueueOutcome::Started(_)));
        assert_eq!(handle.cancelled(), vec![first_id]);

        assert!(matches!(q.enqueue("Two", Priority::Essential), EnqueueOutcome::Queued(_)));
        assert!(matches!(q.enqueue("Three", Priority::Essential), EnqueueOutcome::Queued(_)));
        assert_eq!(q.pending_len(), 2);

        assert!(finish(&mut q, &handle));
        assert_eq!(handle.audible().unwrap().text, "Two");
        assert!(finish(&mut q, &handle));
        assert_eq!(handle.audible().unwrap().text, "Three");
        assert!(!finish(&mut q, &handle));
    }

    #[test]
    fn test_manual_leaves_only_latest_manual_audible() {
        let (mut q, handle) = queue();
        q.enqueue("One", Priority::Essential);
        q.enqueue("Two", Priority::Essential);
        q.enqueue("Manual A", Priority::Manual);
        q.enqueue("Manual B", Priority::Manual);
        assert_eq!(q.pending_len(), 0);
        assert_eq!(handle.audible().unwrap().text, "Manual B");
        assert!(!finish(&mut q, &handle));
        assert!(handle.audible().is_none());
    }

    #[test]
    fn test_stale_end_is_ignored() {
        let (mut q, handle) = queue();
        let EnqueueOutcome::Started(old) = q.enqueue("Old", Priority::Essential) else {
            panic!("should start");
        };
        q.enqueue("New", Priority::Manual);
        assert!(q.on_playback_ended(old));
        assert_eq!(handle.audible().unwrap().text, "New");
    }

    #[test]
    fn test_voice_preference_applies_to_later_utterances() {
        let (mut q, handle) = queue();
        q.enqueue("Before", Priority::Essential);
        q.set_voice_preference(Some("en-GB".into()));
        q.enqueue("After", Priority::Essential);
        finish(&mut q, &handle);
        let started = handle.started();
        assert_eq!(started[0].voice, None);
        assert_eq!(started[1].voice.as_deref(), Some("en-GB"));
    }

    #[test]
    fn test_blank_text_and_cancel_all() {
        let (mut q, handle) = queue();
        assert_eq!(q.enqueue("   ", Priority::Manual), EnqueueOutcome::Dropped);
        q.enqueue("One", Priority::Essential);
        q.enqueue("Two", Priority::Essential);
        q.cancel_all();
        assert!(!q.is_speaking());
        assert_eq!(q.pending_len(), 0);
        assert!(handle.audible().is_none());
    }
}
