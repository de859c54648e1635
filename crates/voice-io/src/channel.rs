use crate::{CaptureConfig, CaptureError, CaptureEvent, Result, SpeechCapture};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Capture backend fed by an external producer (a recognizer thread, a
/// terminal reader, a websocket bridge). Events sent while the session is
/// closed are discarded when the session next opens.
pub struct ChannelCapture {
    rx: Receiver<CaptureEvent>,
    active: bool,
    language: Option<String>,
}

impl ChannelCapture {
    pub fn new() -> (Self, Sender<CaptureEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                rx,
                active: false,
                language: None,
            },
            tx,
        )
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

impl SpeechCapture for ChannelCapture {
    fn start(&mut self, config: &CaptureConfig) -> Result<()> {
        if self.active {
            return Err(CaptureError::AlreadyActive);
        }
        let stale = self.drain();
        if stale > 0 {
            tracing::debug!(stale, "discarded events queued while capture was closed");
        }
        self.language = config.language.clone();
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn poll(&mut self) -> Option<CaptureEvent> {
        if !self.active {
            return None;
        }
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("capture producer disconnected; closing session");
                self.active = false;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transcript;

    #[test]
    fn test_events_flow_only_while_active() {
        let (mut capture, tx) = ChannelCapture::new();
        tx.send(CaptureEvent::WakeWord).unwrap();
        assert!(capture.poll().is_none());

        capture.start(&CaptureConfig::default()).unwrap();
        // queued before start, discarded
        assert!(capture.poll().is_none());

        tx.send(CaptureEvent::Transcript(Transcript::final_text("open notes")))
            .unwrap();
        match capture.poll() {
            Some(CaptureEvent::Transcript(t)) => assert_eq!(t.text, "open notes"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_double_start_rejected() {
        let (mut capture, _tx) = ChannelCapture::new();
        capture.start(&CaptureConfig::default()).unwrap();
        assert_eq!(
            capture.start(&CaptureConfig::default()),
            Err(CaptureError::AlreadyActive)
        );
        capture.stop();
        assert!(!capture.is_active());
    }

    #[test]
    fn test_disconnected_producer_closes_session() {
        let (mut capture, tx) = ChannelCapture::new();
        capture.start(&CaptureConfig::default()).unwrap();
        drop(tx);
        assert!(capture.poll().is_none());
        assert!(!capture.is_active());
    }
}
