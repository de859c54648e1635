//! Assistant status state machine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantStatus {
    #[default]
    Off,
    Idle,
    Listening,
    Processing,
    Speaking,
}

impl AssistantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantStatus::Off => "off",
            AssistantStatus::Idle => "idle",
            AssistantStatus::Listening => "listening",
            AssistantStatus::Processing => "processing",
            AssistantStatus::Speaking => "speaking",
        }
    }
}

impl fmt::Display for AssistantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    ToggleOn,
    ToggleOff,
    /// Wake word heard or the user activated listening by hand.
    Activate,
    FinalTranscript,
    /// Command palette or terminal input.
    TypedCommand,
    Resolved { speaking: bool },
    PlaybackEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal transition: {event:?} while {from}")]
pub struct TransitionError {
    pub from: AssistantStatus,
    pub event: StatusEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: AssistantStatus,
    pub to: AssistantStatus,
}

/// Tracks the status and remembers changes until they are drained, so
/// observers can be notified outside the session lock.
#[derive(Debug, Default)]
pub struct StatusMachine {
    status: AssistantStatus,
    changes: Vec<StatusChange>,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> AssistantStatus {
        self.status
    }

    /// Next status for `event`, without applying it.
    pub fn next(
        from: AssistantStatus,
        event: StatusEvent,
    ) -> Result<AssistantStatus, TransitionError> {
        use AssistantStatus::*;
        let to = match (from, event) {
            (_, StatusEvent::ToggleOff) => Off,
            (Off, StatusEvent::ToggleOn) => Idle,
            (Idle | Listening, StatusEvent::Activate) => Listening,
            (Listening, StatusEvent::FinalTranscript) => Processing,
            (Idle | Listening | Speaking, StatusEvent::TypedCommand) => Processing,
            (Processing, StatusEvent::Resolved { speaking: true }) => Speaking,
            (Processing, StatusEvent::Resolved { speaking: false }) => Idle,
            (Speaking, StatusEvent::PlaybackEnded) => Idle,
            _ => return Err(TransitionError { from, event }),
        };
        Ok(to)
    }

    /// Apply `event`. On error the status is left unchanged.
    pub fn apply(&mut self, event: StatusEvent) -> Result<AssistantStatus, TransitionError> {
        let from = self.status;
        let to = Self::next(from, event)?;
        if to != from {
            tracing::debug!(%from, %to, "assistant status changed");
            self.status = to;
            self.changes.push(StatusChange { from, to });
        }
        Ok(to)
    }

    pub fn drain_changes(&mut self) -> Vec<StatusChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_cycle() {
        let mut machine = StatusMachine::new();
        assert_eq!(machine.apply(StatusEvent::ToggleOn), Ok(AssistantStatus::Idle));
        assert_eq!(machine.apply(StatusEvent::Activate), Ok(AssistantStatus::Listening));
        assert_eq!(
            machine.apply(StatusEvent::FinalTranscript),
            Ok(AssistantStatus::Processing)
        );
        assert_eq!(
            machine.apply(StatusEvent::Resolved { speaking: true }),
            Ok(AssistantStatus::Speaking)
        );
        assert_eq!(machine.apply(StatusEvent::PlaybackEnded), Ok(AssistantStatus::Idle));
        assert_eq!(machine.drain_changes().len(), 5);
        assert!(machine.drain_changes().is_empty());
    }

    #[test]
    fn test_illegal_transition_leaves_state() {
        let mut machine = StatusMachine::new();
        let err = machine.apply(StatusEvent::FinalTranscript).unwrap_err();
        assert_eq!(err.from, AssistantStatus::Off);
        assert_eq!(machine.status(), AssistantStatus::Off);

        machine.apply(StatusEvent::ToggleOn).unwrap();
        machine.apply(StatusEvent::TypedCommand).unwrap();
        assert!(machine.apply(StatusEvent::TypedCommand).is_err());
        assert!(machine.apply(StatusEvent::Activate).is_err());
        assert_eq!(machine.status(), AssistantStatus::Processing);
    }

    #[test]
    fn test_toggle_off_from_anywhere() {
        let paths: [(&[StatusEvent], AssistantStatus); 4] = [
            (&[], AssistantStatus::Idle),
            (&[StatusEvent::Activate], AssistantStatus::Listening),
            (&[StatusEvent::TypedCommand], AssistantStatus::Processing),
            (
                &[StatusEvent::TypedCommand, StatusEvent::Resolved { speaking: true }],
                AssistantStatus::Speaking,
            ),
        ];
        for (events, reached) in paths {
            let mut machine = StatusMachine::new();
            machine.apply(StatusEvent::ToggleOn).unwrap();
            for event in events {
                machine.apply(*event).unwrap();
            }
            assert_eq!(machine.status(), reached);
            assert_eq!(machine.apply(StatusEvent::ToggleOff), Ok(AssistantStatus::Off));
        }
        assert_eq!(
            StatusMachine::next(AssistantStatus::Off, StatusEvent::ToggleOff),
            Ok(AssistantStatus::Off)
        );
    }
}
