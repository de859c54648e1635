//! In-memory terminal transcript

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Ai,
    System,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalMessage {
    pub id: u64,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub timestamp: OffsetDateTime,
}

/// Append-only log. Ids keep increasing across `clear`.
#[derive(Debug, Default)]
pub struct AuditLog {
    next_id: u64,
    entries: Vec<TerminalMessage>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, content: impl Into<String>, kind: MessageKind) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(TerminalMessage {
            id,
            content: content.into(),
            kind,
            timestamp: OffsetDateTime::now_utc(),
        });
        id
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> Vec<TerminalMessage> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TerminalMessage> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_survive_clear() {
        let mut log = AuditLog::new();
        assert_eq!(log.append("go to notes", MessageKind::User), 1);
        assert_eq!(log.append("Opening notes.", MessageKind::Ai), 2);
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.append("hello", MessageKind::User), 3);
        assert_eq!(log.snapshot()[0].id, 3);
    }

    #[test]
    fn test_message_serializes_type_field() {
        let mut log = AuditLog::new();
        log.append("boom", MessageKind::Error);
        let value = serde_json::to_value(&log.snapshot()[0]).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["content"], "boom");
    }
}
