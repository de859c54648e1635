use serde::{Deserialize, Serialize};

/// Keyboard shortcuts owned by the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shortcut {
    /// Ctrl+'
    ToggleTerminal,
    /// Ctrl+Q
    ToggleSecondary,
    /// Ctrl+P
    OpenPalette,
}

impl Shortcut {
    /// Parse a chord like "Ctrl+'" or "control + q". Case and spacing are
    /// ignored.
    pub fn parse(chord: &str) -> Option<Self> {
        let compact: String = chord
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let key = compact
            .strip_prefix("ctrl+")
            .or_else(|| compact.strip_prefix("control+"))?;
        match key {
            "'" => Some(Shortcut::ToggleTerminal),
            "q" => Some(Shortcut::ToggleSecondary),
            "p" => Some(Shortcut::OpenPalette),
            _ => None,
        }
    }

    pub fn chord(&self) -> &'static str {
        match self {
            Shortcut::ToggleTerminal => "Ctrl+'",
            Shortcut::ToggleSecondary => "Ctrl+Q",
            Shortcut::OpenPalette => "Ctrl+P",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chords() {
        assert_eq!(Shortcut::parse("Ctrl+'"), Some(Shortcut::ToggleTerminal));
        assert_eq!(Shortcut::parse("ctrl + q"), Some(Shortcut::ToggleSecondary));
        assert_eq!(Shortcut::parse("Control+P"), Some(Shortcut::OpenPalette));
        assert_eq!(Shortcut::parse("Ctrl+X"), None);
        assert_eq!(Shortcut::parse("p"), None);
        for shortcut in [
            Shortcut::ToggleTerminal,
            Shortcut::ToggleSecondary,
            Shortcut::OpenPalette,
        ] {
            assert_eq!(Shortcut::parse(shortcut.chord()), Some(shortcut));
        }
    }
}
