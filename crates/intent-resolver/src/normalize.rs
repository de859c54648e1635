//! Command normalization and wake-word handling

use std::time::{Duration, Instant};

/// Trim raw input. Returns `None` when nothing visible is left.
/// Casing is preserved; proper nouns matter to the intent service.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.chars().any(|c| !c.is_whitespace() && !c.is_control()) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

fn is_filler_punct(c: char) -> bool {
    matches!(c, ',' | '.' | '!' | '?' | ':' | ';')
}

/// Split off the first whitespace-delimited word, minus trailing punctuation.
fn take_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    let (word, rest) = s.split_at(end);
    Some((word.trim_end_matches(is_filler_punct), rest))
}

/// Trigger phrases that address the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeWords {
    words: Vec<String>,
}

impl Default for WakeWords {
    fn default() -> Self {
        Self::new(["Jarvis", "Alya", "Alia"])
    }
}

impl WakeWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    fn matches(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.words.iter().any(|w| *w == word)
    }

    /// If `text` opens with a wake word (optionally preceded by "hey"),
    /// return whatever follows it. `Some("")` means the text was only the
    /// wake word.
    pub fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        let (first, rest) = take_word(text)?;
        let (candidate, rest) = if first.eq_ignore_ascii_case("hey") {
            take_word(rest)?
        } else {
            (first, rest)
        };
        if !self.matches(candidate) {
            return None;
        }
        Some(rest.trim_start_matches(|c: char| c.is_whitespace() || is_filler_punct(c)).trim_end())
    }

    /// Exact wake-word utterance such as "Jarvis" or "hey alya!".
    pub fn is_exact(&self, text: &str) -> bool {
        matches!(self.strip_prefix(text), Some(rest) if rest.is_empty())
    }
}

/// Drops a command identical to the previous one when it arrives inside
/// `window`. Recognizers sometimes emit the same final transcript twice.
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl DuplicateFilter {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn admit(&mut self, command: &str) -> bool {
        self.admit_at(command, Instant::now())
    }

    pub fn admit_at(&mut self, command: &str, now: Instant) -> bool {
        if let Some((previous, at)) = &self.last {
            if previous == command && now.saturating_duration_since(*at) < self.window {
                return false;
            }
        }
        self.last = Some((command.to_string(), now));
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_rejects_blank() {
        assert_eq!(normalize("  Open Notes \n"), Some("Open Notes".to_string()));
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("\t\u{0007}\n"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn test_normalize_keeps_wake_word_only_input() {
        assert_eq!(normalize(" Hey Jarvis "), Some("Hey Jarvis".to_string()));
    }

    #[test]
    fn test_exact_wake_words() {
        let wake = WakeWords::default();
        for text in [
            "Jarvis", "jarvis", "ALYA", "Alia", "Hey Jarvis", "hey alya", "Hey, Alia!", "Jarvis?",
        ] {
            assert!(wake.is_exact(text), "{text} should be a wake word");
        }
        for text in ["Jarvis open notes", "hey", "hello jarvis", "Jarvisx", ""] {
            assert!(!wake.is_exact(text), "{text} should not be a wake word");
        }
    }

    #[test]
    fn test_strip_prefix_returns_remainder() {
        let wake = WakeWords::default();
        assert_eq!(wake.strip_prefix("Jarvis, open the notes"), Some("open the notes"));
        assert_eq!(wake.strip_prefix("Hey Alya go to dashboard"), Some("go to dashboard"));
        assert_eq!(wake.strip_prefix("open the notes"), None);
        assert_eq!(wake.strip_prefix("Alya"), Some(""));
    }

    #[test]
    fn test_duplicate_filter_window() {
        let mut filter = DuplicateFilter::new(Duration::from_millis(1500));
        let t0 = Instant::now();
        assert!(filter.admit_at("open notes", t0));
        assert!(!filter.admit_at("open notes", t0 + Duration::from_millis(200)));
        assert!(filter.admit_at("open news", t0 + Duration::from_millis(300)));
        assert!(filter.admit_at("open news", t0 + Duration::from_millis(2000)));
    }
}
