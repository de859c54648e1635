//! Offline keyword resolver
//!
//! Pattern-matches common commands without a language model. Output goes
//! through the same JSON contract and validator as model output, so hosts
//! can swap resolvers freely. Replies are English only.

use crate::actions::{Action, Route};
use crate::normalize::WakeWords;
use crate::resolver::{wake_word_action, IntentResolver};
use crate::validate::validate;
use crate::{AssistantContext, Persona, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

/// Regex-driven resolver for demos, tests and offline fallback.
pub struct KeywordResolver {
    wake_words: WakeWords,
    patterns: Vec<(&'static str, Regex)>,
    question_count: Regex,
    difficulty: Regex,
    topic: Regex,
    news_about: Regex,
}

impl KeywordResolver {
    pub fn new() -> std::result::Result<Self, regex::Error> {
        // Checked in order; the first match wins.
        let patterns = vec![
            ("clear_terminal", Regex::new(r"(?i)\bclear\b.*\b(terminal|console|log)\b")?),
            ("open_terminal", Regex::new(r"(?i)\b(open|show)\b.*\b(terminal|console)\b")?),
            ("close_terminal", Regex::new(r"(?i)\b(close|hide)\b.*\b(terminal|console)\b")?),
            ("logout", Regex::new(r"(?i)\b(log\s*out|sign\s*out)\b")?),
            ("change_theme", Regex::new(r"(?i)\b(dark|light|system)\b.*\b(mode|theme)\b|\b(mode|theme)\b.*\b(dark|light|system)\b")?),
            ("change_language", Regex::new(r"(?i)\blanguage\b.*\bto\s+([a-z]+)\s*$")?),
            ("generate_test", Regex::new(r"(?i)\b(make|create|generate|start|give me|prepare)\b.*\b(test|quiz)\b")?),
            ("generate_notes", Regex::new(r"(?i)\b(make|create|generate|write|prepare)\b.*\bnotes?\b")?),
            ("search_youtube", Regex::new(r"(?i)\b(?:search|find|look up)\b\s+(?:youtube\s+for\s+)?(.+?)(?:\s+on\s+youtube)?\s*$")?),
            ("search_books", Regex::new(r"(?i)\b(?:search|find|look up)\b\s+(?:books?\s+(?:for|on|about)\s+)?(.+?)(?:\s+books?)?\s*$")?),
            ("read_news", Regex::new(r"(?i)\b(read|tell|latest|headlines)\b.*\bnews\b|\bnews\b.*\b(headlines|today|latest)\b")?),
            ("open_dialog", Regex::new(r"(?i)\b(open|launch|start|show)\b.*\b(calculator|arcade)\b")?),
            ("speak_quote", Regex::new(r"(?i)\b(quote)\b")?),
            ("speak_math_fact", Regex::new(r"(?i)\bmath\s+fact\b")?),
            ("read_quests", Regex::new(r"(?i)\bquests?\b")?),
            ("navigate", Regex::new(r"(?i)\b(?:go\s+to|open|show(?:\s+me)?|take\s+me\s+to|navigate\s+to)\s+(?:the\s+|my\s+)?([a-z][a-z -]*?)(?:\s+(?:page|section|screen))?\s*$")?),
        ];

        Ok(Self {
            wake_words: WakeWords::default(),
            patterns,
            question_count: Regex::new(r"(?i)\b(\d{1,3})[\s-]*questions?\b")?,
            difficulty: Regex::new(r"(?i)\b(easy|medium|hard)\b")?,
            topic: Regex::new(r"(?i)\b(?:on|about|for|of)\s+(.+?)\s*$")?,
            news_about: Regex::new(r"(?i)\bnews\s+(?:about|on)\s+(.+?)\s*$")?,
        })
    }

    pub fn with_wake_words(mut self, wake_words: WakeWords) -> Self {
        self.wake_words = wake_words;
        self
    }

    /// Produce the raw action object for `command`.
    pub fn interpret(&self, command: &str, persona: Persona) -> Value {
        for (name, regex) in &self.patterns {
            if let Some(captures) = regex.captures(command) {
                if let Some(raw) = self.build(name, command, &captures, persona) {
                    tracing::debug!(pattern = name, "keyword pattern matched");
                    return raw;
                }
            }
        }
        raw_action(
            "chat",
            json!({}),
            reply(persona, "I can't help with that without my language model, I'm afraid."),
        )
    }

    fn build(
        &self,
        name: &str,
        command: &str,
        captures: &regex::Captures<'_>,
        persona: Persona,
    ) -> Option<Value> {
        let capture = |i: usize| captures.get(i).map(|m| m.as_str().trim().to_string());
        let raw = match name {
            "clear_terminal" => raw_action("clear_terminal", json!({}), reply(persona, "Terminal cleared.")),
            "open_terminal" => raw_action("open_terminal", json!({}), reply(persona, "Opening the terminal.")),
            "close_terminal" => raw_action("close_terminal", json!({}), reply(persona, "Closing the terminal.")),
            "logout" => raw_action("logout", json!({}), reply(persona, "Logging you out. See you soon.")),
            "change_theme" => {
                let theme = capture(1).or_else(|| capture(4))?.to_lowercase();
                raw_action(
                    "change_theme",
                    json!({ "theme": theme }),
                    reply(persona, &format!("Switching to {} mode.", theme)),
                )
            }
            "change_language" => {
                let language = title_case(&capture(1)?);
                raw_action(
                    "change_language",
                    json!({ "language": language }),
                    reply(persona, &format!("Switching the language to {}.", language)),
                )
            }
            "generate_test" => {
                let mut params = serde_json::Map::new();
                if let Some(n) = self
                    .question_count
                    .captures(command)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                {
                    params.insert("numQuestions".into(), json!(n));
                }
                if let Some(d) = self.difficulty.captures(command).and_then(|c| c.get(1)) {
                    params.insert("difficulty".into(), json!(d.as_str().to_lowercase()));
                }
                let topic = self.topic_of(command);
                if let Some(t) = &topic {
                    params.insert("topic".into(), json!(t));
                }
                let what = topic
                    .map(|t| format!("Preparing a test on {}.", t))
                    .unwrap_or_else(|| "Opening the test builder.".to_string());
                raw_action("generate_test", Value::Object(params), reply(persona, &what))
            }
            "generate_notes" => {
                let topic = self.topic_of(command);
                let what = topic
                    .as_ref()
                    .map(|t| format!("Generating notes on {}.", t))
                    .unwrap_or_else(|| "Opening notes.".to_string());
                let params = match topic {
                    Some(t) => json!({ "topic": t }),
                    None => json!({}),
                };
                raw_action("generate_notes", params, reply(persona, &what))
            }
            "search_youtube" => {
                if !command.to_lowercase().contains("youtube") {
                    return None;
                }
                let query = capture(1)?;
                raw_action(
                    "search_youtube",
                    json!({ "query": query }),
                    reply(persona, &format!("Searching YouTube for {}.", query)),
                )
            }
            "search_books" => {
                if !command.to_lowercase().contains("book") {
                    return None;
                }
                let query = capture(1)?;
                raw_action(
                    "search_books",
                    json!({ "query": query }),
                    reply(persona, &format!("Looking for books on {}.", query)),
                )
            }
            "read_news" => {
                let params = match self
                    .news_about
                    .captures(command)
                    .and_then(|c| c.get(1))
                {
                    Some(q) => json!({ "category": "top", "query": q.as_str() }),
                    None => json!({ "category": "top" }),
                };
                raw_action("read_news", params, reply(persona, "Here are the latest headlines."))
            }
            "open_dialog" => {
                let dialog = capture(2)?.to_lowercase();
                raw_action(
                    "open_dialog",
                    json!({ "dialog": dialog }),
                    reply(persona, &format!("Opening the {}.", dialog)),
                )
            }
            "speak_quote" => raw_action(
                "speak_text",
                json!({ "contentType": "daily_quote" }),
                reply(persona, "Here's today's quote."),
            ),
            "speak_math_fact" => raw_action(
                "speak_text",
                json!({ "contentType": "math_fact" }),
                reply(persona, "Here's a math fact for you."),
            ),
            "read_quests" => raw_action(
                "read_quests",
                json!({ "contentType": "daily_quests" }),
                reply(persona, "Here are your daily quests."),
            ),
            "navigate" => {
                let route = route_alias(&capture(1)?)?;
                raw_action(
                    "navigate",
                    json!({ "target": route.path() }),
                    reply(persona, &format!("Opening {}.", route_label(route))),
                )
            }
            _ => return None,
        };
        Some(raw)
    }

    fn topic_of(&self, command: &str) -> Option<String> {
        self.topic
            .captures(command)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim_end_matches(['.', '!', '?']).to_string())
            .filter(|t| !t.is_empty())
    }
}

#[async_trait]
impl IntentResolver for KeywordResolver {
    async fn resolve(
        &self,
        command: &str,
        _context: &AssistantContext,
        persona: Persona,
    ) -> Result<Action> {
        if self.wake_words.is_exact(command) {
            return Ok(wake_word_action(persona));
        }
        let raw = self.interpret(command, persona);
        Ok(validate(&raw)?)
    }
}

fn raw_action(kind: &str, params: Value, verbal_response: String) -> Value {
    json!({ "kind": kind, "params": params, "verbalResponse": verbal_response })
}

fn reply(persona: Persona, text: &str) -> String {
    match persona {
        Persona::Jarvis => format!("Right away, sir. {}", text),
        Persona::Alya => text.to_string(),
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn route_alias(phrase: &str) -> Option<Route> {
    let phrase = phrase.trim().to_lowercase();
    let route = match phrase.as_str() {
        "dashboard" | "home" => Route::Dashboard,
        "notes" | "note" => Route::Notes,
        "custom test" | "custom-test" | "tests" | "test" => Route::CustomTest,
        "flashcards" | "flash cards" | "flashcard" => Route::Flashcards,
        "news" => Route::News,
        "library" => Route::Library,
        "profile" | "account" => Route::Profile,
        "college" | "college notes" => Route::College,
        "coding" | "code" | "coding playground" => Route::Coding,
        _ => return None,
    };
    Some(route)
}

fn route_label(route: Route) -> &'static str {
    match route {
        Route::Dashboard => "your dashboard",
        Route::Notes => "notes",
        Route::CustomTest => "the test builder",
        Route::Flashcards => "flashcards",
        Route::News => "the news",
        Route::Library => "the library",
        Route::Profile => "your profile",
        Route::College => "college notes",
        Route::Coding => "the coding playground",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Command, ContentType, Dialog, Difficulty, TestRequest, Theme};

    async fn resolve(text: &str) -> Action {
        let resolver = KeywordResolver::new().unwrap();
        resolver
            .resolve(text, &AssistantContext::default(), Persona::Jarvis)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_dashboard_navigation() {
        let action = resolve("go to the dashboard").await;
        assert_eq!(
            action.command,
            Command::Navigate {
                route: Route::Dashboard
            }
        );
        assert!(!action.verbal_response.is_empty());
    }

    #[tokio::test]
    async fn test_hard_calculus_test() {
        let action = resolve("make a 15 question hard test on calculus").await;
        assert_eq!(
            action.command,
            Command::GenerateTest(TestRequest {
                topic: Some("calculus".into()),
                num_questions: 15,
                difficulty: Difficulty::Hard,
                timer_minutes: None,
            })
        );
    }

    #[tokio::test]
    async fn test_common_commands() {
        let cases: Vec<(&str, Command)> = vec![
            ("switch to dark mode", Command::ChangeTheme { theme: Theme::Dark }),
            ("open the terminal", Command::OpenTerminal),
            ("clear the terminal", Command::ClearTerminal),
            ("please log out", Command::Logout),
            ("open the calculator", Command::OpenDialog { dialog: Dialog::Calculator }),
            ("read me today's quote", Command::SpeakText { content: ContentType::DailyQuote }),
            ("what are my quests", Command::ReadQuests { content: ContentType::DailyQuests }),
            ("change the language to hindi", Command::ChangeLanguage { language: "Hindi".into() }),
            ("search youtube for photosynthesis", Command::SearchYoutube { query: "photosynthesis".into() }),
            ("make notes on the french revolution", Command::GenerateNotes { topic: Some("the french revolution".into()) }),
            ("take me to flashcards", Command::Navigate { route: Route::Flashcards }),
        ];
        for (text, expected) in cases {
            assert_eq!(resolve(text).await.command, expected, "for {:?}", text);
        }
    }

    #[tokio::test]
    async fn test_unmatched_falls_back_to_chat() {
        let action = resolve("sing me a song").await;
        assert_eq!(action.command, Command::Chat { is_wake_word: false });
    }

    #[tokio::test]
    async fn test_wake_word_greeting() {
        let resolver = KeywordResolver::new().unwrap();
        let action = resolver
            .resolve("Hey Alya", &AssistantContext::default(), Persona::Alya)
            .await
            .unwrap();
        assert!(action.is_wake_word());
        assert_eq!(action.verbal_response, "Yes?");
    }
}
