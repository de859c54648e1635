//! Assistant action definitions

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Free-form parameters as they arrived from the intent service.
pub type Params = Map<String, Value>;

/// Every action the dispatcher knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    GenerateNotes,
    GenerateTest,
    GenerateCollegeNotes,
    ReadNews,
    SearchYoutube,
    SearchBooks,
    SwitchTab,
    ChangeTheme,
    ChangeLanguage,
    SpeakText,
    ReadQuests,
    OpenRecentTopic,
    SelectQuizAnswer,
    ArcadeGuess,
    ArcadeHint,
    ArcadeRestart,
    Logout,
    OpenTerminal,
    CloseTerminal,
    ClearTerminal,
    OpenDialog,
    TypeText,
    Chat,
}

impl ActionKind {
    pub const ALL: [ActionKind; 24] = [
        ActionKind::Navigate,
        ActionKind::GenerateNotes,
        ActionKind::GenerateTest,
        ActionKind::GenerateCollegeNotes,
        ActionKind::ReadNews,
        ActionKind::SearchYoutube,
        ActionKind::SearchBooks,
        ActionKind::SwitchTab,
        ActionKind::ChangeTheme,
        ActionKind::ChangeLanguage,
        ActionKind::SpeakText,
        ActionKind::ReadQuests,
        ActionKind::OpenRecentTopic,
        ActionKind::SelectQuizAnswer,
        ActionKind::ArcadeGuess,
        ActionKind::ArcadeHint,
        ActionKind::ArcadeRestart,
        ActionKind::Logout,
        ActionKind::OpenTerminal,
        ActionKind::CloseTerminal,
        ActionKind::ClearTerminal,
        ActionKind::OpenDialog,
        ActionKind::TypeText,
        ActionKind::Chat,
    ];

    /// Wire name used in the action JSON contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::GenerateNotes => "generate_notes",
            ActionKind::GenerateTest => "generate_test",
            ActionKind::GenerateCollegeNotes => "generate_college_notes",
            ActionKind::ReadNews => "read_news",
            ActionKind::SearchYoutube => "search_youtube",
            ActionKind::SearchBooks => "search_books",
            ActionKind::SwitchTab => "switch_tab",
            ActionKind::ChangeTheme => "change_theme",
            ActionKind::ChangeLanguage => "change_language",
            ActionKind::SpeakText => "speak_text",
            ActionKind::ReadQuests => "read_quests",
            ActionKind::OpenRecentTopic => "open_recent_topic",
            ActionKind::SelectQuizAnswer => "select_quiz_answer",
            ActionKind::ArcadeGuess => "arcade_guess",
            ActionKind::ArcadeHint => "arcade_hint",
            ActionKind::ArcadeRestart => "arcade_restart",
            ActionKind::Logout => "logout",
            ActionKind::OpenTerminal => "open_terminal",
            ActionKind::CloseTerminal => "close_terminal",
            ActionKind::ClearTerminal => "clear_terminal",
            ActionKind::OpenDialog => "open_dialog",
            ActionKind::TypeText => "type_text",
            ActionKind::Chat => "chat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ActionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routes the assistant is allowed to navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Dashboard,
    Notes,
    CustomTest,
    Flashcards,
    News,
    Library,
    Profile,
    College,
    Coding,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Dashboard,
        Route::Notes,
        Route::CustomTest,
        Route::Flashcards,
        Route::News,
        Route::Library,
        Route::Profile,
        Route::College,
        Route::Coding,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::Notes => "/notes",
            Route::CustomTest => "/custom-test",
            Route::Flashcards => "/flashcards",
            Route::News => "/news",
            Route::Library => "/library",
            Route::Profile => "/profile",
            Route::College => "/college",
            Route::Coding => "/coding",
        }
    }

    /// Accepts "/notes", "notes", "/Notes/" alike.
    pub fn from_target(target: &str) -> Option<Self> {
        let trimmed = target.trim().trim_end_matches('/').to_ascii_lowercase();
        let path = if trimmed.starts_with('/') {
            trimmed
        } else {
            format!("/{}", trimmed)
        };
        Route::ALL.iter().copied().find(|r| r.path() == path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialog {
    Calculator,
    Arcade,
}

impl Dialog {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialog::Calculator => "calculator",
            Dialog::Arcade => "arcade",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "calculator" => Some(Dialog::Calculator),
            "arcade" => Some(Dialog::Arcade),
            _ => None,
        }
    }
}

/// Dashboard content the assistant can read aloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    DailyQuote,
    MathFact,
    DailyQuests,
    WelcomeMessage,
    TotalLearners,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::DailyQuote => "daily_quote",
            ContentType::MathFact => "math_fact",
            ContentType::DailyQuests => "daily_quests",
            ContentType::WelcomeMessage => "welcome_message",
            ContentType::TotalLearners => "total_learners",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "daily_quote" => Some(ContentType::DailyQuote),
            "math_fact" => Some(ContentType::MathFact),
            "daily_quests" => Some(ContentType::DailyQuests),
            "welcome_message" => Some(ContentType::WelcomeMessage),
            "total_learners" => Some(ContentType::TotalLearners),
            _ => None,
        }
    }
}

/// Parameters for a generated practice test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    pub topic: Option<String>,
    /// Always within `1..=50`.
    pub num_questions: u8,
    pub difficulty: Difficulty,
    /// Time limit in minutes.
    pub timer_minutes: Option<u32>,
}

impl TestRequest {
    pub const DEFAULT_QUESTIONS: u8 = 10;
    pub const MAX_QUESTIONS: u8 = 50;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollegeNotesRequest {
    pub university: String,
    pub semester: String,
    pub branch: String,
    pub subject: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsQuery {
    pub category: String,
    pub country: Option<String>,
    pub query: Option<String>,
    pub language: Option<String>,
    pub state_or_region: Option<String>,
    pub city: Option<String>,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            category: "top".to_string(),
            country: None,
            query: None,
            language: None,
            state_or_region: None,
            city: None,
        }
    }
}

/// Validated, typed payload of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Navigate { route: Route },
    GenerateNotes { topic: Option<String> },
    GenerateTest(TestRequest),
    GenerateCollegeNotes(CollegeNotesRequest),
    ReadNews(NewsQuery),
    SearchYoutube { query: String },
    SearchBooks { query: String },
    SwitchTab { tab: String },
    ChangeTheme { theme: Theme },
    ChangeLanguage { language: String },
    SpeakText { content: ContentType },
    ReadQuests { content: ContentType },
    OpenRecentTopic { topic: Option<String> },
    /// Screen-specific params, forwarded verbatim to the mounted quiz.
    SelectQuizAnswer(Params),
    ArcadeGuess(Params),
    ArcadeHint(Params),
    ArcadeRestart(Params),
    Logout,
    OpenTerminal,
    CloseTerminal,
    ClearTerminal,
    OpenDialog { dialog: Dialog },
    TypeText { target_id: String, text: String },
    Chat { is_wake_word: bool },
    /// A kind the intent service produced that is not part of the contract.
    Unsupported { kind: String },
}

impl Command {
    pub fn kind(&self) -> Option<ActionKind> {
        let kind = match self {
            Command::Navigate { .. } => ActionKind::Navigate,
            Command::GenerateNotes { .. } => ActionKind::GenerateNotes,
            Command::GenerateTest(_) => ActionKind::GenerateTest,
            Command::GenerateCollegeNotes(_) => ActionKind::GenerateCollegeNotes,
            Command::ReadNews(_) => ActionKind::ReadNews,
            Command::SearchYoutube { .. } => ActionKind::SearchYoutube,
            Command::SearchBooks { .. } => ActionKind::SearchBooks,
            Command::SwitchTab { .. } => ActionKind::SwitchTab,
            Command::ChangeTheme { .. } => ActionKind::ChangeTheme,
            Command::ChangeLanguage { .. } => ActionKind::ChangeLanguage,
            Command::SpeakText { .. } => ActionKind::SpeakText,
            Command::ReadQuests { .. } => ActionKind::ReadQuests,
            Command::OpenRecentTopic { .. } => ActionKind::OpenRecentTopic,
            Command::SelectQuizAnswer(_) => ActionKind::SelectQuizAnswer,
            Command::ArcadeGuess(_) => ActionKind::ArcadeGuess,
            Command::ArcadeHint(_) => ActionKind::ArcadeHint,
            Command::ArcadeRestart(_) => ActionKind::ArcadeRestart,
            Command::Logout => ActionKind::Logout,
            Command::OpenTerminal => ActionKind::OpenTerminal,
            Command::CloseTerminal => ActionKind::CloseTerminal,
            Command::ClearTerminal => ActionKind::ClearTerminal,
            Command::OpenDialog { .. } => ActionKind::OpenDialog,
            Command::TypeText { .. } => ActionKind::TypeText,
            Command::Chat { .. } => ActionKind::Chat,
            Command::Unsupported { .. } => return None,
        };
        Some(kind)
    }
}

/// A validated action ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub command: Command,
    /// Raw params as received, kept for diagnostics.
    pub params: Params,
    /// Persona-voiced confirmation. Never empty.
    pub verbal_response: String,
}

impl Action {
    pub fn kind(&self) -> Option<ActionKind> {
        self.command.kind()
    }

    /// Wire name of the action, including unsupported kinds.
    pub fn kind_name(&self) -> &str {
        match &self.command {
            Command::Unsupported { kind } => kind,
            other => other.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    pub fn is_wake_word(&self) -> bool {
        matches!(self.command, Command::Chat { is_wake_word: true })
    }

    /// Re-encode into the `{kind, params, verbalResponse}` contract.
    pub fn to_json(&self) -> Value {
        json!({
            "kind": self.kind_name(),
            "params": Value::Object(self.params.clone()),
            "verbalResponse": self.verbal_response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_name(kind.as_str()), Some(kind));
            let encoded = serde_json::to_value(kind).unwrap();
            assert_eq!(encoded, Value::String(kind.as_str().to_string()));
        }
        assert_eq!(ActionKind::from_name("foo_bar"), None);
    }

    #[test]
    fn test_route_accepts_loose_targets() {
        assert_eq!(Route::from_target("/dashboard"), Some(Route::Dashboard));
        assert_eq!(Route::from_target("custom-test"), Some(Route::CustomTest));
        assert_eq!(Route::from_target(" /Library/ "), Some(Route::Library));
        assert_eq!(Route::from_target("/admin"), None);
    }

    #[test]
    fn test_unsupported_action_reports_raw_kind() {
        let action = Action {
            command: Command::Unsupported {
                kind: "foo_bar".to_string(),
            },
            params: Params::new(),
            verbal_response: "On it.".to_string(),
        };
        assert_eq!(action.kind(), None);
        assert_eq!(action.kind_name(), "foo_bar");
        assert_eq!(action.to_json()["kind"], "foo_bar");
    }
}
