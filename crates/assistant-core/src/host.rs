use intent_resolver::{
    AssistantContext, CollegeNotesRequest, ContentType, Dialog, NewsQuery, Params, Route,
    TestRequest, Theme,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    Youtube,
    Books,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcadeCommand {
    Guess,
    Hint,
    Restart,
}

/// Content generation the host should kick off. The assistant never waits
/// for the result.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Notes { topic: String },
    Test(TestRequest),
    CollegeNotes(CollegeNotesRequest),
}

/// The application subsystems actions are executed against.
///
/// Methods are called without the session lock held, so a host may call
/// back into the [`Assistant`](crate::Assistant), e.g. to announce a new
/// page title from `navigate`.
pub trait AppHost: Send + Sync {
    /// Ambient state at the moment a command is issued.
    fn context(&self) -> AssistantContext;

    fn current_route(&self) -> String;

    fn navigate(&self, route: Route) -> anyhow::Result<()>;

    fn start_generation(&self, request: GenerationRequest) -> anyhow::Result<()>;

    fn show_news(&self, query: &NewsQuery) -> anyhow::Result<()>;

    fn search(&self, provider: SearchProvider, query: &str) -> anyhow::Result<()>;

    fn switch_tab(&self, tab: &str) -> anyhow::Result<()>;

    fn set_theme(&self, theme: Theme) -> anyhow::Result<()>;

    fn set_language(&self, language: &str) -> anyhow::Result<()>;

    /// Text of a dashboard item to read aloud.
    fn fetch_content(&self, content: ContentType) -> anyhow::Result<String>;

    fn open_recent_topic(&self, topic: Option<&str>) -> anyhow::Result<()>;

    fn open_dialog(&self, dialog: Dialog) -> anyhow::Result<()>;

    fn type_text(&self, target_id: &str, text: &str) -> anyhow::Result<()>;

    /// Forwarded to the quiz currently on screen.
    fn quiz_answer(&self, params: &Params) -> anyhow::Result<()>;

    fn arcade(&self, command: ArcadeCommand, params: &Params) -> anyhow::Result<()>;

    fn logout(&self) -> anyhow::Result<()>;
}
