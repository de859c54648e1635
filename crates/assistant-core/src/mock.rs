use crate::host::{AppHost, ArcadeCommand, GenerationRequest, SearchProvider};
use intent_resolver::{
    AssistantContext, ContentType, Dialog, NewsQuery, Params, Route, Theme,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A side effect the assistant asked the host to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Navigate(Route),
    StartGeneration(GenerationRequest),
    ShowNews(NewsQuery),
    Search(SearchProvider, String),
    SwitchTab(String),
    SetTheme(Theme),
    SetLanguage(String),
    OpenRecentTopic(Option<String>),
    OpenDialog(Dialog),
    TypeText { target_id: String, text: String },
    QuizAnswer(Params),
    Arcade(ArcadeCommand, Params),
    Logout,
}

#[derive(Debug)]
struct HostState {
    context: AssistantContext,
    calls: Vec<HostCall>,
    theme: Option<Theme>,
    context_reads: usize,
}

/// In-memory host that records every mutating call. Reads (`context`,
/// `current_route`, `fetch_content`) are not recorded as calls.
pub struct RecordingHost {
    state: Mutex<HostState>,
    content: HashMap<ContentType, String>,
    failing: HashSet<&'static str>,
    navigate_hook: Mutex<Option<NavigateHook>>,
}

type NavigateHook = Arc<dyn Fn(Route) + Send + Sync>;

impl fmt::Debug for RecordingHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingHost")
            .field("state", &self.state)
            .field("failing", &self.failing)
            .finish_non_exhaustive()
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                context: AssistantContext::default(),
                calls: Vec::new(),
                theme: None,
                context_reads: 0,
            }),
            content: HashMap::new(),
            failing: HashSet::new(),
            navigate_hook: Mutex::new(None),
        }
    }

    pub fn with_content(mut self, content: ContentType, text: impl Into<String>) -> Self {
        self.content.insert(content, text.into());
        self
    }

    /// Make the named host method return an error.
    pub fn failing_on(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    /// Run `hook` after every successful navigation, the way a page
    /// announces its new title.
    pub fn on_navigate<F>(&self, hook: F)
    where
        F: Fn(Route) + Send + Sync + 'static,
    {
        *lock(&self.navigate_hook) = Some(Arc::new(hook));
    }

    pub fn set_context(&self, context: AssistantContext) {
        lock(&self.state).context = context;
    }

    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.state).calls.clone()
    }

    pub fn theme(&self) -> Option<Theme> {
        lock(&self.state).theme
    }

    pub fn context_reads(&self) -> usize {
        lock(&self.state).context_reads
    }

    fn record(&self, method: &'static str, call: HostCall) -> anyhow::Result<()> {
        if self.failing.contains(method) {
            anyhow::bail!("{} unavailable", method);
        }
        let mut state = lock(&self.state);
        match &call {
            HostCall::Navigate(route) => state.context.route = route.path().to_string(),
            HostCall::SetTheme(theme) => state.theme = Some(*theme),
            HostCall::SetLanguage(language) => state.context.language = language.clone(),
            _ => {}
        }
        state.calls.push(call);
        Ok(())
    }
}

impl AppHost for RecordingHost {
    fn context(&self) -> AssistantContext {
        let mut state = lock(&self.state);
        state.context_reads += 1;
        state.context.clone()
    }

    fn current_route(&self) -> String {
        lock(&self.state).context.route.clone()
    }

    fn navigate(&self, route: Route) -> anyhow::Result<()> {
        self.record("navigate", HostCall::Navigate(route))?;
        let hook = lock(&self.navigate_hook).clone();
        if let Some(hook) = hook {
            hook(route);
        }
        Ok(())
    }

    fn start_generation(&self, request: GenerationRequest) -> anyhow::Result<()> {
        self.record("start_generation", HostCall::StartGeneration(request))
    }

    fn show_news(&self, query: &NewsQuery) -> anyhow::Result<()> {
        self.record("show_news", HostCall::ShowNews(query.clone()))
    }

    fn search(&self, provider: SearchProvider, query: &str) -> anyhow::Result<()> {
        self.record("search", HostCall::Search(provider, query.to_string()))
    }

    fn switch_tab(&self, tab: &str) -> anyhow::Result<()> {
        self.record("switch_tab", HostCall::SwitchTab(tab.to_string()))
    }

    fn set_theme(&self, theme: Theme) -> anyhow::Result<()> {
        self.record("set_theme", HostCall::SetTheme(theme))
    }

    fn set_language(&self, language: &str) -> anyhow::Result<()> {
        self.record("set_language", HostCall::SetLanguage(language.to_string()))
    }

    fn fetch_content(&self, content: ContentType) -> anyhow::Result<String> {
        if self.failing.contains("fetch_content") {
            anyhow::bail!("fetch_content unavailable");
        }
        Ok(self.content.get(&content).cloned().unwrap_or_default())
    }

    fn open_recent_topic(&self, topic: Option<&str>) -> anyhow::Result<()> {
        self.record(
            "open_recent_topic",
            HostCall::OpenRecentTopic(topic.map(str::to_string)),
        )
    }

    fn open_dialog(&self, dialog: Dialog) -> anyhow::Result<()> {
        self.record("open_dialog", HostCall::OpenDialog(dialog))
    }

    fn type_text(&self, target_id: &str, text: &str) -> anyhow::Result<()> {
        self.record(
            "type_text",
            HostCall::TypeText {
                target_id: target_id.to_string(),
                text: text.to_string(),
            },
        )
    }

    fn quiz_answer(&self, params: &Params) -> anyhow::Result<()> {
        self.record("quiz_answer", HostCall::QuizAnswer(params.clone()))
    }

    fn arcade(&self, command: ArcadeCommand, params: &Params) -> anyhow::Result<()> {
        self.record("arcade", HostCall::Arcade(command, params.clone()))
    }

    fn logout(&self) -> anyhow::Result<()> {
        self.record("logout", HostCall::Logout)
    }
}
