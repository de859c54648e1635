//! Action dispatch
//!
//! A table from [`ActionKind`] to handler. Handlers talk to the host and
//! report session-level effects (terminal, extra speech, log lines) back
//! through the [`DispatchContext`]; they never touch session state directly.

use crate::host::{AppHost, ArcadeCommand, GenerationRequest, SearchProvider};
use crate::MessageKind;
use intent_resolver::{Action, ActionKind, Command, ContentType, Route};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{kind} failed: {source}")]
    Host {
        kind: ActionKind,
        #[source]
        source: anyhow::Error,
    },
    #[error("{kind}: nothing to read for {content:?}")]
    EmptyContent {
        kind: ActionKind,
        content: ContentType,
    },
    #[error("{kind} handler received a {got} command")]
    Mismatch { kind: ActionKind, got: String },
}

pub type HandlerResult = Result<(), HandlerError>;

pub type Handler = fn(&Action, &mut DispatchContext<'_>) -> HandlerResult;

/// Session changes requested by a handler, applied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenTerminal,
    CloseTerminal,
    ClearTerminal,
    /// Extra speech after the action's verbal response.
    Speak(String),
    Log { kind: MessageKind, content: String },
}

pub struct DispatchContext<'a> {
    host: &'a dyn AppHost,
    kind: ActionKind,
    effects: Vec<Effect>,
}

impl<'a> DispatchContext<'a> {
    pub fn new(host: &'a dyn AppHost) -> Self {
        Self {
            host,
            kind: ActionKind::Chat,
            effects: Vec::new(),
        }
    }

    pub fn host(&self) -> &dyn AppHost {
        self.host
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }

    /// Wrap a host error with the action being handled.
    pub fn host_err(&self, source: anyhow::Error) -> HandlerError {
        HandlerError::Host {
            kind: self.kind,
            source,
        }
    }

    /// Navigate unless the host is already on `route`.
    pub fn navigate(&mut self, route: Route) -> HandlerResult {
        if self.host.current_route() == route.path() {
            tracing::debug!(%route, "already on route; skipping navigation");
            return Ok(());
        }
        self.host.navigate(route).map_err(|e| self.host_err(e))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Handled,
    /// The kind is outside the action contract; nothing was executed.
    Unsupported,
    /// The handler failed; an error line was logged.
    Failed(String),
}

pub struct ActionRouter {
    handlers: HashMap<ActionKind, Handler>,
}

impl Default for ActionRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRouter {
    /// Router with the built-in handler for every kind.
    pub fn new() -> Self {
        let handlers = ActionKind::ALL
            .iter()
            .map(|kind| (*kind, default_handler(*kind)))
            .collect();
        Self { handlers }
    }

    pub fn with_handler(mut self, kind: ActionKind, handler: Handler) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn dispatch(&self, action: &Action, ctx: &mut DispatchContext<'_>) -> DispatchOutcome {
        let handler = action.kind().and_then(|kind| {
            ctx.kind = kind;
            self.handlers.get(&kind)
        });
        let Some(handler) = handler else {
            tracing::warn!(kind = action.kind_name(), "unsupported action");
            ctx.push(Effect::Log {
                kind: MessageKind::System,
                content: format!(
                    "Action \"{}\" is recognized but not yet implemented.",
                    action.kind_name()
                ),
            });
            return DispatchOutcome::Unsupported;
        };

        match handler(action, ctx) {
            Ok(()) => {
                tracing::info!(kind = action.kind_name(), "action dispatched");
                DispatchOutcome::Handled
            }
            Err(e) => {
                tracing::error!(kind = action.kind_name(), "action failed: {}", e);
                let message = e.to_string();
                ctx.push(Effect::Log {
                    kind: MessageKind::Error,
                    content: message.clone(),
                });
                DispatchOutcome::Failed(message)
            }
        }
    }
}

fn default_handler(kind: ActionKind) -> Handler {
    match kind {
        ActionKind::Navigate => navigate,
        ActionKind::GenerateNotes => generate_notes,
        ActionKind::GenerateTest => generate_test,
        ActionKind::GenerateCollegeNotes => generate_college_notes,
        ActionKind::ReadNews => read_news,
        ActionKind::SearchYoutube | ActionKind::SearchBooks => search,
        ActionKind::SwitchTab => switch_tab,
        ActionKind::ChangeTheme => change_theme,
        ActionKind::ChangeLanguage => change_language,
        ActionKind::SpeakText | ActionKind::ReadQuests => read_content,
        ActionKind::OpenRecentTopic => open_recent_topic,
        ActionKind::SelectQuizAnswer => select_quiz_answer,
        ActionKind::ArcadeGuess | ActionKind::ArcadeHint | ActionKind::ArcadeRestart => arcade,
        ActionKind::Logout => logout,
        ActionKind::OpenTerminal | ActionKind::CloseTerminal | ActionKind::ClearTerminal => {
            terminal
        }
        ActionKind::OpenDialog => open_dialog,
        ActionKind::TypeText => type_text,
        ActionKind::Chat => chat,
    }
}

fn mismatch(action: &Action, ctx: &DispatchContext<'_>) -> HandlerError {
    HandlerError::Mismatch {
        kind: ctx.kind,
        got: action.kind_name().to_string(),
    }
}

fn navigate(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::Navigate { route } = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.navigate(*route)
}

fn generate_notes(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::GenerateNotes { topic } = &action.command else {
        return Err(mismatch(action, ctx));
    };
    if let Some(topic) = topic {
        ctx.host
            .start_generation(GenerationRequest::Notes {
                topic: topic.clone(),
            })
            .map_err(|e| ctx.host_err(e))?;
    }
    ctx.navigate(Route::Notes)
}

fn generate_test(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::GenerateTest(request) = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host
        .start_generation(GenerationRequest::Test(request.clone()))
        .map_err(|e| ctx.host_err(e))?;
    ctx.navigate(Route::CustomTest)
}

fn generate_college_notes(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::GenerateCollegeNotes(request) = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host
        .start_generation(GenerationRequest::CollegeNotes(request.clone()))
        .map_err(|e| ctx.host_err(e))?;
    ctx.navigate(Route::College)
}

fn read_news(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::ReadNews(query) = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host.show_news(query).map_err(|e| ctx.host_err(e))?;
    ctx.navigate(Route::News)
}

fn search(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let (provider, query) = match &action.command {
        Command::SearchYoutube { query } => (SearchProvider::Youtube, query),
        Command::SearchBooks { query } => (SearchProvider::Books, query),
        _ => return Err(mismatch(action, ctx)),
    };
    ctx.host.search(provider, query).map_err(|e| ctx.host_err(e))
}

fn switch_tab(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::SwitchTab { tab } = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host.switch_tab(tab).map_err(|e| ctx.host_err(e))
}

fn change_theme(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::ChangeTheme { theme } = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host.set_theme(*theme).map_err(|e| ctx.host_err(e))
}

fn change_language(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::ChangeLanguage { language } = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host.set_language(language).map_err(|e| ctx.host_err(e))
}

fn read_content(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let content = match &action.command {
        Command::SpeakText { content } | Command::ReadQuests { content } => *content,
        _ => return Err(mismatch(action, ctx)),
    };
    let text = ctx
        .host
        .fetch_content(content)
        .map_err(|e| ctx.host_err(e))?;
    if text.trim().is_empty() {
        return Err(HandlerError::EmptyContent {
            kind: ctx.kind,
            content,
        });
    }
    ctx.push(Effect::Speak(text));
    Ok(())
}

fn open_recent_topic(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::OpenRecentTopic { topic } = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host
        .open_recent_topic(topic.as_deref())
        .map_err(|e| ctx.host_err(e))
}

fn select_quiz_answer(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::SelectQuizAnswer(params) = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host.quiz_answer(params).map_err(|e| ctx.host_err(e))
}

fn arcade(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let (command, params) = match &action.command {
        Command::ArcadeGuess(p) => (ArcadeCommand::Guess, p),
        Command::ArcadeHint(p) => (ArcadeCommand::Hint, p),
        Command::ArcadeRestart(p) => (ArcadeCommand::Restart, p),
        _ => return Err(mismatch(action, ctx)),
    };
    ctx.host.arcade(command, params).map_err(|e| ctx.host_err(e))
}

fn logout(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::Logout = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host.logout().map_err(|e| ctx.host_err(e))
}

fn terminal(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let effect = match &action.command {
        Command::OpenTerminal => Effect::OpenTerminal,
        Command::CloseTerminal => Effect::CloseTerminal,
        Command::ClearTerminal => Effect::ClearTerminal,
        _ => return Err(mismatch(action, ctx)),
    };
    ctx.push(effect);
    Ok(())
}

fn open_dialog(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::OpenDialog { dialog } = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host.open_dialog(*dialog).map_err(|e| ctx.host_err(e))
}

fn type_text(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    let Command::TypeText { target_id, text } = &action.command else {
        return Err(mismatch(action, ctx));
    };
    ctx.host
        .type_text(target_id, text)
        .map_err(|e| ctx.host_err(e))
}

/// Conversation only; the verbal response is the whole answer.
fn chat(action: &Action, ctx: &mut DispatchContext<'_>) -> HandlerResult {
    match &action.command {
        Command::Chat { .. } => Ok(()),
        _ => Err(mismatch(action, ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{HostCall, RecordingHost};
    use intent_resolver::{validate, Theme};
    use serde_json::json;

    fn action(raw: serde_json::Value) -> Action {
        validate(&raw).unwrap()
    }

    #[test]
    fn test_every_kind_has_a_handler() {
        let router = ActionRouter::new();
        for kind in ActionKind::ALL {
            assert!(router.handlers.contains_key(&kind), "{} has no handler", kind);
        }
    }

    #[test]
    fn test_navigate_twice_navigates_once() {
        let host = RecordingHost::new();
        let router = ActionRouter::new();
        let nav = action(json!({
            "kind": "navigate",
            "params": {"target": "/notes"},
            "verbalResponse": "Opening notes."
        }));
        for _ in 0..2 {
            let mut ctx = DispatchContext::new(&host);
            assert_eq!(router.dispatch(&nav, &mut ctx), DispatchOutcome::Handled);
        }
        assert_eq!(host.calls(), vec![HostCall::Navigate(Route::Notes)]);
        assert_eq!(host.current_route(), "/notes");
    }

    #[test]
    fn test_unsupported_kind_logs_system_line() {
        let host = RecordingHost::new();
        let router = ActionRouter::new();
        let unknown = action(json!({"kind": "foo_bar", "verbalResponse": "Sure."}));
        let mut ctx = DispatchContext::new(&host);
        assert_eq!(router.dispatch(&unknown, &mut ctx), DispatchOutcome::Unsupported);
        assert_eq!(
            ctx.effects(),
            &[Effect::Log {
                kind: MessageKind::System,
                content: "Action \"foo_bar\" is recognized but not yet implemented.".into()
            }]
        );
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_generation_triggers_then_navigates() {
        let host = RecordingHost::new();
        let router = ActionRouter::new();
        let test = action(json!({
            "kind": "generate_test",
            "params": {"topic": "calculus", "numQuestions": 15, "difficulty": "hard"},
            "verbalResponse": "Preparing it."
        }));
        let mut ctx = DispatchContext::new(&host);
        router.dispatch(&test, &mut ctx);
        let calls = host.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            HostCall::StartGeneration(GenerationRequest::Test(req)) => {
                assert_eq!(req.num_questions, 15);
            }
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(calls[1], HostCall::Navigate(Route::CustomTest));
    }

    #[test]
    fn test_notes_without_topic_only_navigates() {
        let host = RecordingHost::new();
        let router = ActionRouter::new();
        let notes = action(json!({"kind": "generate_notes", "verbalResponse": "Opening notes."}));
        router.dispatch(&notes, &mut DispatchContext::new(&host));
        assert_eq!(host.calls(), vec![HostCall::Navigate(Route::Notes)]);
    }

    #[test]
    fn test_host_failure_becomes_error_effect() {
        let host = RecordingHost::new().failing_on("set_theme");
        let router = ActionRouter::new();
        let theme = action(json!({
            "kind": "change_theme",
            "params": {"theme": "dark"},
            "verbalResponse": "Going dark."
        }));
        let mut ctx = DispatchContext::new(&host);
        let outcome = router.dispatch(&theme, &mut ctx);
        assert!(matches!(outcome, DispatchOutcome::Failed(ref m) if m.contains("change_theme")));
        assert!(matches!(
            ctx.effects(),
            [Effect::Log {
                kind: MessageKind::Error,
                ..
            }]
        ));
        assert_ne!(host.theme(), Some(Theme::Dark));
    }

    #[test]
    fn test_read_content_speaks_host_text() {
        let host = RecordingHost::new().with_content(ContentType::DailyQuote, "Stay curious.");
        let router = ActionRouter::new();
        let quote = action(json!({
            "kind": "speak_text",
            "params": {"contentType": "daily_quote"},
            "verbalResponse": "Here's today's quote."
        }));
        let mut ctx = DispatchContext::new(&host);
        assert_eq!(router.dispatch(&quote, &mut ctx), DispatchOutcome::Handled);
        assert_eq!(ctx.effects(), &[Effect::Speak("Stay curious.".into())]);

        let quests = action(json!({"kind": "read_quests", "verbalResponse": "Your quests."}));
        let mut ctx = DispatchContext::new(&host);
        assert!(matches!(
            router.dispatch(&quests, &mut ctx),
            DispatchOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_custom_handler_overrides_default() {
        fn silent(_: &Action, _: &mut DispatchContext<'_>) -> HandlerResult {
            Ok(())
        }
        let host = RecordingHost::new();
        let router = ActionRouter::new().with_handler(ActionKind::Logout, silent);
        let out = action(json!({"kind": "logout", "verbalResponse": "Bye."}));
        router.dispatch(&out, &mut DispatchContext::new(&host));
        assert!(host.calls().is_empty());
    }
}
