//! Intent resolution against an external language model

use crate::actions::{Action, ActionKind, Command, Params, Route};
use crate::normalize::WakeWords;
use crate::validate::validate;
use crate::{tools, AssistantContext, Persona, ResolutionError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Anything that can turn a normalized command into a validated action.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    async fn resolve(
        &self,
        command: &str,
        context: &AssistantContext,
        persona: Persona,
    ) -> Result<Action>;
}

/// A tool the model may call before answering.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System(String),
    User(String),
    /// The model asked for tools instead of answering.
    ToolRequest(Vec<ToolCall>),
    ToolResult { call_id: String, content: String },
}

/// One model turn: either final text or a batch of tool calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

/// Transport to a chat-completion style model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolSpec]) -> Result<Completion>;
}

/// The action every bare wake word resolves to.
pub fn wake_word_action(persona: Persona) -> Action {
    let mut params = Params::new();
    params.insert("isWakeWord".to_string(), Value::Bool(true));
    Action {
        command: Command::Chat { is_wake_word: true },
        params,
        verbal_response: persona.greeting().to_string(),
    }
}

/// Resolver backed by a language model speaking the action JSON contract.
pub struct LlmIntentResolver<C> {
    client: C,
    wake_words: WakeWords,
    max_tool_rounds: usize,
}

impl<C: CompletionClient> LlmIntentResolver<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            wake_words: WakeWords::default(),
            max_tool_rounds: 2,
        }
    }

    pub fn with_wake_words(mut self, wake_words: WakeWords) -> Self {
        self.wake_words = wake_words;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }
}

#[async_trait]
impl<C: CompletionClient> IntentResolver for LlmIntentResolver<C> {
    async fn resolve(
        &self,
        command: &str,
        context: &AssistantContext,
        persona: Persona,
    ) -> Result<Action> {
        if self.wake_words.is_exact(command) {
            tracing::debug!("wake word only; answering locally");
            return Ok(wake_word_action(persona));
        }

        let specs = tools::tool_specs();
        let mut messages = vec![
            ChatMessage::System(instructions(context, persona)),
            ChatMessage::User(command.to_string()),
        ];

        let mut rounds = 0;
        loop {
            match self.client.complete(&messages, &specs).await? {
                Completion::Text(text) => return parse_action(&text),
                Completion::ToolCalls(calls) => {
                    if rounds >= self.max_tool_rounds {
                        return Err(ResolutionError::Malformed(format!(
                            "model kept requesting tools after {} rounds",
                            rounds
                        )));
                    }
                    rounds += 1;
                    let results: Vec<ChatMessage> = calls
                        .iter()
                        .map(|call| {
                            tracing::debug!(tool = %call.name, "running resolver tool");
                            ChatMessage::ToolResult {
                                call_id: call.id.clone(),
                                content: tools::invoke(call),
                            }
                        })
                        .collect();
                    messages.push(ChatMessage::ToolRequest(calls));
                    messages.extend(results);
                }
            }
        }
    }
}

/// Find the outermost JSON object, tolerating code fences or chatter around it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse model output into a validated action.
pub fn parse_action(text: &str) -> Result<Action> {
    let body = extract_json_object(text)
        .ok_or_else(|| ResolutionError::Malformed("no JSON object in response".to_string()))?;
    let raw: Value = serde_json::from_str(body)
        .map_err(|e| ResolutionError::Malformed(format!("invalid JSON: {}", e)))?;
    validate(&raw).map_err(|err| {
        tracing::warn!(error = %err, payload = %raw, "intent service output failed validation");
        ResolutionError::Schema(err)
    })
}

fn action_catalog() -> String {
    let routes: Vec<&str> = Route::ALL.iter().map(|r| r.path()).collect();
    let mut out = String::new();
    for kind in ActionKind::ALL {
        let params = match kind {
            ActionKind::Navigate => format!("{{\"target\": one of {}}}", routes.join(", ")),
            ActionKind::GenerateNotes => "{\"topic\"?: string}".to_string(),
            ActionKind::GenerateTest => "{\"topic\": string, \"numQuestions\"?: 1-50 (default 10), \"difficulty\"?: \"easy\"|\"medium\"|\"hard\" (default \"medium\"), \"timer\"?: minutes}".to_string(),
            ActionKind::GenerateCollegeNotes => "{\"university\", \"semester\", \"branch\", \"subject\", \"unit\": strings, all required}".to_string(),
            ActionKind::ReadNews => "{\"category\"?: string (default \"top\"), \"country\"?, \"query\"?, \"language\"?, \"stateOrRegion\"?, \"city\"?}".to_string(),
            ActionKind::SearchYoutube | ActionKind::SearchBooks => "{\"query\": string}".to_string(),
            ActionKind::SwitchTab => "{\"tab\": string, a tab on the current page}".to_string(),
            ActionKind::ChangeTheme => "{\"theme\": \"light\"|\"dark\"|\"system\"}".to_string(),
            ActionKind::ChangeLanguage => "{\"language\": full English name of the language}".to_string(),
            ActionKind::SpeakText | ActionKind::ReadQuests => "{\"contentType\": \"daily_quote\"|\"math_fact\"|\"daily_quests\"|\"welcome_message\"|\"total_learners\"}".to_string(),
            ActionKind::OpenRecentTopic => "{\"topic\"?: string}".to_string(),
            ActionKind::SelectQuizAnswer => "{\"option\": the answer letter or text}".to_string(),
            ActionKind::ArcadeGuess => "{\"guess\": the user's guess}".to_string(),
            ActionKind::ArcadeHint | ActionKind::ArcadeRestart => "{}".to_string(),
            ActionKind::OpenDialog => "{\"dialog\": \"calculator\"|\"arcade\"}".to_string(),
            ActionKind::TypeText => "{\"targetId\": string, \"text\": string}".to_string(),
            ActionKind::Chat => "{} (plain conversation or answers)".to_string(),
            ActionKind::Logout
            | ActionKind::OpenTerminal
            | ActionKind::CloseTerminal
            | ActionKind::ClearTerminal => "{}".to_string(),
        };
        out.push_str(&format!("- {}: {}\n", kind, params));
    }
    out
}

/// System instructions for the model. Rebuilt per command from fresh context.
pub fn instructions(context: &AssistantContext, persona: Persona) -> String {
    let goal = context
        .user_goal
        .as_deref()
        .map(|g| format!("The user's learning goal: {}.\n", g))
        .unwrap_or_default();
    format!(
        "{style}\n\n\
         You control a learning app. Convert the user's command into exactly one JSON object \
         and output nothing else: no prose, no markdown.\n\
         Shape: {{\"kind\": <action kind>, \"params\": {{...}}, \"verbalResponse\": <string>}}\n\n\
         Action kinds and params:\n{catalog}\n\
         Rules:\n\
         - verbalResponse is required, short, in character, and written in {language}.\n\
         - If the command is only a wake word (\"Jarvis\", \"Alya\", \"Alia\", optionally with \"Hey\"), \
           reply with kind \"chat\", params {{\"isWakeWord\": true}} and the greeting \"{greeting}\".\n\
         - Use the getCurrentTime tool for time questions and generalKnowledge for factual questions; \
           answer those with kind \"chat\".\n\
         - Never invent routes outside the navigate list.\n\n\
         The user is currently on {route}.\n{goal}",
        style = persona.style_guide(),
        catalog = action_catalog(),
        language = context.language,
        greeting = persona.greeting(),
        route = context.route,
        goal = goal,
    )
}
