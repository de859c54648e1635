//! The assistant session
//!
//! Owns the status machine, capture session, speech queue, audit log and
//! terminal panel state for one host. All state sits behind one mutex that
//! is never held across the resolver call or host callbacks; results are matched against an
//! (epoch, seq) ticket so a late answer from a previous activation is
//! dropped.

use crate::audit::{AuditLog, MessageKind, TerminalMessage};
use crate::config::{AssistantConfig, VoicePreferences};
use crate::feedback::{EnqueueOutcome, Priority, SpeechQueue};
use crate::host::AppHost;
use crate::keymap::Shortcut;
use crate::router::{ActionRouter, DispatchContext, DispatchOutcome, Effect};
use crate::status::{AssistantStatus, StatusChange, StatusEvent, StatusMachine};
use intent_resolver::{
    normalize, wake_word_action, DuplicateFilter, IntentResolver, Persona, ResolutionError,
    WakeWords,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;
use voice_io::{CaptureConfig, CaptureError, CaptureEvent, SpeechCapture, SpeechOutput};

type StatusCallback = Arc<dyn Fn(StatusChange) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminalState {
    pub open: bool,
    pub secondary_open: bool,
    pub palette_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Empty,
    /// The assistant is switched off.
    Inactive,
    /// Another command is being resolved.
    Busy,
    Duplicate,
    /// A transcript that was not addressed to the assistant.
    NotAddressed,
}

/// What became of a command. Failures are reported here, never as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Ignored(IgnoreReason),
    Dispatched {
        kind: String,
        outcome: DispatchOutcome,
    },
    /// Resolution failed; the persona apology was spoken.
    Failed { message: String },
    /// The session moved on while the command was resolving.
    Discarded,
    /// A bare wake word while idle: greeted and now listening.
    Greeted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    epoch: u64,
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Typed,
    Voice,
}

struct SessionState {
    machine: StatusMachine,
    persona: Persona,
    epoch: u64,
    seq: u64,
    in_flight: Option<Ticket>,
    capture: Box<dyn SpeechCapture>,
    capture_failure: Option<CaptureError>,
    speech: SpeechQueue,
    audit: AuditLog,
    terminal: TerminalState,
    duplicates: DuplicateFilter,
}

pub struct Assistant {
    id: Uuid,
    state: Mutex<SessionState>,
    resolver: Arc<dyn IntentResolver>,
    host: Arc<dyn AppHost>,
    router: ActionRouter,
    wake_words: WakeWords,
    voices: VoicePreferences,
    capture_config: CaptureConfig,
    resolve_timeout: Duration,
    status_callback: Mutex<Option<StatusCallback>>,
}

impl Assistant {
    pub fn new(
        config: &AssistantConfig,
        resolver: Arc<dyn IntentResolver>,
        host: Arc<dyn AppHost>,
        capture: Box<dyn SpeechCapture>,
        output: Box<dyn SpeechOutput>,
    ) -> Self {
        let mut speech = SpeechQueue::new(output);
        speech.set_voice_preference(config.voices.for_persona(config.persona));
        let capture_config = CaptureConfig {
            language: config.capture_language.clone(),
            ..CaptureConfig::default()
        };
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(SessionState {
                machine: StatusMachine::new(),
                persona: config.persona,
                epoch: 0,
                seq: 0,
                in_flight: None,
                capture,
                capture_failure: None,
                speech,
                audit: AuditLog::new(),
                terminal: TerminalState::default(),
                duplicates: DuplicateFilter::new(config.duplicate_window()),
            }),
            resolver,
            host,
            router: ActionRouter::new(),
            wake_words: config.resolver.wake_words(),
            voices: config.voices.clone(),
            capture_config,
            resolve_timeout: config.resolve_timeout(),
            status_callback: Mutex::new(None),
        }
    }

    pub fn with_router(mut self, router: ActionRouter) -> Self {
        self.router = router;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Observe status changes. The callback runs outside the session lock.
    pub fn on_status_change<F>(&self, callback: F)
    where
        F: Fn(StatusChange) + Send + Sync + 'static,
    {
        let mut slot = self
            .status_callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(Arc::new(callback));
    }

    fn notify(&self, changes: Vec<StatusChange>) {
        if changes.is_empty() {
            return;
        }
        let callback = self
            .status_callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(callback) = callback {
            for change in changes {
                callback(change);
            }
        }
    }

    pub fn status(&self) -> AssistantStatus {
        self.lock().machine.status()
    }

    pub fn persona(&self) -> Persona {
        self.lock().persona
    }

    pub fn terminal(&self) -> TerminalState {
        self.lock().terminal
    }

    pub fn snapshot(&self) -> Vec<TerminalMessage> {
        self.lock().audit.snapshot()
    }

    /// Open the microphone and go idle. A capture failure is logged once
    /// and leaves the toggle disabled until [`reset`](Self::reset).
    pub fn toggle_on(&self) -> Result<AssistantStatus, CaptureError> {
        let (result, changes) = {
            let mut s = self.lock();
            let result = Self::open_capture(&mut s, &self.capture_config);
            (result, s.machine.drain_changes())
        };
        self.notify(changes);
        if let Ok(status) = &result {
            tracing::info!(session = %self.id, %status, "assistant toggled on");
        }
        result
    }

    fn open_capture(
        s: &mut SessionState,
        config: &CaptureConfig,
    ) -> Result<AssistantStatus, CaptureError> {
        if s.machine.status() != AssistantStatus::Off {
            return Ok(s.machine.status());
        }
        if let Some(err) = &s.capture_failure {
            return Err(err.clone());
        }
        if let Err(err) = s.capture.start(config) {
            tracing::error!("speech capture unavailable: {}", err);
            s.audit
                .append(format!("Voice input unavailable: {}", err), MessageKind::Error);
            s.capture_failure = Some(err.clone());
            return Err(err);
        }
        s.epoch += 1;
        s.duplicates.reset();
        s.machine
            .apply(StatusEvent::ToggleOn)
            .map_err(|e| CaptureError::Device(e.to_string()))
    }

    /// Close the microphone and silence everything. An in-flight command
    /// still completes but its result is dropped.
    pub fn toggle_off(&self) -> AssistantStatus {
        let changes = {
            let mut s = self.lock();
            Self::shut_down(&mut s);
            s.machine.drain_changes()
        };
        self.notify(changes);
        tracing::info!(session = %self.id, "assistant toggled off");
        AssistantStatus::Off
    }

    fn shut_down(s: &mut SessionState) {
        s.capture.stop();
        s.speech.cancel_all();
        s.in_flight = None;
        // ToggleOff is legal from every status
        let _ = s.machine.apply(StatusEvent::ToggleOff);
    }

    pub fn toggle(&self) -> Result<AssistantStatus, CaptureError> {
        if self.status() == AssistantStatus::Off {
            self.toggle_on()
        } else {
            Ok(self.toggle_off())
        }
    }

    /// Start listening without a wake word.
    pub fn activate(&self) -> AssistantStatus {
        let (status, changes) = {
            let mut s = self.lock();
            if let Err(e) = s.machine.apply(StatusEvent::Activate) {
                tracing::debug!("activation ignored: {}", e);
            }
            (s.machine.status(), s.machine.drain_changes())
        };
        self.notify(changes);
        status
    }

    /// Drain everything the capture session has produced.
    pub async fn pump_capture(&self) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let event = { self.lock().capture.poll() };
            let Some(event) = event else { break };
            if let Some(outcome) = self.handle_capture_event(event).await {
                outcomes.push(outcome);
            }
        }
        self.check_capture();
        outcomes
    }

    /// A capture session that closed on its own switches the assistant off.
    fn check_capture(&self) {
        let changes = {
            let mut s = self.lock();
            if s.machine.status() == AssistantStatus::Off || s.capture.is_active() {
                return;
            }
            let err = CaptureError::Device("microphone disconnected".to_string());
            tracing::error!(session = %self.id, "speech capture lost: {}", err);
            s.audit
                .append(format!("Voice input unavailable: {}", err), MessageKind::Error);
            s.capture_failure = Some(err);
            Self::shut_down(&mut s);
            s.machine.drain_changes()
        };
        self.notify(changes);
    }

    pub async fn handle_capture_event(&self, event: CaptureEvent) -> Option<CommandOutcome> {
        let transcript = match event {
            CaptureEvent::WakeWord => {
                self.activate();
                return None;
            }
            CaptureEvent::Transcript(t) if !t.is_final => {
                tracing::trace!(text = %t.text, "partial transcript");
                return None;
            }
            CaptureEvent::Transcript(t) => t.text,
        };

        let status = self.status();
        let outcome = match status {
            AssistantStatus::Off => CommandOutcome::Ignored(IgnoreReason::Inactive),
            AssistantStatus::Processing => CommandOutcome::Ignored(IgnoreReason::Busy),
            AssistantStatus::Speaking => CommandOutcome::Ignored(IgnoreReason::NotAddressed),
            AssistantStatus::Listening => self.run_command(&transcript, Source::Voice).await,
            AssistantStatus::Idle => match self.wake_words.strip_prefix(&transcript) {
                None => CommandOutcome::Ignored(IgnoreReason::NotAddressed),
                Some("") => self.greet(),
                Some(rest) => {
                    let rest = rest.to_string();
                    self.activate();
                    self.run_command(&rest, Source::Voice).await
                }
            },
        };
        Some(outcome)
    }

    fn greet(&self) -> CommandOutcome {
        let changes = {
            let mut s = self.lock();
            if s.machine.apply(StatusEvent::Activate).is_err() {
                return CommandOutcome::Ignored(IgnoreReason::Busy);
            }
            let greeting = wake_word_action(s.persona).verbal_response;
            s.audit.append(greeting.as_str(), MessageKind::Ai);
            s.speech.enqueue(&greeting, Priority::Essential);
            s.machine.drain_changes()
        };
        self.notify(changes);
        CommandOutcome::Greeted
    }

    /// Typed command from the palette or terminal.
    pub async fn process_command(&self, raw: &str) -> CommandOutcome {
        self.run_command(raw, Source::Typed).await
    }

    async fn run_command(&self, raw: &str, source: Source) -> CommandOutcome {
        let Some(command) = normalize(raw) else {
            return CommandOutcome::Ignored(IgnoreReason::Empty);
        };

        let begun = {
            let mut s = self.lock();
            let begun = Self::begin(&mut s, &command, source);
            begun.map(|ticket| (ticket, s.persona, s.machine.drain_changes()))
        };
        let (ticket, persona, changes) = match begun {
            Ok(begun) => begun,
            Err(reason) => {
                tracing::debug!(?reason, "command ignored");
                return CommandOutcome::Ignored(reason);
            }
        };
        self.notify(changes);
        tracing::info!(
            session = %self.id,
            epoch = ticket.epoch,
            seq = ticket.seq,
            "resolving command"
        );

        let context = self.host.context();
        let result = match tokio::time::timeout(
            self.resolve_timeout,
            self.resolver.resolve(&command, &context, persona),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ResolutionError::Timeout(self.resolve_timeout)),
        };

        let action = {
            let mut s = self.lock();
            if s.in_flight != Some(ticket) || s.machine.status() != AssistantStatus::Processing {
                tracing::debug!(
                    epoch = ticket.epoch,
                    seq = ticket.seq,
                    "stale result dropped"
                );
                return CommandOutcome::Discarded;
            }
            match result {
                Ok(action) => action,
                Err(err) => {
                    s.in_flight = None;
                    let outcome = Self::report_failure(&mut s, err, persona, &context.language);
                    let changes = Self::settle(&mut s);
                    drop(s);
                    self.notify(changes);
                    return outcome;
                }
            }
        };

        // Handlers run unlocked; hosts may call back into the session.
        let mut ctx = DispatchContext::new(self.host.as_ref());
        let dispatched = self.router.dispatch(&action, &mut ctx);
        let effects = ctx.into_effects();
        let reply = match &dispatched {
            DispatchOutcome::Failed(_) => persona.apology(&context.language).to_string(),
            _ => action.verbal_response.clone(),
        };
        let outcome = CommandOutcome::Dispatched {
            kind: action.kind_name().to_string(),
            outcome: dispatched,
        };

        let changes = {
            let mut s = self.lock();
            if s.in_flight != Some(ticket) {
                tracing::debug!(
                    epoch = ticket.epoch,
                    seq = ticket.seq,
                    "session moved on during dispatch; reply dropped"
                );
                return outcome;
            }
            s.in_flight = None;
            let spoken = Self::apply_effects(&mut s, effects);
            s.audit.append(reply.as_str(), MessageKind::Ai);
            s.speech.enqueue(&reply, Priority::Essential);
            for text in spoken {
                s.audit.append(text.as_str(), MessageKind::Ai);
                s.speech.enqueue(&text, Priority::Essential);
            }
            Self::settle(&mut s)
        };
        self.notify(changes);
        outcome
    }

    fn report_failure(
        s: &mut SessionState,
        err: ResolutionError,
        persona: Persona,
        language: &str,
    ) -> CommandOutcome {
        if let ResolutionError::Schema(schema) = &err {
            tracing::warn!("intent service returned an invalid action: {}", schema);
        } else {
            tracing::warn!("intent resolution failed: {}", err);
        }
        let message = err.sanitized();
        s.audit.append(message.as_str(), MessageKind::Error);
        let apology = persona.apology(language);
        s.audit.append(apology, MessageKind::Ai);
        s.speech.enqueue(apology, Priority::Essential);
        CommandOutcome::Failed { message }
    }

    /// Leave `processing` once the reply is queued.
    fn settle(s: &mut SessionState) -> Vec<StatusChange> {
        let speaking = s.speech.is_speaking();
        if let Err(e) = s.machine.apply(StatusEvent::Resolved { speaking }) {
            tracing::warn!("{}", e);
        }
        s.machine.drain_changes()
    }

    fn begin(s: &mut SessionState, command: &str, source: Source) -> Result<Ticket, IgnoreReason> {
        match s.machine.status() {
            AssistantStatus::Off => return Err(IgnoreReason::Inactive),
            AssistantStatus::Processing => return Err(IgnoreReason::Busy),
            _ => {}
        }
        let event = match source {
            Source::Typed => StatusEvent::TypedCommand,
            Source::Voice => StatusEvent::FinalTranscript,
        };
        StatusMachine::next(s.machine.status(), event).map_err(|_| IgnoreReason::NotAddressed)?;
        if !s.duplicates.admit(command) {
            return Err(IgnoreReason::Duplicate);
        }

        if s.machine.status() == AssistantStatus::Speaking {
            s.speech.cancel_all();
        }
        s.machine
            .apply(event)
            .map_err(|_| IgnoreReason::NotAddressed)?;
        s.seq += 1;
        let ticket = Ticket {
            epoch: s.epoch,
            seq: s.seq,
        };
        s.in_flight = Some(ticket);
        s.audit.append(command, MessageKind::User);
        Ok(ticket)
    }

    /// Applies terminal and log effects; returns extra text to speak.
    fn apply_effects(s: &mut SessionState, effects: Vec<Effect>) -> Vec<String> {
        let mut spoken = Vec::new();
        for effect in effects {
            match effect {
                Effect::OpenTerminal => s.terminal.open = true,
                Effect::CloseTerminal => s.terminal.open = false,
                Effect::ClearTerminal => s.audit.clear(),
                Effect::Speak(text) => spoken.push(text),
                Effect::Log { kind, content } => {
                    s.audit.append(content, kind);
                }
            }
        }
        spoken
    }

    /// The speech engine finished utterance `id`.
    pub fn playback_ended(&self, id: u64) -> AssistantStatus {
        let (status, changes) = {
            let mut s = self.lock();
            let still_speaking = s.speech.on_playback_ended(id);
            if !still_speaking && s.machine.status() == AssistantStatus::Speaking {
                let _ = s.machine.apply(StatusEvent::PlaybackEnded);
            }
            (s.machine.status(), s.machine.drain_changes())
        };
        self.notify(changes);
        status
    }

    /// Page-title style announcement. Defaults to optional priority and is
    /// dropped while the assistant is off.
    pub fn announce(&self, text: &str, priority: Option<Priority>) -> EnqueueOutcome {
        let mut s = self.lock();
        if s.machine.status() == AssistantStatus::Off {
            return EnqueueOutcome::Dropped;
        }
        s.speech.enqueue(text, priority.unwrap_or(Priority::Optional))
    }

    /// User-requested playback. Interrupts anything else.
    pub fn speak_manual(&self, text: &str) -> EnqueueOutcome {
        self.lock().speech.enqueue(text, Priority::Manual)
    }

    /// Switch persona and the voice used for later utterances.
    pub fn set_persona(&self, persona: Persona) {
        let mut s = self.lock();
        s.persona = persona;
        s.speech.set_voice_preference(self.voices.for_persona(persona));
        tracing::info!(session = %self.id, persona = %persona, "persona changed");
    }

    pub fn handle_shortcut(&self, shortcut: Shortcut) -> TerminalState {
        let mut s = self.lock();
        match shortcut {
            Shortcut::ToggleTerminal => s.terminal.open = !s.terminal.open,
            Shortcut::ToggleSecondary => s.terminal.secondary_open = !s.terminal.secondary_open,
            Shortcut::OpenPalette => s.terminal.palette_open = true,
        }
        s.terminal
    }

    pub fn close_palette(&self) {
        self.lock().terminal.palette_open = false;
    }

    /// Back to a fresh, switched-off session. Audit ids keep counting.
    pub fn reset(&self) {
        let changes = {
            let mut s = self.lock();
            Self::shut_down(&mut s);
            s.audit.clear();
            s.terminal = TerminalState::default();
            s.capture_failure = None;
            s.duplicates.reset();
            s.machine.drain_changes()
        };
        self.notify(changes);
        tracing::info!(session = %self.id, "assistant reset");
    }
}
