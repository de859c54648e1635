//! assistant-core: the assistant session and everything it dispatches to
//!
//! Ties capture, intent resolution and speech output together behind one
//! [`Assistant`] per host. Actions are executed against the host through
//! the [`AppHost`] trait; every step is written to an in-memory audit log.

mod audit;
pub use audit::{AuditLog, MessageKind, TerminalMessage};

mod config;
pub use config::{AssistantConfig, ConfigError, VoicePreferences};

mod feedback;
pub use feedback::{EnqueueOutcome, Priority, SpeechQueue};

mod host;
pub use host::{AppHost, ArcadeCommand, GenerationRequest, SearchProvider};

mod keymap;
pub use keymap::Shortcut;

mod router;
pub use router::{
    ActionRouter, DispatchContext, DispatchOutcome, Effect, Handler, HandlerError, HandlerResult,
};

mod session;
pub use session::{Assistant, CommandOutcome, IgnoreReason, TerminalState};

mod status;
pub use status::{AssistantStatus, StatusChange, StatusEvent, StatusMachine, TransitionError};

#[cfg(feature = "mock")]
pub mod mock;

/// Initialize the assistant core
pub fn init() -> anyhow::Result<()> {
    tracing::info!("Initializing Assistant Core");
    intent_resolver::init()?;
    Ok(())
}
