use intent_resolver::{Persona, ResolverConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("config format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Voice name per persona, handed to the speech engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePreferences {
    pub jarvis: Option<String>,
    pub alya: Option<String>,
}

impl Default for VoicePreferences {
    fn default() -> Self {
        Self {
            jarvis: Some("en-GB-male".to_string()),
            alya: Some("en-IN-female".to_string()),
        }
    }
}

impl VoicePreferences {
    pub fn for_persona(&self, persona: Persona) -> Option<String> {
        match persona {
            Persona::Jarvis => self.jarvis.clone(),
            Persona::Alya => self.alya.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub persona: Persona,
    /// Upper bound on one intent resolution, in milliseconds
    pub resolve_timeout_ms: u64,
    /// Identical commands inside this window are dropped
    pub duplicate_window_ms: u64,
    pub voices: VoicePreferences,
    /// Recognizer language tag, e.g. "en-IN"
    pub capture_language: Option<String>,
    pub resolver: ResolverConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            persona: Persona::Jarvis,
            resolve_timeout_ms: 20_000,
            duplicate_window_ms: 1_500,
            voices: VoicePreferences::default(),
            capture_language: None,
            resolver: ResolverConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Read `path`, writing the defaults there first if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            tracing::info!("no config at {}; writing defaults", path.display());
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn duplicate_window(&self) -> Duration {
        Duration::from_millis(self.duplicate_window_ms)
    }
}
