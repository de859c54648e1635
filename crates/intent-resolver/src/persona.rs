//! Persona profiles and ambient command context

use serde::{Deserialize, Serialize};
use std::fmt;

/// Personality the assistant speaks with. Affects wording only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    #[default]
    Jarvis,
    Alya,
}

impl Persona {
    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::Jarvis => "J.A.R.V.I.S.",
            Persona::Alya => "Alya",
        }
    }

    /// Fixed reply to a bare wake word. Deliberately not localized.
    pub fn greeting(&self) -> &'static str {
        match self {
            Persona::Jarvis => "Yes, sir?",
            Persona::Alya => "Yes?",
        }
    }

    /// Tone instructions handed to the intent service.
    pub fn style_guide(&self) -> &'static str {
        match self {
            Persona::Jarvis => {
                "You are J.A.R.V.I.S., a composed, formal British butler-style assistant. \
                 Address the user as \"sir\", stay brief and precise, and keep a dry wit."
            }
            Persona::Alya => {
                "You are Alya, a warm, upbeat study companion. Speak casually and \
                 encouragingly, keep replies short, and never call the user \"sir\"."
            }
        }
    }

    /// Spoken when a command could not be understood or carried out.
    pub fn apology(&self, language: &str) -> &'static str {
        let lang = language.trim().to_ascii_lowercase();
        match (self, lang.as_str()) {
            (Persona::Jarvis, "hindi") => {
                "क्षमा कीजिए सर, उस अनुरोध को पूरा करने में समस्या हुई।"
            }
            (Persona::Alya, "hindi") => "माफ़ करना, कुछ गड़बड़ हो गई। फिर से कोशिश करें?",
            (Persona::Jarvis, "spanish") => {
                "Mis disculpas, señor. Hubo un problema al procesar esa solicitud."
            }
            (Persona::Alya, "spanish") => "Lo siento, algo salió mal. ¿Lo intentamos de nuevo?",
            (Persona::Jarvis, "french") => {
                "Toutes mes excuses, monsieur. Un problème est survenu avec cette demande."
            }
            (Persona::Alya, "french") => "Désolée, quelque chose s'est mal passé. On réessaie ?",
            (Persona::Jarvis, "german") => {
                "Verzeihung, Sir. Bei dieser Anfrage ist ein Problem aufgetreten."
            }
            (Persona::Alya, "german") => {
                "Sorry, da ist etwas schiefgelaufen. Versuchen wir es noch einmal?"
            }
            (Persona::Jarvis, _) => {
                "My apologies, sir. I encountered a problem processing that request."
            }
            (Persona::Alya, _) => "Sorry, something went wrong there. Could you try again?",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jarvis" | "j.a.r.v.i.s." => Some(Persona::Jarvis),
            "alya" | "alia" => Some(Persona::Alya),
            _ => None,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ambient state read from the host at the moment a command is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantContext {
    /// Path of the screen the user is on, e.g. "/dashboard".
    pub route: String,
    /// Full English language name, e.g. "English" or "Hindi".
    pub language: String,
    /// The learner's stated goal, if they set one.
    #[serde(default)]
    pub user_goal: Option<String>,
}

impl Default for AssistantContext {
    fn default() -> Self {
        Self {
            route: "/dashboard".to_string(),
            language: "English".to_string(),
            user_goal: None,
        }
    }
}
