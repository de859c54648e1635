//! Action schema validation
//!
//! Turns the raw `{kind, params, verbalResponse}` object into a typed
//! [`Action`], filling documented defaults. Unknown kinds are accepted as
//! [`Command::Unsupported`] so the reply can still be spoken.

use crate::actions::{
    Action, ActionKind, CollegeNotesRequest, Command, ContentType, Dialog, Difficulty, NewsQuery,
    Params, Route, TestRequest, Theme,
};
use crate::SchemaError;
use serde_json::Value;

type Result<T> = core::result::Result<T, SchemaError>;

pub fn validate(raw: &Value) -> Result<Action> {
    let obj = raw.as_object().ok_or(SchemaError::NotAnObject)?;

    let kind_name = obj
        .get("kind")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SchemaError::MissingKind)?;

    let verbal_response = obj
        .get("verbalResponse")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SchemaError::MissingVerbalResponse)?
        .to_string();

    let params = match obj.get("params") {
        None | Some(Value::Null) => Params::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(SchemaError::ParamsNotObject),
    };

    let command = match ActionKind::from_name(kind_name) {
        Some(kind) => build_command(kind, &params)?,
        None => {
            tracing::debug!(kind = kind_name, "intent service produced an unsupported kind");
            Command::Unsupported {
                kind: kind_name.to_string(),
            }
        }
    };

    Ok(Action {
        command,
        params,
        verbal_response,
    })
}

fn build_command(kind: ActionKind, params: &Params) -> Result<Command> {
    let p = ParamReader { kind, params };
    let command = match kind {
        ActionKind::Navigate => {
            let target = p.required_str("target")?;
            let route = Route::from_target(&target)
                .ok_or_else(|| p.invalid("target", format!("\"{}\" is not a known route", target)))?;
            Command::Navigate { route }
        }
        ActionKind::GenerateNotes => Command::GenerateNotes {
            topic: p.optional_str("topic"),
        },
        ActionKind::GenerateTest => Command::GenerateTest(test_request(&p)?),
        ActionKind::GenerateCollegeNotes => Command::GenerateCollegeNotes(CollegeNotesRequest {
            university: p.required_str("university")?,
            semester: p.required_str("semester")?,
            branch: p.required_str("branch")?,
            subject: p.required_str("subject")?,
            unit: p.required_str("unit")?,
        }),
        ActionKind::ReadNews => Command::ReadNews(NewsQuery {
            category: p
                .optional_str("category")
                .unwrap_or_else(|| NewsQuery::default().category),
            country: p.optional_str("country"),
            query: p.optional_str("query"),
            language: p.optional_str("language"),
            state_or_region: p.optional_str("stateOrRegion"),
            city: p.optional_str("city"),
        }),
        ActionKind::SearchYoutube => Command::SearchYoutube {
            query: p.required_str("query")?,
        },
        ActionKind::SearchBooks => Command::SearchBooks {
            query: p.required_str("query")?,
        },
        ActionKind::SwitchTab => Command::SwitchTab {
            tab: p.required_str("tab")?,
        },
        ActionKind::ChangeTheme => {
            let theme = p.required_str("theme")?;
            Command::ChangeTheme {
                theme: Theme::from_name(&theme)
                    .ok_or_else(|| p.invalid("theme", "expected light, dark or system"))?,
            }
        }
        ActionKind::ChangeLanguage => Command::ChangeLanguage {
            language: p.required_str("language")?,
        },
        ActionKind::SpeakText => Command::SpeakText {
            content: p.content_type()?,
        },
        ActionKind::ReadQuests => Command::ReadQuests {
            content: match p.optional_str("contentType") {
                None => ContentType::DailyQuests,
                Some(_) => p.content_type()?,
            },
        },
        ActionKind::OpenRecentTopic => Command::OpenRecentTopic {
            topic: p.optional_str("topic"),
        },
        ActionKind::SelectQuizAnswer => Command::SelectQuizAnswer(params.clone()),
        ActionKind::ArcadeGuess => Command::ArcadeGuess(params.clone()),
        ActionKind::ArcadeHint => Command::ArcadeHint(params.clone()),
        ActionKind::ArcadeRestart => Command::ArcadeRestart(params.clone()),
        ActionKind::Logout => Command::Logout,
        ActionKind::OpenTerminal => Command::OpenTerminal,
        ActionKind::CloseTerminal => Command::CloseTerminal,
        ActionKind::ClearTerminal => Command::ClearTerminal,
        ActionKind::OpenDialog => {
            let dialog = p.required_str("dialog")?;
            Command::OpenDialog {
                dialog: Dialog::from_name(&dialog)
                    .ok_or_else(|| p.invalid("dialog", "expected calculator or arcade"))?,
            }
        }
        ActionKind::TypeText => Command::TypeText {
            target_id: p.required_str("targetId")?,
            text: p.required_str("text")?,
        },
        ActionKind::Chat => Command::Chat {
            is_wake_word: p.optional_bool("isWakeWord").unwrap_or(false),
        },
    };
    Ok(command)
}

fn test_request(p: &ParamReader<'_>) -> Result<TestRequest> {
    let num_questions = match p.optional_u32("numQuestions")? {
        None => TestRequest::DEFAULT_QUESTIONS,
        Some(n) => {
            let clamped = n.clamp(1, u32::from(TestRequest::MAX_QUESTIONS));
            if clamped != n {
                tracing::warn!(requested = n, clamped, "numQuestions out of range");
            }
            // clamped to 1..=50 above
            u8::try_from(clamped).unwrap_or(TestRequest::MAX_QUESTIONS)
        }
    };
    let difficulty = match p.optional_str("difficulty") {
        None => Difficulty::default(),
        Some(d) => Difficulty::from_name(&d)
            .ok_or_else(|| p.invalid("difficulty", "expected easy, medium or hard"))?,
    };
    Ok(TestRequest {
        topic: p.optional_str("topic"),
        num_questions,
        difficulty,
        timer_minutes: p.optional_u32("timer")?,
    })
}

struct ParamReader<'a> {
    kind: ActionKind,
    params: &'a Params,
}

impl ParamReader<'_> {
    fn invalid(&self, param: &'static str, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidParam {
            kind: self.kind,
            param,
            reason: reason.into(),
        }
    }

    /// Strings and numbers are both accepted; models often emit `"semester": 5`.
    fn optional_str(&self, key: &str) -> Option<String> {
        match self.params.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn required_str(&self, key: &'static str) -> Result<String> {
        self.optional_str(key).ok_or(SchemaError::MissingParam {
            kind: self.kind,
            param: key,
        })
    }

    fn optional_u32(&self, key: &'static str) -> Result<Option<u32>> {
        let value = match self.params.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(v) => v,
        };
        let parsed = match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| self.invalid(key, "expected a non-negative integer"))
    }

    fn optional_bool(&self, key: &str) -> Option<bool> {
        match self.params.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn content_type(&self) -> Result<ContentType> {
        let raw = self.required_str("contentType")?;
        ContentType::from_name(&raw).ok_or_else(|| {
            self.invalid(
                "contentType",
                format!("\"{}\" is not a readable content type", raw),
            )
        })
    }
}
