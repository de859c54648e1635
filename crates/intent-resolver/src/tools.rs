//! Auxiliary tools exposed to the intent service

use crate::resolver::{ToolCall, ToolSpec};
use serde_json::json;
use time::OffsetDateTime;

pub const GET_CURRENT_TIME: &str = "getCurrentTime";
pub const GENERAL_KNOWLEDGE: &str = "generalKnowledge";

pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: GET_CURRENT_TIME,
            description: "Get the current time for a location the user asked about.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "City or region, e.g. \"Mumbai\"."}
                },
                "required": ["location"]
            }),
        },
        ToolSpec {
            name: GENERAL_KNOWLEDGE,
            description: "Use for factual or general questions that need no app action.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string"}
                },
                "required": ["question"]
            }),
        },
    ]
}

/// Run a tool requested by the intent service and return its textual result.
pub fn invoke(call: &ToolCall) -> String {
    let arg = |key: &str| {
        call.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    match call.name.as_str() {
        GET_CURRENT_TIME => current_time(&arg("location")),
        GENERAL_KNOWLEDGE => general_knowledge(&arg("question")),
        other => {
            tracing::warn!(tool = other, "intent service requested an unknown tool");
            format!("Tool \"{}\" is not available. Answer without it.", other)
        }
    }
}

pub fn current_time(location: &str) -> String {
    current_time_at(location, OffsetDateTime::now_utc())
}

fn current_time_at(location: &str, now: OffsetDateTime) -> String {
    let place = if location.trim().is_empty() {
        "the user's location"
    } else {
        location.trim()
    };
    format!(
        "The current UTC time is {:02}:{:02} on {}-{:02}-{:02}. Convert it to the local time in {} when you answer.",
        now.hour(),
        now.minute(),
        now.year(),
        u8::from(now.month()),
        now.day(),
        place
    )
}

/// Marker result only. The intent service writes the actual answer into
/// `verbalResponse` of its next message; no lookup happens here.
pub fn general_knowledge(question: &str) -> String {
    format!(
        "Answer the question \"{}\" from your own knowledge. Reply with kind \"chat\" and put the answer in verbalResponse.",
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month};

    #[test]
    fn test_current_time_formats_location() {
        let now = Date::from_calendar_date(2026, Month::October, 16)
            .unwrap()
            .with_hms(9, 5, 0)
            .unwrap()
            .assume_utc();
        let out = current_time_at("Pune", now);
        assert!(out.contains("09:05"));
        assert!(out.contains("2026-10-16"));
        assert!(out.contains("Pune"));
    }

    #[test]
    fn test_invoke_dispatches_by_name() {
        let call = ToolCall {
            id: "call_1".into(),
            name: GENERAL_KNOWLEDGE.into(),
            arguments: json!({"question": "Who wrote Gitanjali?"}),
        };
        assert!(invoke(&call).contains("Who wrote Gitanjali?"));

        let call = ToolCall {
            id: "call_2".into(),
            name: "launchRockets".into(),
            arguments: json!({}),
        };
        assert!(invoke(&call).contains("not available"));
    }
}
