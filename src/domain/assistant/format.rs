//! Heuristics for replies that read like raw data instead of prose.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static BARE_STRUCTURAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[\s\d.,:;{}\[\]()"'+\-/%|=]+$"#).expect("valid regex"));

static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]+`").expect("valid regex"));

static EMBEDDED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\s*"[^"\n]+"\s*:[^}]*\}"#).expect("valid regex"));

static EMBEDDED_ARRAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[\s*(?:"[^"\n]*"|-?\d+(?:\.\d+)?)\s*(?:,\s*(?:"[^"\n]*"|-?\d+(?:\.\d+)?)\s*)+\]"#)
        .expect("valid regex")
});

/// Keys a model tends to wrap its actual answer in.
const REPLY_KEYS: &[&str] = &["reply", "response", "message", "text", "answer"];

/// Whether `text` looks like structured output rather than conversation.
pub fn is_technical_looking(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    parse_structured(trimmed).is_some()
        || BARE_STRUCTURAL.is_match(trimmed)
        || trimmed.contains("```")
        || INLINE_CODE.is_match(trimmed)
        || EMBEDDED_OBJECT.is_match(trimmed)
        || EMBEDDED_ARRAY.is_match(trimmed)
}

/// Parses `text` when the whole of it is a JSON object or array.
pub fn parse_structured(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(v @ (Value::Object(_) | Value::Array(_))) => Some(v),
        _ => None,
    }
}

/// Turns a structured value into a sentence without another backend call.
///
/// Prefers a conversational field when present, otherwise lists the
/// top-level scalar fields as "Key: value".
pub fn humanize_structured(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            for key in REPLY_KEYS {
                if let Some(Value::String(s)) = map.get(*key) {
                    if !s.trim().is_empty() {
                        return Some(s.trim().to_string());
                    }
                }
            }
            summarize_fields(map)
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(format!("Here's what I found: {}.", parts.join(", ")))
            }
        }
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn summarize_fields(map: &Map<String, Value>) -> Option<String> {
    let parts: Vec<String> = map
        .iter()
        .filter_map(|(k, v)| scalar_text(v).map(|t| format!("{}: {}", label(k), t)))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(format!("Here's what I found. {}.", parts.join(", ")))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "yes" } else { "no" }.to_string()),
        _ => None,
    }
}

fn label(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Prompt asking the backend to restate a technical reply as prose.
pub fn rewrite_prompt(question: &str, draft: &str) -> String {
    format!(
        "The user asked: \"{}\"\n\n\
         A draft answer was produced, but it looks like raw data or code:\n\
         {}\n\n\
         Rewrite it into a single friendly, concise, human-readable reply to the user's question. \
         Do NOT include any code blocks, JSON, brackets or key/value lists. \
         Keep every number, date and name from the draft. \
         Reply with the rewritten text only.",
        question.trim(),
        draft.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_object_is_technical() {
        assert!(is_technical_looking(r#"{"attendance_rate": 92}"#));
        assert!(is_technical_looking("[1, 2, 3]"));
    }

    #[test]
    fn plain_sentence_is_not_technical() {
        assert!(!is_technical_looking("Your rate is 92%."));
        assert!(!is_technical_looking(
            "You were absent twice this month (on Monday and Friday). Keep it up!"
        ));
        assert!(!is_technical_looking(""));
    }

    #[test]
    fn bare_numbers_are_technical() {
        assert!(is_technical_looking("92"));
        assert!(is_technical_looking("23, 2, 92.0"));
    }

    #[test]
    fn code_markers_are_technical() {
        assert!(is_technical_looking("Here:\n```\nSELECT 1\n```"));
        assert!(is_technical_looking("Use `attendance_rate` to check."));
    }

    #[test]
    fn embedded_structures_are_technical() {
        assert!(is_technical_looking(r#"Result: {"present": 23, "absent": 2}"#));
        assert!(is_technical_looking(r#"Your classes are ["Math", "Physics"]"#));
    }

    #[test]
    fn bracketed_prose_is_not_technical() {
        assert!(!is_technical_looking("See the schedule [updated weekly] for details."));
    }

    #[test]
    fn humanize_prefers_reply_keys() {
        let v = json!({"answer": "You have 3 absences.", "extra": 1});
        assert_eq!(humanize_structured(&v).as_deref(), Some("You have 3 absences."));
    }

    #[test]
    fn humanize_summarizes_scalars() {
        let v = json!({"attendance_rate": 92, "risk": "good", "records": []});
        assert_eq!(
            humanize_structured(&v).as_deref(),
            Some("Here's what I found. Attendance rate: 92, Risk: good.")
        );
    }

    #[test]
    fn humanize_gives_up_on_nested_only() {
        assert_eq!(humanize_structured(&json!({"records": [{"a": 1}]})), None);
    }

    #[test]
    fn rewrite_prompt_frames_question() {
        let p = rewrite_prompt(" rate? ", r#"{"attendance_rate": 92}"#);
        assert!(p.starts_with("The user asked: \"rate?\""));
        assert!(p.contains(r#"{"attendance_rate": 92}"#));
    }
}
