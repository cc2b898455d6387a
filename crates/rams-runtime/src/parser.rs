//! Recovery of a JSON object from LLM text.
//!
//! Models asked for JSON still wrap it in markdown fences or surround it with
//! prose. The parser strips fences, tries a direct parse, then falls back to
//! the span between the first `{` and the last `}`. Nothing else is repaired.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// The provider reply could not be read as a JSON object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed LLM output: {reason}")]
pub struct MalformedOutput {
    pub reason: String,
}

impl MalformedOutput {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Parse the first JSON object out of a model reply.
pub fn parse_json(raw: &str) -> Result<Map<String, JsonValue>, MalformedOutput> {
    let text = strip_fences(raw);
    if text.is_empty() {
        return Err(MalformedOutput::new("empty response"));
    }

    let value = match serde_json::from_str::<JsonValue>(text) {
        Ok(value) => value,
        Err(direct) => {
            let candidate = object_span(text).ok_or_else(|| {
                MalformedOutput::new(format!("no JSON object found ({})", direct))
            })?;
            serde_json::from_str::<JsonValue>(candidate)
                .map_err(|e| MalformedOutput::new(format!("invalid JSON object: {}", e)))?
        }
    };

    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(MalformedOutput::new(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Remove a leading ```` ``` ```` / ```` ```json ```` line and a trailing fence.
fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let map = parse_json(r#"{"steps": []}"#).unwrap();
        assert!(map.contains_key("steps"));
    }

    #[test]
    fn test_fenced_object() {
        let raw = "```json\n{\"steps\": [{\"step_number\": 1}]}\n```";
        let map = parse_json(raw).unwrap();
        assert_eq!(map["steps"][0]["step_number"], 1);

        let bare_fence = "```\n{\"a\": 1}\n```\n";
        assert_eq!(parse_json(bare_fence).unwrap()["a"], 1);
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let raw = "Here is the analysis you asked for:\n{\"steps\": []}\nLet me know if you need more.";
        let map = parse_json(raw).unwrap();
        assert!(map["steps"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_prose_only_is_malformed() {
        let err = parse_json("I'm sorry, I cannot analyse this procedure.").unwrap_err();
        assert!(err.reason.contains("no JSON object"));
    }

    #[test]
    fn test_array_is_malformed() {
        let err = parse_json("[1, 2, 3]").unwrap_err();
        assert!(err.reason.contains("an array"));
    }

    #[test]
    fn test_empty_is_malformed() {
        assert!(parse_json("   ").is_err());
        assert!(parse_json("```json\n```").is_err());
    }

    #[test]
    fn test_broken_span_is_malformed() {
        let err = parse_json("result: {\"steps\": [} done").unwrap_err();
        assert!(err.reason.contains("invalid JSON object"));
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn recovers_object_from_prose_and_fences(
                key in "[a-z_]{1,12}",
                number in 0u32..10_000,
                prefix in "[A-Za-z ,.:]{0,40}",
                suffix in "[A-Za-z ,.:]{0,40}",
                fenced in any::<bool>(),
            ) {
                let mut object = Map::new();
                object.insert(key.clone(), JsonValue::from(number));
                let body = JsonValue::Object(object).to_string();
                let raw = if fenced {
                    format!("```json\n{}\n```", body)
                } else {
                    format!("{}{}{}", prefix, body, suffix)
                };

                let map = parse_json(&raw).unwrap();
                prop_assert_eq!(map[&key].as_u64(), Some(number as u64));
            }
        }
    }
}
