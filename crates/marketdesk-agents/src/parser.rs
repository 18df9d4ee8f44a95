use serde_json::Value;

use crate::error::AgentError;

/// Extract the first JSON object from an LLM reply.
///
/// Accepts a bare object, an object inside a fenced markdown block
/// (```` ```json ```` or a plain fence), or an object embedded in prose.
pub fn extract_json(text: &str) -> Result<String, AgentError> {
    let trimmed = text.trim();

    let candidates = [
        trimmed.starts_with('{').then(|| trimmed.to_string()),
        fenced_block(trimmed),
        first_embedded_object(trimmed),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|candidate| is_json_object(candidate))
        .ok_or_else(|| {
            AgentError::Parse(format!(
                "No valid JSON object found in response (length={})",
                text.len()
            ))
        })
}

/// Parse the first JSON object in an LLM reply.
pub fn parse_json_reply(raw: &str) -> Result<Value, AgentError> {
    let json_str = extract_json(raw)?;
    serde_json::from_str(&json_str)
        .map_err(|e| AgentError::Parse(format!("Failed to parse LLM JSON: {e}")))
}

/// Structured analysis from an agent reply. Prose without any JSON object is
/// kept as `{"summary": <text>}`.
pub fn analysis_from_reply(raw: &str) -> Value {
    parse_json_reply(raw).unwrap_or_else(|_| serde_json::json!({ "summary": raw.trim() }))
}

fn is_json_object(text: &str) -> bool {
    matches!(serde_json::from_str::<Value>(text), Ok(Value::Object(_)))
}

/// Body of the first fenced code block, with an optional language tag.
fn fenced_block(text: &str) -> Option<String> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let info = after_fence[..body_start].trim();
    if !(info.is_empty() || info.eq_ignore_ascii_case("json")) {
        return None;
    }
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim().to_string())
}

/// The first `{` in the text that opens a complete JSON object. Braces and
/// quotes in surrounding prose are skipped over.
fn first_embedded_object(text: &str) -> Option<String> {
    text.match_indices('{').find_map(|(start, _)| {
        let tail = &text[start..];
        let mut stream = serde_json::Deserializer::from_str(tail).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(_))) => Some(tail[..stream.byte_offset()].to_string()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object() {
        let input = r#"{"signal": "bullish", "confidence": 0.7}"#;
        assert_eq!(extract_json(input).unwrap(), input);
    }

    #[test]
    fn fenced_json_block() {
        let input = "Analysis follows.\n```json\n{\"signal\": \"neutral\"}\n```\nThanks.";
        assert_eq!(extract_json(input).unwrap(), r#"{"signal": "neutral"}"#);
    }

    #[test]
    fn fenced_block_without_language() {
        let input = "```\n{\"signal\": \"bearish\"}\n```";
        assert_eq!(extract_json(input).unwrap(), r#"{"signal": "bearish"}"#);
    }

    #[test]
    fn object_after_prose() {
        let input = "Here is my view on AAPL:\n{\"summary\": \"range-bound\", \"risks\": [\"earnings\"]} hope it helps";
        let value: Value = serde_json::from_str(&extract_json(input).unwrap()).unwrap();
        assert_eq!(value["summary"], "range-bound");
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let input = r#"Result: {"summary": "broke out of the {150, 160} box", "confidence": 0.5}"#;
        let value: Value = serde_json::from_str(&extract_json(input).unwrap()).unwrap();
        assert_eq!(value["confidence"], 0.5);
    }

    #[test]
    fn braces_in_prose_before_object() {
        let input = r#"Trading range {150-160} held. Result: {"signal": "bullish"}"#;
        assert_eq!(extract_json(input).unwrap(), r#"{"signal": "bullish"}"#);
    }

    #[test]
    fn stray_quote_in_prose_before_object() {
        let input = r#"He said "buy the dip. {"signal": "bullish"}"#;
        assert_eq!(extract_json(input).unwrap(), r#"{"signal": "bullish"}"#);
    }

    #[test]
    fn arrays_and_prose_are_not_objects() {
        assert!(extract_json("[1, 2, 3]").is_err());
        assert!(extract_json("No structured output today.").is_err());
        assert!(extract_json("unbalanced { \"a\": 1").is_err());
    }

    #[test]
    fn parse_reply_from_markdown() {
        let input = r#"```json
{
    "summary": "Momentum is improving",
    "signal": "bullish",
    "confidence": 0.72,
    "keyPoints": ["RSI recovering from 35"]
}
```"#;

        let value = parse_json_reply(input).unwrap();
        assert_eq!(value["signal"], "bullish");
        assert_eq!(value["keyPoints"][0], "RSI recovering from 35");
    }

    #[test]
    fn prose_reply_becomes_summary() {
        let value = analysis_from_reply("  The stock looks fairly valued.\n");
        assert_eq!(value, serde_json::json!({"summary": "The stock looks fairly valued."}));
    }
}
