//! Recovers tool calls that a model wrote into its text reply instead of
//! using native tool calling, e.g.
//!
//! ```text
//! Let me check.
//! <tool_call>
//! {"name": "fetch_weather", "arguments": {"city": "Paris"}}
//! </tool_call>
//! ```

use crate::traits::ToolCall;
use serde_json::Value;

const TOOL_CALL_TAGS: &[(&str, &str)] = &[
    ("<tool_call>", "</tool_call>"),
    ("<function_call>", "</function_call>"),
];

pub fn contains_inline_tool_calls(text: &str) -> bool {
    TOOL_CALL_TAGS.iter().any(|(open, _)| text.contains(open))
}

/// Splits `text` into the prose around the tagged blocks and the calls found
/// inside them. An unterminated block is left in the prose.
pub fn parse_inline_tool_calls(text: &str) -> (String, Vec<ToolCall>) {
    let mut text_parts = Vec::new();
    let mut calls = Vec::new();
    let mut remaining = text;

    while let Some((start, open, close)) = find_first_tag(remaining) {
        let after_open = &remaining[start + open.len()..];
        let Some(close_idx) = after_open.find(close) else {
            break;
        };

        let before = remaining[..start].trim();
        if !before.is_empty() {
            text_parts.push(before.to_string());
        }

        for value in extract_json_objects(&after_open[..close_idx]) {
            if let Some(call) = tool_call_from_value(&value, calls.len()) {
                calls.push(call);
            }
        }

        remaining = &after_open[close_idx + close.len()..];
    }

    let rest = remaining.trim();
    if !rest.is_empty() {
        text_parts.push(rest.to_string());
    }

    (text_parts.join("\n"), calls)
}

fn find_first_tag(text: &str) -> Option<(usize, &'static str, &'static str)> {
    TOOL_CALL_TAGS
        .iter()
        .filter_map(|&(open, close)| text.find(open).map(|idx| (idx, open, close)))
        .min_by_key(|(idx, _, _)| *idx)
}

fn extract_json_objects(text: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0
                    && let Some(s) = start.take()
                    && let Ok(value) = serde_json::from_str::<Value>(&text[s..=i])
                {
                    values.push(value);
                }
            }
            _ => {}
        }
    }

    values
}

fn tool_call_from_value(value: &Value, index: usize) -> Option<ToolCall> {
    let name = value.get("name")?.as_str()?.to_string();
    let arguments = match value.get("arguments").or_else(|| value.get("parameters")) {
        None | Some(Value::Null) => "{}".to_string(),
        Some(Value::String(raw)) => raw.clone(),
        Some(other) => serde_json::to_string(other).ok()?,
    };

    let digest = md5::compute(format!("{}:{}:{}", index, name, arguments).as_bytes());

    Some(ToolCall {
        id: format!("call_{:x}", digest),
        name,
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_calls_and_keeps_prose() {
        let text = "Let me check.\n<tool_call>\n{\"name\": \"fetch_weather\", \"arguments\": {\"city\": \"Paris\"}}\n</tool_call>\nOne moment.";
        let (prose, calls) = parse_inline_tool_calls(text);

        assert_eq!(prose, "Let me check.\nOne moment.");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "fetch_weather");
        assert_eq!(calls[0].arguments, r#"{"city":"Paris"}"#);
        assert!(calls[0].id.starts_with("call_"));
    }

    #[test]
    fn multiple_calls_get_distinct_ids() {
        let text = r#"<tool_call>{"name":"ping","arguments":{}}</tool_call><function_call>{"name":"ping","arguments":{}}</function_call>"#;
        let (prose, calls) = parse_inline_tool_calls(text);

        assert!(prose.is_empty());
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].id, calls[1].id);
    }

    #[test]
    fn braces_and_escapes_inside_strings() {
        let text = r#"<tool_call>{"name":"echo","arguments":{"text":"a } \"b\" \\"}}</tool_call>"#;
        let (_, calls) = parse_inline_tool_calls(text);

        assert_eq!(calls.len(), 1);
        let args: Value = serde_json::from_str(&calls[0].arguments).unwrap();
        assert_eq!(args["text"], r#"a } "b" \"#);
    }

    #[test]
    fn string_arguments_pass_through() {
        let text = r#"<tool_call>{"name":"ping","arguments":"{\"x\":1}"}</tool_call>"#;
        let (_, calls) = parse_inline_tool_calls(text);
        assert_eq!(calls[0].arguments, r#"{"x":1}"#);
    }

    #[test]
    fn unterminated_block_stays_text() {
        let text = "before <tool_call>{\"name\":\"ping\"}";
        let (prose, calls) = parse_inline_tool_calls(text);
        assert!(calls.is_empty());
        assert_eq!(prose, text);
        assert!(contains_inline_tool_calls(text));
    }
}
