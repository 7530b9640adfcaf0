use thiserror::Error;

/// A completion that could not be repaired into a JSON object.
///
/// This is a recoverable condition for the engine: it resolves to a
/// fallback classification, never to partial data.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in completion")]
    MissingObject,

    #[error("extracted text is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Extract the JSON object embedded in a free-text LLM completion.
///
/// Models routinely wrap their JSON in a code fence or pad it with prose
/// ("Sure! Here's the classification: ..."), so the raw text is first
/// stripped of any fence marker, then sliced from the first `{` to the last
/// `}` before parsing.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, ParseError> {
    let mut text = raw.trim();

    if let Some(stripped) = text.strip_prefix("```") {
        // Drop an optional language tag on the fence line.
        let stripped = match stripped.find('\n') {
            Some(pos) => &stripped[pos + 1..],
            None => stripped,
        };
        text = stripped.strip_suffix("```").unwrap_or(stripped).trim();
    }

    let start = text.find('{').ok_or(ParseError::MissingObject)?;
    let end = text.rfind('}').ok_or(ParseError::MissingObject)?;
    if end < start {
        return Err(ParseError::MissingObject);
    }

    let value = serde_json::from_str(&text[start..=end])?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_object() {
        let v = extract_json(r#"{"category": "X"}"#).unwrap();
        assert_eq!(v["category"], "X");
    }

    #[test]
    fn fenced_with_language_tag() {
        let v = extract_json("```json\n{\"category\":\"X\"}\n```").unwrap();
        assert_eq!(v["category"], "X");
    }

    #[test]
    fn fenced_without_language_tag() {
        let v = extract_json("```\n{\"severity\":\"High\"}\n```").unwrap();
        assert_eq!(v["severity"], "High");
    }

    #[test]
    fn surrounded_by_prose() {
        let v = extract_json(r#"Sure! {"category":"X"} Hope that helps."#).unwrap();
        assert_eq!(v["category"], "X");
    }

    #[test]
    fn no_braces_fails() {
        assert!(matches!(
            extract_json("no braces here"),
            Err(ParseError::MissingObject)
        ));
    }

    #[test]
    fn reversed_braces_fail() {
        assert!(matches!(
            extract_json("} oops {"),
            Err(ParseError::MissingObject)
        ));
    }

    #[test]
    fn invalid_json_fails() {
        assert!(matches!(
            extract_json("{not valid json}"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn nested_object_slices_to_outermost_braces() {
        let v = extract_json(r#"prefix {"a": {"b": 1}} suffix"#).unwrap();
        assert_eq!(v["a"]["b"], 1);
    }
}
