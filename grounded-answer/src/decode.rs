//! Lenient JSON extraction from model output.
//!
//! Models are asked for a bare JSON object but sometimes wrap it in prose or
//! code fences. The fallback takes the span from the first `{` to the last `}`.
//! It is not brace-balanced: output holding several JSON-like fragments will
//! produce a span that covers all of them and usually fails to parse.

use serde::de::DeserializeOwned;

/// Parses one JSON object out of `raw`.
///
/// On failure of both the direct parse and the brace fallback, the error of
/// the attempt that decided the outcome is returned.
///
/// # Example
/// ```
/// # use grounded_answer::decode_json;
/// let v: serde_json::Value = decode_json("noise {\"a\":1} noise").unwrap();
/// assert_eq!(v["a"], 1);
/// ```
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let trimmed = raw.trim();
    let err = match serde_json::from_str(trimmed) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return Err(err);
    };
    if end <= start {
        return Err(err);
    }
    serde_json::from_str(&trimmed[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{Value, json};

    #[derive(Debug, Deserialize, PartialEq)]
    struct A {
        a: i64,
    }

    #[test]
    fn parses_direct_object() {
        let v: A = decode_json("{\"a\":1}").unwrap();
        assert_eq!(v, A { a: 1 });
    }

    #[test]
    fn extracts_object_from_surrounding_noise() {
        let v: A = decode_json("noise {\"a\":1} noise").unwrap();
        assert_eq!(v, A { a: 1 });

        let fenced = "```json\n{\"a\": {\"b\": [1, 2]}}\n```";
        let v: Value = decode_json(fenced).unwrap();
        assert_eq!(v, json!({"a": {"b": [1, 2]}}));
    }

    #[test]
    fn rejects_text_without_braces() {
        assert!(decode_json::<Value>("not json at all").is_err());
        assert!(decode_json::<Value>("   ").is_err());
    }

    #[test]
    fn rejects_closing_brace_before_opening() {
        assert!(decode_json::<Value>("} nothing here {").is_err());
    }

    #[test]
    fn two_fragments_are_not_separated() {
        assert!(decode_json::<Value>("{\"a\":1} and then {\"b\":2}").is_err());
    }
}
