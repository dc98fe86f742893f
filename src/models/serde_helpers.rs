//! Custom serde helpers for host-supplied values.
//!
//! Hosts and hand-written config files are loose about JSON types: a port
//! arrives as `18944` or `"18944"`, a switch as `true` or `"true"`. These
//! deserializers accept both forms and normalise them to what the
//! dispatcher stores.

use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrText {
    Bool(bool),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Deserializes a boolean given either as a JSON boolean or as text.
///
/// # Examples
/// ```text
/// true      -> true
/// "False"   -> false
/// "yes"     -> error
/// ```
pub fn lenient_bool<'a, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    match BoolOrText::deserialize(deserializer)? {
        BoolOrText::Bool(b) => Ok(b),
        BoolOrText::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(D::Error::custom(format!(
                "expected true or false, found '{}'",
                s
            ))),
        },
    }
}

/// Deserializes a text value, accepting JSON numbers as their decimal form.
///
/// # Examples
/// ```text
/// "127.0.0.1" -> "127.0.0.1"
/// 18944       -> "18944"
/// 29.97       -> "29.97"
/// ```
pub fn text_or_number<'a, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'a>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Integer(n) => n.to_string(),
        TextOrNumber::Float(f) => f.to_string(),
    })
}

/// `skip_serializing_if` predicate for a field's enumeration elements.
pub fn no_elements(elements: &&'static [&'static str]) -> bool {
    elements.is_empty()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use test_casing::test_casing;

    use super::{lenient_bool, text_or_number};

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "lenient_bool")]
        flag: bool,
        #[serde(deserialize_with = "text_or_number")]
        text: String,
    }

    const ACCEPTED: [(&str, bool, &str); 4] = [
        (r#"{"flag": true, "text": "127.0.0.1"}"#, true, "127.0.0.1"),
        (r#"{"flag": "FALSE", "text": 18944}"#, false, "18944"),
        (r#"{"flag": " true ", "text": 29.97}"#, true, "29.97"),
        (r#"{"flag": false, "text": ""}"#, false, ""),
    ];

    #[test_casing(4, ACCEPTED)]
    fn accepts_loose_json_types(json: &str, flag: bool, text: &str) {
        let probe: Probe = serde_json::from_str(json).expect("should parse");
        assert_eq!(probe.flag, flag);
        assert_eq!(probe.text, text);
    }

    #[test]
    fn rejects_non_boolean_text() {
        let parsed = serde_json::from_str::<Probe>(r#"{"flag": "yes", "text": "x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_structured_text() {
        let parsed = serde_json::from_str::<Probe>(r#"{"flag": true, "text": ["a"]}"#);
        assert!(parsed.is_err());
    }
}
