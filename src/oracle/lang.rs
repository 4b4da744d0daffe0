use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Answer language. Anything other than `hi` falls back to English.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    En,
    Hi,
}

impl Lang {
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("hi") {
            Lang::Hi
        } else {
            Lang::En
        }
    }

    /// Language name as used in prompt instructions.
    pub fn name(self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::Hi => "Hindi",
        }
    }
}

/// Lenient `deserialize_with` helper: any JSON value is accepted, and only the string
/// `"hi"` selects Hindi. Numbers, null, objects and unknown codes mean English.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Lang, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(code) => Lang::from_code(&code),
        _ => Lang::En,
    })
}
