use serde_json::{Map, Value};

use super::lang::Lang;
use crate::pinecone::ScoredVector;

const MISSING: &str = "N/A";

/// A retrieved verse with the fields the prompt needs, pulled out of index metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub score: f32,
    pub chapter: String,
    pub verse: String,
    pub sanskrit: String,
    pub hindi: String,
    pub english: String,
}

impl Passage {
    pub fn from_match(hit: &ScoredVector) -> Self {
        let meta = &hit.metadata;
        Self {
            score: hit.score,
            chapter: first_field(meta, &["chapter_number", "chapter"])
                .unwrap_or_else(|| MISSING.to_string()),
            verse: first_field(meta, &["verse", "verse_number"])
                .unwrap_or_else(|| MISSING.to_string()),
            sanskrit: first_field(meta, &["sanskrit"]).unwrap_or_default(),
            hindi: first_field(meta, &["hindi"]).unwrap_or_default(),
            english: first_field(meta, &["english", "translation", "text"]).unwrap_or_default(),
        }
    }

    /// Meaning in the requested language; Hindi falls back to the default field when absent.
    pub fn meaning(&self, lang: Lang) -> &str {
        match lang {
            Lang::Hi if !self.hindi.is_empty() => &self.hindi,
            _ => &self.english,
        }
    }
}

fn first_field(meta: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| meta.get(*key))
        .find_map(value_text)
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && n.is_f64() => format!("{}", f as i64),
            _ => n.to_string(),
        },
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
