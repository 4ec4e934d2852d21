//! Content-blob codec.
//!
//! # Rules
//! - The blob is the camelCase JSON form of the document.
//! - Every top-level field decodes on its own; a malformed field falls back to its
//!   default with a warning instead of failing the whole load.
//! - Collections decode per element: a malformed entry is dropped, its siblings survive.
//! - A blob that is not a JSON object yields an empty document.
//! - A missing or unknown `template` resolves to the default template.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{DocumentParts, IdGenerator, PersonalInfo, ResumeDocument};

/// Title used when the document has no name at all.
pub const UNTITLED: &str = "Untitled Resume";

/// Serializes the document to its opaque text-blob form.
pub fn encode_document(doc: &ResumeDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string(doc)
}

/// Decodes a content blob, defaulting anything missing or malformed.
pub fn decode_document(blob: &str, ids: &mut dyn IdGenerator) -> ResumeDocument {
    let parts = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(map)) => decode_parts(&map),
        Ok(Value::Null) => DocumentParts::default(),
        Ok(other) => {
            warn!(kind = json_kind(&other), "Content blob is not an object; using empty document");
            DocumentParts::default()
        }
        Err(e) => {
            if !blob.trim().is_empty() {
                warn!("Content blob is not valid JSON ({e}); using empty document");
            }
            DocumentParts::default()
        }
    };
    ResumeDocument::from_parts(parts, ids)
}

fn decode_parts(map: &Map<String, Value>) -> DocumentParts {
    DocumentParts {
        personal_info: field(map, "personalInfo"),
        summary: field(map, "summary"),
        skills: entries(map, "skills"),
        experiences: entries(map, "experiences"),
        education: entries(map, "education"),
        projects: entries(map, "projects"),
        template: field(map, "template"),
    }
}

fn field<T: DeserializeOwned + Default>(map: &Map<String, Value>, key: &str) -> T {
    match map.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => T::deserialize(value).unwrap_or_else(|e| {
            warn!(field = key, "Malformed field in content blob ({e}); using default");
            T::default()
        }),
    }
}

fn entries<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Vec<T> {
    let items = match map.get(key) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(field = key, kind = json_kind(other), "Expected a list in content blob; using empty");
            return Vec::new();
        }
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(field = key, index, "Dropping malformed entry in content blob ({e})");
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Display title for a remote record: `"{first} {last}'s Resume"`.
pub fn record_title(info: &PersonalInfo) -> String {
    let name = [info.first_name.trim(), info.last_name.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        UNTITLED.to_string()
    } else {
        format!("{name}'s Resume")
    }
}
