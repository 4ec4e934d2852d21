//! The canonical résumé document and its mutation operations.
//!
//! All mutation goes through `ResumeDocument` methods so that two invariants hold
//! at every observable point: entry ids are unique within their collection, and
//! `skills` holds no duplicate value. Unknown ids are tolerated as no-ops.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::ids::IdGenerator;
use crate::model::update::{EntryKind, EntryUpdate, PersonalField};
use crate::model::DocumentError;
use crate::templates::TemplateId;

// ────────────────────────────────────────────────────────────────────────────
// Entities
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub website: String,
    #[serde(deserialize_with = "lenient_string")]
    pub linkedin: String,
    #[serde(deserialize_with = "lenient_string")]
    pub github: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub current: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub institution: String,
    #[serde(deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient_string")]
    pub field: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub gpa: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub technologies: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub github: String,
}

/// Common surface of the three entry collections.
pub trait Entry: Default {
    const KIND: EntryKind;
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

macro_rules! impl_entry {
    ($ty:ty, $kind:expr) => {
        impl Entry for $ty {
            const KIND: EntryKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

impl_entry!(Experience, EntryKind::Experience);
impl_entry!(Education, EntryKind::Education);
impl_entry!(Project, EntryKind::Project);

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// Unvalidated document content, as decoded from a stored blob.
///
/// Turned into a [`ResumeDocument`] by [`ResumeDocument::from_parts`], which
/// restores the skill and identifier invariants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentParts {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub skills: Vec<String>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub template: TemplateId,
}

/// The résumé being edited. Serializes to the camelCase content-blob shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    personal_info: PersonalInfo,
    summary: String,
    skills: Vec<String>,
    experiences: Vec<Experience>,
    education: Vec<Education>,
    projects: Vec<Project>,
    template: TemplateId,
}

impl ResumeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from decoded parts.
    ///
    /// Duplicate skills keep their first occurrence. Entries with a blank or
    /// repeated id get a fresh one from `ids`.
    pub fn from_parts(parts: DocumentParts, ids: &mut dyn IdGenerator) -> Self {
        let DocumentParts {
            personal_info,
            summary,
            skills,
            mut experiences,
            mut education,
            mut projects,
            template,
        } = parts;

        let mut seen = HashSet::new();
        let skill_count = skills.len();
        let skills: Vec<String> = skills
            .into_iter()
            .filter(|s| !s.trim().is_empty() && seen.insert(s.clone()))
            .collect();
        if skills.len() != skill_count {
            debug!(
                dropped = skill_count - skills.len(),
                "Dropped blank or duplicate skills"
            );
        }

        repair_ids(&mut experiences, ids);
        repair_ids(&mut education, ids);
        repair_ids(&mut projects, ids);

        Self {
            personal_info,
            summary,
            skills,
            experiences,
            education,
            projects,
            template,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn personal_info(&self) -> &PersonalInfo {
        &self.personal_info
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn experiences(&self) -> &[Experience] {
        &self.experiences
    }

    pub fn education(&self) -> &[Education] {
        &self.education
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    // ── Mutators ────────────────────────────────────────────────────────────

    pub fn set_personal_info(&mut self, field: PersonalField, value: impl Into<String>) {
        *field.slot(&mut self.personal_info) = value.into();
    }

    pub fn set_summary(&mut self, text: impl Into<String>) {
        self.summary = text.into();
    }

    /// Appends a skill. Blank or already-present (case-sensitive) skills are a no-op.
    ///
    /// Returns `true` when the skill was added.
    pub fn add_skill(&mut self, skill: &str) -> bool {
        let skill = skill.trim();
        if skill.is_empty() || self.skills.iter().any(|s| s == skill) {
            return false;
        }
        self.skills.push(skill.to_string());
        true
    }

    /// Removes a skill. Returns `true` when something was removed.
    pub fn remove_skill(&mut self, skill: &str) -> bool {
        let before = self.skills.len();
        self.skills.retain(|s| s != skill);
        self.skills.len() != before
    }

    /// Appends an empty entry of `kind` and returns its new id.
    ///
    /// A generated id that already exists in the collection is a broken
    /// generator; the document is left untouched and `IdCollision` is returned.
    pub fn add_entry(
        &mut self,
        kind: EntryKind,
        ids: &mut dyn IdGenerator,
    ) -> Result<String, DocumentError> {
        let id = ids.next_id();
        match kind {
            EntryKind::Experience => push_entry(&mut self.experiences, id),
            EntryKind::Education => push_entry(&mut self.education, id),
            EntryKind::Project => push_entry(&mut self.projects, id),
        }
    }

    /// Applies a typed update to the entry with `id`. Unknown ids are a no-op.
    ///
    /// Returns `true` when an entry was updated.
    pub fn update_entry(&mut self, id: &str, update: EntryUpdate) -> bool {
        let applied = match update {
            EntryUpdate::Experience(field) => find_mut(&mut self.experiences, id)
                .map(|entry| field.apply(entry))
                .is_some(),
            EntryUpdate::Education(field) => find_mut(&mut self.education, id)
                .map(|entry| field.apply(entry))
                .is_some(),
            EntryUpdate::Project(field) => find_mut(&mut self.projects, id)
                .map(|entry| field.apply(entry))
                .is_some(),
        };
        if !applied {
            debug!(entry_id = id, "update_entry: unknown id, ignoring");
        }
        applied
    }

    /// Removes the entry with `id` from the `kind` collection. Unknown ids are a no-op.
    pub fn remove_entry(&mut self, kind: EntryKind, id: &str) -> bool {
        let removed = match kind {
            EntryKind::Experience => remove_by_id(&mut self.experiences, id),
            EntryKind::Education => remove_by_id(&mut self.education, id),
            EntryKind::Project => remove_by_id(&mut self.projects, id),
        };
        if !removed {
            debug!(kind = %kind, entry_id = id, "remove_entry: unknown id, ignoring");
        }
        removed
    }

    pub fn set_template(&mut self, template: TemplateId) {
        self.template = template;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Collection helpers
// ────────────────────────────────────────────────────────────────────────────

fn position_of<T: Entry>(entries: &[T], id: &str) -> Option<usize> {
    entries.iter().position(|e| e.id() == id)
}

fn find_mut<'a, T: Entry>(entries: &'a mut [T], id: &str) -> Option<&'a mut T> {
    entries.iter_mut().find(|e| e.id() == id)
}

fn push_entry<T: Entry>(entries: &mut Vec<T>, id: String) -> Result<String, DocumentError> {
    if id.is_empty() || position_of(entries, &id).is_some() {
        return Err(DocumentError::IdCollision { kind: T::KIND, id });
    }
    let mut entry = T::default();
    entry.set_id(id.clone());
    entries.push(entry);
    Ok(id)
}

fn remove_by_id<T: Entry>(entries: &mut Vec<T>, id: &str) -> bool {
    match position_of(entries, id) {
        Some(idx) => {
            entries.remove(idx);
            true
        }
        None => false,
    }
}

/// Generator draws before falling back to a random UUID.
const MAX_REPAIR_ATTEMPTS: usize = 64;

fn repair_ids<T: Entry>(entries: &mut [T], ids: &mut dyn IdGenerator) {
    let mut seen: HashSet<String> = HashSet::with_capacity(entries.len());
    let taken: HashSet<String> = entries.iter().map(|e| e.id().to_string()).collect();

    for entry in entries.iter_mut() {
        if !entry.id().is_empty() && seen.insert(entry.id().to_string()) {
            continue;
        }
        let usable = |c: &String| !c.is_empty() && !taken.contains(c) && !seen.contains(c);
        let fresh = (0..MAX_REPAIR_ATTEMPTS)
            .map(|_| ids.next_id())
            .find(|c| usable(c))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        warn!(
            kind = %T::KIND,
            old_id = entry.id(),
            new_id = %fresh,
            "Re-assigned blank or duplicate entry id"
        );
        seen.insert(fresh.clone());
        entry.set_id(fresh);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Serde helpers
// ────────────────────────────────────────────────────────────────────────────

/// Treats an explicit `null` like an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts strings, numbers and booleans as text; `null` and structured values become "".
///
/// Older blobs stored numeric GPAs and timestamp ids as JSON numbers.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Accepts booleans and the strings `"true"`/`"false"`; anything else is `false`.
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// A list of text items; each item goes through [`lenient_string`] rules and blanks are dropped.
pub(crate) fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect())
}
