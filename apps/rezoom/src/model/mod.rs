// Document Model: the résumé content, its typed updates and the editing session.

pub mod completeness;
pub mod document;
pub mod ids;
pub mod session;
pub mod update;

use thiserror::Error;

pub use completeness::{placeholder_report, PlaceholderReport};
pub use document::{
    DocumentParts, Education, Entry, Experience, PersonalInfo, Project, ResumeDocument,
};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use session::EditingSession;
pub use update::{
    EducationField, EntryKind, EntryUpdate, ExperienceField, PersonalField, ProjectField,
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Generated {kind} id '{id}' is already in use")]
    IdCollision { kind: EntryKind, id: String },

    #[error("Unknown {entity} field '{field}'")]
    UnknownField { entity: &'static str, field: String },

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("Unknown entry kind '{0}'")]
    UnknownEntryKind(String),

    #[error(transparent)]
    UnknownTemplate(#[from] crate::templates::UnknownTemplate),
}
