//! Typed field updates for personal info and collection entries.
//!
//! Each entity kind has its own field enum carrying a typed payload, so an update
//! can never target a field the entity does not have.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::document::{Education, Experience, PersonalInfo, Project};
use crate::model::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Experience,
    Education,
    Project,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Experience => "experience",
            EntryKind::Education => "education",
            EntryKind::Project => "project",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "experience" | "experiences" => Ok(EntryKind::Experience),
            "education" => Ok(EntryKind::Education),
            "project" | "projects" => Ok(EntryKind::Project),
            other => Err(DocumentError::UnknownEntryKind(other.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Personal info
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalField {
    FirstName,
    LastName,
    Email,
    Phone,
    Location,
    Website,
    Linkedin,
    Github,
}

impl PersonalField {
    pub(crate) fn slot(self, info: &mut PersonalInfo) -> &mut String {
        match self {
            PersonalField::FirstName => &mut info.first_name,
            PersonalField::LastName => &mut info.last_name,
            PersonalField::Email => &mut info.email,
            PersonalField::Phone => &mut info.phone,
            PersonalField::Location => &mut info.location,
            PersonalField::Website => &mut info.website,
            PersonalField::Linkedin => &mut info.linkedin,
            PersonalField::Github => &mut info.github,
        }
    }
}

impl FromStr for PersonalField {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match normalize(s).as_str() {
            "firstname" => PersonalField::FirstName,
            "lastname" => PersonalField::LastName,
            "email" => PersonalField::Email,
            "phone" => PersonalField::Phone,
            "location" => PersonalField::Location,
            "website" => PersonalField::Website,
            "linkedin" => PersonalField::Linkedin,
            "github" => PersonalField::Github,
            _ => {
                return Err(DocumentError::UnknownField {
                    entity: "personal_info",
                    field: s.to_string(),
                })
            }
        };
        Ok(field)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry updates
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ExperienceField {
    Company(String),
    Position(String),
    StartDate(String),
    EndDate(String),
    Current(bool),
    Description(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EducationField {
    Institution(String),
    Degree(String),
    Field(String),
    StartDate(String),
    EndDate(String),
    Gpa(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectField {
    Name(String),
    Description(String),
    Technologies(Vec<String>),
    Url(String),
    Github(String),
}

/// A single field update addressed to one entry. The variant selects the collection.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryUpdate {
    Experience(ExperienceField),
    Education(EducationField),
    Project(ProjectField),
}

impl EntryUpdate {
    /// Builds a typed update from a field name and a textual value.
    ///
    /// `current` accepts `true`/`false`/`yes`/`no`/`1`/`0`; `technologies` is a
    /// comma-separated list.
    pub fn parse(kind: EntryKind, field: &str, value: &str) -> Result<Self, DocumentError> {
        let text = value.to_string();
        let unknown = || DocumentError::UnknownField {
            entity: kind.as_str(),
            field: field.to_string(),
        };

        let update = match kind {
            EntryKind::Experience => EntryUpdate::Experience(match normalize(field).as_str() {
                "company" => ExperienceField::Company(text),
                "position" => ExperienceField::Position(text),
                "startdate" => ExperienceField::StartDate(text),
                "enddate" => ExperienceField::EndDate(text),
                "current" => ExperienceField::Current(parse_flag(value)?),
                "description" => ExperienceField::Description(text),
                _ => return Err(unknown()),
            }),
            EntryKind::Education => EntryUpdate::Education(match normalize(field).as_str() {
                "institution" => EducationField::Institution(text),
                "degree" => EducationField::Degree(text),
                "field" => EducationField::Field(text),
                "startdate" => EducationField::StartDate(text),
                "enddate" => EducationField::EndDate(text),
                "gpa" => EducationField::Gpa(text),
                _ => return Err(unknown()),
            }),
            EntryKind::Project => EntryUpdate::Project(match normalize(field).as_str() {
                "name" => ProjectField::Name(text),
                "description" => ProjectField::Description(text),
                "technologies" => ProjectField::Technologies(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect(),
                ),
                "url" => ProjectField::Url(text),
                "github" => ProjectField::Github(text),
                _ => return Err(unknown()),
            }),
        };
        Ok(update)
    }
}

impl ExperienceField {
    pub(crate) fn apply(self, entry: &mut Experience) {
        match self {
            ExperienceField::Company(v) => entry.company = v,
            ExperienceField::Position(v) => entry.position = v,
            ExperienceField::StartDate(v) => entry.start_date = v,
            ExperienceField::EndDate(v) => entry.end_date = v,
            ExperienceField::Current(v) => entry.current = v,
            ExperienceField::Description(v) => entry.description = v,
        }
    }
}

impl EducationField {
    pub(crate) fn apply(self, entry: &mut Education) {
        match self {
            EducationField::Institution(v) => entry.institution = v,
            EducationField::Degree(v) => entry.degree = v,
            EducationField::Field(v) => entry.field = v,
            EducationField::StartDate(v) => entry.start_date = v,
            EducationField::EndDate(v) => entry.end_date = v,
            EducationField::Gpa(v) => entry.gpa = v,
        }
    }
}

impl ProjectField {
    pub(crate) fn apply(self, entry: &mut Project) {
        match self {
            ProjectField::Name(v) => entry.name = v,
            ProjectField::Description(v) => entry.description = v,
            ProjectField::Technologies(v) => entry.technologies = v,
            ProjectField::Url(v) => entry.url = v,
            ProjectField::Github(v) => entry.github = v,
        }
    }
}

/// `start_date`, `startDate` and `start-date` all name the same field.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn parse_flag(value: &str) -> Result<bool, DocumentError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(DocumentError::InvalidValue {
            field: "current",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_field_name_spellings() {
        for name in ["start_date", "startDate", "start-date", "STARTDATE"] {
            let update = EntryUpdate::parse(EntryKind::Experience, name, "2020-01").unwrap();
            assert_eq!(
                update,
                EntryUpdate::Experience(ExperienceField::StartDate("2020-01".to_string()))
            );
        }
    }

    #[test]
    fn test_parse_current_flag() {
        let update = EntryUpdate::parse(EntryKind::Experience, "current", "yes").unwrap();
        assert_eq!(update, EntryUpdate::Experience(ExperienceField::Current(true)));
        let err = EntryUpdate::parse(EntryKind::Experience, "current", "maybe").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidValue { field: "current", .. }));
    }

    #[test]
    fn test_parse_rejects_field_from_other_kind() {
        let err = EntryUpdate::parse(EntryKind::Project, "company", "Acme").unwrap_err();
        assert!(matches!(err, DocumentError::UnknownField { entity: "project", .. }));
    }

    #[test]
    fn test_parse_technologies_list() {
        let update = EntryUpdate::parse(EntryKind::Project, "technologies", "Rust, tokio,,serde ")
            .unwrap();
        assert_eq!(
            update,
            EntryUpdate::Project(ProjectField::Technologies(vec![
                "Rust".to_string(),
                "tokio".to_string(),
                "serde".to_string()
            ]))
        );
    }

    #[test]
    fn test_entry_kind_from_str() {
        assert_eq!("Experiences".parse::<EntryKind>().unwrap(), EntryKind::Experience);
        assert!("awards".parse::<EntryKind>().is_err());
    }

    #[test]
    fn test_personal_field_from_str() {
        assert_eq!("first_name".parse::<PersonalField>().unwrap(), PersonalField::FirstName);
        assert_eq!("LinkedIn".parse::<PersonalField>().unwrap(), PersonalField::Linkedin);
        assert!("twitter".parse::<PersonalField>().is_err());
    }
}
