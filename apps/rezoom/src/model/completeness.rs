use serde::Serialize;

use crate::model::document::ResumeDocument;

/// A scalar field that is empty and would render as a placeholder label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingField {
    /// Section the field belongs to (`header`, `experience`, `education`, `project`).
    pub section: &'static str,
    /// Entry id, or `None` for header fields.
    pub entry_id: Option<String>,
    pub field: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaceholderReport {
    pub missing: Vec<MissingField>,
}

impl PlaceholderReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Short human-readable list, e.g. `header.first_name, experience[e1].company`.
    pub fn describe(&self) -> String {
        self.missing
            .iter()
            .map(|m| match &m.entry_id {
                Some(id) => format!("{}[{}].{}", m.section, id, m.field),
                None => format!("{}.{}", m.section, m.field),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lists every field the renderer would fill with a placeholder label.
///
/// The renderer itself does not distinguish preview from export; this report lets
/// the export path warn before a placeholder ends up in a finished file.
pub fn placeholder_report(doc: &ResumeDocument) -> PlaceholderReport {
    let mut missing = Vec::new();
    let mut check = |section: &'static str, entry_id: Option<&str>, field: &'static str, value: &str| {
        if value.trim().is_empty() {
            missing.push(MissingField {
                section,
                entry_id: entry_id.map(str::to_string),
                field,
            });
        }
    };

    let info = doc.personal_info();
    check("header", None, "first_name", &info.first_name);
    check("header", None, "last_name", &info.last_name);

    for exp in doc.experiences() {
        check("experience", Some(&exp.id), "position", &exp.position);
        check("experience", Some(&exp.id), "company", &exp.company);
    }
    for edu in doc.education() {
        check("education", Some(&edu.id), "degree", &edu.degree);
        check("education", Some(&edu.id), "field", &edu.field);
        check("education", Some(&edu.id), "institution", &edu.institution);
    }
    for project in doc.projects() {
        check("project", Some(&project.id), "name", &project.name);
    }

    PlaceholderReport { missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::SequentialIds;
    use crate::model::update::{EntryKind, EntryUpdate, ExperienceField, PersonalField};

    #[test]
    fn test_empty_document_only_misses_name() {
        let report = placeholder_report(&ResumeDocument::new());
        assert_eq!(report.missing.len(), 2);
        assert_eq!(report.describe(), "header.first_name, header.last_name");
    }

    #[test]
    fn test_blank_entry_fields_are_reported() {
        let mut ids = SequentialIds::new("e");
        let mut doc = ResumeDocument::new();
        doc.set_personal_info(PersonalField::FirstName, "Ada");
        doc.set_personal_info(PersonalField::LastName, "Lovelace");
        let id = doc.add_entry(EntryKind::Experience, &mut ids).unwrap();
        doc.update_entry(&id, EntryUpdate::Experience(ExperienceField::Company("Acme".into())));

        let report = placeholder_report(&doc);
        assert!(!report.is_complete());
        assert_eq!(report.describe(), "experience[e1].position");
    }

    #[test]
    fn test_complete_document() {
        let mut doc = ResumeDocument::new();
        doc.set_personal_info(PersonalField::FirstName, "Ada");
        doc.set_personal_info(PersonalField::LastName, "Lovelace");
        assert!(placeholder_report(&doc).is_complete());
    }
}
