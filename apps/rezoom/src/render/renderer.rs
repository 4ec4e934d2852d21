//! Document → visual tree.
//!
//! # Rules
//! - Section order is fixed: Header, Summary, Skills, Experience, Education, Projects.
//! - A section other than Header appears iff its data is non-empty (summary non-blank).
//! - Entries keep collection order; no date sorting.
//! - A `current` experience shows "Present" instead of its stored end date.
//! - Missing scalar fields render as placeholder labels.

use crate::model::{Education, Experience, PersonalInfo, Project, ResumeDocument};
use crate::render::tree::{
    Block, FieldItem, Heading, HeadingLevel, RenderedEntry, RenderedSection, RenderedTree,
    SectionKind,
};
use crate::templates::{SectionTitleStyle, TemplateRegistry, TemplateRules};

pub const PRESENT: &str = "Present";

/// Renders `doc` under `rules`. Pure; the same inputs always give the same tree.
pub fn render(doc: &ResumeDocument, rules: &TemplateRules) -> Vec<RenderedSection> {
    let mut sections = vec![render_header(doc.personal_info(), rules)];

    if !doc.summary().trim().is_empty() {
        sections.push(RenderedSection {
            kind: SectionKind::Summary,
            blocks: vec![
                section_heading("Professional Summary", rules),
                Block::Paragraph {
                    text: doc.summary().trim().to_string(),
                },
            ],
        });
    }

    if !doc.skills().is_empty() {
        sections.push(RenderedSection {
            kind: SectionKind::Skills,
            blocks: vec![
                section_heading("Skills", rules),
                Block::BadgeList {
                    items: doc.skills().to_vec(),
                    style: rules.skill_badge_style,
                },
            ],
        });
    }

    if !doc.experiences().is_empty() {
        sections.push(entry_section(
            SectionKind::Experience,
            "Experience",
            doc.experiences().iter().map(experience_entry).collect(),
            rules,
        ));
    }

    if !doc.education().is_empty() {
        sections.push(entry_section(
            SectionKind::Education,
            "Education",
            doc.education().iter().map(education_entry).collect(),
            rules,
        ));
    }

    if !doc.projects().is_empty() {
        sections.push(entry_section(
            SectionKind::Projects,
            "Projects",
            doc.projects().iter().map(project_entry).collect(),
            rules,
        ));
    }

    sections
}

/// Renders `doc` under the rules of its own template.
pub fn render_tree(doc: &ResumeDocument, registry: &TemplateRegistry) -> RenderedTree {
    let rules = *registry.rules(doc.template());
    RenderedTree {
        sections: render(doc, &rules),
        rules,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

fn render_header(info: &PersonalInfo, rules: &TemplateRules) -> RenderedSection {
    let name = format!(
        "{} {}",
        or_placeholder(&info.first_name, "Your"),
        or_placeholder(&info.last_name, "Name")
    );

    let contacts: Vec<FieldItem> = [
        ("Email", &info.email),
        ("Phone", &info.phone),
        ("Location", &info.location),
        ("Website", &info.website),
        ("LinkedIn", &info.linkedin),
        ("GitHub", &info.github),
    ]
    .into_iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(label, value)| FieldItem {
        label,
        value: value.trim().to_string(),
    })
    .collect();

    let mut blocks = vec![Block::Heading(Heading {
        text: name,
        level: HeadingLevel::Title,
        style: rules.section_title_style,
    })];
    if !contacts.is_empty() {
        blocks.push(Block::FieldList { fields: contacts });
    }

    RenderedSection {
        kind: SectionKind::Header,
        blocks,
    }
}

fn entry_section(
    kind: SectionKind,
    title: &str,
    entries: Vec<RenderedEntry>,
    rules: &TemplateRules,
) -> RenderedSection {
    RenderedSection {
        kind,
        blocks: vec![section_heading(title, rules), Block::EntryList { entries }],
    }
}

fn section_heading(title: &str, rules: &TemplateRules) -> Block {
    let text = match rules.section_title_style {
        SectionTitleStyle::UppercaseTracked => title.to_uppercase(),
        SectionTitleStyle::Plain | SectionTitleStyle::AccentColored => title.to_string(),
    };
    Block::Heading(Heading {
        text,
        level: HeadingLevel::Section,
        style: rules.section_title_style,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Entries
// ────────────────────────────────────────────────────────────────────────────

fn experience_entry(exp: &Experience) -> RenderedEntry {
    // The stored end date is kept on the entry but hidden while `current` is set.
    let end = if exp.current { PRESENT } else { exp.end_date.trim() };
    RenderedEntry {
        id: exp.id.clone(),
        title: or_placeholder(&exp.position, "Position"),
        subtitle: Some(or_placeholder(&exp.company, "Company")),
        dates: date_range(&exp.start_date, end),
        body: non_blank(&exp.description).into_iter().collect(),
        links: Vec::new(),
    }
}

fn education_entry(edu: &Education) -> RenderedEntry {
    let mut body = Vec::new();
    if let Some(gpa) = non_blank(&edu.gpa) {
        body.push(format!("GPA: {gpa}"));
    }
    RenderedEntry {
        id: edu.id.clone(),
        title: format!(
            "{} in {}",
            or_placeholder(&edu.degree, "Degree"),
            or_placeholder(&edu.field, "Field")
        ),
        subtitle: Some(or_placeholder(&edu.institution, "Institution")),
        dates: date_range(&edu.start_date, edu.end_date.trim()),
        body,
        links: Vec::new(),
    }
}

fn project_entry(project: &Project) -> RenderedEntry {
    let mut body: Vec<String> = non_blank(&project.description).into_iter().collect();
    let technologies: Vec<&str> = project
        .technologies
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !technologies.is_empty() {
        body.push(format!("Technologies: {}", technologies.join(", ")));
    }

    let mut links = Vec::new();
    if let Some(url) = non_blank(&project.url) {
        links.push(FieldItem {
            label: "Live Demo",
            value: url,
        });
    }
    if let Some(github) = non_blank(&project.github) {
        links.push(FieldItem {
            label: "GitHub",
            value: github,
        });
    }

    RenderedEntry {
        id: project.id.clone(),
        title: or_placeholder(&project.name, "Project Name"),
        subtitle: None,
        dates: None,
        body,
        links,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn or_placeholder(value: &str, placeholder: &str) -> String {
    non_blank(value).unwrap_or_else(|| placeholder.to_string())
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn date_range(start: &str, end: &str) -> Option<String> {
    let start = start.trim();
    if start.is_empty() && end.is_empty() {
        return None;
    }
    Some(format!("{start} - {end}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DocumentParts, EntryKind, EntryUpdate, ExperienceField, PersonalField, ProjectField,
        SequentialIds,
    };
    use crate::templates::{TemplateId, TemplateRegistry};

    fn rules(id: TemplateId) -> TemplateRules {
        *TemplateRegistry::new().rules(id)
    }

    fn acme_doc() -> ResumeDocument {
        let parts = DocumentParts {
            experiences: vec![Experience {
                id: "1".into(),
                company: "Acme".into(),
                position: "Eng".into(),
                start_date: "2020-01".into(),
                end_date: String::new(),
                current: true,
                description: "Built X".into(),
            }],
            ..Default::default()
        };
        ResumeDocument::from_parts(parts, &mut SequentialIds::new("r"))
    }

    #[test]
    fn test_empty_document_renders_header_only() {
        for id in TemplateId::ALL {
            let sections = render(&ResumeDocument::new(), &rules(id));
            assert_eq!(sections.len(), 1);
            assert_eq!(sections[0].kind, SectionKind::Header);
            assert_eq!(sections[0].heading().unwrap().text, "Your Name");
        }
    }

    #[test]
    fn test_summary_presence_follows_content() {
        let mut doc = ResumeDocument::new();
        for id in TemplateId::ALL {
            doc.set_summary("");
            assert!(render(&doc, &rules(id)).iter().all(|s| s.kind != SectionKind::Summary));
            doc.set_summary("   ");
            assert!(render(&doc, &rules(id)).iter().all(|s| s.kind != SectionKind::Summary));
            doc.set_summary("x");
            assert!(render(&doc, &rules(id)).iter().any(|s| s.kind == SectionKind::Summary));
        }
    }

    #[test]
    fn test_section_order_is_fixed() {
        let mut ids = SequentialIds::new("e");
        let mut doc = ResumeDocument::new();
        // Populate in reverse display order.
        doc.add_entry(EntryKind::Project, &mut ids).unwrap();
        doc.add_entry(EntryKind::Education, &mut ids).unwrap();
        doc.add_entry(EntryKind::Experience, &mut ids).unwrap();
        doc.add_skill("Rust");
        doc.set_summary("Engineer");

        let tree = render_tree(&doc, &TemplateRegistry::new());
        assert_eq!(
            tree.section_kinds(),
            vec![
                SectionKind::Header,
                SectionKind::Summary,
                SectionKind::Skills,
                SectionKind::Experience,
                SectionKind::Education,
                SectionKind::Projects,
            ]
        );
    }

    #[test]
    fn test_current_experience_shows_present() {
        let sections = render(&acme_doc(), &rules(TemplateId::Modern));
        let experience = sections
            .iter()
            .find(|s| s.kind == SectionKind::Experience)
            .unwrap();
        let entry = &experience.entries()[0];
        assert_eq!(entry.title, "Eng");
        assert_eq!(entry.subtitle.as_deref(), Some("Acme"));
        assert_eq!(entry.dates.as_deref(), Some("2020-01 - Present"));
        assert_eq!(entry.body, vec!["Built X".to_string()]);
    }

    #[test]
    fn test_current_hides_stored_end_date() {
        let mut doc = acme_doc();
        doc.update_entry(
            "1",
            EntryUpdate::Experience(ExperienceField::EndDate("2023-05".into())),
        );
        let tree = render_tree(&doc, &TemplateRegistry::new());
        let entry = &tree.section(SectionKind::Experience).unwrap().entries()[0];
        assert_eq!(entry.dates.as_deref(), Some("2020-01 - Present"));
        // Stored value is retained.
        assert_eq!(doc.experiences()[0].end_date, "2023-05");
    }

    #[test]
    fn test_missing_fields_render_placeholders() {
        let mut ids = SequentialIds::new("e");
        let mut doc = ResumeDocument::new();
        doc.add_entry(EntryKind::Experience, &mut ids).unwrap();
        doc.add_entry(EntryKind::Education, &mut ids).unwrap();
        doc.add_entry(EntryKind::Project, &mut ids).unwrap();
        doc.set_personal_info(PersonalField::FirstName, "Ada");

        let tree = render_tree(&doc, &TemplateRegistry::new());
        assert_eq!(tree.sections[0].heading().unwrap().text, "Ada Name");

        let exp = &tree.section(SectionKind::Experience).unwrap().entries()[0];
        assert_eq!(exp.title, "Position");
        assert_eq!(exp.subtitle.as_deref(), Some("Company"));
        assert_eq!(exp.dates, None);

        let edu = &tree.section(SectionKind::Education).unwrap().entries()[0];
        assert_eq!(edu.title, "Degree in Field");
        assert_eq!(edu.subtitle.as_deref(), Some("Institution"));

        let project = &tree.section(SectionKind::Projects).unwrap().entries()[0];
        assert_eq!(project.title, "Project Name");
    }

    #[test]
    fn test_entries_keep_collection_order() {
        let mut ids = SequentialIds::new("e");
        let mut doc = ResumeDocument::new();
        for start in ["2023-01", "2018-06", "2021-03"] {
            let id = doc.add_entry(EntryKind::Experience, &mut ids).unwrap();
            doc.update_entry(&id, EntryUpdate::Experience(ExperienceField::StartDate(start.into())));
        }
        let tree = render_tree(&doc, &TemplateRegistry::new());
        let order: Vec<&str> = tree
            .section(SectionKind::Experience)
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(order, ["e1", "e2", "e3"]);
    }

    #[test]
    fn test_uppercase_tracked_titles() {
        let mut doc = ResumeDocument::new();
        doc.add_skill("Go");
        let sections = render(&doc, &rules(TemplateId::Classic));
        assert_eq!(sections[1].heading().unwrap().text, "SKILLS");
        let sections = render(&doc, &rules(TemplateId::Modern));
        assert_eq!(sections[1].heading().unwrap().text, "Skills");
    }

    #[test]
    fn test_skill_badges_follow_rules() {
        let mut doc = ResumeDocument::new();
        doc.add_skill("Go");
        doc.add_skill("Rust");
        for id in TemplateId::ALL {
            let r = rules(id);
            let sections = render(&doc, &r);
            let badges = sections[1]
                .blocks
                .iter()
                .find_map(|b| match b {
                    Block::BadgeList { items, style } => Some((items.clone(), *style)),
                    _ => None,
                })
                .unwrap();
            assert_eq!(badges.0, vec!["Go".to_string(), "Rust".to_string()]);
            assert_eq!(badges.1, r.skill_badge_style);
        }
    }

    #[test]
    fn test_project_links_and_technologies() {
        let mut ids = SequentialIds::new("p");
        let mut doc = ResumeDocument::new();
        let id = doc.add_entry(EntryKind::Project, &mut ids).unwrap();
        doc.update_entry(&id, EntryUpdate::Project(ProjectField::Name("rezoom".into())));
        doc.update_entry(&id, EntryUpdate::Project(ProjectField::Github("github.com/x/rezoom".into())));
        doc.update_entry(
            &id,
            EntryUpdate::Project(ProjectField::Technologies(vec!["Rust".into(), "lopdf".into()])),
        );
        let tree = render_tree(&doc, &TemplateRegistry::new());
        let entry = &tree.section(SectionKind::Projects).unwrap().entries()[0];
        assert_eq!(entry.links.len(), 1);
        assert_eq!(entry.links[0].label, "GitHub");
        assert_eq!(entry.body, vec!["Technologies: Rust, lopdf".to_string()]);
    }

    #[test]
    fn test_header_lists_only_present_contacts() {
        let mut doc = ResumeDocument::new();
        doc.set_personal_info(PersonalField::Email, "ada@example.com");
        doc.set_personal_info(PersonalField::Linkedin, "linkedin.com/in/ada");
        let sections = render(&doc, &rules(TemplateId::Modern));
        let fields = sections[0]
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::FieldList { fields } => Some(fields.clone()),
                _ => None,
            })
            .unwrap();
        let labels: Vec<&str> = fields.iter().map(|f| f.label).collect();
        assert_eq!(labels, ["Email", "LinkedIn"]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let doc = acme_doc();
        let r = rules(TemplateId::Creative);
        assert_eq!(render(&doc, &r), render(&doc, &r));
    }
}
