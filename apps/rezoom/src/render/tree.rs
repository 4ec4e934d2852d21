//! Visual tree produced by the renderer.
//!
//! The tree is a value: produced fresh by every render call, never mutated
//! afterwards, and cheap to clone into an export snapshot.

use serde::Serialize;

use crate::templates::{SectionTitleStyle, SkillBadgeStyle, TemplateRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    Summary,
    Skills,
    Experience,
    Education,
    Projects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingLevel {
    /// The subject's name at the top of the document.
    Title,
    Section,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub text: String,
    pub level: HeadingLevel,
    pub style: SectionTitleStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldItem {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEntry {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// Formatted date range, e.g. `2020-01 - Present`.
    pub dates: Option<String>,
    pub body: Vec<String>,
    pub links: Vec<FieldItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading(Heading),
    FieldList { fields: Vec<FieldItem> },
    Paragraph { text: String },
    BadgeList { items: Vec<String>, style: SkillBadgeStyle },
    EntryList { entries: Vec<RenderedEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedSection {
    pub kind: SectionKind,
    pub blocks: Vec<Block>,
}

impl RenderedSection {
    pub fn heading(&self) -> Option<&Heading> {
        self.blocks.iter().find_map(|b| match b {
            Block::Heading(h) => Some(h),
            _ => None,
        })
    }

    pub fn entries(&self) -> &[RenderedEntry] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                Block::EntryList { entries } => Some(entries.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// A rendered document together with the rules it was rendered under.
///
/// This is the root container the export pipeline rasterizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTree {
    pub rules: TemplateRules,
    pub sections: Vec<RenderedSection>,
}

impl RenderedTree {
    pub fn section(&self, kind: SectionKind) -> Option<&RenderedSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn section_kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }
}
