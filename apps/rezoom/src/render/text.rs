use crate::render::tree::{Block, HeadingLevel, RenderedSection};
use crate::templates::SkillBadgeStyle;

/// Prints a rendered section list as plain text for terminal preview.
pub fn to_plain_text(sections: &[RenderedSection]) -> String {
    let mut out = String::new();

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for block in &section.blocks {
            match block {
                Block::Heading(heading) => match heading.level {
                    HeadingLevel::Title => {
                        out.push_str(&heading.text);
                        out.push('\n');
                        out.push_str(&"=".repeat(heading.text.chars().count()));
                        out.push('\n');
                    }
                    HeadingLevel::Section => {
                        out.push_str(&heading.text);
                        out.push('\n');
                        out.push_str(&"-".repeat(heading.text.chars().count()));
                        out.push('\n');
                    }
                },
                Block::FieldList { fields } => {
                    let line = fields
                        .iter()
                        .map(|f| f.value.as_str())
                        .collect::<Vec<_>>()
                        .join(" • ");
                    out.push_str(&line);
                    out.push('\n');
                }
                Block::Paragraph { text } => {
                    out.push_str(text);
                    out.push('\n');
                }
                Block::BadgeList { items, style } => {
                    let (open, close) = match style {
                        SkillBadgeStyle::Outline => ("(", ")"),
                        SkillBadgeStyle::Filled => ("[", "]"),
                    };
                    let line = items
                        .iter()
                        .map(|s| format!("{open}{s}{close}"))
                        .collect::<Vec<_>>()
                        .join(" ");
                    out.push_str(&line);
                    out.push('\n');
                }
                Block::EntryList { entries } => {
                    for entry in entries {
                        out.push_str(&entry.title);
                        if let Some(dates) = &entry.dates {
                            out.push_str(&format!("  ({dates})"));
                        }
                        out.push('\n');
                        if let Some(subtitle) = &entry.subtitle {
                            out.push_str(&format!("  {subtitle}\n"));
                        }
                        for line in &entry.body {
                            out.push_str(&format!("  {line}\n"));
                        }
                        for link in &entry.links {
                            out.push_str(&format!("  {}: {}\n", link.label, link.value));
                        }
                    }
                }
            }
        }
    }

    out
}
