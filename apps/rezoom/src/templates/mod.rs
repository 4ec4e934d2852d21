//! Template Registry: the closed set of résumé templates and their presentation rules.
//!
//! Every template id maps to exactly one [`TemplateRules`] record. The renderer
//! and the rasterizer consume the record uniformly; nothing else branches on the
//! template id. Lookups never fail: an unknown id resolves to [`TemplateId::Modern`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

// ────────────────────────────────────────────────────────────────────────────
// Template identifiers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateId {
    #[default]
    Modern,
    Classic,
    Creative,
    Minimal,
}

impl TemplateId {
    pub const ALL: [TemplateId; 4] = [
        TemplateId::Modern,
        TemplateId::Classic,
        TemplateId::Creative,
        TemplateId::Minimal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateId::Modern => "modern",
            TemplateId::Classic => "classic",
            TemplateId::Creative => "creative",
            TemplateId::Minimal => "minimal",
        }
    }

    /// Resolves a stored identifier, falling back to the default for anything unknown.
    pub fn resolve(id: &str) -> TemplateId {
        id.parse().unwrap_or_else(|_| {
            warn!(template = id, "Unknown template id, using default");
            TemplateId::default()
        })
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown template '{0}'")]
pub struct UnknownTemplate(pub String);

impl FromStr for TemplateId {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" => Ok(TemplateId::Modern),
            "classic" => Ok(TemplateId::Classic),
            "creative" => Ok(TemplateId::Creative),
            "minimal" => Ok(TemplateId::Minimal),
            _ => Err(UnknownTemplate(s.to_string())),
        }
    }
}

impl Serialize for TemplateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Legacy blobs may carry ids from retired templates (or null); those degrade to the default.
impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(TemplateId::resolve).unwrap_or_default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Presentation rules
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Typography {
    Sans,
    Serif,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Density {
    Normal,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionTitleStyle {
    Plain,
    UppercaseTracked,
    AccentColored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillBadgeStyle {
    Outline,
    Filled,
}

/// The full set of presentation rules for one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRules {
    pub id: TemplateId,
    pub display_name: &'static str,
    pub typography: Typography,
    pub density: Density,
    pub section_title_style: SectionTitleStyle,
    pub skill_badge_style: SkillBadgeStyle,
    /// Accent colour as RGB, used for accent-coloured titles, rules and filled badges.
    pub accent: [u8; 3],
}

const RULES: [TemplateRules; 4] = [
    TemplateRules {
        id: TemplateId::Modern,
        display_name: "Modern",
        typography: Typography::Sans,
        density: Density::Normal,
        section_title_style: SectionTitleStyle::AccentColored,
        skill_badge_style: SkillBadgeStyle::Filled,
        accent: [37, 99, 235],
    },
    TemplateRules {
        id: TemplateId::Classic,
        display_name: "Classic",
        typography: Typography::Serif,
        density: Density::Normal,
        section_title_style: SectionTitleStyle::UppercaseTracked,
        skill_badge_style: SkillBadgeStyle::Outline,
        accent: [31, 41, 55],
    },
    TemplateRules {
        id: TemplateId::Creative,
        display_name: "Creative",
        typography: Typography::Sans,
        density: Density::Normal,
        section_title_style: SectionTitleStyle::AccentColored,
        skill_badge_style: SkillBadgeStyle::Outline,
        accent: [190, 24, 93],
    },
    TemplateRules {
        id: TemplateId::Minimal,
        display_name: "Minimal",
        typography: Typography::Mono,
        density: Density::Compact,
        section_title_style: SectionTitleStyle::Plain,
        skill_badge_style: SkillBadgeStyle::Outline,
        accent: [75, 85, 99],
    },
];

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

/// Read-only registry over the fixed template table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRegistry;

impl TemplateRegistry {
    pub fn new() -> Self {
        TemplateRegistry
    }

    /// Rules for a known template.
    pub fn rules(&self, id: TemplateId) -> &'static TemplateRules {
        RULES
            .iter()
            .find(|r| r.id == id)
            .unwrap_or(&RULES[0])
    }

    /// Rules for an arbitrary stored identifier. Unknown ids yield the default rules.
    pub fn lookup(&self, id: &str) -> &'static TemplateRules {
        self.rules(TemplateId::resolve(id))
    }

    pub fn default_rules(&self) -> &'static TemplateRules {
        self.rules(TemplateId::default())
    }

    pub fn all(&self) -> &'static [TemplateRules] {
        &RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_has_rules() {
        let registry = TemplateRegistry::new();
        for id in TemplateId::ALL {
            assert_eq!(registry.rules(id).id, id);
        }
        assert_eq!(registry.all().len(), TemplateId::ALL.len());
    }

    #[test]
    fn test_unknown_lookup_equals_default() {
        let registry = TemplateRegistry::new();
        assert_eq!(registry.lookup("tech-minimal"), registry.lookup("modern"));
        assert_eq!(registry.lookup(""), registry.default_rules());
        assert_eq!(registry.lookup("🙃"), registry.lookup("modern"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = TemplateRegistry::new();
        assert_eq!(registry.lookup("Classic").id, TemplateId::Classic);
        assert_eq!(registry.lookup(" minimal ").id, TemplateId::Minimal);
    }

    #[test]
    fn test_template_id_deserializes_unknown_as_default() {
        let id: TemplateId = serde_json::from_str("\"executive-classic\"").unwrap();
        assert_eq!(id, TemplateId::Modern);
        let id: TemplateId = serde_json::from_str("null").unwrap();
        assert_eq!(id, TemplateId::Modern);
        let id: TemplateId = serde_json::from_str("\"creative\"").unwrap();
        assert_eq!(id, TemplateId::Creative);
    }

    #[test]
    fn test_template_id_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TemplateId::Classic).unwrap(),
            "\"classic\""
        );
    }
}
