//! Command-line front end: argument parsing, dispatch, printing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use rezoom::config::Config;
use rezoom::errors::AppError;
use rezoom::export::{
    CanvasRasterizer, DirectorySink, ExportOutcome, ExportPipeline, PaginationMode, PreviewSurface,
};
use rezoom::model::{EditingSession, EntryKind, EntryUpdate, PersonalField, ResumeDocument, UuidIds};
use rezoom::render::{render, to_plain_text};
use rezoom::sync::{decode_document, HttpResumeStore, StaticTokenProvider, SyncLayer};
use rezoom::templates::{TemplateId, TemplateRegistry};

#[derive(Parser, Debug)]
#[command(name = "rezoom", version, about = "Build, preview, export and sync resumes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available templates
    Templates,

    /// List resumes stored on the server
    List,

    /// Download a stored resume into a local document file
    Pull {
        id: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Upload a local document file (creates a new record unless --id is given)
    Push {
        file: PathBuf,
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a stored resume
    Delete { id: String },

    /// Print a plain-text preview of a local document file
    Preview {
        file: PathBuf,
        /// Override the document's template
        #[arg(long)]
        template: Option<String>,
    },

    /// Export a local document file to PDF
    Export {
        file: PathBuf,
        /// Override the document's template
        #[arg(long)]
        template: Option<String>,
        /// Directory for the PDF (defaults to REZOOM_OUTPUT_DIR)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Legacy layout: one page holding the whole document
        #[arg(long)]
        single_page: bool,
    },

    /// Apply one edit to a local document file (created if missing)
    Edit {
        file: PathBuf,
        #[command(subcommand)]
        op: EditOp,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum EditOp {
    /// Set a personal-info field (first-name, last-name, email, phone, location, website, linkedin, github)
    Set { field: String, value: String },

    /// Replace the professional summary
    Summary { text: String },

    AddSkill { skill: String },

    RemoveSkill { skill: String },

    /// Add an empty experience, education or project entry
    AddEntry { kind: String },

    /// Set one field of an entry
    UpdateEntry {
        kind: String,
        id: String,
        field: String,
        value: String,
    },

    RemoveEntry { kind: String, id: String },

    /// Switch template (modern, classic, creative, minimal)
    Template { id: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch
// ────────────────────────────────────────────────────────────────────────────

pub async fn run(cli: Cli, config: &Config) -> Result<(), AppError> {
    match cli.command {
        Commands::Templates => {
            for rules in TemplateRegistry::new().all() {
                let marker = if rules.id == TemplateId::default() { " (default)" } else { "" };
                println!(
                    "{:<10} {}{} [{:?}, {:?}]",
                    rules.id.as_str(), rules.display_name, marker, rules.typography, rules.density
                );
            }
        }
        Commands::List => {
            let rows = sync_layer(config)?.refresh_listing().await?;
            if rows.is_empty() {
                println!("No resumes yet.");
            }
            for row in rows {
                let updated = row
                    .updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<8} {:<16} {}", row.id, updated, row.title);
            }
        }
        Commands::Pull { id, out } => {
            let doc = sync_layer(config)?.load(&id).await?;
            match out {
                Some(path) => {
                    write_document(&path, &doc).await?;
                    println!("Saved resume {id} to {}", path.display());
                }
                None => println!("{}", to_json(&doc)?),
            }
        }
        Commands::Push { file, id } => {
            let doc = read_document(&file).await?;
            let record = sync_layer(config)?.save(&doc, id.as_deref()).await?;
            println!("Saved \"{}\" as resume {}", record.title, record.id);
        }
        Commands::Delete { id } => {
            let layer = sync_layer(config)?;
            layer.refresh_listing().await?;
            layer.delete(&id).await?;
            println!("Deleted resume {id}");
        }
        Commands::Preview { file, template } => {
            let doc = with_template(read_document(&file).await?, template.as_deref())?;
            let registry = TemplateRegistry::new();
            print!("{}", to_plain_text(&render(&doc, registry.rules(doc.template()))));
        }
        Commands::Export {
            file,
            template,
            out_dir,
            single_page,
        } => {
            let doc = with_template(read_document(&file).await?, template.as_deref())?;
            let mut surface = PreviewSurface::new();
            surface.mount(&doc, &TemplateRegistry::new());

            let mut settings = config.export_settings();
            if single_page {
                settings.pagination = PaginationMode::SinglePage;
            }
            let dir = out_dir.unwrap_or_else(|| config.output_dir.clone());
            let pipeline = ExportPipeline::new(
                Arc::new(CanvasRasterizer::new()),
                Arc::new(DirectorySink::new(dir)),
                settings,
            )?;

            match pipeline.export(&surface).await? {
                ExportOutcome::Saved(report) => println!(
                    "Exported {} ({} page{}) to {}",
                    report.file_name,
                    report.pages,
                    if report.pages == 1 { "" } else { "s" },
                    report.path.display()
                ),
                ExportOutcome::NotMounted => println!("Nothing to export."),
                ExportOutcome::AlreadyInProgress => println!("An export is already running."),
            }
        }
        Commands::Edit { file, op } => {
            let doc = if tokio::fs::try_exists(&file).await? {
                read_document(&file).await?
            } else {
                info!(path = %file.display(), "Starting a new document");
                ResumeDocument::new()
            };
            let mut session = EditingSession::with_ids(doc, None, Box::new(UuidIds));
            let message = apply_edit(&mut session, op)?;
            write_document(&file, &session.document).await?;
            println!("{message}");
        }
    }
    Ok(())
}

/// Applies one edit to the session's document and describes what happened.
pub fn apply_edit(session: &mut EditingSession, op: EditOp) -> Result<String, AppError> {
    let message = match op {
        EditOp::Set { field, value } => {
            let field: PersonalField = field.parse()?;
            session.document.set_personal_info(field, value);
            "Updated personal info".to_string()
        }
        EditOp::Summary { text } => {
            session.document.set_summary(text);
            "Updated summary".to_string()
        }
        EditOp::AddSkill { skill } => match session.document.add_skill(&skill) {
            true => format!("Added skill \"{}\"", skill.trim()),
            false => "Skill is blank or already listed; no change".to_string(),
        },
        EditOp::RemoveSkill { skill } => match session.document.remove_skill(&skill) {
            true => format!("Removed skill \"{skill}\""),
            false => "Skill not found; no change".to_string(),
        },
        EditOp::AddEntry { kind } => {
            let kind: EntryKind = kind.parse()?;
            let id = session.add_entry(kind)?;
            format!("Added {kind} entry {id}")
        }
        EditOp::UpdateEntry {
            kind,
            id,
            field,
            value,
        } => {
            let kind: EntryKind = kind.parse()?;
            let update = EntryUpdate::parse(kind, &field, &value)?;
            match session.document.update_entry(&id, update) {
                true => format!("Updated {kind} entry {id}"),
                false => format!("No {kind} entry {id}; no change"),
            }
        }
        EditOp::RemoveEntry { kind, id } => {
            let kind: EntryKind = kind.parse()?;
            match session.document.remove_entry(kind, &id) {
                true => format!("Removed {kind} entry {id}"),
                false => format!("No {kind} entry {id}; no change"),
            }
        }
        EditOp::Template { id } => {
            let template: TemplateId = id.parse().map_err(rezoom::model::DocumentError::from)?;
            session.document.set_template(template);
            format!("Template set to {template}")
        }
    };
    Ok(message)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn sync_layer(config: &Config) -> Result<SyncLayer, AppError> {
    let store = HttpResumeStore::new(config.api_url.clone(), config.network_timeout)?;
    let auth = StaticTokenProvider::new(config.token.clone());
    Ok(SyncLayer::new(
        Arc::new(store),
        Arc::new(auth),
        config.network_timeout,
    ))
}

fn with_template(mut doc: ResumeDocument, template: Option<&str>) -> Result<ResumeDocument, AppError> {
    if let Some(id) = template {
        let id: TemplateId = id.parse().map_err(rezoom::model::DocumentError::from)?;
        doc.set_template(id);
    }
    Ok(doc)
}

async fn read_document(path: &Path) -> Result<ResumeDocument, AppError> {
    let blob = tokio::fs::read_to_string(path).await?;
    Ok(decode_document(&blob, &mut UuidIds))
}

async fn write_document(path: &Path, doc: &ResumeDocument) -> Result<(), AppError> {
    let mut json = to_json(doc)?;
    json.push('\n');
    tokio::fs::write(path, json).await?;
    Ok(())
}

fn to_json(doc: &ResumeDocument) -> Result<String, AppError> {
    serde_json::to_string_pretty(doc).map_err(|e| AppError::InvalidFile(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rezoom::model::SequentialIds;

    fn session() -> EditingSession {
        EditingSession::with_ids(ResumeDocument::new(), None, Box::new(SequentialIds::new("e")))
    }

    #[test]
    fn test_cli_parses_edit_update_entry() {
        let cli = Cli::try_parse_from([
            "rezoom", "edit", "cv.json", "update-entry", "experience", "e1", "company", "Acme",
        ])
        .unwrap();
        let Commands::Edit { file, op } = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(file, PathBuf::from("cv.json"));
        assert!(matches!(op, EditOp::UpdateEntry { ref field, .. } if field == "company"));
    }

    #[test]
    fn test_cli_parses_export_flags() {
        let cli = Cli::try_parse_from(["rezoom", "export", "cv.json", "--single-page", "--template", "classic"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Export { single_page: true, template: Some(ref t), .. } if t == "classic"
        ));
    }

    #[test]
    fn test_apply_edit_covers_mutators() {
        let mut s = session();
        apply_edit(&mut s, EditOp::Set { field: "first-name".into(), value: "Ada".into() }).unwrap();
        apply_edit(&mut s, EditOp::Summary { text: "Hi".into() }).unwrap();
        apply_edit(&mut s, EditOp::AddSkill { skill: "Go".into() }).unwrap();
        let msg = apply_edit(&mut s, EditOp::AddSkill { skill: "Go".into() }).unwrap();
        assert!(msg.contains("no change"));

        let msg = apply_edit(&mut s, EditOp::AddEntry { kind: "experience".into() }).unwrap();
        assert_eq!(msg, "Added experience entry e1");
        apply_edit(
            &mut s,
            EditOp::UpdateEntry {
                kind: "experience".into(),
                id: "e1".into(),
                field: "current".into(),
                value: "yes".into(),
            },
        )
        .unwrap();
        apply_edit(&mut s, EditOp::Template { id: "Minimal".into() }).unwrap();

        let doc = &s.document;
        assert_eq!(doc.personal_info().first_name, "Ada");
        assert_eq!(doc.skills(), ["Go".to_string()]);
        assert!(doc.experiences()[0].current);
        assert_eq!(doc.template(), TemplateId::Minimal);

        let msg = apply_edit(&mut s, EditOp::RemoveEntry { kind: "experience".into(), id: "nope".into() })
            .unwrap();
        assert!(msg.contains("no change"));
    }

    #[test]
    fn test_apply_edit_rejects_unknown_names() {
        let mut s = session();
        let err = apply_edit(&mut s, EditOp::Set { field: "age".into(), value: "3".into() }).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(apply_edit(&mut s, EditOp::Template { id: "neon".into() }).is_err());
        assert!(apply_edit(&mut s, EditOp::AddEntry { kind: "hobby".into() }).is_err());
    }

    #[tokio::test]
    async fn test_document_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.json");
        let mut doc = ResumeDocument::new();
        doc.set_personal_info(PersonalField::FirstName, "Ada");
        write_document(&path, &doc).await.unwrap();
        assert_eq!(read_document(&path).await.unwrap(), doc);
    }
}
