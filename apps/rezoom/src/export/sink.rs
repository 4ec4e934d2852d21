use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::export::ExportError;

/// Final stage of an export: hands the finished file to the user.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Delivers `bytes` under `file_name` and returns where they ended up.
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError>;
}

/// Saves exports into a local directory, overwriting any file of the same name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        let size = bytes.len();
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), bytes = size, "Export saved");
        Ok(path)
    }
}

/// `{first_name}.pdf`, or `resume.pdf` when the name is blank.
///
/// Path separators and control characters are dropped so the name cannot
/// escape the sink's directory.
pub fn export_file_name(first_name: &str) -> String {
    let cleaned: String = first_name
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '\0') && !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    let stem = if cleaned.is_empty() { "resume" } else { cleaned };
    format!("{stem}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_name_uses_first_name() {
        assert_eq!(export_file_name("Ada"), "Ada.pdf");
        assert_eq!(export_file_name("  Ada "), "Ada.pdf");
    }

    #[test]
    fn test_export_file_name_falls_back_to_resume() {
        assert_eq!(export_file_name(""), "resume.pdf");
        assert_eq!(export_file_name("   "), "resume.pdf");
        assert_eq!(export_file_name("/"), "resume.pdf");
    }

    #[test]
    fn test_export_file_name_strips_separators() {
        assert_eq!(export_file_name("../etc/passwd"), "etcpasswd.pdf");
        assert_eq!(export_file_name("a\\b"), "ab.pdf");
    }

    #[tokio::test]
    async fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));
        let path = sink.deliver("Ada.pdf", b"%PDF-1.5".to_vec()).await.unwrap();

        assert_eq!(path, dir.path().join("out").join("Ada.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5");
    }
}
