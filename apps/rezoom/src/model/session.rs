use crate::model::document::ResumeDocument;
use crate::model::ids::{IdGenerator, UuidIds};
use crate::model::update::EntryKind;
use crate::model::DocumentError;

/// One editing session: the document, its id source, and the remote record it came from.
///
/// `record_id` is `None` for a brand-new résumé; the first successful save fills it
/// so later saves update instead of creating a second record.
pub struct EditingSession {
    pub document: ResumeDocument,
    pub record_id: Option<String>,
    ids: Box<dyn IdGenerator>,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::with_ids(ResumeDocument::new(), None, Box::new(UuidIds))
    }

    pub fn with_ids(
        document: ResumeDocument,
        record_id: Option<String>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            document,
            record_id,
            ids,
        }
    }

    pub fn from_record(record_id: impl Into<String>, document: ResumeDocument) -> Self {
        Self::with_ids(document, Some(record_id.into()), Box::new(UuidIds))
    }

    /// Adds an entry using the session's own id generator.
    pub fn add_entry(&mut self, kind: EntryKind) -> Result<String, DocumentError> {
        self.document.add_entry(kind, self.ids.as_mut())
    }

    pub fn is_new(&self) -> bool {
        self.record_id.is_none()
    }
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::SequentialIds;

    #[test]
    fn test_session_add_entry_uses_injected_generator() {
        let mut session =
            EditingSession::with_ids(ResumeDocument::new(), None, Box::new(SequentialIds::new("s")));
        assert_eq!(session.add_entry(EntryKind::Experience).unwrap(), "s1");
        assert_eq!(session.add_entry(EntryKind::Project).unwrap(), "s2");
        assert!(session.is_new());
    }

    #[test]
    fn test_from_record_is_not_new() {
        let session = EditingSession::from_record("42", ResumeDocument::new());
        assert_eq!(session.record_id.as_deref(), Some("42"));
        assert!(!session.is_new());
    }
}
