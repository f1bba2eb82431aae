//! Case model: a main document plus an ordered list of attachments, assembled
//! into one output artifact.
//!
//! References point at files by absolute path; the files themselves are never
//! copied, so a reference can go stale when the file is moved or its drive is
//! removed. Existence is therefore re-checked on every validation pass and
//! never cached here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::util::display_name;

/// A named pointer to a source file by absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    /// Human-readable name shown in prompts and listings. For attachments this
    /// doubles as the title printed on the attachment cover page.
    pub name: String,
    pub path: PathBuf,
}

impl DocumentReference {
    /// Build a reference with the display name derived from the file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self { name, path }
    }

    pub fn named(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Live filesystem check; the filesystem is external mutable state, so the
    /// answer is only valid for the instant it was taken.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// The committed output of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub path: PathBuf,
    /// Viewer handle reported by the engine, when it provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_url: Option<String>,
    /// Date the artifact was produced, as reported by the engine.
    pub updated: String,
}

/// A unit of work: one filing to be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<DocumentReference>,
    #[serde(default)]
    pub attachments: Vec<DocumentReference>,
    /// Set only after a successful assembly, never speculatively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ArtifactReference>,
}

impl Case {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            main: None,
            attachments: Vec::new(),
            output: None,
        }
    }

    /// Whether a path is already referenced by the main document or any attachment.
    pub fn references_path(&self, path: &Path) -> bool {
        self.main.as_ref().is_some_and(|m| m.path == path)
            || self.attachments.iter().any(|a| a.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_derives_name_from_stem() {
        let doc = DocumentReference::from_path("/a/b/exhibit-1.pdf");
        assert_eq!(doc.name, "exhibit-1");
        assert_eq!(doc.path, PathBuf::from("/a/b/exhibit-1.pdf"));
    }

    #[test]
    fn references_path_checks_main_and_attachments() {
        let mut case = Case::new("c1", "Smith v. Jones");
        case.main = Some(DocumentReference::from_path("/a/brief.docx"));
        case.attachments
            .push(DocumentReference::named("Exhibit 1", "/a/ex1.pdf"));

        assert!(case.references_path(Path::new("/a/brief.docx")));
        assert!(case.references_path(Path::new("/a/ex1.pdf")));
        assert!(!case.references_path(Path::new("/a/other.pdf")));
    }

    #[test]
    fn case_round_trips_through_json() {
        let mut case = Case::new("c1", "Smith v. Jones");
        case.main = Some(DocumentReference::from_path("/a/brief.docx"));
        case.output = Some(ArtifactReference {
            path: PathBuf::from("/out/filing.pdf"),
            view_url: None,
            updated: "2026-08-01".to_string(),
        });

        let json = serde_json::to_string(&case).unwrap();
        let back: Case = serde_json::from_str(&json).unwrap();
        assert_eq!(back, case);
        // view_url is omitted, not serialized as null
        assert!(!json.contains("view_url"));
    }

    #[test]
    fn case_without_optional_fields_deserializes() {
        let json = r#"{"id":"c1","title":"T"}"#;
        let case: Case = serde_json::from_str(json).unwrap();
        assert!(case.main.is_none());
        assert!(case.attachments.is_empty());
        assert!(case.output.is_none());
    }
}
