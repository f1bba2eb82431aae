//! JSON-file case store.
//!
//! All cases live in a single `cases.json` under the data directory. Every
//! mutating operation rewrites the whole file; concurrent writers are
//! last-write-wins with no locking discipline. The store is the only
//! persistence layer: the orchestrator writes corrected references through
//! it during reconciliation, and the caller commits the final artifact
//! reference through it after a successful assembly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::case::{ArtifactReference, Case, DocumentReference};
use crate::errors::StoreError;
use crate::util::is_supported_document;

/// On-disk shape of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    cases: Vec<Case>,
}

pub struct CaseStore {
    path: PathBuf,
    file: StoreFile,
}

impl CaseStore {
    /// Open the store at `path`, creating an empty one (and its parent
    /// directories) if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            let store = Self {
                path,
                file: StoreFile::default(),
            };
            store.persist()?;
            return Ok(store);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| StoreError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        let file: StoreFile =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::WriteFailed {
                path: self.path.clone(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(&self.file).expect("store file serializes");
        std::fs::write(&self.path, content).map_err(|source| StoreError::WriteFailed {
            path: self.path.clone(),
            source,
        })
    }

    pub fn cases(&self) -> &[Case] {
        &self.file.cases
    }

    /// Resolve a full id or an unambiguous id prefix to a case.
    pub fn resolve(&self, query: &str) -> Result<&Case, StoreError> {
        if let Some(case) = self.file.cases.iter().find(|c| c.id == query) {
            return Ok(case);
        }
        let mut matches = self.file.cases.iter().filter(|c| c.id.starts_with(query));
        match (matches.next(), matches.next()) {
            (Some(case), None) => Ok(case),
            (Some(_), Some(_)) => Err(StoreError::AmbiguousCase {
                query: query.to_string(),
            }),
            (None, _) => Err(StoreError::CaseNotFound {
                query: query.to_string(),
            }),
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Case, StoreError> {
        self.file
            .cases
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::CaseNotFound {
                query: id.to_string(),
            })
    }

    /// Create a new empty case and return it.
    pub fn create(&mut self, title: &str) -> Result<Case, StoreError> {
        let case = Case::new(Uuid::new_v4().to_string(), title);
        self.file.cases.push(case.clone());
        self.persist()?;
        Ok(case)
    }

    /// Duplicate an existing case's file references under a new title.
    /// The output artifact is not carried over.
    pub fn duplicate(&mut self, id: &str, title: &str) -> Result<Case, StoreError> {
        let source = self.resolve(id)?;
        let mut case = Case::new(Uuid::new_v4().to_string(), title);
        case.main = source.main.clone();
        case.attachments = source.attachments.clone();
        self.file.cases.push(case.clone());
        self.persist()?;
        Ok(case)
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), StoreError> {
        self.get_mut(id)?.title = title.to_string();
        self.persist()
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.file.cases.len();
        self.file.cases.retain(|c| c.id != id);
        if self.file.cases.len() == before {
            return Err(StoreError::CaseNotFound {
                query: id.to_string(),
            });
        }
        self.persist()
    }

    /// Persist a case's file references (main + attachments) as-is.
    ///
    /// This is the write path the reconciliation loop uses to commit
    /// corrected paths between rounds, so a reference fixed in round N
    /// survives even if the user cancels in round N+1.
    pub fn save_files(
        &mut self,
        id: &str,
        main: Option<DocumentReference>,
        attachments: Vec<DocumentReference>,
    ) -> Result<(), StoreError> {
        let case = self.get_mut(id)?;
        case.main = main;
        case.attachments = attachments;
        self.persist()
    }

    /// Intake checks shared by `set_main` and `attach`. A path that does not
    /// exist yet is allowed (its drive may be unplugged); an existing but
    /// empty file is not.
    fn check_intake(path: &Path) -> Result<(), StoreError> {
        if !is_supported_document(path) {
            return Err(StoreError::UnsupportedDocument {
                path: path.to_path_buf(),
            });
        }
        if let Ok(meta) = std::fs::metadata(path)
            && meta.len() == 0
        {
            return Err(StoreError::EmptyDocument {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Set or replace the main document. Clears any committed output, since
    /// the artifact no longer reflects the case's contents.
    pub fn set_main(&mut self, id: &str, path: impl Into<PathBuf>) -> Result<(), StoreError> {
        let path = path.into();
        Self::check_intake(&path)?;
        let case = self.get_mut(id)?;
        case.main = Some(DocumentReference::from_path(path));
        case.output = None;
        self.persist()
    }

    /// Append an attachment. A path already referenced by the case is
    /// rejected rather than silently duplicated.
    pub fn attach(
        &mut self,
        id: &str,
        title: Option<&str>,
        path: impl Into<PathBuf>,
    ) -> Result<DocumentReference, StoreError> {
        let path = path.into();
        Self::check_intake(&path)?;
        let case = self.get_mut(id)?;
        if case.references_path(&path) {
            return Err(StoreError::DuplicateReference { path });
        }
        let reference = match title {
            Some(title) => DocumentReference::named(title, path),
            None => DocumentReference::from_path(path),
        };
        case.attachments.push(reference.clone());
        case.output = None;
        self.persist()?;
        Ok(reference)
    }

    /// Remove the attachment at `index` (zero-based) and return it.
    pub fn detach(&mut self, id: &str, index: usize) -> Result<DocumentReference, StoreError> {
        let case = self.get_mut(id)?;
        if index >= case.attachments.len() {
            return Err(StoreError::AttachmentOutOfRange {
                index,
                len: case.attachments.len(),
            });
        }
        let removed = case.attachments.remove(index);
        case.output = None;
        self.persist()?;
        Ok(removed)
    }

    /// Move the attachment at `from` to position `to`. Order is semantically
    /// meaningful: it determines attachment ordering in the final artifact.
    pub fn reorder(&mut self, id: &str, from: usize, to: usize) -> Result<(), StoreError> {
        let case = self.get_mut(id)?;
        let len = case.attachments.len();
        for index in [from, to] {
            if index >= len {
                return Err(StoreError::AttachmentOutOfRange { index, len });
            }
        }
        let reference = case.attachments.remove(from);
        case.attachments.insert(to, reference);
        case.output = None;
        self.persist()
    }

    /// Commit the output artifact reference. Called only after a `Success`
    /// outcome, never speculatively.
    pub fn commit_artifact(
        &mut self,
        id: &str,
        artifact: ArtifactReference,
    ) -> Result<(), StoreError> {
        self.get_mut(id)?.output = Some(artifact);
        self.persist()
    }
}
