//! Typed error hierarchy for the assembly orchestrator.
//!
//! Two top-level enums cover the two subsystems:
//! - `StoreError`: case store I/O and lookup failures
//! - `AssemblyError`: validation, reconciliation, and engine failures
//!
//! Filesystem and user-input problems are resolved locally inside the
//! reconciliation loop; engine-level problems surface as a terminal
//! `Failure` outcome rather than as errors. Nothing here is allowed to
//! crash the host process; the CLI reports and exits.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the case store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read case store at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write case store at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Case store at {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No case matches '{query}'")]
    CaseNotFound { query: String },

    #[error("'{query}' matches more than one case; use a longer id")]
    AmbiguousCase { query: String },

    #[error("Attachment index {index} is out of range (case has {len})")]
    AttachmentOutOfRange { index: usize, len: usize },

    #[error("{path} is already part of this case")]
    DuplicateReference { path: PathBuf },

    #[error("{path} is not a supported document type (pdf, docx)")]
    UnsupportedDocument { path: PathBuf },

    #[error("{path} is empty")]
    EmptyDocument { path: PathBuf },
}

/// Errors from the assembly orchestration flow.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A referenced file is missing and no correction could be obtained
    /// (e.g. running without prompts). Interactive runs resolve this inside
    /// the reconciliation loop instead.
    #[error("Source file for '{name}' is missing: {path}")]
    MissingSource { name: String, path: PathBuf },

    /// The user cancelled an interactive step. Corrections committed in
    /// earlier rounds remain; nothing else happens.
    #[error("Assembly cancelled")]
    Cancelled,

    #[error("Case has no main document")]
    NoMainDocument,

    /// A case store write failed mid-flow. Never swallowed: the caller must
    /// see that a correction or final commit did not land.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
