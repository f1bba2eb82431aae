//! Wire contracts shared with the rendering engine.
//!
//! Two streams exist per run: a progress channel carrying one JSON frame per
//! line, and the engine's stdout, which carries exactly one terminal JSON
//! payload when the run ends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::case::ArtifactReference;
use crate::request::AssemblyRequest;

/// Rendering phase reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Converting,
    Merging,
    Numbering,
    Saving,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Converting => "converting",
            Phase::Merging => "merging",
            Phase::Numbering => "numbering",
            Phase::Saving => "saving",
        }
    }
}

/// Which document a progress frame refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Main,
    Attachment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub kind: FileKind,
    pub index: usize,
    pub name: String,
}

/// One frame from the progress channel. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: u64,
    pub total: u64,
    pub message: String,
    pub phase: Phase,
    #[serde(default)]
    pub file: Option<FileDescriptor>,
}

/// The serialized argument handed to the engine process.
#[derive(Debug, Serialize)]
pub struct EngineJob {
    pub main: JobDocument,
    pub attachments: Vec<JobAttachment>,
    pub output: JobOutput,
    #[serde(rename = "isDraft")]
    pub is_draft: bool,
}

#[derive(Debug, Serialize)]
pub struct JobDocument {
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct JobAttachment {
    pub path: PathBuf,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct JobOutput {
    pub path: PathBuf,
}

impl EngineJob {
    pub fn from_request(request: &AssemblyRequest) -> Self {
        EngineJob {
            main: JobDocument {
                path: request.main().path.clone(),
            },
            attachments: request
                .attachments()
                .iter()
                .map(|a| JobAttachment {
                    path: a.path.clone(),
                    title: a.name.clone(),
                })
                .collect(),
            output: JobOutput {
                path: request.output_path().clone(),
            },
            is_draft: request.draft(),
        }
    }
}

/// The single JSON object the engine prints on stdout when it exits.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TerminalPayload {
    Success { output: TerminalOutput },
    Error { error: TerminalError },
}

#[derive(Debug, Deserialize)]
pub struct TerminalOutput {
    pub path: PathBuf,
    #[serde(default)]
    pub url: Option<String>,
    pub updated: String,
}

#[derive(Debug, Deserialize)]
pub struct TerminalError {
    pub message: String,
}

/// How one assembly run ended. Emitted exactly once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(ArtifactReference),
    Failure { message: String },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success(_))
    }
}

impl From<TerminalPayload> for GenerationOutcome {
    fn from(payload: TerminalPayload) -> Self {
        match payload {
            TerminalPayload::Success { output } => GenerationOutcome::Success(ArtifactReference {
                path: output.path,
                view_url: output.url,
                updated: output.updated,
            }),
            TerminalPayload::Error { error } => GenerationOutcome::Failure {
                message: error.message,
            },
        }
    }
}

/// Parse the terminal payload printed on the engine's stdout. Anything other
/// than a single well-formed object becomes a generic failure.
pub fn parse_terminal(stdout: &str) -> GenerationOutcome {
    let trimmed = stdout.trim();
    match serde_json::from_str::<TerminalPayload>(trimmed) {
        Ok(payload) => payload.into(),
        Err(_) => GenerationOutcome::Failure {
            message: "engine produced no readable result".to_string(),
        },
    }
}

/// Parse one line from the progress channel.
pub fn parse_frame(line: &str) -> Result<ProgressEvent, serde_json::Error> {
    serde_json::from_str(line)
}
