//! Assembly request construction: resolve the output destination and package
//! a fully validated case into an immutable request for the engine.

use dialoguer::Input;
use std::path::PathBuf;

use crate::case::{Case, DocumentReference};
use crate::errors::AssemblyError;

/// The immutable, fully validated package handed to the engine. Built only
/// for a case whose references all passed validation, and consumed exactly
/// once by the engine bridge.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    main: DocumentReference,
    attachments: Vec<DocumentReference>,
    output_path: PathBuf,
    draft: bool,
}

impl AssemblyRequest {
    pub fn main(&self) -> &DocumentReference {
        &self.main
    }

    /// Attachments in case order. The order is semantically meaningful: it
    /// determines attachment ordering in the final artifact.
    pub fn attachments(&self) -> &[DocumentReference] {
        &self.attachments
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    pub fn draft(&self) -> bool {
        self.draft
    }
}

/// Where the output destination comes from. The interactive implementation
/// prompts with a pre-seeded default filename; scripted runs supply a fixed
/// path.
pub trait OutputPicker {
    /// Pick a destination. Returning `Ok(None)` cancels the assembly before
    /// any process is spawned.
    fn choose(&mut self, default_name: &str) -> Result<Option<PathBuf>, AssemblyError>;
}

/// Build the request for a validated case.
///
/// Fails with `NoMainDocument` if the case has no main reference, and with
/// `Cancelled` if the picker declines to choose a destination.
pub fn build_request(
    case: &Case,
    picker: &mut dyn OutputPicker,
    draft: bool,
) -> Result<AssemblyRequest, AssemblyError> {
    let main = case.main.clone().ok_or(AssemblyError::NoMainDocument)?;

    let default_name = if case.title.trim().is_empty() {
        "filing.pdf".to_string()
    } else {
        format!("{}.pdf", case.title.trim())
    };
    let Some(output_path) = picker.choose(&default_name)? else {
        return Err(AssemblyError::Cancelled);
    };

    Ok(AssemblyRequest {
        main,
        attachments: case.attachments.clone(),
        output_path,
        draft,
    })
}

/// Terminal prompt for the destination path.
pub struct InteractiveOutputPicker;

impl OutputPicker for InteractiveOutputPicker {
    fn choose(&mut self, default_name: &str) -> Result<Option<PathBuf>, AssemblyError> {
        let input: String = Input::new()
            .with_prompt("Save assembled filing as")
            .with_initial_text(default_name)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| AssemblyError::Other(e.into()))?;

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(trimmed)))
    }
}

/// Non-interactive picker carrying a predetermined destination.
pub struct FixedOutput(pub PathBuf);

impl OutputPicker for FixedOutput {
    fn choose(&mut self, _default_name: &str) -> Result<Option<PathBuf>, AssemblyError> {
        Ok(Some(self.0.clone()))
    }
}
