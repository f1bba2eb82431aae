//! The interactive reconciliation loop that repairs stale path references
//! before assembly.
//!
//! Each round runs one validation pass, surfaces the first unresolved
//! missing reference to the correction source, and feeds the supplied
//! correction into the next pass. Updated references are committed to the
//! case store before re-validating, so a reference fixed in round N survives
//! even if the user cancels in round N+1. No round cap is enforced here; a
//! correction source may choose to give up on its own.

use console::style;
use dialoguer::{Confirm, Input};
use std::path::PathBuf;

use crate::case::Case;
use crate::errors::AssemblyError;
use crate::store::CaseStore;
use crate::validate::{CorrectionDirective, MissingReference, validate_case};

/// A user-supplied replacement for one missing reference.
#[derive(Debug, Clone)]
pub struct Correction {
    pub fixed_path: PathBuf,
    pub apply_for_all: bool,
}

/// Where corrections come from. The interactive CLI implementation prompts
/// the user; tests drive the loop with scripted corrections.
pub trait CorrectionSource {
    /// Ask for a replacement path for `missing`. `round` is 1-based and only
    /// informational (e.g. an interactive layer may offer to give up after
    /// many rounds). Returning `Ok(None)` cancels the whole assembly.
    fn correct(
        &mut self,
        missing: &MissingReference,
        round: u32,
    ) -> Result<Option<Correction>, AssemblyError>;
}

/// Run the reconciliation loop to completion.
///
/// Returns the fully validated case, or `Cancelled` if the source declined
/// to supply a correction. Corrections already committed in earlier rounds
/// remain in the store either way.
pub fn reconcile(
    mut case: Case,
    store: &mut CaseStore,
    source: &mut dyn CorrectionSource,
) -> Result<Case, AssemblyError> {
    let mut correction: Option<CorrectionDirective> = None;
    let mut round: u32 = 0;

    loop {
        round += 1;
        let validation = validate_case(case, correction.as_ref());
        case = validation.case;

        if correction.is_some() {
            // Commit the repaired references before the next pass.
            store.save_files(&case.id, case.main.clone(), case.attachments.clone())?;
        }

        let Some(missing) = validation.missing else {
            tracing::debug!(case = %case.id, rounds = round, "all references validated");
            return Ok(case);
        };

        tracing::debug!(
            case = %case.id,
            round,
            name = %missing.name,
            path = %missing.path.display(),
            "missing source file"
        );

        let Some(supplied) = source.correct(&missing, round)? else {
            return Err(AssemblyError::Cancelled);
        };
        correction = Some(CorrectionDirective {
            original_path: missing.path,
            fixed_path: supplied.fixed_path,
            apply_for_all: supplied.apply_for_all,
        });
    }
}

/// Terminal prompt for corrections: show which document went missing, take a
/// replacement path, and offer to reuse its folder for every other missing
/// file.
pub struct InteractiveCorrections;

impl CorrectionSource for InteractiveCorrections {
    fn correct(
        &mut self,
        missing: &MissingReference,
        _round: u32,
    ) -> Result<Option<Correction>, AssemblyError> {
        println!(
            "{} \"{}\" was not found at {}",
            style("Missing file:").yellow().bold(),
            missing.name,
            style(missing.path.display()).dim(),
        );

        let input: String = Input::new()
            .with_prompt("New path (leave empty to cancel)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| AssemblyError::Other(e.into()))?;

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let apply_for_all = Confirm::new()
            .with_prompt("Apply this folder to all other missing files?")
            .default(false)
            .interact()
            .unwrap_or(false);

        Ok(Some(Correction {
            fixed_path: PathBuf::from(trimmed),
            apply_for_all,
        }))
    }
}

/// Non-interactive source for scripted runs: any missing reference is a
/// hard error instead of a prompt.
pub struct NoCorrections;

impl CorrectionSource for NoCorrections {
    fn correct(
        &mut self,
        missing: &MissingReference,
        _round: u32,
    ) -> Result<Option<Correction>, AssemblyError> {
        Err(AssemblyError::MissingSource {
            name: missing.name.clone(),
            path: missing.path.clone(),
        })
    }
}
