//! Assembly orchestrator: drives one case from validation through engine
//! submission and commits the artifact after a successful run.
//!
//! The flow is reconcile, build the request, submit to the engine. Progress
//! is consumed by subscribing to the running assembly's relay; the outcome
//! is committed to the store only here, never speculatively.

use tracing::info;

use crate::engine::wire::GenerationOutcome;
use crate::engine::{EngineLauncher, RunningAssembly};
use crate::errors::AssemblyError;
use crate::reconcile::{CorrectionSource, reconcile};
use crate::request::{OutputPicker, build_request};
use crate::store::CaseStore;

/// One submitted assembly, carrying the case it belongs to so the outcome
/// can be committed back.
#[derive(Debug)]
pub struct Assembly {
    pub case_id: String,
    pub running: RunningAssembly,
}

/// Validate and reconcile the case, build the request, and hand it to the
/// engine. Returns once the engine run is in flight; subscribe to
/// `running.relay()` before awaiting the outcome to observe progress.
pub async fn start_assembly(
    query: &str,
    store: &mut CaseStore,
    corrections: &mut dyn CorrectionSource,
    picker: &mut dyn OutputPicker,
    engine: &dyn EngineLauncher,
    draft: bool,
) -> Result<Assembly, AssemblyError> {
    let case = store.resolve(query)?.clone();
    info!(case_id = %case.id, title = %case.title, "starting assembly");

    let case = reconcile(case, store, corrections)?;
    let request = build_request(&case, picker, draft)?;
    let running = engine.submit(request).await;

    Ok(Assembly {
        case_id: case.id,
        running,
    })
}

/// Commit a terminal outcome. Only a success updates the case's output
/// reference; a failure leaves the store untouched.
pub fn commit_outcome(
    store: &mut CaseStore,
    case_id: &str,
    outcome: &GenerationOutcome,
) -> Result<(), AssemblyError> {
    match outcome {
        GenerationOutcome::Success(artifact) => {
            store.commit_artifact(case_id, artifact.clone())?;
            info!(case_id, path = %artifact.path.display(), "artifact committed");
            Ok(())
        }
        GenerationOutcome::Failure { .. } => Ok(()),
    }
}
