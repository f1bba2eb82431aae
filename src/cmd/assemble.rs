//! The `assemble` command: reconcile a case's references, submit it to the
//! rendering engine, and stream progress until the terminal outcome.

use anyhow::Result;
use std::path::PathBuf;

use bindery::config::Config;
use bindery::engine::SubprocessEngine;
use bindery::engine::wire::GenerationOutcome;
use bindery::errors::AssemblyError;
use bindery::orchestrator::{commit_outcome, start_assembly};
use bindery::reconcile::{CorrectionSource, InteractiveCorrections, NoCorrections};
use bindery::relay::AssemblyEvent;
use bindery::request::{FixedOutput, InteractiveOutputPicker, OutputPicker};
use bindery::store::CaseStore;
use bindery::ui::AssemblyUI;

pub struct AssembleArgs {
    pub query: String,
    pub output: Option<PathBuf>,
    pub draft: bool,
    pub no_input: bool,
}

pub async fn cmd_assemble(config: &Config, args: AssembleArgs) -> Result<()> {
    let mut store = CaseStore::open(&config.store_file)?;
    let title = store.resolve(&args.query)?.title.clone();

    let mut interactive_corrections = InteractiveCorrections;
    let mut no_corrections = NoCorrections;
    let corrections: &mut dyn CorrectionSource = if args.no_input {
        &mut no_corrections
    } else {
        &mut interactive_corrections
    };

    let mut fixed_picker;
    let mut interactive_picker;
    let picker: &mut dyn OutputPicker = match args.output {
        Some(path) => {
            fixed_picker = FixedOutput(path);
            &mut fixed_picker
        }
        None if args.no_input => {
            anyhow::bail!("--no-input requires --output");
        }
        None => {
            interactive_picker = InteractiveOutputPicker;
            &mut interactive_picker
        }
    };

    let engine = SubprocessEngine::new(config.engine_cmd.clone(), config.channel_addr);

    let assembly = match start_assembly(
        &args.query,
        &mut store,
        corrections,
        picker,
        &engine,
        args.draft,
    )
    .await
    {
        Ok(assembly) => assembly,
        Err(AssemblyError::Cancelled) => {
            println!("Assembly cancelled.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let ui = AssemblyUI::new(config.verbose);
    ui.begin(&title);
    ui.log_step(&format!(
        "engine: {} (channel {})",
        config.engine_cmd, config.channel_addr
    ));

    let mut subscription = assembly.running.relay().subscribe();
    let drain = tokio::spawn(async move {
        let mut last: Option<GenerationOutcome> = None;
        while let Some(event) = subscription.next().await {
            match event {
                AssemblyEvent::Progress(frame) => ui.on_progress(&frame),
                AssemblyEvent::Finished(outcome) => {
                    match &outcome {
                        GenerationOutcome::Success(artifact) => ui.success(artifact),
                        GenerationOutcome::Failure { message } => ui.failure(message),
                    }
                    last = Some(outcome);
                    break;
                }
            }
        }
        last
    });

    let outcome = assembly.running.wait().await;
    let _ = drain.await;

    commit_outcome(&mut store, &assembly.case_id, &outcome)?;

    match outcome {
        GenerationOutcome::Success(_) => Ok(()),
        GenerationOutcome::Failure { message } => anyhow::bail!("assembly failed: {message}"),
    }
}
