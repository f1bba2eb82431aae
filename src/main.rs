use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use bindery::config::{Config, Overrides};
use bindery::store::CaseStore;

mod cmd;

#[derive(Parser)]
#[command(name = "bindery")]
#[command(version, about = "Assemble legal filings from a main document and ordered attachments")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory holding cases.json and bindery.toml
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Rendering engine command to spawn
    #[arg(long, global = true)]
    pub engine: Option<String>,

    /// Address the engine's progress channel listens on
    #[arg(long, global = true)]
    pub channel: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new case
    New { title: String },
    /// List all cases
    List,
    /// Show a case's documents and their status
    Show { case: String },
    /// Rename a case
    Rename { case: String, title: String },
    /// Copy a case's documents into a new case
    Duplicate { case: String, title: String },
    /// Delete a case
    Delete {
        case: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Set or replace the main document
    SetMain { case: String, path: PathBuf },
    /// Add an attachment at the end of the list
    Attach {
        case: String,
        path: PathBuf,
        /// Title printed on the attachment cover page (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Remove the attachment at a 1-based position
    Detach { case: String, position: usize },
    /// Move an attachment from one 1-based position to another
    Reorder { case: String, from: usize, to: usize },
    /// Validate the case and render it into a single output document
    Assemble {
        case: String,
        /// Destination path (skips the save prompt)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Render with draft stamping
        #[arg(long)]
        draft: bool,
        /// Fail on missing files instead of prompting for corrections
        #[arg(long)]
        no_input: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = std::env::var("BINDERY_LOG")
        .unwrap_or_else(|_| if cli.verbose { "debug" } else { "warn" }.to_string());
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load(Overrides {
        data_dir: cli.data_dir.clone(),
        engine_cmd: cli.engine.clone(),
        channel: cli.channel.clone(),
        verbose: cli.verbose,
    })?;
    config.ensure_directories()?;

    match &cli.command {
        Commands::Assemble {
            case,
            output,
            draft,
            no_input,
        } => {
            cmd::cmd_assemble(
                &config,
                cmd::AssembleArgs {
                    query: case.clone(),
                    output: output.clone(),
                    draft: *draft,
                    no_input: *no_input,
                },
            )
            .await?;
            return Ok(());
        }
        _ => {}
    }

    let mut store = CaseStore::open(&config.store_file)?;
    match &cli.command {
        Commands::New { title } => cmd::cmd_new(&mut store, title)?,
        Commands::List => cmd::cmd_list(&store)?,
        Commands::Show { case } => cmd::cmd_show(&store, case)?,
        Commands::Rename { case, title } => cmd::cmd_rename(&mut store, case, title)?,
        Commands::Duplicate { case, title } => cmd::cmd_duplicate(&mut store, case, title)?,
        Commands::Delete { case, force } => cmd::cmd_delete(&mut store, case, *force)?,
        Commands::SetMain { case, path } => cmd::cmd_set_main(&mut store, case, path)?,
        Commands::Attach { case, path, title } => {
            cmd::cmd_attach(&mut store, case, path, title.as_deref())?
        }
        Commands::Detach { case, position } => cmd::cmd_detach(&mut store, case, *position)?,
        Commands::Reorder { case, from, to } => cmd::cmd_reorder(&mut store, case, *from, *to)?,
        Commands::Assemble { .. } => unreachable!("handled above"),
    }

    Ok(())
}
