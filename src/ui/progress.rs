use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::case::ArtifactReference;
use crate::engine::wire::{FileKind, ProgressEvent};
use crate::util::truncate_name;

/// Terminal UI for one assembly run, rendered via an `indicatif` progress bar.
///
/// The bar's length follows the engine's reported totals frame by frame; the
/// message line shows the current phase and the file being worked on. Before
/// the first frame arrives the bar spins with a waiting message, since the
/// engine controls when progress starts flowing.
pub struct AssemblyUI {
    bar: ProgressBar,
    verbose: bool,
}

impl AssemblyUI {
    pub fn new(verbose: bool) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{prefix:.bold.dim} {spinner} {msg}")
                .expect("progress bar template is a valid static string"),
        );
        bar.set_prefix("Assemble");
        Self { bar, verbose }
    }

    /// Announce the run and start the spinner while waiting for the engine
    /// to connect.
    pub fn begin(&self, title: &str) {
        self.bar.set_message(format!(
            "{} {}",
            style(title).cyan(),
            style("(starting...)").dim()
        ));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    /// Apply one progress frame.
    pub fn on_progress(&self, event: &ProgressEvent) {
        if self.bar.length() != Some(event.total) {
            self.bar.set_style(
                ProgressStyle::default_bar()
                    .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("progress bar template is a valid static string")
                    .progress_chars("█▓▒░"),
            );
            self.bar.set_length(event.total);
        }
        self.bar.set_position(event.step);

        let subject = match &event.file {
            Some(file) => {
                let label = match file.kind {
                    FileKind::Main => "main",
                    FileKind::Attachment => "attachment",
                };
                format!(" {} {}", style(label).dim(), truncate_name(&file.name, 32))
            }
            None => String::new(),
        };
        self.bar.set_message(format!(
            "{}{}",
            style(event.phase.label()).yellow(),
            subject
        ));
    }

    pub fn success(&self, artifact: &ArtifactReference) {
        self.bar.finish_and_clear();
        println!(
            "{} {}",
            style("✓").green().bold(),
            style(format!("Saved {}", artifact.path.display())).green()
        );
    }

    pub fn failure(&self, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", style("✗").red().bold(), style(message).red());
    }

    /// Verbose-only diagnostic line, printed above the bar.
    pub fn log_step(&self, msg: &str) {
        if self.verbose {
            self.bar.println(format!("  {}", style(msg).dim()));
        }
    }
}
