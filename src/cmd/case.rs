//! Case management commands: create, inspect, and edit cases and their
//! document references.

use anyhow::Result;
use console::style;
use dialoguer::Confirm;
use std::path::Path;

use bindery::case::Case;
use bindery::store::CaseStore;
use bindery::util::truncate_name;

pub fn cmd_new(store: &mut CaseStore, title: &str) -> Result<()> {
    let case = store.create(title)?;
    println!("Created case {} ({})", style(&case.title).cyan(), short_id(&case.id));
    Ok(())
}

pub fn cmd_list(store: &CaseStore) -> Result<()> {
    if store.cases().is_empty() {
        println!("No cases yet. Create one with `bindery new <title>`.");
        return Ok(());
    }
    for case in store.cases() {
        let artifact = match &case.output {
            Some(output) => format!(" {} {}", style("→").dim(), output.path.display()),
            None => String::new(),
        };
        println!(
            "{}  {} ({} attachment{}){}",
            style(short_id(&case.id)).dim(),
            truncate_name(&case.title, 48),
            case.attachments.len(),
            if case.attachments.len() == 1 { "" } else { "s" },
            artifact,
        );
    }
    Ok(())
}

pub fn cmd_show(store: &CaseStore, query: &str) -> Result<()> {
    let case = store.resolve(query)?;
    print_case(case);
    Ok(())
}

fn print_case(case: &Case) {
    println!("{} ({})", style(&case.title).cyan().bold(), case.id);
    match &case.main {
        Some(main) => {
            let marker = if main.exists() {
                style("ok").green()
            } else {
                style("missing").red()
            };
            println!("  main: {} [{}]", main.path.display(), marker);
        }
        None => println!("  main: {}", style("not set").dim()),
    }
    for (index, attachment) in case.attachments.iter().enumerate() {
        let marker = if attachment.exists() {
            style("ok").green()
        } else {
            style("missing").red()
        };
        println!(
            "  {:>2}. {} ({}) [{}]",
            index + 1,
            attachment.name,
            attachment.path.display(),
            marker,
        );
    }
    if let Some(output) = &case.output {
        println!(
            "  output: {} (updated {})",
            output.path.display(),
            output.updated
        );
    }
}

pub fn cmd_rename(store: &mut CaseStore, query: &str, title: &str) -> Result<()> {
    let id = store.resolve(query)?.id.clone();
    store.rename(&id, title)?;
    println!("Renamed {} to {}", short_id(&id), style(title).cyan());
    Ok(())
}

pub fn cmd_duplicate(store: &mut CaseStore, query: &str, title: &str) -> Result<()> {
    let id = store.resolve(query)?.id.clone();
    let copy = store.duplicate(&id, title)?;
    println!(
        "Duplicated into {} ({})",
        style(&copy.title).cyan(),
        short_id(&copy.id)
    );
    Ok(())
}

pub fn cmd_delete(store: &mut CaseStore, query: &str, force: bool) -> Result<()> {
    let case = store.resolve(query)?;
    let (id, title) = (case.id.clone(), case.title.clone());

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete case \"{title}\"?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.delete(&id)?;
    println!("Deleted {}", style(title).cyan());
    Ok(())
}

pub fn cmd_set_main(store: &mut CaseStore, query: &str, path: &Path) -> Result<()> {
    let id = store.resolve(query)?.id.clone();
    warn_if_absent(path);
    store.set_main(&id, path)?;
    println!("Main document set to {}", path.display());
    Ok(())
}

pub fn cmd_attach(
    store: &mut CaseStore,
    query: &str,
    path: &Path,
    title: Option<&str>,
) -> Result<()> {
    let id = store.resolve(query)?.id.clone();
    warn_if_absent(path);
    let reference = store.attach(&id, title, path)?;
    println!("Attached {} ({})", style(&reference.name).cyan(), path.display());
    Ok(())
}

pub fn cmd_detach(store: &mut CaseStore, query: &str, position: usize) -> Result<()> {
    let id = store.resolve(query)?.id.clone();
    let removed = store.detach(&id, position.saturating_sub(1))?;
    println!("Detached {}", style(&removed.name).cyan());
    Ok(())
}

pub fn cmd_reorder(store: &mut CaseStore, query: &str, from: usize, to: usize) -> Result<()> {
    let id = store.resolve(query)?.id.clone();
    store.reorder(&id, from.saturating_sub(1), to.saturating_sub(1))?;
    println!("Moved attachment {from} to position {to}");
    Ok(())
}

/// Attaching a path that does not exist yet is allowed (the drive may simply
/// be unplugged), but worth a heads-up.
fn warn_if_absent(path: &Path) {
    if !path.exists() {
        eprintln!(
            "{} {} does not exist right now; it will be validated at assembly time",
            style("note:").yellow(),
            path.display()
        );
    }
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}
