//! adbc - command-line front end for adb-commander

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use adb_commander::config::Config;
use adb_commander::errors::{AppError, AppResult};
use adb_commander::ops::{JobProgress, TransferItem, TransferJob, create_directory};
use adb_commander::providers::{BackendKind, PanelProvider, ProviderError};
use adb_commander::state::{BackgroundTask, Panel, TaskResult};
use adb_commander::utils::{format_date, format_size};

mod cli;

use cli::{Cli, Command, Location};

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load();

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn provider_for(config: &Config, kind: BackendKind) -> Box<dyn PanelProvider> {
    match kind {
        BackendKind::Local => Box::new(config.local_provider()),
        BackendKind::Adb => Box::new(config.adb_provider()),
    }
}

fn open_panel(config: &Config, kind: BackendKind, path: Option<&str>, show_hidden: bool) -> Panel {
    let provider = provider_for(config, kind);
    let status = Box::new(|message: &str| eprintln!("{}", message));
    match path {
        Some(path) => Panel::at_path(provider, None, status, show_hidden, path),
        None => Panel::new(provider, None, status, show_hidden),
    }
}

fn run(command: Command, config: &Config) -> AppResult<()> {
    match command {
        Command::Devices => devices(config),
        Command::Ls { backend, path, all } => {
            let panel = open_panel(
                config,
                backend.0,
                path.as_deref(),
                all || config.general.show_hidden,
            );
            print_listing(&panel);
            Ok(())
        }
        Command::Cp { sources, dest } => transfer(config, sources, dest, false),
        Command::Mv { sources, dest } => transfer(config, sources, dest, true),
        Command::Rm { targets, force } => remove(config, targets, force),
        Command::Mkdir { target } => {
            let mut provider = provider_for(config, target.kind);
            create_directory(provider.as_mut(), &target.path)?;
            eprintln!("Created {}", target.path);
            Ok(())
        }
        Command::Stat { path } => {
            match config.adb_provider().stat(&path) {
                Some(stat) => println!(
                    "{}\t{}\t{}\t{}",
                    if stat.is_dir { "directory" } else { "file" },
                    stat.size,
                    format_date(stat.modified),
                    path
                ),
                None => println!("{}: not available", path),
            }
            Ok(())
        }
        Command::Diff { left, right } => {
            diff(config, &left, &right);
            Ok(())
        }
        Command::Use { serial } => remember_device(config, serial),
    }
}

/// Persist the device serial in the config file, keeping its comments
fn remember_device(config: &Config, serial: Option<String>) -> AppResult<()> {
    let mut config = config.clone();
    config.adb.serial = serial;
    config.save()?;
    match &config.adb.serial {
        Some(serial) => eprintln!("Using device {}", serial),
        None => eprintln!("Using whichever device is attached"),
    }
    Ok(())
}

fn devices(config: &Config) -> AppResult<()> {
    let task = BackgroundTask::probe(provider_for(config, BackendKind::Adb));
    match task.wait() {
        Some(TaskResult::Probed { connected: true, .. }) => {
            println!("device ready");
            Ok(())
        }
        Some(_) => Err(ProviderError::NotConnected("no device attached".to_string()).into()),
        None => Err(AppError::Config("probe thread exited".to_string())),
    }
}

fn print_listing(panel: &Panel) {
    println!("{} {}", panel.kind().label(), panel.path);
    for entry in &panel.entries {
        let name = match &entry.symlink_target {
            Some(target) => format!("{} -> {}", entry.name, target),
            None if entry.is_dir && !entry.is_parent => format!("{}/", entry.name),
            None => entry.name.clone(),
        };
        println!(
            "{:<11} {:>8} {:>8} {:>10} {} {}",
            entry.permissions,
            entry.owner,
            entry.group,
            entry.size,
            format_date(entry.modified),
            name
        );
    }
    println!("{}", panel.summary());
}

/// Collect the items for a job; they must all live on one backend
fn job_items(
    provider: &mut dyn PanelProvider,
    locations: &[Location],
) -> AppResult<(BackendKind, Vec<TransferItem>)> {
    let kind = locations
        .first()
        .map(|l| l.kind)
        .ok_or_else(|| AppError::InvalidJob("nothing to do".to_string()))?;
    if locations.iter().any(|l| l.kind != kind) {
        return Err(AppError::InvalidJob(
            "all sources must be on the same backend".to_string(),
        ));
    }

    let mut items = Vec::with_capacity(locations.len());
    for location in locations {
        let is_dir = match provider.parent_path(&location.path) {
            Some(dir) => provider
                .list_directory(&dir)?
                .iter()
                .any(|e| e.is_dir && e.name == provider.base_name(&location.path)),
            None => false,
        };
        items.push(TransferItem {
            path: location.path.clone(),
            is_dir,
        });
    }
    Ok((kind, items))
}

fn transfer(config: &Config, sources: Vec<Location>, dest: Location, is_move: bool) -> AppResult<()> {
    let kind = sources.first().map(|l| l.kind).unwrap_or(BackendKind::Local);
    let mut source = provider_for(config, kind);
    let (source_kind, items) = job_items(source.as_mut(), &sources)?;

    // The destination is shown as a panel once the job is done
    let mut dest_panel = open_panel(
        config,
        dest.kind,
        Some(&dest.path),
        config.general.show_hidden,
    );

    let job = if is_move {
        TransferJob::move_to(items, source_kind, dest.path.clone(), dest.kind)
    } else {
        TransferJob::copy(items, source_kind, dest.path.clone(), dest.kind)
    };
    let (_, target, result) = run_in_background(job, source, Some(dest_panel.take_provider()));
    if let Some(target) = target {
        dest_panel.restore_provider(target);
        dest_panel.refresh();
        println!("{}: {}", dest_panel.path, dest_panel.summary());
    }
    result
}

fn remove(config: &Config, targets: Vec<Location>, force: bool) -> AppResult<()> {
    let kind = targets.first().map(|l| l.kind).unwrap_or(BackendKind::Local);
    let mut source = provider_for(config, kind);
    let (source_kind, items) = job_items(source.as_mut(), &targets)?;

    if !force && !confirm(&format!("Delete {} item(s) on {}?", items.len(), source_kind.label()))? {
        eprintln!("Cancelled");
        return Ok(());
    }

    let (_, _, result) = run_in_background(TransferJob::delete(items, source_kind), source, None);
    result
}

fn confirm(message: &str) -> io::Result<bool> {
    eprint!("{} [y/N] ", message);
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Run `job` on a worker thread, printing progress until it finishes.
/// The providers come back alongside the outcome.
fn run_in_background(
    job: TransferJob,
    source: Box<dyn PanelProvider>,
    target: Option<Box<dyn PanelProvider>>,
) -> (Box<dyn PanelProvider>, Option<Box<dyn PanelProvider>>, AppResult<()>) {
    let task = BackgroundTask::transfer(job, source, target);

    let finished = loop {
        for progress in task.poll_progress() {
            print_progress(&progress);
        }
        if let Some(result) = task.try_recv() {
            break result;
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    for progress in task.poll_progress() {
        print_progress(&progress);
    }
    eprintln!();

    match finished {
        TaskResult::JobFinished {
            operation,
            source,
            target,
            result,
        } => {
            let result = result.map(|count| {
                eprintln!("{} {} item(s)", operation.past_tense(), count);
            });
            (source, target, result)
        }
        TaskResult::Probed { provider, .. } => (provider, None, Ok(())),
    }
}

fn print_progress(progress: &JobProgress) {
    let item = match progress.item_fraction {
        Some(f) => format!(" {:>3.0}%", f * 100.0),
        None => String::new(),
    };
    eprint!(
        "\r[{:>3.0}%] {}/{} {}{}\x1b[K",
        progress.fraction * 100.0,
        progress.items_done,
        progress.items_total,
        progress.current_item,
        item
    );
    let _ = io::stderr().flush();
}

fn diff(config: &Config, left: &Location, right: &Location) {
    let show_hidden = config.general.show_hidden;
    let mut left_panel = open_panel(config, left.kind, Some(&left.path), show_hidden);
    let mut right_panel = open_panel(config, right.kind, Some(&right.path), show_hidden);

    let left_names = left_panel.file_names();
    let right_names = right_panel.file_names();
    let left_unique = left_panel.enable_diff(&right_names);
    let right_unique = right_panel.enable_diff(&left_names);
    eprintln!("Diff: left has {} unique, right has {} unique", left_unique, right_unique);

    for (label, panel) in [("<", &left_panel), (">", &right_panel)] {
        for entry in panel.entries.iter().filter(|e| panel.is_diff_unique(e)) {
            let suffix = if entry.is_dir { "/" } else { "" };
            println!("{} {}{}", label, entry.name, suffix);
        }
    }

    let selected = left_panel.select_diff_unique_only();
    if selected && left_panel.selected_count() > 0 {
        eprintln!(
            "{} only on the left",
            format_size(left_panel.selected_size())
        );
    }
}
