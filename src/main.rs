//! markspan - keep named text spans anchored in a markdown document.
//!
//! # Usage
//!
//! ```bash
//! markspan notes.md --markers spans.json
//! markspan notes.md --markers spans.json --mode rich-text --select intro
//! markspan notes.md --markers spans.json --watch --export spans.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use markspan::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use markspan::coordinator::{CoordinatorOptions, MarkerCoordinator};
use markspan::editor::{DEFAULT_WIDTH, Editor};
use markspan::marker::{MarkerId, MarkerSeed};
use markspan::perf;
use markspan::view::ViewMode;
use markspan::watcher::FileWatcher;

/// Keep named text spans anchored in a markdown document
#[derive(Parser, Debug)]
#[command(name = "markspan", version, about, long_about = None)]
struct Cli {
    /// Markdown file to open
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// JSON array of markers: [{"id": "a", "start": 0, "end": 4}]
    #[arg(short, long, value_name = "PATH")]
    markers: Option<PathBuf>,

    /// Surface the marker offsets should refer to
    #[arg(long, value_enum)]
    mode: Option<ViewMode>,

    /// Viewport width used for highlight geometry
    #[arg(long, value_name = "COLUMNS")]
    width: Option<u16>,

    /// Open read-only, as a viewer
    #[arg(long)]
    view_only: bool,

    /// Select a marker and print the resulting selection
    #[arg(long, value_name = "ID")]
    select: Option<String>,

    /// Write the markers (source offsets) to a file on exit
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Watch the file and reconcile markers on every external edit
    #[arg(short, long)]
    watch: bool,

    /// Quiet period before an edit is reconciled
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Print timing of reconciliation passes
    #[arg(long)]
    perf: bool,

    /// Write marker and watcher events to a file
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn load_seeds(path: &Path) -> Result<Vec<MarkerSeed>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read markers {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse markers {}", path.display()))
}

/// Feed external edits to the coordinator until interrupted.
///
/// With `export`, the export file is rewritten after every batch of updates
/// so an interrupted watch keeps the latest offsets.
fn watch_loop(
    coordinator: &mut MarkerCoordinator,
    path: &Path,
    watcher: &FileWatcher,
    export: Option<&Path>,
) -> Result<()> {
    let started = Instant::now();
    let poll = Duration::from_millis(25);
    eprintln!("watching {} (Ctrl-C to stop)", watcher.target_path().display());
    loop {
        if watcher.wait_change(poll) {
            match fs::read_to_string(path) {
                Ok(content) if content != coordinator.editor().value() => {
                    coordinator.editor_mut().replace_all(&content);
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(%err, path = %path.display(), "reload failed"),
            }
        }
        let now_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        coordinator.pump(now_ms);
        let updates = coordinator.take_updates();
        for update in &updates {
            println!("{}", serde_json::to_string(update)?);
        }
        if let Some(export) = export.filter(|_| !updates.is_empty()) {
            write_export(coordinator, export)?;
        }
    }
}

fn write_export(coordinator: &mut MarkerCoordinator, path: &Path) -> Result<()> {
    let data = coordinator.export_markers();
    fs::write(path, serde_json::to_string_pretty(&data)? + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = ConfigFlags {
        watch: cli.watch,
        perf: cli.perf,
        mode: cli.mode,
        width: cli.width,
        debounce_ms: cli.debounce_ms,
        debug_log: cli.debug_log.clone(),
    };

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("MARKSPAN_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        tracing::warn!(
            %err,
            path = ?debug_log_path,
            "failed to open debug log"
        );
    }

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }
    let content = fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let seeds = match &cli.markers {
        Some(path) => load_seeds(path)?,
        None => Vec::new(),
    };

    let width = effective.width.unwrap_or(DEFAULT_WIDTH);
    let editor = if cli.view_only {
        Editor::view_only("", width)
    } else {
        Editor::new("", effective.mode.unwrap_or(ViewMode::Source), width)
    };
    let options = effective
        .debounce_ms
        .map_or_else(CoordinatorOptions::default, |debounce_ms| {
            CoordinatorOptions { debounce_ms }
        });
    let mut coordinator = MarkerCoordinator::new(editor, options);
    let markers = coordinator
        .set_value_with_markers(&content, &seeds)
        .context("Invalid marker data")?;
    coordinator.take_updates();

    println!("{}", serde_json::to_string_pretty(&markers)?);

    if let Some(id) = &cli.select {
        let id = MarkerId::from(id.as_str());
        coordinator.select_marker(&id);
        println!("{}", serde_json::to_string(&coordinator.current_selection())?);
    }

    if effective.watch {
        let watcher = FileWatcher::new(&cli.file)
            .with_context(|| format!("Failed to watch {}", cli.file.display()))?;
        return watch_loop(&mut coordinator, &cli.file, &watcher, cli.export.as_deref());
    }

    if let Some(path) = &cli.export {
        write_export(&mut coordinator, path)?;
    }
    Ok(())
}

