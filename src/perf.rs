//! Lightweight timing and event log.
//!
//! Timing scopes print to stderr when enabled with `--perf`. Events go to the
//! file given with `--debug-log`, one line each, stamped with milliseconds
//! since the log was opened.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static EVENT_LOG: LazyLock<Mutex<EventLog>> = LazyLock::new(|| Mutex::new(EventLog::new()));

/// Times its own lifetime.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::trace!(scope = self.name, elapsed_ms, "perf scope");
        if is_enabled() {
            eprintln!("[perf] {}: {:.2} ms", self.name, elapsed_ms);
        }
    }
}

#[derive(Debug)]
struct EventLog {
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl EventLog {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            writer: None,
        }
    }
}

fn event_log() -> MutexGuard<'static, EventLog> {
    EVENT_LOG.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Open (or with `None`, close) the event log file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = event_log();
    let Some(path) = path else {
        log.writer = None;
        return Ok(());
    };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "markspan debug log start")?;
    writer.flush()?;
    log.start = Instant::now();
    log.writer = Some(writer);
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    event_log().writer.is_some()
}

/// Append an event line. Does nothing while no log file is open.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut log = event_log();
    let elapsed_ms = log.start.elapsed().as_secs_f64() * 1000.0;
    if let Some(writer) = log.writer.as_mut() {
        let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {}", detail.as_ref());
        let _ = writer.flush();
    }
}
