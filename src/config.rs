//! Saved defaults for the command line.
//!
//! Config files hold command-line flags, whitespace separated, with `#`
//! comment lines. The global file is read first, then a local `.markspanrc`,
//! then the actual command line; later sources win.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::view::ViewMode;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub perf: bool,
    pub mode: Option<ViewMode>,
    pub width: Option<u16>,
    pub debounce_ms: Option<u64>,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: booleans add up, options in `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            perf: self.perf || other.perf,
            mode: other.mode.or(self.mode),
            width: other.width.or(self.width),
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }

    /// The flags as config file lines.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.watch {
            lines.push("--watch".to_string());
        }
        if let Some(mode) = self.mode {
            lines.push(format!("--mode {}", mode.as_str()));
        }
        if let Some(width) = self.width {
            lines.push(format!("--width {width}"));
        }
        if let Some(ms) = self.debounce_ms {
            lines.push(format!("--debounce-ms {ms}"));
        }
        if self.perf {
            lines.push("--perf".to_string());
        }
        if let Some(path) = &self.debug_log {
            lines.push(format!("--debug-log {}", path.display()));
        }
        lines
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("markspan").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("markspan")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("markspan").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("markspan")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".markspanrc")
}

/// Read flags from a config file. A missing file yields the defaults.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write flags to a config file, creating parent directories.
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# markspan defaults (saved with --save)".to_string()];
    lines.extend(flags.to_lines());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove a config file if present.
///
/// # Errors
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list; everything else is ignored.
///
/// Valued flags accept both `--flag value` and `--flag=value`. Unparseable
/// values leave the option unset.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--watch" => flags.watch = true,
            "--perf" => flags.perf = true,
            _ => {
                let Some((name, value, consumed)) = split_valued(token, tokens.get(i + 1)) else {
                    i += 1;
                    continue;
                };
                match name {
                    "--mode" => flags.mode = ViewMode::parse(value),
                    "--width" => flags.width = value.parse().ok(),
                    "--debounce-ms" => flags.debounce_ms = value.parse().ok(),
                    "--debug-log" => flags.debug_log = Some(PathBuf::from(value)),
                    _ => {}
                }
                i += consumed;
            }
        }
        i += 1;
    }
    flags
}

const VALUED_FLAGS: [&str; 4] = ["--mode", "--width", "--debounce-ms", "--debug-log"];

/// Split a valued flag into its name and value.
///
/// Returns how many extra tokens the value consumed.
fn split_valued<'a>(token: &'a str, next: Option<&'a String>) -> Option<(&'a str, &'a str, usize)> {
    if let Some((name, value)) = token.split_once('=') {
        return VALUED_FLAGS.contains(&name).then_some((name, value, 0));
    }
    if VALUED_FLAGS.contains(&token) {
        return next.map(|value| (token, value.as_str(), 1));
    }
    None
}
