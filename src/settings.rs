//! Settings infrastructure for celltrack.
//!
//! This module provides support for loading and parsing `celltrack.toml` files
//! to configure cell markers, newline handling and whether tracking is enabled.

use std::path::{Path, PathBuf};

use log::warn;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::cells::{CellMarkers, CellSplitter, NewlineStyle};
use crate::tracker::{TrackerConfig, DEFAULT_HISTORY_LIMIT};

/// Name of the settings file looked up in the workspace.
pub const SETTINGS_FILE: &str = "celltrack.toml";

/// Root settings structure loaded from celltrack.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Tracking configuration.
    pub tracking: Option<TrackingSettings>,
}

/// Settings for the cell tracker.
#[derive(Debug, Default, Deserialize)]
pub struct TrackingSettings {
    /// Whether submissions and edits are tracked at all (default: true).
    pub enabled: Option<bool>,

    /// Regular expressions recognising delimiter lines. Replaces the
    /// built-in markers when present.
    pub cell_markers: Option<Vec<String>>,

    /// Newline style used for cell text: "auto", "lf" or "crlf".
    pub newline: Option<String>,

    /// Number of edit batches kept per document for mapping stale lines.
    pub history_limit: Option<usize>,
}

/// Problems found while turning settings into a tracker configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid cell marker pattern '{pattern}': {source}")]
    InvalidMarker {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("unknown newline style '{0}' (expected auto, lf or crlf)")]
    UnknownNewline(String),
}

/// Compile marker patterns, reporting the first one that fails.
pub fn compile_markers(patterns: &[String]) -> Result<CellMarkers, SettingsError> {
    let regexes = patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| SettingsError::InvalidMarker {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CellMarkers::new(regexes))
}

/// Parse a newline setting. `None` means detect per document.
pub fn parse_newline(s: &str) -> Result<Option<NewlineStyle>, SettingsError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "auto" | "" => Ok(None),
        "lf" | "\\n" => Ok(Some(NewlineStyle::Lf)),
        "crlf" | "\\r\\n" => Ok(Some(NewlineStyle::CrLf)),
        _ => Err(SettingsError::UnknownNewline(s.to_string())),
    }
}

/// Load settings from a celltrack.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to parse {}: {}", path.display(), e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover celltrack.toml by searching up the directory tree, then direct children.
///
/// Search order:
/// 1. Walk up from `start_dir` to filesystem root
/// 2. If not found, check immediate child directories of `start_dir`
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found file. If not found, returns
/// `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    // Phase 1: Walk up from start_dir
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    // Phase 2: Check immediate child directories
    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                let candidate = entry.path().join(SETTINGS_FILE);
                if candidate.is_file() {
                    return (load_settings(&candidate), entry.path());
                }
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}

/// Build a tracker configuration from settings.
///
/// Invalid values are logged and replaced by their defaults, so a broken
/// settings file never disables the server.
pub fn build_tracker_config(settings: &Settings) -> TrackerConfig {
    let mut config = TrackerConfig::default();

    let Some(tracking) = settings.tracking.as_ref() else {
        return config;
    };

    if let Some(enabled) = tracking.enabled {
        config.enabled = enabled;
    }

    if let Some(ref patterns) = tracking.cell_markers {
        match compile_markers(patterns) {
            Ok(markers) => config.splitter = CellSplitter::new(markers),
            Err(e) => warn!("{}; using default cell markers", e),
        }
    }

    if let Some(ref newline) = tracking.newline {
        match parse_newline(newline) {
            Ok(style) => config.newline = style,
            Err(e) => warn!("{}; detecting newlines per document", e),
        }
    }

    config.history_limit = tracking.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    config
}
