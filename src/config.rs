//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sim::canvas::CanvasSettings;
use crate::sim::store::DEFAULT_CACHE_LIMIT;

const APP_DIR: &str = "infinite-canvas";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub canvas: CanvasSettings,
    pub storage_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    canvas: TomlCanvas,
    #[serde(default)]
    storage: TomlStorage,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlCanvas {
    #[serde(default = "default_scroll_step")]
    scroll_step: i64,
    #[serde(default = "default_label_max_len")]
    label_max_len: usize,
    #[serde(default = "default_cache_limit")]
    cache_limit: usize,
}

#[derive(Deserialize, Debug, Default)]
struct TomlStorage {
    /// Unset → data home (see `default_storage_dir`).
    dir: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_scroll_step() -> i64 { 3 }
fn default_label_max_len() -> usize { 60 }
fn default_cache_limit() -> usize { DEFAULT_CACHE_LIMIT }
fn default_log_file() -> String { "infinite-canvas.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlCanvas {
    fn default() -> Self {
        TomlCanvas {
            scroll_step: default_scroll_step(),
            label_max_len: default_label_max_len(),
            cache_limit: default_cache_limit(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        Self::from_toml(toml_cfg)
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let storage_dir = toml_cfg
            .storage
            .dir
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_dir);

        // Relative log paths sit next to the worlds directory.
        let log_file = PathBuf::from(&toml_cfg.log.file);
        let log_file = if log_file.is_absolute() {
            log_file
        } else {
            storage_dir
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(log_file)
        };

        AppConfig {
            canvas: CanvasSettings {
                scroll_step: toml_cfg.canvas.scroll_step.max(1),
                label_max_len: toml_cfg.canvas.label_max_len.max(1),
                cache_limit: toml_cfg.canvas.cache_limit.max(1),
            },
            storage_dir,
            log_file,
            log_level: toml_cfg.log.level,
        }
    }
}

/// `~/.local/share/infinite-canvas/worlds`, or `./worlds` without a home.
fn default_storage_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home)
            .join(".local/share")
            .join(APP_DIR)
            .join("worlds"),
        _ => PathBuf::from("worlds"),
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before logging is up, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
