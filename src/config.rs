//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--device-root`, `--theme`, `--log-file`, `--log-level`)
//! 2. Explicit `--config <path>`
//! 3. `$SIMB_CONFIG` environment variable (path to config file)
//! 4. Project-local `.simb.toml` in the current working directory
//! 5. Global `~/.config/simb/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;

use crate::nav::state::LoadSettings;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Simulator device set directory.
    pub device_root: Option<String>,
    /// Log file path.
    pub log_file: Option<String>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: Option<String>,
}

/// File viewer settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ViewerConfig {
    /// Bytes per lazily loaded chunk.
    pub chunk_size: Option<u64>,
    /// Files up to this size are read whole on open.
    pub small_file_threshold: Option<u64>,
    /// Upper bound on chunks kept in memory per file.
    pub max_resident_chunks: Option<usize>,
    /// Largest payload handed to an image, archive or plist renderer.
    pub max_decode_bytes: Option<u64>,
    /// Tab rendering width.
    pub tab_width: Option<usize>,
}

/// Database table settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Rows fetched per page.
    pub page_size: Option<usize>,
    /// Widest a column is drawn, in terminal cells.
    pub max_column_width: Option<usize>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub list_bg: Option<String>,
    pub list_fg: Option<String>,
    pub list_selected_bg: Option<String>,
    pub list_selected_fg: Option<String>,
    pub list_dir_fg: Option<String>,
    pub list_dim_fg: Option<String>,
    pub content_bg: Option<String>,
    pub content_fg: Option<String>,
    pub content_line_nr_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub header_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "auto", "dark", "light", "custom".
    pub scheme: Option<String>,
    /// How often "auto" re-checks the terminal appearance.
    pub poll_interval_ms: Option<u64>,
    /// Syntect theme used on dark backgrounds.
    pub syntax_theme_dark: Option<String>,
    /// Syntect theme used on light backgrounds.
    pub syntax_theme_light: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub viewer: ViewerConfig,
    pub database: DatabaseConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Device set location relative to the home directory.
pub const DEFAULT_DEVICE_ROOT: &str = "Library/Developer/CoreSimulator/Devices";
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default tab width in cells.
pub const DEFAULT_TAB_WIDTH: usize = 4;
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;
/// Default theme poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_SYNTAX_THEME_DARK: &str = "base16-ocean.dark";
pub const DEFAULT_SYNTAX_THEME_LIGHT: &str = "InspiredGitHub";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("SIMB_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".simb.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("simb").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            // Config is resolved before the logger exists; say it twice.
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            warn!("failed to parse config file {}: {e}", path.display());
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                device_root: other
                    .general
                    .device_root
                    .clone()
                    .or(self.general.device_root),
                log_file: other.general.log_file.clone().or(self.general.log_file),
                log_level: other.general.log_level.clone().or(self.general.log_level),
            },
            viewer: ViewerConfig {
                chunk_size: other.viewer.chunk_size.or(self.viewer.chunk_size),
                small_file_threshold: other
                    .viewer
                    .small_file_threshold
                    .or(self.viewer.small_file_threshold),
                max_resident_chunks: other
                    .viewer
                    .max_resident_chunks
                    .or(self.viewer.max_resident_chunks),
                max_decode_bytes: other
                    .viewer
                    .max_decode_bytes
                    .or(self.viewer.max_decode_bytes),
                tab_width: other.viewer.tab_width.or(self.viewer.tab_width),
            },
            database: DatabaseConfig {
                page_size: other.database.page_size.or(self.database.page_size),
                max_column_width: other
                    .database
                    .max_column_width
                    .or(self.database.max_column_width),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                poll_interval_ms: other
                    .theme
                    .poll_interval_ms
                    .or(self.theme.poll_interval_ms),
                syntax_theme_dark: other
                    .theme
                    .syntax_theme_dark
                    .clone()
                    .or(self.theme.syntax_theme_dark),
                syntax_theme_light: other
                    .theme
                    .syntax_theme_light
                    .clone()
                    .or(self.theme.syntax_theme_light),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher overwrites.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Simulator device set directory, `~`-expanded.
    pub fn device_root(&self) -> PathBuf {
        match self.general.device_root.as_deref() {
            Some(path) => expand_home(path),
            None => dirs::home_dir()
                .unwrap_or_default()
                .join(DEFAULT_DEVICE_ROOT),
        }
    }

    /// Log file path; `<cache_dir>/simb/simb.log` unless configured.
    pub fn log_file(&self) -> PathBuf {
        match self.general.log_file.as_deref() {
            Some(path) => expand_home(path),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("simb")
                .join("simb.log"),
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.general
            .log_level
            .as_deref()
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }

    /// Tab width in cells, at least 1.
    pub fn tab_width(&self) -> usize {
        self.viewer.tab_width.unwrap_or(DEFAULT_TAB_WIDTH).max(1)
    }

    pub fn max_column_width(&self) -> usize {
        self.database
            .max_column_width
            .unwrap_or(DEFAULT_MAX_COLUMN_WIDTH)
            .max(1)
    }

    /// Theme scheme: "auto", "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("auto")
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.theme
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(100)
    }

    pub fn syntax_theme_dark(&self) -> &str {
        self.theme
            .syntax_theme_dark
            .as_deref()
            .unwrap_or(DEFAULT_SYNTAX_THEME_DARK)
    }

    pub fn syntax_theme_light(&self) -> &str {
        self.theme
            .syntax_theme_light
            .as_deref()
            .unwrap_or(DEFAULT_SYNTAX_THEME_LIGHT)
    }

    /// Loading limits for the navigator. Zero sizes fall back to defaults.
    pub fn load_settings(&self) -> LoadSettings {
        let defaults = LoadSettings::default();
        LoadSettings {
            chunk_size: nonzero(self.viewer.chunk_size, defaults.chunk_size),
            small_file_threshold: self
                .viewer
                .small_file_threshold
                .unwrap_or(defaults.small_file_threshold),
            max_resident_chunks: nonzero(
                self.viewer.max_resident_chunks,
                defaults.max_resident_chunks,
            ),
            max_decode_bytes: self
                .viewer
                .max_decode_bytes
                .unwrap_or(defaults.max_decode_bytes),
            page_size: nonzero(self.database.page_size, defaults.page_size),
        }
    }
}

fn nonzero<T: PartialEq + Default + Copy>(value: Option<T>, fallback: T) -> T {
    match value {
        Some(v) if v != T::default() => v,
        _ => fallback,
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().unwrap_or_default().join(rest),
        None => PathBuf::from(path),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
