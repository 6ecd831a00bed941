/// Configuration system: TOML-based with sensible defaults.
/// Config file: `~/.config/mbcursor/config.toml`

use crate::core::{BackendKind, ProbeKind};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encoding: EncodingConfig,
    pub width: WidthConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub backend: BackendKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WidthConfig {
    pub probe: ProbeKind,
    /// Columns assumed for a codepoint whose width cannot be measured.
    pub unknown_width: u8,
    /// Codepoints below this get cache slots up front.
    pub initial_capacity: usize,
    pub probe_timeout_ms: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
}

impl Default for WidthConfig {
    fn default() -> Self {
        Self {
            probe: ProbeKind::Table,
            unknown_width: 1,
            initial_capacity: 256,
            probe_timeout_ms: 200,
        }
    }
}

impl Config {
    /// Config file path: `~/.config/mbcursor/config.toml`
    pub fn path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from file, falling back to defaults.
    pub fn load() -> Self {
        let path = Self::path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_str(&contents),
            Err(e) => {
                log::debug!("no config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse config from TOML string.
    pub fn from_str(s: &str) -> Self {
        toml::from_str(s).unwrap_or_else(|e| {
            log::warn!("invalid config, using defaults: {}", e);
            Self::default()
        })
    }
}

fn dirs_path() -> PathBuf {
    let home = crate::shell::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("mbcursor")
}
