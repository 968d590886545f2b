//! Panel configuration types.
//!
//! The CLI and any embedding host read `chatforest.toml` through these types.
//! Settings are consumed read-only by the panel: display/filter options, the
//! default sort, cache freshness and the pacing of batch deletes.

use chatforest_core::{SortConfig, SortKey, SortOrder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "chatforest.toml";

/// Five minutes.
pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration (persisted as `chatforest.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PanelConfig {
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub sort: SortSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub delete: DeleteSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplaySettings {
    #[serde(default = "default_false")]
    pub show_checkpoints: bool,
    /// Characters kept from the first/last message previews.
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    #[serde(default = "default_true")]
    pub confirm_delete: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_checkpoints: false,
            preview_length: default_preview_length(),
            confirm_delete: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SortSettings {
    #[serde(default)]
    pub by: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSettings {
    pub fn to_sort_config(&self) -> SortConfig {
        SortConfig::new(self.by, self.order)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: default_cache_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteSettings {
    /// Pause between sequential delete calls.
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,
    /// Pause before the post-delete reload so the backing store settles.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for DeleteSettings {
    fn default() -> Self {
        Self {
            inter_call_delay_ms: default_inter_call_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_preview_length() -> usize {
    80
}
fn default_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}
fn default_inter_call_delay_ms() -> u64 {
    100
}
fn default_settle_delay_ms() -> u64 {
    500
}

impl PanelConfig {
    /// Parse TOML text and apply compatibility fallbacks.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: PanelConfig = toml::from_str(content)?;
        apply_compat_fallbacks(&mut config);
        Ok(config)
    }

    /// Load from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

/// Normalise values the panel cannot work with.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut PanelConfig) -> bool {
    let mut changed = false;

    if config.display.preview_length == 0 {
        config.display.preview_length = default_preview_length();
        changed = true;
    }

    if config.cache.ttl_ms == 0 {
        config.cache.ttl_ms = default_cache_ttl_ms();
        changed = true;
    }

    changed
}
