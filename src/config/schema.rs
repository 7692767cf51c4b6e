//! Configuration schema for modbake
//!
//! Configuration is stored at `~/.config/modbake/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Where games are found and baked games stored
    pub paths: PathsConfig,

    /// Cache retention
    pub cache: CacheConfig,

    /// Base game matching
    pub resolve: ResolveConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

impl GeneralConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Filesystem roots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Writable data root (`games/` and `baked-games/` live here).
    /// Defaults to the platform data directory.
    pub data_root: Option<PathBuf>,

    /// Read-only bundled assets root, searched after the data root
    pub bundled_assets: Option<PathBuf>,
}

/// Cache retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Baked games older than this are removed by `sweep` (0 = never)
    pub max_age_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_age_days: 7 }
    }
}

impl CacheConfig {
    /// Retention as a duration, `None` when eviction is disabled
    pub fn max_age(&self) -> Option<Duration> {
        days_to_duration(self.max_age_days)
    }
}

/// Convert a day count to a duration; zero disables
pub fn days_to_duration(days: u32) -> Option<Duration> {
    if days == 0 {
        None
    } else {
        Some(Duration::from_secs(u64::from(days) * 24 * 60 * 60))
    }
}

/// Base game resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Extra name fragments per base type, e.g. `mygame = ["my-game", "mg"]`
    pub aliases: HashMap<String, Vec<String>>,
}
