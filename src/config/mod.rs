//! Configuration module

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::context::ContextOptions;
use crate::core::graph::Direction;
use crate::core::storage::IdPrefixes;

/// Name of the per-project directory
pub const DIR_NAME: &str = ".bonnet";
pub const CONFIG_FILE: &str = "config.toml";
pub const DB_FILE: &str = "bonnet.db";
/// Overrides every other database location
pub const DATABASE_ENV: &str = "BONNET_DATABASE";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub ids: IdConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Matches returned for an empty query
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_limit() -> usize {
    20
}

fn default_recent_limit() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextConfig {
    #[serde(default = "default_depth")]
    pub default_depth: usize,

    #[serde(default)]
    pub include_related: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            include_related: false,
        }
    }
}

fn default_depth() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GraphConfig {
    /// Edge direction for related-record traversal
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdConfig {
    #[serde(default = "default_entity_prefix")]
    pub entity_prefix: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    #[serde(default = "default_group_prefix")]
    pub group_prefix: String,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            entity_prefix: default_entity_prefix(),
            file_prefix: default_file_prefix(),
            group_prefix: default_group_prefix(),
        }
    }
}

fn default_entity_prefix() -> String {
    "T".to_string()
}

fn default_file_prefix() -> String {
    "F".to_string()
}

fn default_group_prefix() -> String {
    "G".to_string()
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        // Try local config first, then global
        if let Some(local) = Self::find_local_config() {
            return Self::load_from(&local);
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn id_prefixes(&self) -> IdPrefixes {
        IdPrefixes {
            entity: self.ids.entity_prefix.clone(),
            file: self.ids.file_prefix.clone(),
            group: self.ids.group_prefix.clone(),
        }
    }

    /// Context options from config defaults
    pub fn context_options(&self) -> ContextOptions {
        ContextOptions {
            depth: self.context.default_depth,
            include_related: self.context.include_related,
            direction: self.graph.direction,
        }
    }

    /// Walk up from the working directory to the nearest `.bonnet/<name>`
    fn find_local(name: &str) -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let candidate = current.join(DIR_NAME).join(name);
            if candidate.exists() {
                return Some(candidate);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Find local .bonnet/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        Self::find_local(CONFIG_FILE)
    }

    /// Find local .bonnet/bonnet.db walking up directories
    pub fn find_local_db() -> Option<PathBuf> {
        Self::find_local(DB_FILE)
    }

    /// Find the nearest .bonnet directory, with or without a database
    pub fn find_local_dir() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let candidate = current.join(DIR_NAME);
            if candidate.is_dir() {
                return Some(candidate);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Home directory's .bonnet
    pub fn global_dir() -> Option<PathBuf> {
        directories::UserDirs::new().map(|u| u.home_dir().join(DIR_NAME))
    }

    /// Get global config path (~/.bonnet/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|d| d.join(CONFIG_FILE))
    }

    /// Get global database path (~/.bonnet/bonnet.db)
    pub fn global_db_path() -> Option<PathBuf> {
        Self::global_dir().map(|d| d.join(DB_FILE))
    }

    /// Get database path with priority:
    /// 1. BONNET_DATABASE env var
    /// 2. Local .bonnet/bonnet.db (walking up from CWD)
    /// 3. Local .bonnet/ directory (database created on first use)
    /// 4. Global ~/.bonnet/bonnet.db
    pub fn data_path(&self) -> PathBuf {
        if let Ok(env_path) = std::env::var(DATABASE_ENV) {
            if !env_path.is_empty() {
                return PathBuf::from(env_path);
            }
        }

        if let Some(local_db) = Self::find_local_db() {
            return local_db;
        }

        if let Some(local_dir) = Self::find_local_dir() {
            return local_dir.join(DB_FILE);
        }

        if let Some(global) = Self::global_db_path() {
            return global;
        }

        PathBuf::from(DIR_NAME).join(DB_FILE)
    }
}
