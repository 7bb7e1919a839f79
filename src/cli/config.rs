//! `bonnet config` command
//!
//! Get or set configuration values.
//!
//! # Usage
//! ```bash
//! bonnet config                         # Show config file
//! bonnet config search.default_limit    # Get specific value
//! bonnet config graph.direction outgoing
//! bonnet config ids.entity_prefix K --global
//! bonnet config --path
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use toml_edit::DocumentMut;

use crate::config::{Config, CONFIG_FILE, DIR_NAME};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config key (e.g., search.default_limit, graph.direction)
    pub key: Option<String>,

    /// Value to set
    pub value: Option<String>,

    /// List all config values
    #[arg(long)]
    pub list: bool,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Use global config (~/.bonnet/config.toml) instead of local
    #[arg(short, long)]
    pub global: bool,
}

fn local_config_path() -> PathBuf {
    Config::find_local_config().unwrap_or_else(|| PathBuf::from(DIR_NAME).join(CONFIG_FILE))
}

fn get_config_path(global: bool) -> Result<PathBuf> {
    if global {
        Config::global_config_path().context("Could not determine home directory")
    } else {
        Ok(local_config_path())
    }
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let config_path = get_config_path(args.global)?;

    if args.path {
        if let Some(global) = Config::global_config_path() {
            println!("Global: {}", global.display());
        }
        println!("Local:  {}", local_config_path().display());
        println!();
        if config_path.exists() {
            println!("{} Active: {}", "✓".green(), config_path.display());
        } else {
            println!("{} No config file found at {}", "!".yellow(), config_path.display());
        }
        return Ok(());
    }

    if args.list || args.key.is_none() {
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            println!("# {}\n", config_path.display());
            println!("{}", content);
        } else {
            println!("No config file at {}; defaults apply:\n", config_path.display());
            println!("{}", toml::to_string_pretty(&Config::default())?);
        }
        return Ok(());
    }

    if let Some(key) = &args.key {
        if let Some(value) = &args.value {
            set_config_value(&config_path, key, value)?;
            println!("{} Set {} = {} (in {})", "✓".green(), key, value, config_path.display());
        } else {
            match get_config_value(&config_path, key)? {
                Some(v) => println!("{}", v),
                None => println!("(not set)"),
            }
        }
    }

    Ok(())
}

/// Set a nested config value using dot notation (e.g., "search.default_limit").
///
/// The edited file must still load as a `Config`, so unknown values for
/// typed keys are rejected before anything is written.
fn set_config_value(path: &Path, key: &str, val: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = content.parse().context("Failed to parse config.toml")?;

    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        [name] => doc[*name] = toml_edit::value(parse_toml_value(val)),
        [section, name] => {
            if doc.get(section).is_none() {
                doc[*section] = toml_edit::table();
            }
            doc[*section][*name] = toml_edit::value(parse_toml_value(val));
        }
        _ => bail!("Key too deep: {}. Max depth is section.key", key),
    }

    let updated = doc.to_string();
    toml::from_str::<Config>(&updated)
        .with_context(|| format!("Invalid value for {}: {}", key, val))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, updated)?;
    Ok(())
}

/// Get a config value by dot notation key
fn get_config_value(path: &Path, key: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let doc: toml::Value = content.parse().context("Failed to parse config.toml")?;

    let parts: Vec<&str> = key.split('.').collect();
    let val = match parts.as_slice() {
        [name] => doc.get(name),
        [section, name] => doc.get(section).and_then(|t| t.get(name)),
        _ => None,
    };

    Ok(val.map(|v| match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

/// Parse string value to appropriate TOML type
fn parse_toml_value(s: &str) -> toml_edit::Value {
    if let Ok(b) = s.parse::<bool>() {
        return b.into();
    }
    if let Ok(i) = s.parse::<i64>() {
        return i.into();
    }
    if let Ok(f) = s.parse::<f64>() {
        return f.into();
    }
    s.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_preserves_comments() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "# my settings\n[search]\ndefault_limit = 5\n")?;

        set_config_value(&path, "graph.direction", "outgoing")?;
        set_config_value(&path, "search.default_limit", "7")?;

        let content = fs::read_to_string(&path)?;
        assert!(content.starts_with("# my settings"));
        let config = Config::load_from(&path)?;
        assert_eq!(config.search.default_limit, 7);
        assert_eq!(
            get_config_value(&path, "graph.direction")?.as_deref(),
            Some("outgoing")
        );
        Ok(())
    }

    #[test]
    fn test_set_rejects_invalid_value() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(CONFIG_FILE);

        assert!(set_config_value(&path, "graph.direction", "sideways").is_err());
        assert!(set_config_value(&path, "search.default_limit", "many").is_err());
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_parse_toml_value_types() {
        assert_eq!(parse_toml_value("true").as_bool(), Some(true));
        assert_eq!(parse_toml_value("3").as_integer(), Some(3));
        assert_eq!(parse_toml_value("T").as_str(), Some("T"));
    }
}
