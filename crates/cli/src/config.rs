use anyhow::{Context, Result};
use chatforest_runtime_config::{PanelConfig, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/chatforest/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("chatforest"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load config from `explicit` or the canonical path, falling back to
/// defaults when no file exists.
pub fn load_config(explicit: Option<&Path>) -> Result<PanelConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };
    PanelConfig::load_or_default(&path)
        .with_context(|| format!("Failed to load config at {}", path.display()))
}

/// Print the effective config as TOML.
pub fn show_config(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };
    let config = load_config(Some(&path))?;
    let rendered = config
        .to_toml_string()
        .context("Failed to serialize config")?;

    let origin = if path.exists() { "" } else { " (defaults)" };
    println!("# {}{}", path.display(), origin);
    print!("{rendered}");
    Ok(())
}
