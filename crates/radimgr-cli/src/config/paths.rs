//! Config directory resolution.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Application directory name under the config home.
const APP_DIR: &str = "radimgr";

/// Config file name.
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file path.
///
/// - If `dir` is `Some`, returns `{dir}/config.toml`.
/// - Otherwise returns `$XDG_CONFIG_HOME/radimgr/config.toml`, falling back
///   to `~/.config/radimgr/config.toml`.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set
/// (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }

    let xdg = std::env::var("XDG_CONFIG_HOME").ok();
    let home = std::env::var("HOME").ok();
    default_config_path(xdg.as_deref(), home.as_deref())
}

/// Builds the default config path from the environment values.
fn default_config_path(xdg_config_home: Option<&str>, home: Option<&str>) -> Result<PathBuf> {
    let base = match (xdg_config_home.filter(|v| !v.is_empty()), home) {
        (Some(xdg), _) => PathBuf::from(xdg),
        (None, Some(home)) => Path::new(home).join(".config"),
        (None, None) => bail!("HOME environment variable is not set"),
    };
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}
