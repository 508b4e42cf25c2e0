//! Configuration for tally.
//!
//! [`load_and_apply`] fills the process environment from XDG `config.toml` and the project
//! `.env`, with priority **existing env > .env > XDG**. [`Settings::from_env`] then reads
//! the typed settings.

mod env_file;
mod settings;
mod xdg;

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

pub use settings::{
    Settings, SettingsError, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_DATABASE, DEFAULT_MAX_FAILURES,
    DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
pub use xdg::config_file_path;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Sets every key found in `.env` or the XDG `[env]` table that is not already set in the
/// process environment. `.env` wins over XDG.
///
/// * `app_name`: directory under `$XDG_CONFIG_HOME` (e.g. `"tally"`).
/// * `override_dir`: where to look for `.env` instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let from_xdg = xdg::read_env_table(app_name)?;
    let from_dotenv = env_file::read(override_dir).map_err(LoadError::DotenvRead)?;

    let keys: HashSet<&String> = from_xdg.keys().chain(from_dotenv.keys()).collect();
    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(value) = from_dotenv.get(key).or_else(|| from_xdg.get(key)) {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}
