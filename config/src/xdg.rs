//! `[env]` table of `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LoadError;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Location of the app's `config.toml` (whether or not it exists).
pub fn config_file_path(app_name: &str) -> Result<PathBuf, LoadError> {
    let base = cross_xdg::BaseDirs::new().map_err(|e| LoadError::XdgPath(e.to_string()))?;
    Ok(base.config_home().join(app_name).join("config.toml"))
}

/// Entries of the `[env]` table. No file, or no table, is an empty map.
pub(crate) fn read_env_table(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = config_file_path(app_name)?;
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let file: ConfigFile = toml::from_str(&content)?;
    Ok(file.env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::with_xdg_home;

    #[test]
    fn missing_file_is_empty() {
        let map = read_env_table("tally-test-no-such-app").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn reads_env_table_and_ignores_other_tables() {
        let map = with_xdg_home(
            "tally",
            "[env]\nTALLY_MODEL = \"gpt-4o\"\n\n[ui]\ntheme = \"dark\"\n",
            || read_env_table("tally"),
        )
        .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["TALLY_MODEL"], "gpt-4o");
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let result = with_xdg_home("tally", "[env\nbroken", || read_env_table("tally"));
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}
