//! Configuration file discovery and loading.
//!
//! Files live in a configuration directory (`conf` by default) and are
//! selected by name. TOML is preferred; YAML is accepted as well.

use crate::error::{ConfigError, ConfigResult};
use crate::value::{Table, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = "conf";

/// Extensions tried, in order, when the config name has none.
pub const CONFIG_EXTENSIONS: [&str; 3] = ["toml", "yaml", "yml"];

/// Find `<dir>/<name>.<ext>`. A name that already carries an extension is
/// used as-is.
pub fn locate_config(dir: &Path, name: &str) -> ConfigResult<PathBuf> {
    let not_found = || ConfigError::ConfigNotFound { name: name.to_string(), dir: dir.to_path_buf() };

    let direct = dir.join(name);
    if Path::new(name).extension().is_some() {
        return if direct.is_file() { Ok(direct) } else { Err(not_found()) };
    }

    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
        .ok_or_else(not_found)
}

/// Read a config file into a table. An empty file yields an empty table.
pub fn load_config_file(path: &Path) -> ConfigResult<Table> {
    let content = std::fs::read_to_string(path)?;
    let parse_err = |message: String| ConfigError::Parse { path: path.to_path_buf(), message };

    let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"));
    let value = if is_yaml {
        if content.trim().is_empty() {
            return Ok(Table::new());
        }
        serde_yaml::from_str::<Value>(&content).map_err(|e| parse_err(e.to_string()))?
    } else {
        let table: toml::Table = toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?;
        Value::from(toml::Value::Table(table))
    };

    match value {
        Value::Section(table) => {
            tracing::debug!(path = %path.display(), keys = table.len(), "loaded configuration file");
            Ok(table)
        }
        Value::Null => Ok(Table::new()),
        other => Err(parse_err(format!("top level must be a mapping, found {}", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_prefers_toml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("train.yaml"), "trainer:\n  max_epochs: 2\n").unwrap();
        std::fs::write(temp.path().join("train.toml"), "[trainer]\nmax_epochs = 3\n").unwrap();

        let found = locate_config(temp.path(), "train").unwrap();
        assert_eq!(found.extension().and_then(|e| e.to_str()), Some("toml"));
    }

    #[test]
    fn test_locate_missing_config() {
        let temp = TempDir::new().unwrap();
        let err = locate_config(temp.path(), "absent").unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_yaml_and_toml_agree() {
        let temp = TempDir::new().unwrap();
        let yaml = temp.path().join("a.yaml");
        let toml_path = temp.path().join("a.toml");
        std::fs::write(&yaml, "optim:\n  lr: 0.1\n  betas: [0.9, 0.999]\n").unwrap();
        std::fs::write(&toml_path, "[optim]\nlr = 0.1\nbetas = [0.9, 0.999]\n").unwrap();

        assert_eq!(load_config_file(&yaml).unwrap(), load_config_file(&toml_path).unwrap());
    }

    #[test]
    fn test_load_rejects_scalar_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        std::fs::write(&path, "42\n").unwrap();
        assert!(matches!(load_config_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_empty_files() {
        let temp = TempDir::new().unwrap();
        let yaml = temp.path().join("empty.yaml");
        let toml_path = temp.path().join("empty.toml");
        std::fs::write(&yaml, "").unwrap();
        std::fs::write(&toml_path, "").unwrap();
        assert!(load_config_file(&yaml).unwrap().is_empty());
        assert!(load_config_file(&toml_path).unwrap().is_empty());
    }
}
