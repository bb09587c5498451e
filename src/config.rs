use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::cli::OutputFormat;

/// User defaults from `config.toml`. Command line flags take precedence.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    pub currency: Option<String>,
    pub vat_rate: Option<f64>,
    pub format: Option<OutputFormat>,
    pub columns: Option<Vec<String>>,
}

pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pricewise").map(|d| d.config_dir().join("config.toml"))
}

pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Config {
    let Ok(data) = fs::read_to_string(path) else {
        return Config::default();
    };

    match toml::from_str(&data) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        Err(e) => {
            tracing::warn!("invalid config at {}: {}", path.display(), e);
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_config_from(&dir.path().join("config.toml")),
            Config::default()
        );
    }

    #[test]
    fn reads_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "currency = \"EUR\"\nvat_rate = 21\nformat = \"json\"\ncolumns = [\"name\", \"price\"]\n",
        )
        .unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.currency.as_deref(), Some("EUR"));
        assert_eq!(config.vat_rate, Some(21.0));
        assert_eq!(config.format, Some(OutputFormat::Json));
        assert_eq!(
            config.columns,
            Some(vec!["name".to_string(), "price".to_string()])
        );
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "currency = [").unwrap();
        assert_eq!(load_config_from(&path), Config::default());
    }
}
