//! Layered configuration.
//!
//! Settings come from an optional TOML file (by default
//! `~/.config/litfetch/config.toml`) overridden by `LITFETCH_*` environment
//! variables, e.g. `LITFETCH_TOKEN` or `LITFETCH_API_BASE`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the index API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bearer token attached to index requests
    #[serde(default)]
    pub token: Option<String>,

    /// Directory downloaded artifacts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Parallel workers per transfer
    #[serde(default = "default_workers")]
    pub transfer_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            output_dir: default_output_dir(),
            transfer_workers: default_workers(),
        }
    }
}

fn default_api_base() -> String {
    "http://api.cnki.net".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_workers() -> usize {
    crate::transfer::DEFAULT_WORKERS
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("litfetch").join("config.toml"))
}

/// Load settings from the given file (or the default location) merged with
/// `LITFETCH_*` environment variables.
pub fn load(path: Option<&Path>) -> Result<Settings, config::ConfigError> {
    let mut builder = config::Config::builder()
        .set_default("api_base", default_api_base())?
        .set_default("output_dir", default_output_dir().display().to_string())?
        .set_default("transfer_workers", default_workers() as i64)?;

    let file = path.map(Path::to_path_buf).or_else(default_config_path);
    if let Some(file) = file {
        builder = builder.add_source(config::File::from(file).required(false));
    }

    builder
        .add_source(config::Environment::with_prefix("LITFETCH").try_parsing(true))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_base, "http://api.cnki.net");
        assert!(settings.token.is_none());
        assert_eq!(settings.transfer_workers, 4);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base = \"http://index.example.com\"\ntransfer_workers = 8\n",
        )
        .unwrap();

        let settings = load(Some(&path)).unwrap();
        assert_eq!(settings.api_base, "http://index.example.com");
        assert_eq!(settings.transfer_workers, 8);
        assert!(settings.token.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.transfer_workers, 4);
    }
}
