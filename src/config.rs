// Configuration: the JSON file under `~/.keyscore-cli`, environment
// overrides, and persistence of command results into the results
// directory. Everything here is resolved once at startup; the rest of the
// crate receives a finished `Config` value.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.keysco.re";
pub const CONFIG_DIR_NAME: &str = ".keyscore-cli";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const ENV_BASE_URL: &str = "CLISCORE_BASE_URL";
pub const ENV_API_KEY: &str = "CLISCORE_API_KEY";
pub const ENV_RESULTS_DIR: &str = "CLISCORE_RESULTS_DIR";
pub const ENV_SAVE_RESULTS: &str = "CLISCORE_SAVE_RESULTS";
pub const ENV_SPINNER_STYLE: &str = "CLISCORE_SPINNER_STYLE";

/// `~/.keyscore-cli`, or `./.keyscore-cli` when no home directory is known.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

pub fn default_results_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(CONFIG_DIR_NAME).join("results"),
        None => PathBuf::from("./results"),
    }
}

/// Client settings, in the same shape as the config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Empty when no key has been configured.
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "resultsDir")]
    pub results_dir: PathBuf,
    #[serde(rename = "saveResults")]
    pub save_results: bool,
    #[serde(rename = "spinnerStyle")]
    pub spinner_style: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: String::new(),
            results_dir: default_results_dir(),
            save_results: false,
            spinner_style: "default".into(),
        }
    }
}

impl Config {
    /// Reads the config file at `path`, then applies environment overrides
    /// looked up through `env`. A missing or unreadable file means defaults.
    pub fn resolve<F>(path: &Path, env: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::load_file(path).unwrap_or_default();
        config.apply_env(env);
        config
    }

    /// Returns `None` when the file does not exist or cannot be parsed.
    pub fn load_file(path: &Path) -> Option<Config> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("could not read {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<Config>(&data) {
            Ok(mut config) => {
                if config.base_url.trim().is_empty() {
                    config.base_url = DEFAULT_BASE_URL.into();
                }
                Some(config)
            }
            Err(e) => {
                log::warn!("ignoring malformed config {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| env(key).filter(|v| !v.is_empty());
        if let Some(url) = set(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(key) = set(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(dir) = set(ENV_RESULTS_DIR) {
            self.results_dir = PathBuf::from(dir);
        }
        if let Some(save) = set(ENV_SAVE_RESULTS) {
            self.save_results = save == "true" || save == "1";
        }
        if let Some(style) = set(ENV_SPINNER_STYLE) {
            self.spinner_style = style;
        }
    }

    /// Writes the config as pretty JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("failed to create config directory: {}", e)))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .map_err(|e| Error::Config(format!("failed to write config file: {}", e)))?;
        log::info!("saved configuration to {}", path.display());
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn require_api_key(&self) -> Result<&str> {
        if self.has_api_key() {
            Ok(&self.api_key)
        } else {
            Err(Error::MissingApiKey)
        }
    }

    /// Writes `results` to the results directory when saving is enabled.
    /// Returns the path of the written file.
    pub fn save_results<T, D>(
        &self,
        command: &str,
        terms: &[String],
        types: &[D],
        results: &T,
    ) -> Result<Option<PathBuf>>
    where
        T: Serialize,
        D: Display,
    {
        if !self.save_results {
            return Ok(None);
        }
        std::fs::create_dir_all(&self.results_dir)?;

        let now = Local::now();
        let types: Vec<String> = types.iter().map(|t| t.to_string()).collect();
        let path = self
            .results_dir
            .join(results_file_name(command, terms, &types, &now));

        let record = SavedResults {
            timestamp: now.to_rfc3339(),
            command,
            terms,
            types: &types,
            results,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        log::info!("saved {} results to {}", command, path.display());
        Ok(Some(path))
    }
}

#[derive(Serialize)]
struct SavedResults<'a, T: Serialize> {
    timestamp: String,
    command: &'a str,
    terms: &'a [String],
    types: &'a [String],
    results: &'a T,
}

/// `<command>_<terms>_<types>_<YYYYmmdd-HHMMSS>.json`
pub fn results_file_name(
    command: &str,
    terms: &[String],
    types: &[String],
    at: &DateTime<Local>,
) -> String {
    format!(
        "{}_{}_{}_{}.json",
        command,
        safe_file_component(&terms.join("_")),
        safe_file_component(&types.join("_")),
        at.format("%Y%m%d-%H%M%S")
    )
}

fn safe_file_component(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
