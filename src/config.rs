use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_MAX_REDIRECTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub max_redirects: usize,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debug: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            fetch_timeout_secs: 30,
            user_agent: format!("axilang/{}", env!("CARGO_PKG_VERSION")),
            prompt: String::from("AxiLang>> "),
        }
    }
}

impl Config {
    /// Reads the config file, falling back to defaults, then applies
    /// environment overrides.
    pub fn load() -> Self {
        let path = Self::get_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config file {}: {}", path.display(), e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        if let Ok(value) = env::var("AXILANG_DEBUG") {
            config.debug = is_truthy(&value);
        }

        config
    }

    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn get_config_path() -> PathBuf {
        if let Ok(custom) = env::var("AXILANG_CONFIG") {
            return PathBuf::from(custom);
        }

        let home = if cfg!(windows) {
            env::var("USERPROFILE")
        } else {
            env::var("HOME")
        };

        PathBuf::from(home.unwrap_or_else(|_| String::from(".")))
            .join(".axilang")
            .join("config.json")
    }

    pub fn continuation_prompt(&self) -> String {
        let width = self.prompt.trim_end().chars().count().saturating_sub(2);
        format!("{}>> ", ".".repeat(width.max(3)))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
