use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variables that must be present (and non-empty) before any request is made.
pub const TOKEN_VAR: &str = "TOKEN";
pub const OWNER_VAR: &str = "OWNER";
pub const REPOSITORY_VAR: &str = "REPOSITORY";

/// Settings file looked up in the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = ".pr-digest.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),

    #[error("Failed to read settings file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// API credentials. The token never shows up in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[redacted]")
            .finish()
    }
}

/// The single repository a run is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

/// Tunables read from the optional TOML settings file.
/// Every field has a default, so an absent file is equivalent to `Settings::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// REST API root, e.g. https://api.github.com
    pub api_url: String,
    /// Web root used when building PR links in the digest
    pub web_url: String,
    /// Number of listing pages requested at most
    pub max_pages: u32,
    /// Page size for the closed-PR listing
    pub per_page: u32,
    /// Fixed pause between two consecutive API requests
    pub request_delay_ms: u64,
    /// PRs with fewer comments than this are left out of the digest
    pub min_comments: usize,
    /// Comment authors (usually bots) whose comments are never rendered
    pub skip_comment_authors: Vec<String>,
    pub pr_dump_path: PathBuf,
    pub comment_dump_path: PathBuf,
    pub report_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            web_url: "https://github.com".to_string(),
            max_pages: 14,
            per_page: 100,
            request_delay_ms: 5_000,
            min_comments: 3,
            skip_comment_authors: vec!["github-actions[bot]".to_string()],
            pr_dump_path: PathBuf::from("pr.txt"),
            comment_dump_path: PathBuf::from("comment.txt"),
            report_path: PathBuf::from("year_end_review.md"),
        }
    }
}

impl Settings {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Load settings from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Settings::default())
        }
    }

    /// Load from a specific path; a missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings = toml::from_str(&contents)?;
        Ok(settings)
    }
}

/// Everything a run needs, built once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub repository: Repository,
    pub settings: Settings,
}

impl Config {
    /// Read the required environment variables and the settings file.
    ///
    /// An explicitly given settings file must exist; the implicit
    /// `.pr-digest.toml` is optional.
    pub fn load(settings_path: Option<&Path>) -> Result<Config, ConfigError> {
        let settings = Self::load_settings(settings_path)?;
        Self::from_lookup(|key| std::env::var(key).ok(), settings)
    }

    fn load_settings(settings_path: Option<&Path>) -> Result<Settings, ConfigError> {
        match settings_path {
            Some(path) => Settings::load_from(path),
            None => Settings::load(Path::new(DEFAULT_SETTINGS_FILE)),
        }
    }

    /// Build a config from an arbitrary variable source.
    /// All missing variables are reported together.
    pub fn from_lookup<F>(lookup: F, settings: Settings) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |key: &'static str| match lookup(key) {
            Some(value) if !value.is_empty() => value,
            _ => {
                missing.push(key);
                String::new()
            }
        };

        let token = require(TOKEN_VAR);
        let owner = require(OWNER_VAR);
        let name = require(REPOSITORY_VAR);

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        Ok(Config {
            credentials: Credentials { token },
            repository: Repository { owner, name },
            settings,
        })
    }
}
