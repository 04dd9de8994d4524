use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".phpmetrics-reporter.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("PHP version is required (set `php-version` input or [runtime] version)")]
    MissingRuntimeVersion,

    #[error("Invalid PHP version {0:?}: expected digits and dots only, e.g. 8.2")]
    InvalidRuntimeVersion(String),

    #[error("GitHub token is required (set `github-token` input or GITHUB_TOKEN)")]
    MissingToken,
}

/// Top-level configuration loaded from .phpmetrics-reporter.toml.
///
/// Every field is optional in the file. Values left unset fall back to the
/// GitHub Actions inputs in the environment, and CLI flags override both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// PHP version to install, e.g. "8.2"
    pub version: Option<String>,
    /// Extension packages installed next to the runtime (`php<version>-<ext>`)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            version: None,
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to the action input or GITHUB_TOKEN.
    pub token: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// PhpMetrics executable, relative to the checkout
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Only changed files ending with this suffix are analyzed
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Directory receiving the raw reports and the rendered markdown
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            extension: default_extension(),
            assets_dir: default_assets_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    /// Upper bound for any single external command
    #[serde(default = "default_command_secs")]
    pub command_secs: u64,
    /// Upper bound for any single GitHub API request
    #[serde(default = "default_http_secs")]
    pub http_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            command_secs: default_command_secs(),
            http_secs: default_http_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }
}

fn default_extensions() -> Vec<String> {
    ["cli", "xml", "mbstring"].iter().map(|s| s.to_string()).collect()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_binary() -> String {
    "vendor/bin/phpmetrics".to_string()
}

fn default_extension() -> String {
    ".php".to_string()
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(".github/workflows")
}

fn default_command_secs() -> u64 {
    1800
}

fn default_http_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from an explicit path, or from .phpmetrics-reporter.toml
    /// in the current directory when it exists. Values the file leaves unset are
    /// then filled through `lookup` (see [`Config::apply_env`]).
    pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(lookup);
        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill values the file left unset from the Actions inputs.
    ///
    /// The runner exposes `with:` inputs as `INPUT_<NAME>` with the name
    /// upper-cased and hyphens kept.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.runtime.version.is_none() {
            self.runtime.version = non_empty("INPUT_PHP-VERSION");
        }
        if self.github.token.is_none() {
            self.github.token = non_empty("INPUT_GITHUB-TOKEN").or_else(|| non_empty("GITHUB_TOKEN"));
        }
        if let Some(api_url) = non_empty("GITHUB_API_URL") {
            if self.github.api_url == default_api_url() {
                self.github.api_url = api_url;
            }
        }
    }

    /// Apply command-line overrides; `None` or an empty value leaves the
    /// current value (the runner sets unused inputs to "").
    pub fn override_with(&mut self, php_version: Option<String>, github_token: Option<String>) {
        if let Some(version) = php_version.filter(|v| !v.trim().is_empty()) {
            self.runtime.version = Some(version);
        }
        if let Some(token) = github_token.filter(|t| !t.trim().is_empty()) {
            self.github.token = Some(token);
        }
    }

    /// The validated PHP version.
    ///
    /// It ends up inside a `sh -c` string, so anything besides digits and
    /// dots is refused.
    pub fn runtime_version(&self) -> Result<&str, ConfigError> {
        let version = self
            .runtime
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingRuntimeVersion)?;

        let well_formed = version.chars().all(|c| c.is_ascii_digit() || c == '.')
            && version.starts_with(|c: char| c.is_ascii_digit())
            && !version.ends_with('.');
        if !well_formed {
            return Err(ConfigError::InvalidRuntimeVersion(version.to_string()));
        }
        Ok(version)
    }

    pub fn github_token(&self) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)
    }

    /// Check everything the pipeline needs before it starts running commands.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runtime_version()?;
        self.github_token()?;
        Ok(())
    }
}
