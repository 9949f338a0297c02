use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::drafts::{Drafts, FileDraftStore};
use crate::wizard::{FileSubmitter, FormSubmitter, HttpSubmitter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub drafts: DraftsConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Directories; relative paths resolve against the working directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub drafts: String,
    pub submissions: String,
    /// User form definitions (`*.json`), merged over the built-in catalog
    pub forms: String,
    pub logs: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftsConfig {
    /// Minimum gap between draft writes while typing (default: 500)
    #[serde(default = "default_autosave_debounce")]
    pub autosave_debounce_ms: u64,
}

fn default_autosave_debounce() -> u64 {
    500
}

impl Default for DraftsConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: default_autosave_debounce(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    /// Write each submission as a JSON file
    #[default]
    File,
    /// POST each submission to `submit.endpoint`
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    #[serde(default)]
    pub mode: SubmitMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Request timeout for the HTTP submitter (default: 30)
    #[serde(default = "default_submit_timeout")]
    pub timeout_secs: u64,
    /// Environment variable holding a bearer token for the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

fn default_submit_timeout() -> u64 {
    30
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            mode: SubmitMode::default(),
            endpoint: None,
            timeout_secs: default_submit_timeout(),
            token_env: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Event poll interval; also the autosave flush cadence
    pub tick_rate_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Form opened when `--form` is not given
    #[serde(default = "default_form")]
    pub form: String,
    /// Draft owner when `--owner` is not given; falls back to `$USER`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

fn default_form() -> String {
    "event".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            form: default_form(),
            owner: None,
        }
    }
}

impl Config {
    /// Project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".formflow/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so formflow works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/formflow/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("formflow").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with FORMFLOW_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("FORMFLOW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// The effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    fn resolve(path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    pub fn drafts_path(&self) -> PathBuf {
        Self::resolve(&self.paths.drafts)
    }

    pub fn submissions_path(&self) -> PathBuf {
        Self::resolve(&self.paths.submissions)
    }

    pub fn forms_path(&self) -> PathBuf {
        Self::resolve(&self.paths.forms)
    }

    pub fn logs_path(&self) -> PathBuf {
        Self::resolve(&self.paths.logs)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.drafts.autosave_debounce_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.ui.tick_rate_ms)
    }

    /// File-backed drafts under `paths.drafts`
    pub fn drafts(&self) -> Drafts {
        Drafts::new(Arc::new(FileDraftStore::new(self.drafts_path())))
    }

    /// The submitter selected by `submit.mode`
    pub fn build_submitter(&self) -> Result<Arc<dyn FormSubmitter>> {
        match self.submit.mode {
            SubmitMode::File => Ok(Arc::new(FileSubmitter::new(self.submissions_path()))),
            SubmitMode::Http => {
                let Some(endpoint) = self.submit.endpoint.as_deref() else {
                    bail!("submit.mode is \"http\" but submit.endpoint is not set");
                };
                let mut submitter =
                    HttpSubmitter::new(endpoint, Duration::from_secs(self.submit.timeout_secs))
                        .context("Failed to build HTTP submitter")?;

                if let Some(var) = &self.submit.token_env {
                    match std::env::var(var) {
                        Ok(token) => submitter = submitter.with_bearer_token(token),
                        Err(_) => {
                            tracing::warn!(var = %var, "Token variable not set, submitting without auth")
                        }
                    }
                }
                Ok(Arc::new(submitter))
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                drafts: ".formflow/drafts".to_string(),
                submissions: ".formflow/submissions".to_string(),
                forms: ".formflow/forms".to_string(),
                logs: ".formflow/logs".to_string(),
            },
            drafts: DraftsConfig::default(),
            submit: SubmitConfig::default(),
            ui: UiConfig { tick_rate_ms: 100 },
            logging: LoggingConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}
