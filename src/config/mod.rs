//! Configuration management.
//!
//! Resolution order: an explicit `--config` path, then
//! `HOOKWISE_CONFIG_PATH`, then `<config dir>/hookwise/config.toml`, then
//! built-in defaults. Environment overrides are applied last.

mod features;

pub use features::FeatureFlags;

use crate::observability::LogFormat;
use crate::services::{ClassifierConfig, ReportLimits};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var naming a config file.
pub const CONFIG_PATH_ENV: &str = "HOOKWISE_CONFIG_PATH";

/// Main configuration for hookwise.
#[derive(Debug, Clone, Serialize)]
pub struct HookwiseConfig {
    /// Rule catalog; the built-in catalog is used when unset.
    pub rules_path: Option<PathBuf>,
    /// Root of the per-session log directories.
    pub data_dir: PathBuf,
    /// Classifier tuning.
    pub classifier: ClassifierConfig,
    /// Report section limits.
    pub summary: ReportLimits,
    /// Feature flags.
    pub features: FeatureFlags,
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize)]
pub struct LlmConfig {
    /// Provider name. Only `anthropic` is built in.
    pub provider: String,
    /// Model name.
    pub model: Option<String>,
    /// API key.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL for the provider.
    pub base_url: Option<String>,
    /// Narration budget in milliseconds.
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: None,
            api_key: None,
            base_url: None,
            timeout_ms: 5_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `debug` or `hookwise=trace`.
    pub level: Option<String>,
    /// Output format.
    pub format: LogFormat,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Rule catalog path.
    pub rules_path: Option<String>,
    /// Data directory.
    pub data_dir: Option<String>,
    /// Classifier section.
    pub classifier: Option<ConfigFileClassifier>,
    /// Summary section.
    pub summary: Option<ConfigFileSummary>,
    /// Feature flags.
    pub features: Option<ConfigFileFeatures>,
    /// LLM configuration.
    pub llm: Option<ConfigFileLlm>,
    /// Logging configuration.
    pub logging: Option<ConfigFileLogging>,
}

/// Classifier section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileClassifier {
    /// Match cap.
    pub max_matches: Option<usize>,
}

/// Summary section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSummary {
    /// Requests listed in the report.
    pub max_requests_shown: Option<usize>,
    /// File touches listed in the report.
    pub max_files_shown: Option<usize>,
    /// Commands listed in the report.
    pub max_commands_shown: Option<usize>,
    /// Errors listed in the report.
    pub max_errors_shown: Option<usize>,
}

/// Features section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileFeatures {
    /// Summary artifacts.
    pub summary: Option<bool>,
    /// Transcript copy.
    pub chat_copy: Option<bool>,
    /// Hook input log.
    pub hook_log: Option<bool>,
    /// LLM narration.
    pub narration: Option<bool>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Provider name.
    pub provider: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Narration budget in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for HookwiseConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            data_dir: default_data_dir(),
            classifier: ClassifierConfig::default(),
            summary: ReportLimits::default(),
            features: FeatureFlags::default(),
            llm: LlmConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl HookwiseConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves configuration for the process and applies env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file (argument or
    /// `HOOKWISE_CONFIG_PATH`) cannot be read or parsed. A broken file at
    /// the default location is logged and ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::parse(&contents)
    }

    /// Parses TOML configuration content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid config document.
    pub fn parse(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/hookwise/` on macOS)
    /// 2. XDG config dir (`~/.config/hookwise/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("hookwise").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("hookwise")
                .join("config.toml"),
        ];
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = lookup("HOOKWISE_RULES_PATH") {
            self.rules_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("HOOKWISE_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("HOOKWISE_MAX_MATCHES") {
            match v.trim().parse::<usize>() {
                Ok(n) => self.classifier.max_matches = n,
                Err(_) => tracing::warn!(value = %v, "Ignoring invalid HOOKWISE_MAX_MATCHES"),
            }
        }
        if let Some(v) = lookup("HOOKWISE_LLM_TIMEOUT_MS") {
            match v.trim().parse::<u64>() {
                Ok(n) => self.llm.timeout_ms = n,
                Err(_) => tracing::warn!(value = %v, "Ignoring invalid HOOKWISE_LLM_TIMEOUT_MS"),
            }
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = lookup("ANTHROPIC_API_KEY");
        }
        if let Some(v) = lookup("HOOKWISE_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&v);
        }
        if let Some(v) = lookup("HOOKWISE_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(v));
        }
        self
    }

    /// Converts a `ConfigFile` to `HookwiseConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(rules_path) = file.rules_path {
            config.rules_path = Some(PathBuf::from(rules_path));
        }
        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(max_matches) = file.classifier.and_then(|c| c.max_matches) {
            config.classifier.max_matches = max_matches;
        }
        if let Some(summary) = file.summary {
            let limits = &mut config.summary;
            limits.max_requests_shown = summary.max_requests_shown.unwrap_or(limits.max_requests_shown);
            limits.max_files_shown = summary.max_files_shown.unwrap_or(limits.max_files_shown);
            limits.max_commands_shown = summary.max_commands_shown.unwrap_or(limits.max_commands_shown);
            limits.max_errors_shown = summary.max_errors_shown.unwrap_or(limits.max_errors_shown);
        }
        if let Some(features) = file.features {
            if let Some(v) = features.summary {
                config.features.summary = v;
            }
            if let Some(v) = features.chat_copy {
                config.features.chat_copy = v;
            }
            if let Some(v) = features.hook_log {
                config.features.hook_log = v;
            }
            if let Some(v) = features.narration {
                config.features.narration = v;
            }
        }
        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                config.llm.provider = provider.trim().to_lowercase();
            }
            if let Some(timeout_ms) = llm.timeout_ms {
                config.llm.timeout_ms = timeout_ms;
            }
            config.llm.model = llm.model;
            config.llm.api_key = llm.api_key;
            config.llm.base_url = llm.base_url;
        }
        if let Some(logging) = file.logging {
            config.logging.level = logging.level;
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }

        config
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the rule catalog path.
    #[must_use]
    pub fn with_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = Some(path.into());
        self
    }

    /// Sets the feature flags.
    #[must_use]
    pub const fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }
}

/// Default root for per-session logs.
///
/// Falls back to a temporary directory if the platform data dir cannot be
/// resolved.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || {
            tracing::warn!("Failed to resolve user data dir; falling back to temp dir");
            std::env::temp_dir().join("hookwise").join("logs")
        },
        |b| b.data_local_dir().join("hookwise").join("logs"),
    )
}
