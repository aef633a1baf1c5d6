//! Configuration types for persona-rates
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `PERSONA_RATES__*` environment variables (e.g. `PERSONA_RATES__MODEL__MODEL=llama3`).
//! Command line flags are applied on top by the binary.

use crate::error::{Error, Result};
use dotenvy::dotenv;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "persona-rates.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PERSONA_RATES";

/// Default values matching a stock local Ollama install
pub mod defaults {
    /// OpenAI-compatible endpoint of the local daemon
    pub const BASE_URL: &str = "http://localhost:11434/v1";
    /// Ollama ignores the key but OpenAI-style clients must send one
    pub const API_KEY: &str = "ollama";
    /// Generous timeout for slow local inference
    pub const TIMEOUT_SECS: u64 = 300;
    /// Model pulled with `ollama pull gemma3`
    pub const MODEL: &str = "gemma3";
    /// Central-banker repetitions
    pub const ITERATIONS: u32 = 10;
    /// Scenario values used by both survey drivers
    pub const RATES: [f64; 6] = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
    /// Profile table location
    pub const PROFILES_PATH: &str = "profiles.csv";
    /// Persona results location
    pub const RESULTS_PATH: &str = "results.csv";
}

/// Shape of the requested answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Only the `{X.XX}` number
    #[default]
    Number,
    /// Short reasoning followed by an `{X.XX}` value
    Open,
}

impl AnswerMode {
    /// Fixed decoding parameters for this mode
    pub fn decoding(self) -> Decoding {
        match self {
            Self::Number => Decoding {
                temperature: 0.0,
                max_tokens: 10,
            },
            Self::Open => Decoding {
                temperature: 0.7,
                max_tokens: 200,
            },
        }
    }

    /// Default central-banker output file for this mode
    pub fn central_bank_file(self) -> &'static str {
        match self {
            Self::Number => "resultsCentralBank.csv",
            Self::Open => "resultsCentralBankOPEN.csv",
        }
    }

    /// Lowercase name as accepted on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Open => "open",
        }
    }
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "number" => Ok(Self::Number),
            "open" => Ok(Self::Open),
            other => Err(Error::config(format!(
                "unknown answer mode '{}', expected 'number' or 'open'",
                other
            ))),
        }
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decoding {
    /// Temperature for sampling (0.0-2.0)
    pub temperature: f32,
    /// Maximum tokens for completion
    pub max_tokens: u32,
}

/// Completion service configuration
#[derive(Clone)]
pub struct ServiceConfig {
    /// Base URL of the OpenAI-compatible API, including `/v1`
    pub base_url: Url,
    /// API key sent as a bearer token
    pub api_key: SecretString,
    /// Request timeout
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Create a service configuration for the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: SecretString::from(defaults::API_KEY.to_string()),
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
        })
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = SecretString::from(api_key.into());
        self
    }

    /// Get the API key as a string
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Base URL without a trailing slash, ready for joining paths
    pub fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***REDACTED***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Model selection and optional decoding overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier as known to the service
    pub model: String,
    /// Overrides the answer mode's temperature
    pub temperature: Option<f32>,
    /// Overrides the answer mode's token limit
    pub max_tokens: Option<u32>,
}

impl ModelConfig {
    /// Create a new model configuration
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Decoding for `mode` with any overrides applied
    pub fn decoding(&self, mode: AnswerMode) -> Decoding {
        let base = mode.decoding();
        Decoding {
            temperature: self.temperature.unwrap_or(base.temperature),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(defaults::MODEL)
    }
}

/// Survey shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Answer format for the central-banker variant
    pub answer_mode: AnswerMode,
    /// Central-banker repetitions
    pub iterations: u32,
    /// Number of leading profiles to skip when resuming
    pub start_offset: usize,
    /// Inflation values, outer loop
    pub inflation: Vec<f64>,
    /// Unemployment values, inner loop
    pub unemployment: Vec<f64>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            answer_mode: AnswerMode::default(),
            iterations: defaults::ITERATIONS,
            start_offset: 0,
            inflation: defaults::RATES.to_vec(),
            unemployment: defaults::RATES.to_vec(),
        }
    }
}

/// Input and output file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Profile table
    pub profiles: PathBuf,
    /// Persona results table
    pub results: PathBuf,
    /// Central-banker results table, derived from the answer mode when unset
    pub central_bank: Option<PathBuf>,
}

impl PathsConfig {
    /// Central-banker output location for `mode`
    pub fn central_bank_for(&self, mode: AnswerMode) -> PathBuf {
        self.central_bank
            .clone()
            .unwrap_or_else(|| PathBuf::from(mode.central_bank_file()))
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            profiles: PathBuf::from(defaults::PROFILES_PATH),
            results: PathBuf::from(defaults::RESULTS_PATH),
            central_bank: None,
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Completion service
    pub service: ServiceConfig,
    /// Model selection
    pub model: ModelConfig,
    /// Survey shape
    pub survey: SurveyConfig,
    /// File locations
    pub paths: PathsConfig,
}

/// Raw service section as it appears in files and the environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ServiceSection {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            api_key: defaults::API_KEY.to_string(),
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    service: ServiceSection,
    model: ModelSection,
    survey: SurveyConfig,
    paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ModelSection {
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            model: defaults::MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl Settings {
    /// Load settings from `.env`, the config file and the environment.
    ///
    /// An explicit `path` must exist; otherwise [`DEFAULT_CONFIG_FILE`] is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // Load .env if present so local development picks up PERSONA_RATES__* overrides
        let _ = dotenv();

        let file = match path {
            Some(path) => config::File::from(path.to_path_buf()).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let raw: SettingsFile = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("survey.inflation")
                    .with_list_parse_key("survey.unemployment"),
            )
            .build()?
            .try_deserialize()?;

        Self::from_file(raw)
    }

    fn from_file(raw: SettingsFile) -> Result<Self> {
        let service = ServiceConfig::new(&raw.service.base_url)?
            .with_api_key(raw.service.api_key)
            .with_timeout(Duration::from_secs(raw.service.timeout_secs));

        let settings = Self {
            service,
            model: ModelConfig {
                model: raw.model.model,
                temperature: raw.model.temperature,
                max_tokens: raw.model.max_tokens,
            },
            survey: raw.survey,
            paths: raw.paths,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants the drivers rely on
    pub fn validate(&self) -> Result<()> {
        if self.model.model.trim().is_empty() {
            return Err(Error::config("model identifier must not be empty"));
        }
        if let Some(temperature) = self.model.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(Error::config(format!(
                    "temperature {} outside 0.0-2.0",
                    temperature
                )));
            }
        }
        if self.model.max_tokens == Some(0) {
            return Err(Error::config("max_tokens must be at least 1"));
        }
        if self.survey.iterations == 0 {
            return Err(Error::config("iterations must be at least 1"));
        }
        if self.survey.inflation.is_empty() || self.survey.unemployment.is_empty() {
            return Err(Error::config(
                "inflation and unemployment value lists must not be empty",
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: Url::parse(defaults::BASE_URL).expect("valid default base URL"),
                api_key: SecretString::from(defaults::API_KEY.to_string()),
                timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            },
            model: ModelConfig::default(),
            survey: SurveyConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::config(format!("invalid service base URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::config(format!(
            "unsupported URL scheme '{}' in service base URL",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Settings::load reads process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.service.base(), "http://localhost:11434/v1");
        assert_eq!(settings.service.api_key(), "ollama");
        assert_eq!(settings.model.model, "gemma3");
        assert_eq!(settings.survey.iterations, 10);
        assert_eq!(settings.survey.inflation.len(), 6);
        assert_eq!(settings.survey.start_offset, 0);
    }

    #[test]
    fn test_answer_mode_decoding() {
        assert_eq!(
            AnswerMode::Number.decoding(),
            Decoding {
                temperature: 0.0,
                max_tokens: 10
            }
        );
        assert_eq!(
            AnswerMode::Open.decoding(),
            Decoding {
                temperature: 0.7,
                max_tokens: 200
            }
        );
        assert_eq!(
            AnswerMode::Open.central_bank_file(),
            "resultsCentralBankOPEN.csv"
        );
        assert_eq!("OPEN".parse::<AnswerMode>().unwrap(), AnswerMode::Open);
        assert!("essay".parse::<AnswerMode>().is_err());
    }

    #[test]
    fn test_model_overrides() {
        let model = ModelConfig::new("llama3").with_max_tokens(32);
        let decoding = model.decoding(AnswerMode::Number);
        assert_eq!(decoding.temperature, 0.0);
        assert_eq!(decoding.max_tokens, 32);
    }

    #[test]
    fn test_load_from_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[service]
base_url = "http://127.0.0.1:8000/v1/"
timeout_secs = 30

[model]
model = "llama3"

[survey]
answer_mode = "open"
iterations = 2
inflation = [2.0, 4.0]
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.service.base(), "http://127.0.0.1:8000/v1");
        assert_eq!(settings.service.timeout, Duration::from_secs(30));
        assert_eq!(settings.model.model, "llama3");
        assert_eq!(settings.survey.answer_mode, AnswerMode::Open);
        assert_eq!(settings.survey.iterations, 2);
        assert_eq!(settings.survey.inflation, vec![2.0, 4.0]);
        assert_eq!(settings.survey.unemployment.len(), 6);
        assert_eq!(
            settings.paths.central_bank_for(settings.survey.answer_mode),
            PathBuf::from("resultsCentralBankOPEN.csv")
        );
    }

    #[test]
    fn test_environment_overrides_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[model]
model = "gemma3"

[survey]
iterations = 2
inflation = [6.0, 8.0, 10.0]
"#
        )
        .unwrap();

        std::env::set_var("PERSONA_RATES__MODEL__MODEL", "llama3");
        std::env::set_var("PERSONA_RATES__SURVEY__ITERATIONS", "7");
        std::env::set_var("PERSONA_RATES__SURVEY__INFLATION", "2,4");
        std::env::set_var("PERSONA_RATES__SURVEY__UNEMPLOYMENT", "3.5,5");
        let loaded = Settings::load(Some(file.path()));
        for key in ["MODEL__MODEL", "SURVEY__ITERATIONS", "SURVEY__INFLATION", "SURVEY__UNEMPLOYMENT"] {
            std::env::remove_var(format!("PERSONA_RATES__{}", key));
        }

        let settings = loaded.unwrap();
        assert_eq!(settings.model.model, "llama3");
        assert_eq!(settings.survey.iterations, 7);
        assert_eq!(settings.survey.inflation, vec![2.0, 4.0]);
        assert_eq!(settings.survey.unemployment, vec![3.5, 5.0]);
    }

    #[test]
    fn test_validation_rejects_zero_iterations() {
        let mut settings = Settings::default();
        settings.survey.iterations = 0;
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ServiceConfig::new("not a url").is_err());
        assert!(ServiceConfig::new("ftp://localhost/v1").is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let service = ServiceConfig::new(defaults::BASE_URL)
            .unwrap()
            .with_api_key("super-secret");
        let debug = format!("{:?}", service);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
