//! Layered configuration: defaults, an optional TOML file, then `HAKIM__*`
//! environment overrides (double underscore separates nested keys), then the
//! well-known `DASHSCOPE_API_KEY` and `WEATHER_API` variables for keys left
//! unset.
//!
//! ```rust
//! use hakim::HakimConfig;
//!
//! let config = HakimConfig::from_toml_str(
//!     "[model]\nname = \"qwen-plus\"\n",
//!     [("HAKIM__ORCHESTRATION__RETRY_ATTEMPTS", "5"), ("DASHSCOPE_API_KEY", "sk-demo")],
//! )
//! .expect("config should load");
//!
//! assert_eq!(config.model.name, "qwen-plus");
//! assert_eq!(config.orchestration.retry_attempts, 5);
//! assert_eq!(config.model.seed, 1234);
//! assert_eq!(format!("{:?}", config.model.api_key), "Some([REDACTED])");
//! ```

use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use hchat::{DEFAULT_MODEL, DEFAULT_SEED, DEFAULT_SYSTEM_PROMPT};
use hcommon::GenerationOptions;
use hprovider::{RetryPolicy, SecretString};
use serde::{Deserialize, Deserializer};

use crate::HakimError;

pub const ENV_PREFIX: &str = "HAKIM";
pub const DASHSCOPE_API_KEY_VAR: &str = "DASHSCOPE_API_KEY";
pub const WEATHER_API_KEY_VAR: &str = "WEATHER_API";

pub const DASHSCOPE_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";
pub const AMAP_WEATHER_ENDPOINT: &str = "https://restapi.amap.com/v3/weather/weatherInfo";

/// Files probed, in order, when no explicit path is given.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["hakim.toml", "config/hakim.toml"];

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct HakimConfig {
    pub model: ModelConfig,
    pub orchestration: OrchestrationConfig,
    pub weather: WeatherConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub base_url: String,
    pub seed: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            base_url: DASHSCOPE_ENDPOINT.to_string(),
            seed: DEFAULT_SEED,
            temperature: None,
            max_tokens: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Whole-cycle budget; `0` disables it.
    pub cycle_timeout_ms: u64,
    pub tool_timeout_ms: u64,
    pub retry_attempts: u32,
    pub system_prompt: Option<String>,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            cycle_timeout_ms: 60_000,
            tool_timeout_ms: 15_000,
            retry_attempts: 3,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    /// CSV file of `name,adcode` rows.
    pub city_codes_path: Option<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: AMAP_WEATHER_ENDPOINT.to_string(),
            timeout_ms: 10_000,
            api_key: None,
            city_codes_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(SecretString::new).filter(|secret| !secret.is_empty()))
}

impl HakimConfig {
    /// Loads from the process environment. An explicit `path` must exist;
    /// otherwise `hakim.toml` and `config/hakim.toml` are probed.
    pub fn load(path: Option<&Path>) -> Result<Self, HakimError> {
        Self::load_with_env(path, std::env::vars())
    }

    pub fn load_with_env<I, K, V>(path: Option<&Path>, vars: I) -> Result<Self, HakimError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut builder = config::Config::builder();
        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(found) = DEFAULT_CONFIG_FILES
                    .iter()
                    .map(Path::new)
                    .find(|candidate| candidate.exists())
                {
                    builder = builder.add_source(
                        File::from(found).format(FileFormat::Toml).required(false),
                    );
                }
            }
        }

        Self::finish(builder, vars)
    }

    pub fn from_toml_str<I, K, V>(toml: &str, vars: I) -> Result<Self, HakimError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let builder = config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder, vars)
    }

    fn finish<I, K, V>(builder: ConfigBuilder<DefaultState>, vars: I) -> Result<Self, HakimError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect::<config::Map<String, String>>();

        let dashscope_key = vars.get(DASHSCOPE_API_KEY_VAR).cloned();
        let weather_key = vars.get(WEATHER_API_KEY_VAR).cloned();

        let mut loaded = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars)),
            )
            .build()?
            .try_deserialize::<Self>()?;

        if loaded.model.api_key.is_none() {
            loaded.model.api_key = dashscope_key
                .map(SecretString::new)
                .filter(|secret| !secret.is_empty());
        }
        if loaded.weather.api_key.is_none() {
            loaded.weather.api_key = weather_key
                .map(SecretString::new)
                .filter(|secret| !secret.is_empty());
        }

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), HakimError> {
        if self.model.name.trim().is_empty() {
            return Err(HakimError::configuration("model.name must not be empty"));
        }
        if self.model.base_url.trim().is_empty() {
            return Err(HakimError::configuration("model.base_url must not be empty"));
        }
        if self.weather.endpoint.trim().is_empty() {
            return Err(HakimError::configuration(
                "weather.endpoint must not be empty",
            ));
        }
        if self.orchestration.tool_timeout_ms == 0 {
            return Err(HakimError::configuration(
                "orchestration.tool_timeout_ms must be positive",
            ));
        }

        Ok(())
    }

    pub fn cycle_timeout(&self) -> Option<Duration> {
        match self.orchestration.cycle_timeout_ms {
            0 => None,
            millis => Some(Duration::from_millis(millis)),
        }
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.orchestration.tool_timeout_ms)
    }

    pub fn weather_timeout(&self) -> Duration {
        Duration::from_millis(self.weather.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.orchestration.retry_attempts)
    }

    pub fn generation_options(&self) -> GenerationOptions {
        let mut options = GenerationOptions::default().with_seed(self.model.seed);
        if let Some(temperature) = self.model.temperature {
            options = options.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.model.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }
        options
    }

    pub fn system_prompt(&self) -> &str {
        self.orchestration
            .system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}
