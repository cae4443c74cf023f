//! Loader for TruthShield configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: YAML files and inline snippets in the order they
//! were added, then `TRUTHSHIELD__`-prefixed environment variables
//! (`TRUTHSHIELD__PROVIDERS__VERIFIER__MODEL=sonar` sets
//! `providers.verifier.model`). After merging, `${VAR}` placeholders in any
//! string are expanded from the process environment.
//!
//! ```yaml
//! version: "1"
//! logging:
//!   format: json
//!   filter: "info,truthshield_normalizer=debug"
//! normalizer:
//!   min_explanation_chars: 20
//! providers:
//!   verifier:
//!     model: sonar-pro
//!     api_key: "${PERPLEXITY_API_KEY}"
//!   preprocessor:
//!     model: gpt-4o-mini
//!     api_key: "${OPENAI_API_KEY}"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use truthshield_common::NormalizerSettings;
use truthshield_common::observability::LogFormat;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TRUTHSHIELD";
const CONFIG_FILE_NAME: &str = "truthshield.yaml";

pub const DEFAULT_VERIFIER_ENDPOINT: &str = "https://api.perplexity.ai/";
pub const DEFAULT_PREPROCESSOR_ENDPOINT: &str = "https://api.openai.com/v1/";

#[derive(Debug, Clone, Deserialize)]
pub struct TruthShieldConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub normalizer: NormalizerSettings,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives; `RUST_LOG` still wins when set.
    pub filter: String,
    pub stderr: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".to_string(),
            stderr: false,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    pub verifier: ProviderConfig,
    #[serde(default)]
    pub preprocessor: Option<ProviderConfig>,
}

/// One OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub model: String,
    pub api_key: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn endpoint_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.endpoint.as_deref().unwrap_or(default)
    }

    /// The API key, rejecting blanks and placeholders that never resolved.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::Message(format!(
                "api_key for model {} is empty",
                self.model
            )));
        }
        if key.contains("${") {
            return Err(ConfigError::Message(format!(
                "api_key for model {} references an unset variable: {key}",
                self.model
            )));
        }
        Ok(key)
    }
}

/// `./truthshield.yaml` if present, else `<config dir>/truthshield/truthshield.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("truthshield").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TruthShieldConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TruthShieldConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TruthShieldConfigLoader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`Self::with_file`], but a missing file is skipped so deployments
    /// can rely on environment variables alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use truthshield_config::TruthShieldConfigLoader;
    ///
    /// let cfg = TruthShieldConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "test"
    /// providers:
    ///   verifier:
    ///     model: sonar
    ///     api_key: pplx-example
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.version.as_deref(), Some("test"));
    /// assert!(cfg.providers.preprocessor.is_none());
    /// assert_eq!(cfg.normalizer.html_snippet_chars, 500);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize.
    pub fn load(self) -> Result<TruthShieldConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("TS_FOO", Some("bar"), || {
            let mut v = json!("prefix-${TS_FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("TS_CITY", Some("Lyon")), ("TS_CC", Some("fr"))], || {
            let mut v = json!(["hello-$TS_CITY", { "loc": "${TS_CITY}.${TS_CC}" }, 42, null]);
            expand_env_in_value(&mut v);
            assert_eq!(v, json!(["hello-Lyon", { "loc": "Lyon.fr" }, 42, null]));
        });
    }

    #[test]
    fn expands_recursively_and_stops_on_cycles() {
        temp_env::with_vars(
            [
                ("TS_BAZ", Some("qux")),
                ("TS_BAR", Some("mid-${TS_BAZ}")),
                ("TS_A", Some("${TS_B}")),
                ("TS_B", Some("${TS_A}")),
            ],
            || {
                let mut chained = json!("X=${TS_BAR}");
                expand_env_in_value(&mut chained);
                assert_eq!(chained, json!("X=mid-qux"));

                let mut cyclic = json!("x=${TS_A}-y");
                expand_env_in_value(&mut cyclic);
                let s = cyclic.as_str().unwrap();
                assert!(s.starts_with("x=") && s.ends_with("-y"));
            },
        );
    }

    #[test]
    fn unresolved_keys_are_rejected() {
        let provider = ProviderConfig {
            model: "sonar".into(),
            api_key: "${TS_DOES_NOT_EXIST}".into(),
            endpoint: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: None,
        };
        assert!(provider.api_key().is_err());
        assert_eq!(
            provider.endpoint_or(DEFAULT_VERIFIER_ENDPOINT),
            DEFAULT_VERIFIER_ENDPOINT
        );
    }
}
