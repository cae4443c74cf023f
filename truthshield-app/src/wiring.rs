use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use truthshield_common::observability::LogConfig;
use truthshield_config::{
    DEFAULT_PREPROCESSOR_ENDPOINT, DEFAULT_VERIFIER_ENDPOINT, LoggingConfig, ProviderConfig,
    TruthShieldConfig, TruthShieldConfigLoader, default_config_path,
};
use truthshield_llm::FactChecker;
use truthshield_llm::chat::ChatCompletionsClient;
use truthshield_normalizer::Normalizer;

/// Load configuration; an explicit path must exist, the default locations
/// are optional and environment variables alone may suffice.
pub fn load_config(explicit: Option<&Path>) -> Result<TruthShieldConfig> {
    let loader = TruthShieldConfigLoader::new();
    let loader = match explicit {
        Some(path) => loader.with_file(path),
        None => match default_config_path() {
            Some(path) => loader.with_optional_file(path),
            None => loader,
        },
    };
    loader.load().with_context(|| match explicit {
        Some(path) => format!("failed to load configuration from {}", path.display()),
        None => "no usable configuration: pass --config or set TRUTHSHIELD__PROVIDERS__VERIFIER__MODEL \
                 and TRUTHSHIELD__PROVIDERS__VERIFIER__API_KEY"
            .to_string(),
    })
}

pub fn log_config(logging: &LoggingConfig, verbose: bool) -> LogConfig {
    LogConfig {
        app_name: "truthshield",
        log_dir: logging.dir.clone(),
        emit_stderr: logging.stderr || verbose,
        format: logging.format,
        default_filter: logging.filter.clone(),
    }
}

pub fn build_client(provider: &ProviderConfig, default_endpoint: &str) -> Result<ChatCompletionsClient> {
    let api_key = provider.api_key()?;
    let mut client = ChatCompletionsClient::new(
        provider.endpoint_or(default_endpoint),
        api_key,
        provider.model.clone(),
    )?
    .with_defaults(provider.temperature, provider.max_tokens);
    if let Some(secs) = provider.timeout_secs {
        client = client.with_timeout(Duration::from_secs(secs));
    }
    Ok(client)
}

pub fn build_fact_checker(cfg: &TruthShieldConfig) -> Result<FactChecker> {
    let verifier = build_client(&cfg.providers.verifier, DEFAULT_VERIFIER_ENDPOINT)
        .context("verifier provider")?;
    let mut checker = FactChecker::new(Arc::new(verifier), Normalizer::new(cfg.normalizer.clone()));

    if let Some(pre) = &cfg.providers.preprocessor {
        let preprocessor =
            build_client(pre, DEFAULT_PREPROCESSOR_ENDPOINT).context("preprocessor provider")?;
        checker = checker.with_preprocessor(Arc::new(preprocessor));
    }

    tracing::debug!(
        verifier = %cfg.providers.verifier.model,
        preprocessor = ?cfg.providers.preprocessor.as_ref().map(|p| p.model.as_str()),
        "app.fact_checker.ready"
    );
    Ok(checker)
}
