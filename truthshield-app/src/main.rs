use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use truthshield_common::observability::init_logging;
use truthshield_config::LoggingConfig;
use truthshield_llm::Submission;
use truthshield_llm::traits::ChatClient;
use truthshield_normalizer::{Normalizer, NormalizerSettings};
mod wiring;

#[derive(Parser)]
#[command(name = "truthshield")]
#[command(about = "Fact-check claims against a search-augmented LLM")]
#[command(version)]
struct Cli {
    /// YAML configuration file (default: ./truthshield.yaml or the user config dir)
    #[arg(short, long, global = true, env = "TRUTHSHIELD_CONFIG")]
    config: Option<PathBuf>,

    /// Mirror logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fact-check a claim (or the article behind a URL) and print the verification
    Check {
        /// Claim text, or a URL with --url
        text: String,

        /// Treat TEXT as the URL of an article
        #[arg(long)]
        url: bool,
    },

    /// Normalize a saved upstream response body without calling any service
    Normalize {
        /// File holding the response body (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Probe the configured providers
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { text, url } => {
            let cfg = wiring::load_config(cli.config.as_deref())?;
            init_logging(wiring::log_config(&cfg.logging, cli.verbose))?;

            let submission = if url {
                Submission::url(&text)?
            } else {
                Submission::claim(text)?
            };
            let checker = wiring::build_fact_checker(&cfg)?;
            let verification = checker.check(submission).await?;
            println!("{}", serde_json::to_string_pretty(&verification)?);
        }

        Commands::Normalize { input } => {
            // Offline use needs no providers, so a missing default config is fine.
            let (logging, settings) = match wiring::load_config(cli.config.as_deref()) {
                Ok(cfg) => (cfg.logging, cfg.normalizer),
                Err(_) if cli.config.is_none() => {
                    (LoggingConfig::default(), NormalizerSettings::default())
                }
                Err(e) => return Err(e),
            };
            init_logging(wiring::log_config(&logging, cli.verbose))?;

            let body = match &input {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?,
            };
            let record = Normalizer::new(settings).normalize_body(&body);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Health => {
            let cfg = wiring::load_config(cli.config.as_deref())?;
            init_logging(wiring::log_config(&cfg.logging, cli.verbose))?;

            let checker = wiring::build_fact_checker(&cfg)?;
            let verifier_ok = report("verifier", checker.verifier().as_ref()).await?;
            if let Some(pre) = checker.preprocessor() {
                report("preprocessor", pre.as_ref()).await?;
            }
            if !verifier_ok {
                bail!("verifier is unreachable");
            }
        }
    }

    Ok(())
}

async fn report(role: &str, client: &dyn ChatClient) -> Result<bool> {
    let ok = client.health_check().await?;
    println!(
        "{role} ({}): {}",
        client.model_name(),
        if ok { "ok" } else { "unreachable" }
    );
    Ok(ok)
}
