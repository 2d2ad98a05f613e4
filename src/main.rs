use anyhow::{Context, Result};
use deep_research::cli::init::{self, InitConfig, InitResult};
use deep_research::cli::output::Output;
use deep_research::cli::{Cli, Commands};
use deep_research::{ResearchConfig, ResearchPipeline};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Commands::Init {
            ref path,
            force,
            search,
        } => {
            let result = init::run(
                InitConfig {
                    path: path.clone(),
                    force,
                    search,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => anyhow::bail!(e),
            }
        }
        Commands::Config { full, validate } => show_config(&cli.config, full, validate, &output),
        Commands::Run {
            ref topic,
            max_loops,
            output: ref report_path,
            json,
        } => {
            let mut config = load_config(&cli.config, &output)?;
            init_tracing(&config.log_level, cli.verbose, cli.json_logs);

            if let Some(max_loops) = max_loops {
                config.research.max_loops = max_loops;
                config.validate()?;
            }
            for warning in config.validate_with_warnings()? {
                tracing::warn!("{}", warning);
            }

            let pipeline = ResearchPipeline::from_config(&config)
                .context("Failed to build the research pipeline")?;
            let result = pipeline
                .run(topic)
                .await
                .with_context(|| format!("Research run for '{}' failed", topic))?;

            if let Some(path) = report_path {
                std::fs::write(path, &result.report)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                tracing::info!(path = %path.display(), "Report written");
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output.report(&result.report);
                if cli.verbose {
                    output.timings(&result.timings);
                }
                output.notifications(&result.notifications);
            }
            Ok(())
        }
    }
}

/// Logs go to stderr so the report on stdout can be piped.
fn init_tracing(log_level: &str, verbose: bool, json: bool) {
    let default_filter = if verbose {
        format!("{},deep_research=debug", log_level)
    } else {
        log_level.to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

fn load_config(path: &Path, output: &Output) -> Result<ResearchConfig> {
    ResearchConfig::load(path).map_err(|e| {
        output.error(&e.to_string());
        output.hint("Run 'deep-research init' to create a research.toml");
        anyhow::Error::new(e)
    })
}

fn show_config(path: &Path, full: bool, validate: bool, output: &Output) -> Result<()> {
    let config = load_config(path, output)?;

    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    output.kv("model", &format!("{} @ {}", config.llm.model, config.llm.base_url));
    output.kv("web search", config.search.name());
    output.kv("memory", config.memory.name());
    output.kv("max_loops", &config.research.max_loops.to_string());

    let email = &config.notify.email;
    output.kv(
        "notify email",
        if email.recipient.trim().is_empty() {
            "no recipient (will fail)".to_string()
        } else {
            format!("{} via {}:{}", email.recipient, email.smtp_server, email.smtp_port)
        }
        .as_str(),
    );
    output.kv("notify discord", &format!("${}", config.notify.discord.webhook_url_env));

    if full {
        output.subheader("Full configuration");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    if validate {
        let warnings = config.validate_with_warnings()?;
        if warnings.is_empty() {
            output.success("Configuration is valid");
        } else {
            for warning in &warnings {
                output.warning(&warning.message);
            }
            output.success(&format!("Configuration is valid ({} warnings)", warnings.len()));
        }
    }

    Ok(())
}
