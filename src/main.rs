//! study-tutor - Terminal client for a topic-scoped study tutor
//!
//! Main entry point for the study-tutor application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use study_tutor::cli::{Cli, Commands};
use study_tutor::commands;
use study_tutor::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { topic } => {
            tracing::info!("Starting interactive tutoring session");
            if let Some(t) = &topic {
                tracing::debug!("Initial topic: {}", t);
            }
            commands::chat::run_chat(config, topic).await?;
            Ok(())
        }
        Commands::Ask { topic, question } => {
            tracing::info!("Asking a single question");
            commands::ask::run_ask(config, topic, question).await?;
            Ok(())
        }
        Commands::History => {
            tracing::info!("Starting history command");
            commands::history::run_history(config).await?;
            Ok(())
        }
        Commands::Export { format, output } => {
            tracing::info!("Starting {} export", format);
            if let Some(dir) = &output {
                tracing::debug!("Export directory override: {}", dir.display());
            }
            commands::export::run_export(config, format, output).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "study_tutor=debug"
    } else {
        "study_tutor=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
