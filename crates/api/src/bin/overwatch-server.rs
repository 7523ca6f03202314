//! Overwatch gateway entry point
//!
//! Loads configuration, initializes tracing and serves the risk assessment
//! API. Also offers configuration validation and one-shot assessments.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use overwatch_assessor::RiskAssessor;
use overwatch_common::{init_tracing_with_level, GatewayConfig, LogFormat};
use overwatch_api::OverwatchServer;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "overwatch-server")]
#[command(version)]
#[command(about = "LLM-backed risk gateway for automated actions")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "OVERWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, ignore_case = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },
    /// Assess a single action and print the verdict as JSON
    Assess {
        /// Description of the intended action
        action: String,
    },
    /// Validate configuration
    ValidateConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing_with_level(&cli.log_level, cli.log_format)?;

    info!("Overwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = GatewayConfig::load(cli.config.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    match cli.command {
        Some(Commands::ValidateConfig) => {
            println!("✓ Configuration is valid");
            println!("  Identity endpoint:  {}", config.identity.url);
            println!("  Inference endpoint: {}", config.inference.url);
            println!("  Model:              {}", config.inference.model_id);
            println!("  Token cache:        {}", config.identity.cache_tokens);
            println!("  Validation:         {:?}", config.verdict.validation);
            Ok(())
        }
        Some(Commands::Assess { action }) => {
            let assessor = RiskAssessor::from_config(&config)?;
            let assessment = assessor.assess_detailed(&action).await;
            if assessment.source.is_degraded() {
                warn!(source = assessment.source.header_value(), "Verdict is a degraded fallback");
            } else {
                info!(source = assessment.source.header_value(), "One-shot assessment complete");
            }
            println!("{}", serde_json::to_string_pretty(&assessment.verdict)?);
            Ok(())
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(h) = host {
                config.server.host = h;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            OverwatchServer::new(&config)?.run().await
        }
        None => OverwatchServer::new(&config)?.run().await,
    }
}
