pub mod check_config;
pub mod classify;
pub mod output;
pub mod runtime;
pub mod serve;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use check_config::cmd_check_config;
pub use classify::{cmd_classify, ClassifyArgs};
pub use output::OutputFormat;
pub use runtime::{init_logging, load_config, LoadedConfig, LogFormat};
pub use serve::{cmd_serve, ServeArgs};
pub use version::cmd_version;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "GATEHOUSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server behind the admission pipeline
    Serve(ServeArgs),
    /// Show how a method and path would be classified
    Classify(ClassifyArgs),
    /// Validate the configuration file and seed data without serving
    CheckConfig,
    /// Print version and build information
    Version,
}

pub async fn dispatch(args: CliArgs) -> Result<()> {
    match args.command {
        Commands::Version => cmd_version(),
        Commands::Classify(classify) => {
            let loaded = load_config(args.config.as_deref()).await?;
            cmd_classify(classify, &loaded.config)
        }
        Commands::CheckConfig => {
            let loaded = load_config(args.config.as_deref()).await?;
            cmd_check_config(&loaded).await
        }
        Commands::Serve(serve) => {
            let loaded = load_config(args.config.as_deref()).await?;
            cmd_serve(serve, loaded.config).await
        }
    }
}
