//! csjava CLI
//!
//! Converts C# sources and project archives to Java through a
//! text-completion service.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use csjava_core::ConversionOptions;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "csjava")]
#[command(author, version, about = "csjava - C# to Java conversion with an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert C# files or zipped projects
    Convert {
        /// .cs files and/or .zip archives
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output directory for the produced archives
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Write only the archive of translated files
        #[arg(long)]
        java_only: bool,

        /// Drop comments from the translated code
        #[arg(long)]
        no_comments: bool,

        /// Turn properties into plain fields instead of getters/setters
        #[arg(long)]
        no_getters_setters: bool,

        /// Keep C# naming instead of Java conventions
        #[arg(long)]
        keep_naming: bool,

        /// Analyze the whole project first (recommended for multiple files)
        #[arg(long)]
        project_context: bool,
    },

    /// Analyze the quality of a C# file
    Analyze {
        /// C# source file
        file: PathBuf,
    },

    /// Test the completion service connection
    Test,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the completion endpoint
    SetEndpoint {
        /// Endpoint URL (e.g., https://my-resource.openai.azure.com)
        url: String,
        /// Provider (azure, openai)
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Set the Azure deployment name
    SetDeployment { name: String },
    /// Set the API key (prompts if not given)
    SetApiKey { key: Option<String> },
    /// Reset to default configuration
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "csjava=debug,csjava_core=debug"
        } else {
            "csjava=warn,csjava_core=warn"
        })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    info!("Starting csjava CLI");

    let result = match cli.command {
        Commands::Convert {
            paths,
            out,
            java_only,
            no_comments,
            no_getters_setters,
            keep_naming,
            project_context,
        } => {
            commands::convert::run(commands::convert::ConvertOptions {
                paths,
                out,
                java_only,
                conversion: ConversionOptions {
                    include_comments: !no_comments,
                    generate_getters_setters: !no_getters_setters,
                    use_java_conventions: !keep_naming,
                    use_project_context: project_context,
                },
            })
            .await
        }
        Commands::Analyze { file } => commands::analyze::run(&file).await,
        Commands::Test => commands::connection::run().await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show().await,
            ConfigAction::SetEndpoint { url, provider } => {
                commands::config::set_endpoint(&url, provider.as_deref()).await
            }
            ConfigAction::SetDeployment { name } => commands::config::set_deployment(&name).await,
            ConfigAction::SetApiKey { key } => commands::config::set_api_key(key).await,
            ConfigAction::Reset { yes } => commands::config::reset(yes).await,
        },
    };

    if let Err(ref e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    result
}
