//! Aquamark CLI - Batch watermarking for photo collections.
//!
//! Aquamark applies text and/or image watermarks to photos with
//! configurable placement, opacity, styling, and resizing.
//!
//! # Usage
//!
//! ```bash
//! # Watermark a directory of photos
//! aquamark export ./photos/ --out ./marked --text "© 2026" --position right_bottom
//!
//! # Reuse a saved template
//! aquamark export photo.jpg --out ./marked --template holiday
//!
//! # List scanned fonts
//! aquamark fonts list
//!
//! # View configuration
//! aquamark config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Aquamark - Batch watermarking for photo collections.
#[derive(Parser, Debug)]
#[command(name = "aquamark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Watermark images and write them to an output directory
    Export(cli::export::ExportArgs),

    /// Manage saved watermark templates
    Template(cli::template::TemplateArgs),

    /// Inspect the scanned fonts directory
    Fonts(cli::fonts::FontsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match aquamark_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `aquamark config path`."
            );
            aquamark_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Aquamark v{}", aquamark_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Export(args) => cli::export::execute(args, config).await,
        Commands::Template(args) => cli::template::execute(args).await,
        Commands::Fonts(args) => cli::fonts::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
