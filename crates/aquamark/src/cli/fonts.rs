//! The `aquamark fonts` command for inspecting the fonts directory.

use clap::{Args, Subcommand};

use aquamark_core::{Config, FontLibrary};

/// Arguments for the `fonts` command.
#[derive(Args, Debug)]
pub struct FontsArgs {
    #[command(subcommand)]
    pub command: FontsCommand,
}

/// Subcommands for font inspection.
#[derive(Subcommand, Debug)]
pub enum FontsCommand {
    /// List font families found in the fonts directory
    List,

    /// Show the fonts directory path
    Path,
}

/// Execute the fonts command.
pub async fn execute(args: FontsArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        FontsCommand::List => {
            let fonts_dir = config.fonts_dir();
            if !fonts_dir.is_dir() {
                println!(
                    "Fonts directory {} does not exist; the built-in font will be used.",
                    fonts_dir.display()
                );
                return Ok(());
            }

            let library = FontLibrary::scan(&fonts_dir);
            if library.is_empty() {
                println!(
                    "No .ttf/.otf files found in {}; the built-in font will be used.",
                    fonts_dir.display()
                );
                return Ok(());
            }

            println!("Fonts in {}:", fonts_dir.display());
            for (family, styles) in library.families() {
                println!("  {:<24} {}", family, styles.join(", "));
            }
        }

        FontsCommand::Path => {
            println!("{}", config.fonts_dir().display());
        }
    }

    Ok(())
}
