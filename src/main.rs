use anyhow::Context;
use burnkit::{
    export_document, init_logging, launch_output, reorder_document, Config, LogLevel,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "burnkit", version, about = "Layered artwork to laser G-code")]
struct Cli {
    /// Configuration file (JSON or TOML); defaults to the platform config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate G-code for every visible layer of a document
    Export {
        /// Document JSON file
        document: PathBuf,

        /// Output program path (defaults to the document path with the configured extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep shapes in document order
        #[arg(long)]
        no_optimize: bool,

        /// Open the program afterwards (also enabled by `export.autolaunch`)
        #[arg(long)]
        open: bool,
    },
    /// Reorder each layer's shapes to shorten travel
    Reorder {
        /// Document JSON file
        document: PathBuf,

        /// Output document path (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let level = if cli.verbose {
        LogLevel::Verbose
    } else {
        config.logging.level
    };
    init_logging(level)?;
    info!("BurnKit {} (built {})", burnkit::VERSION, burnkit::BUILD_DATE);

    match cli.command {
        Command::Export {
            document,
            output,
            no_optimize,
            open,
        } => {
            let (written, _) =
                export_document(&document, output.as_deref(), &config, !no_optimize)?;
            if open || config.export.autolaunch {
                if let Err(e) = launch_output(&written) {
                    warn!("{:#}", e);
                }
            }
        }
        Command::Reorder { document, output } => {
            reorder_document(&document, output.as_deref(), &config)?;
        }
    }

    Ok(())
}
