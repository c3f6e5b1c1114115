//! bead-select: find ferrite chip beads by impedance in vendor S-parameter archives.
//!
//! This is the main entry point for the chip bead selector.

mod config;
mod orchestrator;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_types::units::Bounds;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "bead-select")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Select parts by size and impedance
    Select {
        /// Parameter file (TOML or JSON); replaces the flags below
        #[arg(short, long, conflicts_with_all = ["size", "impedance"])]
        params: Option<PathBuf>,

        /// Size class in inch (0201, 0402, 0603, 0805, 1206)
        #[arg(short, long, required_unless_present = "params")]
        size: Option<String>,

        /// |Z| window at 100 MHz in ohms: MIN,MAX
        #[arg(long, value_delimiter = ',', num_args = 2, required_unless_present = "params")]
        impedance: Option<Vec<f64>>,

        /// L window at 1 MHz in henries: MIN,MAX
        #[arg(long, value_delimiter = ',', num_args = 2)]
        inductance: Option<Vec<f64>>,

        /// Directory holding the vendor archives (zip files or extracted)
        #[arg(long)]
        archive_root: Option<PathBuf>,

        /// Catalog file (TOML or JSON) instead of the built-in vendor list
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output directory for plot series
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a Touchstone file and summarize the part
    ParseTouchstone {
        /// Path to the .s1p/.s2p file
        file: PathBuf,
    },

    /// List catalog archives and whether they are present
    Catalog {
        /// Catalog file (TOML or JSON) instead of the built-in vendor list
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Directory holding the vendor archives (zip files or extracted)
        #[arg(long, default_value = "sparam")]
        archive_root: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Select {
            params,
            size,
            impedance,
            inductance,
            archive_root,
            catalog,
            output,
        } => {
            let mut config = match params {
                Some(path) => config::load_config(&path)?,
                None => selection_from_flags(size, impedance, inductance)?,
            };
            if let Some(root) = archive_root {
                config.archive_root = root;
            }
            if let Some(catalog) = catalog {
                config.catalog = Some(catalog);
            }
            config::validate_config(&config)?;

            run_selection(config, output.as_deref(), cli.format)?;
        }
        Commands::ParseTouchstone { file } => {
            parse_touchstone(&file, cli.format)?;
        }
        Commands::Catalog { catalog, archive_root } => {
            list_catalog(catalog.as_deref(), &archive_root, cli.format)?;
        }
    }

    Ok(())
}

fn window(values: Option<Vec<f64>>, label: &str) -> Result<Option<Bounds>> {
    match values.as_deref() {
        None => Ok(None),
        Some(&[min, max]) => Ok(Some(Bounds::new(min, max))),
        Some(other) => anyhow::bail!("{} needs MIN,MAX, got {} values", label, other.len()),
    }
}

fn selection_from_flags(
    size: Option<String>,
    impedance: Option<Vec<f64>>,
    inductance: Option<Vec<f64>>,
) -> Result<config::SelectionConfig> {
    let size = size.context("--size is required without --params")?;
    let impedance = window(impedance, "--impedance")?.context("--impedance is required without --params")?;

    let mut config = config::SelectionConfig::new(size, impedance);
    config.inductance = window(inductance, "--inductance")?;
    Ok(config)
}

fn run_selection(config: config::SelectionConfig, output_dir: Option<&Path>, format: OutputFormat) -> Result<()> {
    let orchestrator = orchestrator::Orchestrator::new(config)?;
    tracing::info!(
        "Selecting size {} from {:?}",
        orchestrator.config().size,
        orchestrator.config().archive_root
    );
    let results = orchestrator.run()?;

    let stdout = std::io::stdout();
    output::write_report(&results, format, &mut stdout.lock())?;

    if let Some(dir) = output_dir {
        output::write_plot_files(&results, dir)
            .with_context(|| format!("Failed to write plot series to {:?}", dir))?;
    }

    Ok(())
}

fn parse_touchstone(file: &Path, format: OutputFormat) -> Result<()> {
    tracing::info!("Parsing Touchstone file: {:?}", file);

    let (summary, curve) = orchestrator::load_curve(file)?;
    let stdout = std::io::stdout();
    output::write_touchstone(&summary, &curve, format, &mut stdout.lock())?;
    Ok(())
}

fn list_catalog(catalog: Option<&Path>, archive_root: &Path, format: OutputFormat) -> Result<()> {
    let status = orchestrator::list_catalog(catalog, archive_root)?;
    let stdout = std::io::stdout();
    output::write_catalog(&status, format, &mut stdout.lock())?;
    Ok(())
}
