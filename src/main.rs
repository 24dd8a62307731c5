//! kernwalk - Walk a namespace tree from the anchor found in its top-level collection.
//!
//! Usage:
//!   kernwalk snapshot <FILE>   Walk a namespace described by a JSON snapshot
//!   kernwalk dir <PATH>        Walk a namespace mirrored from a directory tree
//!   kernwalk --help            Show help

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kernwalk_scan::{DirectoryLoader, LoadConfig, LoadedNamespace, NamespaceSnapshot};
use kernwalk_walk::{
    AcceptAll, Driver, PrintVisitor, RecordingVisitor, VisitRecord, WalkConfig, WalkReport,
    WalkWarning,
};

#[derive(Parser)]
#[command(
    name = "kernwalk",
    version,
    about = "Walk a reference-counted namespace tree",
    long_about = "kernwalk resolves a namespace root, its lock and a top-level collection, \
                  finds the first usable collection member, and prints every node below \
                  that member's parent, depth-first."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a namespace loaded from a JSON snapshot
    Snapshot {
        /// Snapshot file
        file: PathBuf,

        #[command(flatten)]
        opts: WalkOpts,
    },

    /// Walk a namespace mirrored from a directory tree
    Dir {
        /// Directory to mirror as the namespace root
        path: PathBuf,

        /// Directory, relative to PATH, whose entries form the collection
        #[arg(short, long, default_value = "module")]
        collection: PathBuf,

        #[command(flatten)]
        opts: WalkOpts,
    },
}

#[derive(Args)]
struct WalkOpts {
    /// Maximum depth to walk (no limit by default)
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a WalkReport,
    visits: Vec<VisitRecord>,
    load_warnings: &'a [WalkWarning],
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Snapshot { file, opts } => {
            setup_logging(opts.verbose)?;
            let loaded = load_snapshot(&file)?;
            run_walk(&loaded, &[], &opts)?;
        }
        Command::Dir {
            path,
            collection,
            opts,
        } => {
            setup_logging(opts.verbose)?;
            let config = LoadConfig::builder()
                .root(path)
                .collection_dir(collection)
                .build()
                .context("Invalid load configuration")?;
            let loaded = DirectoryLoader::new()
                .load(&config)
                .context("Failed to load directory")?;
            for warning in &loaded.warnings {
                warn!("{}", warning.message);
            }
            run_walk(&loaded.loaded, &loaded.warnings, &opts)?;
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("kernwalk=debug,warn")
    } else {
        EnvFilter::new("kernwalk=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

fn load_snapshot(file: &Path) -> Result<LoadedNamespace> {
    let snapshot = NamespaceSnapshot::load(file)
        .with_context(|| format!("Failed to read snapshot {}", file.display()))?;
    let loaded = snapshot.build().context("Failed to build namespace")?;
    info!(
        nodes = loaded.namespace.node_count(),
        members = loaded.collection.len(),
        "snapshot loaded"
    );
    Ok(loaded)
}

/// Register the loaded namespace's symbols, run the driver once, tear down.
fn run_walk(loaded: &LoadedNamespace, load_warnings: &[WalkWarning], opts: &WalkOpts) -> Result<()> {
    let config = WalkConfig::builder()
        .max_depth(opts.max_depth)
        .build()
        .context("Invalid walk configuration")?;
    let driver = Driver::with_config(loaded.symbols(&config), config);

    match opts.format {
        OutputFormat::Text => {
            let printer = PrintVisitor::new(std::io::stdout());
            let report = driver.run(&AcceptAll, &printer).context("Walk failed")?;
            if !report.walked() {
                eprintln!("No anchor found in collection {}", loaded.collection.name());
            }
            if report.has_warnings() {
                eprintln!(
                    "{} warning(s) during walk",
                    report.skipped.len() + report.summary.warnings.len()
                );
            }
        }
        OutputFormat::Json => {
            let recorder = RecordingVisitor::new();
            let report = driver.run(&AcceptAll, &recorder).context("Walk failed")?;
            let output = JsonOutput {
                report: &report,
                visits: recorder.into_records(),
                load_warnings,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    driver.teardown();
    Ok(())
}
