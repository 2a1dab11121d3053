//! Command-line host for plughost.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plughost_core::config::{
    env_vars, DiscoveryConfig, DEFAULT_CONFIG_FILE, DEFAULT_EXTENSION_DIR,
};
use plughost_core::extension::{
    AttemptOutcome, BundleIndexer, BundleWriter, DiscoveryReport, ExtensionInfo, ModuleFile,
    NativeModule, PluginRegistry,
};
use plughost_core::RuntimeDiscovery;
use serde::Serialize;

/// plughost - discover, load and run extension bundles.
#[derive(Parser, Debug)]
#[command(name = "plughost")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run one discovery pass: load, activate, then deactivate.
    Run {
        /// Extension directory to scan.
        #[arg(short, long, default_value = DEFAULT_EXTENSION_DIR)]
        dir: PathBuf,
        /// Configuration file (written with defaults if missing).
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Module file the host owns and discovery must skip.
        #[arg(long)]
        exclude: Vec<PathBuf>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the type descriptors of a bundle without loading it.
    Inspect {
        /// Path to the bundle file.
        #[arg(required = true)]
        bundle: PathBuf,
    },
    /// Pack a shared library into a bundle.
    Pack {
        /// Shared library exporting a type table.
        #[arg(required = true)]
        library: PathBuf,
        /// Bundle file to write.
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct RunSummary<'a> {
    report: &'a DiscoveryReport,
    extensions: Vec<ExtensionInfo>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    tracing::debug!(command = ?args.command, "Starting plughost");

    match args.command {
        Command::Run {
            dir,
            config,
            exclude,
            json,
        } => run_discovery(&dir, &config, exclude, json, args.verbose),
        Command::Inspect { bundle } => inspect_bundle(&bundle),
        Command::Pack { library, output } => pack_library(&library, &output),
    }
}

fn init_logging(verbose: bool) {
    // Check if JSON logging is requested (for production/container environments)
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_directive = if verbose { "plughost=debug" } else { "plughost=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    // Logs go to stderr so stdout carries only the report.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run_discovery(
    dir: &Path,
    config_path: &Path,
    exclude: Vec<PathBuf>,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let mut config = DiscoveryConfig::load_or_init(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?
        .apply_env_overrides();
    if verbose {
        config.verbose_logging = true;
    }

    let mut discovery = exclude
        .into_iter()
        .fold(RuntimeDiscovery::new(dir, config), |discovery, path| {
            discovery.exclude_module(path)
        });

    let outcome = discovery.begin_discovery().map(|_| ());

    if let (Some(report), Some(registry)) = (discovery.report(), discovery.registry()) {
        if json {
            let summary = RunSummary {
                report,
                extensions: registry.list(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_report(report, registry);
        }
    }

    discovery.end_discovery();
    outcome.context("Extension activation failed")
}

fn print_report(report: &DiscoveryReport, registry: &PluginRegistry) {
    println!(
        "Extension directory: {} ({})",
        report.directory.display(),
        report.scan
    );

    for module in &report.modules {
        println!();
        println!("{}", module.module.display());
        if let Some(error) = &module.index_error {
            println!("  archive error: {}", error);
        }
        if let Some(error) = &module.native_error {
            println!("  native library error: {}", error);
        }
        for attempt in &module.attempts {
            match &attempt.outcome {
                AttemptOutcome::Registered { origin } => {
                    println!("  registered {} ({})", attempt.descriptor, origin);
                }
                AttemptOutcome::Skipped(reason) => {
                    println!("  skipped {}: {}", attempt.descriptor, reason);
                }
            }
        }
        if module.registered.is_none() {
            println!("  no extension");
        }
    }

    println!();
    for entry in registry.iter() {
        println!("  [{}] {}", entry.state(), entry.type_name());
    }
    println!(
        "Registered: {} extension(s) in {}ms",
        report.registered_count(),
        report.elapsed_ms
    );
}

fn inspect_bundle(bundle: &Path) -> Result<()> {
    let index = BundleIndexer::new().index(&ModuleFile::new(bundle));

    println!("Bundle: {}", bundle.display());
    for descriptor in &index.descriptors {
        println!("  {}", descriptor);
    }
    println!("Types: {}", index.descriptors.len());

    match index.error {
        Some(e) => Err(e).with_context(|| format!("Failed to read {}", bundle.display())),
        None => Ok(()),
    }
}

fn pack_library(library: &Path, output: &Path) -> Result<()> {
    let module = NativeModule::open(library)
        .with_context(|| format!("Failed to read type table from {}", library.display()))?;

    let writer = module
        .types()
        .iter()
        .fold(BundleWriter::new().with_library(library), |writer, ty| {
            writer.with_type(ty.name.as_str())
        });
    writer
        .write_to(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Packed {} type(s) into {}",
        module.types().len(),
        output.display()
    );
    Ok(())
}
