//! cellar — archives historical formula versions out of a tap's git history.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cellar_lib::{Archiver, Manifest, Result, RunReport};

mod output;

/// Archive historical formula versions from an upstream tap checkout
#[derive(Parser)]
#[command(name = "cellar", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// Path to the upstream tap checkout to mine
    #[arg(long, value_name = "PATH")]
    repo: Option<PathBuf>,

    /// Directory the archived formulae are written to
    #[arg(long, value_name = "DIR")]
    formulae: Option<PathBuf>,

    /// TOML manifest of tracked packages (defaults to the built-in set)
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Output the run report as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only archive these packages (default: every tracked package)
    #[arg(value_name = "PACKAGES")]
    packages: Vec<String>,
}

const AFTER_HELP: &str = "\
The upstream tap keeps only the current definition of each formula. cellar
walks the commits that touched a tracked formula, extracts the release each
revision described, and writes every retained past release back out as a
pinned name@version formula. The latest version is always left alone: it is
still the live definition.

Examples:
  cellar --repo vendor/homebrew-core
  cellar --manifest cellar.toml elasticsearch
  cellar --json -vv
";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        if let Err(e) = output::print_json(&report) {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    } else {
        output::print_text(&report);
    }

    if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(cli: &Cli) -> Result<RunReport> {
    let manifest = match &cli.manifest {
        Some(path) => Manifest::load(path)?,
        None => Manifest::builtin()?,
    };

    let specs = if cli.packages.is_empty() {
        manifest.packages.clone()
    } else {
        manifest.select(&cli.packages)?
    };

    let repo = cli.repo.as_ref().unwrap_or(&manifest.repo);
    let formulae = cli.formulae.as_ref().unwrap_or(&manifest.formulae_dir);
    tracing::info!(
        repo = %repo.display(),
        formulae = %formulae.display(),
        packages = specs.len(),
        "starting archival run"
    );

    let archiver = Archiver::open(repo, formulae)?;
    Ok(archiver.run(&specs))
}

/// Initialize tracing subscriber based on verbosity, RUST_LOG wins.
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,cellar_lib=info".to_string(),
            2 => "info,cellar_lib=debug".to_string(),
            _ => "debug,cellar_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}
