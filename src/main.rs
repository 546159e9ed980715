//! awsweep: delete AWS resources matching a declarative filter
//!
//! A filter document maps resource types to id/tag regex patterns; matching
//! resources are destroyed in dependency order. `plan` previews a wipe
//! without issuing a single destructive call; every run writes a manifest of
//! what matched.

use anyhow::Result;
use awsweep::cloud::aws::AwsCloud;
use awsweep::cloud::{ResourceLifecycle, ResourceListing};
use awsweep::engine::{catalog, DEFAULT_CONCURRENCY};
use awsweep::{FilterConfig, SweepOptions, Sweeper};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "awsweep")]
#[command(about = "Delete AWS resources matching a declarative filter, in dependency order")]
#[command(version)]
struct Args {
    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// AWS region (overrides the profile's default region)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Path for the YAML manifest of everything that matched
    #[arg(long, global = true, default_value = "out.yaml")]
    output: PathBuf,

    /// Concurrent destroy calls per resource set
    #[arg(long, global = true, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete everything the filter config matches
    Wipe {
        /// YAML filter document (type -> {ids: [...], tags: {...}})
        config: PathBuf,
    },

    /// Delete every resource of every supported type
    WipeAll,

    /// Dry run: inventory and report what a wipe would delete
    Plan {
        /// YAML filter document (type -> {ids: [...], tags: {...}})
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    // Configuration problems abort here, before any AWS call is made.
    let (filter, dry_run) = match &args.command {
        Command::Wipe { config } => (FilterConfig::from_file(config)?, false),
        Command::WipeAll => (FilterConfig::match_all(catalog::supported_types()), false),
        Command::Plan { config } => (FilterConfig::from_file(config)?, true),
    };

    if let Some(profile) = &args.profile {
        info!(profile = %profile, "Using AWS profile");
    }
    info!(
        dry_run,
        concurrency = args.concurrency,
        types = filter.resource_types().count(),
        "Starting sweep"
    );

    let cloud = Arc::new(AwsCloud::new(args.profile.as_deref(), args.region.as_deref()).await);
    let listing: Arc<dyn ResourceListing> = cloud.clone();
    let lifecycle: Arc<dyn ResourceLifecycle> = cloud;

    let sweeper = Sweeper::new(
        listing,
        lifecycle,
        filter,
        SweepOptions {
            dry_run,
            concurrency: args.concurrency,
        },
    );

    let report = sweeper.run().await;
    sweeper.write_manifest(&args.output)?;

    let mode = if dry_run { "PLAN (dry-run)" } else { "WIPE" };
    println!("\n=== Sweep Report ===");
    println!("Mode: {mode}");
    println!();
    println!("Resource sets: {}", report.sets);
    println!("Matched:       {}", report.matched);
    if dry_run {
        println!("Skipped:       {} (dry-run mode)", report.skipped);
        println!();
        println!("Run wipe with the same config to actually delete these resources.");
    } else {
        println!("Deleted:       {}", report.deleted);
        println!("Failed:        {}", report.failed);
        println!("Skipped:       {}", report.skipped);
    }
    println!();
    println!("Manifest written to {}", args.output.display());

    Ok(())
}
