///
/// CLI glue for spec-publish: command parsing, config loading and wiring the
/// real collaborators (HTTP manifest fetcher, git publisher) into the core
/// pipeline.
///
/// All publishing logic lives in [`spec-publish-core`]; keep it there.
///
/// [`spec-publish-core`]: ../../spec-publish-core/
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spec_publish_core::git::GitPublisher;
use spec_publish_core::manifest::HttpManifestFetcher;
use spec_publish_core::pipeline::{run_publish, PublishOptions};
use spec_publish_core::spec::SpecDescriptor;
use std::path::PathBuf;

/// CLI for spec-publish: publish versioned OpenAPI specs to a docs branch.
#[derive(Parser)]
#[clap(
    name = "spec-publish",
    version,
    about = "Stage an OpenAPI spec under latest/versioned names, update versions.json and push it to the docs branch"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stage the spec, update the versions manifest for releases, and push to the publish branch
    Publish {
        /// Optional YAML config file; OA_* environment variables override it
        #[clap(long)]
        config: Option<PathBuf>,
        /// Stage everything (manifest included) but do not push
        #[clap(long)]
        no_push: bool,
    },
    /// Print the spec version and whether it counts as a release
    Version {
        /// Optional YAML config file; OA_* environment variables override it
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish { config, no_push } => {
            let config = load_config(config.as_deref())?;
            let descriptor = SpecDescriptor::locate(&config).context("Failed to locate spec")?;
            tracing::info!(command = "publish", version = %descriptor.version, "Starting OpenAPI spec publish");

            let fetcher = HttpManifestFetcher::new();
            let publisher = GitPublisher::new();
            let options = PublishOptions { push: !no_push };
            let report = run_publish(&config, &descriptor, &fetcher, &publisher, options)
                .await
                .context("OpenAPI spec failed to publish")?;

            tracing::info!(command = "publish", ?report, "Publish complete");
            let kind = if report.is_release { "release" } else { "pre-release" };
            if report.pushed {
                println!(
                    "Published OpenAPI spec {} ({kind}) to {}",
                    report.version, config.branch
                );
            } else {
                println!(
                    "Staged OpenAPI spec {} ({kind}) in {} (not pushed)",
                    report.version,
                    config.dist_dir.display()
                );
            }
            Ok(())
        }
        Commands::Version { config } => {
            let config = load_config(config.as_deref())?;
            let descriptor = SpecDescriptor::locate(&config).context("Failed to locate spec")?;
            let kind = if descriptor.is_release { "release" } else { "pre-release" };
            println!("{} ({kind})", descriptor.version);
            Ok(())
        }
    }
}
