use anyhow::{bail, Context};
use clap::Parser;
use generator::catalog::{build_synthetic_catalog, GeneratorConfig};
use log::info;
use selectorcore::catalog::SqliteCatalog;
use std::io::{self, Cursor};
use std::path::PathBuf;
use workflow::config::SelectorConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

const OFFLINE_POINTING: &str = "MeerKAT:array1:169000000:3C286:202.78:30.51:1420.0";

#[derive(Parser)]
#[command(author, version, about = "Field-of-view target selector for telescope pointings")]
struct Args {
    /// Load the selector config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// SQLite catalog holding the target list (overrides the config)
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(long, default_value = "pointing_channel")]
    pointing_channel: String,
    #[arg(long, default_value = "targets_channel")]
    targets_channel: String,
    /// Run one sample pointing against a synthetic in-memory catalog
    #[arg(long, default_value_t = false)]
    offline: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.config {
        SelectorConfig::load(path)?
    } else {
        let config = SelectorConfig::from_args(
            args.catalog.clone(),
            args.pointing_channel,
            args.targets_channel,
        );
        config.validate()?;
        config
    };
    if let Some(path) = args.catalog {
        config.catalog.path = Some(path);
    }

    let runner = Runner::new(config.clone());

    if args.offline {
        let catalog = build_synthetic_catalog(&GeneratorConfig::default(), &config.catalog.table)?;
        let summary = runner.execute(catalog, Cursor::new(OFFLINE_POINTING), io::stdout())?;
        let matches = summary
            .last_published
            .as_ref()
            .and_then(|published| published.payload.as_deref())
            .map(|payload| serde_json::from_str::<Vec<serde_json::Value>>(payload))
            .transpose()
            .context("decoding offline payload")?
            .map_or(0, |entries| entries.len().saturating_sub(1));
        println!(
            "Offline run -> published {}, dropped {}, failed {}, targets in beam {}",
            summary.metrics.published, summary.metrics.dropped, summary.metrics.failed, matches
        );
        return Ok(());
    }

    let Some(path) = config.catalog.path.as_ref() else {
        bail!("no catalog configured; pass --catalog or set catalog.path in the config");
    };
    let catalog = SqliteCatalog::open(path)
        .with_context(|| format!("opening catalog {}", path.display()))?;
    info!(
        "reading pointings from stdin for channel {}",
        config.pointing_channel
    );
    let summary = runner.execute(catalog, io::stdin().lock(), io::stdout())?;
    info!(
        "input closed: received {}, published {}, dropped {}, failed {}, written {}",
        summary.metrics.received,
        summary.metrics.published,
        summary.metrics.dropped,
        summary.metrics.failed,
        summary.written
    );

    Ok(())
}
