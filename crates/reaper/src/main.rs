mod cli;

use std::{io::Write, path::Path, sync::Arc};

use anyhow::Context;
use clap::Parser;

use reaper_core::{
    config::{self, Config},
    driver::Driver,
    policy::PolicySets,
};
use reaper_slack::SlackGateway;

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // `.env` may carry RUST_LOG, so apply it before the subscriber reads the filter.
    config::load_dotenv_if_present(Path::new(config::DOTENV_PATH));
    reaper_core::logging::init("reaper")?;

    let cfg = Config::load()?;
    let policy = Arc::new(PolicySets::load(&cfg)?);
    let gateway = Arc::new(SlackGateway::from_config(&cfg)?);

    let driver = Driver::new(gateway, policy, &cfg, cli.run_options());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = driver.run(&mut out).await.context("reaper run failed")?;
    out.flush()?;

    tracing::info!(
        dry_run = summary.dry_run,
        candidates = summary.scan.candidates.len(),
        scan_failures = summary.scan.failures.len(),
        warned = summary.warned,
        archived = summary.archive.as_ref().map_or(0, |a| a.archived.len()),
        archive_failures = summary.archive.as_ref().map_or(0, |a| a.failures.len()),
        "run complete"
    );
    Ok(())
}
