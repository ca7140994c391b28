//! End-to-end run: banner, scan, report, optional warnings, archival.

use std::{io::Write, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    archiver::{ArchiveReport, Archiver},
    config::Config,
    policy::PolicySets,
    ports::ChannelGateway,
    retry::RetryPolicy,
    scanner::{ScanReport, Scanner},
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub dry_run: bool,
    /// Run the pre-archival warning step for every candidate.
    pub warn: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            warn: false,
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub dry_run: bool,
    pub scan: ScanReport,
    pub warned: usize,
    /// `None` in dry run.
    pub archive: Option<ArchiveReport>,
}

pub struct Driver {
    scanner: Scanner,
    archiver: Archiver,
    options: RunOptions,
}

impl Driver {
    pub fn new(
        gateway: Arc<dyn ChannelGateway>,
        policy: Arc<PolicySets>,
        cfg: &Config,
        options: RunOptions,
    ) -> Self {
        Self {
            scanner: Scanner::new(gateway.clone(), policy, cfg),
            archiver: Archiver::new(
                gateway,
                RetryPolicy::new(cfg.retry_delay),
                cfg.history_limit,
                options.dry_run,
            ),
            options,
        }
    }

    pub async fn run(&self, out: &mut dyn Write) -> Result<RunSummary> {
        self.run_at(Utc::now(), out).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>, out: &mut dyn Write) -> Result<RunSummary> {
        if self.options.dry_run {
            writeln!(out, "THIS IS A DRY RUN! No Channels will be archived")?;
        } else {
            writeln!(out, "THIS IS NOT A DRY RUN! Channels will be archived")?;
        }

        let scan = self.scanner.scan_at(now).await?;

        writeln!(out, "The following channels will be archived")?;
        let mut warned = 0;
        for candidate in &scan.candidates {
            writeln!(
                out,
                "{}: {} days since last active",
                candidate.channel.name, candidate.days_inactive
            )?;

            if !self.options.warn {
                continue;
            }
            match self
                .archiver
                .warn(&candidate.channel, candidate.days_inactive, out)
                .await
            {
                Ok(outcome) if outcome.success() => {
                    warned += 1;
                    writeln!(out, "Warned on {}", candidate.channel.name)?;
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(channel = %candidate.channel.name, %error, "warning failed");
                }
            }
        }

        let archive = if self.options.dry_run {
            None
        } else {
            writeln!(out, "Archiving now...")?;
            Some(self.archiver.archive_all(&scan.candidates, out).await?)
        };

        Ok(RunSummary {
            dry_run: self.options.dry_run,
            scan,
            warned,
            archive,
        })
    }
}
