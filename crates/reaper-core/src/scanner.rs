//! Full-workspace scan: paginate, classify every channel, collect archive candidates.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::time::sleep;

use crate::{
    activity::ActivityEvaluator,
    config::Config,
    domain::{CandidateSet, Channel, ChannelPage},
    eligibility::{EligibilityFilter, Exemption},
    errors::{Error, GatewayError},
    policy::PolicySets,
    ports::ChannelGateway,
    retry::RetryPolicy,
    Result,
};

/// How a single channel was classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Restrict-list is non-empty and does not name this channel.
    OutOfScope,
    Exempt(Exemption),
    Active,
    BelowThreshold { days_inactive: i64 },
    Candidate { days_inactive: i64 },
}

#[derive(Debug)]
pub struct ChannelFailure {
    pub channel: Channel,
    pub error: Error,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub pages: usize,
    pub channels: usize,
    pub out_of_scope: usize,
    pub exempt: usize,
    pub active: usize,
    pub below_threshold: usize,
    pub rate_limit_waits: usize,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub candidates: CandidateSet,
    pub failures: Vec<ChannelFailure>,
    pub stats: ScanStats,
}

pub struct Scanner {
    gateway: Arc<dyn ChannelGateway>,
    evaluator: ActivityEvaluator,
    policy: Arc<PolicySets>,
    threshold_days: i64,
    page_size: usize,
}

impl Scanner {
    pub fn new(gateway: Arc<dyn ChannelGateway>, policy: Arc<PolicySets>, cfg: &Config) -> Self {
        let evaluator = ActivityEvaluator::new(
            gateway.clone(),
            RetryPolicy::new(cfg.retry_delay),
            cfg.history_limit,
        );
        Self {
            gateway,
            evaluator,
            policy,
            threshold_days: i64::from(cfg.days_inactive),
            page_size: cfg.page_size,
        }
    }

    pub async fn scan(&self) -> Result<ScanReport> {
        self.scan_at(Utc::now()).await
    }

    /// Walk every page until the platform returns an empty cursor.
    ///
    /// Per-channel failures are recorded and skipped. Only a listing call that fails
    /// with something other than a rate limit ends the scan early.
    pub async fn scan_at(&self, now: DateTime<Utc>) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        let mut cursor = String::new();

        loop {
            let page = self.list_page(&cursor, &mut report.stats).await?;
            report.stats.pages += 1;

            let mut results = Vec::with_capacity(page.channels.len());
            for channel in page.channels {
                let result = self
                    .check_channel_with_backoff(&channel, now, &mut report.stats)
                    .await;
                results.push((channel, result));
            }
            absorb(&mut report, results);

            if page.next_cursor.is_empty() {
                break;
            }
            cursor = page.next_cursor;
        }

        tracing::info!(
            pages = report.stats.pages,
            channels = report.stats.channels,
            candidates = report.candidates.len(),
            failures = report.failures.len(),
            "scan finished"
        );
        Ok(report)
    }

    async fn list_page(&self, cursor: &str, stats: &mut ScanStats) -> Result<ChannelPage> {
        loop {
            match self.gateway.list_channels(cursor, self.page_size).await {
                Ok(page) => return Ok(page),
                Err(GatewayError::RateLimited { retry_after }) => {
                    stats.rate_limit_waits += 1;
                    wait_out(retry_after, "conversations list").await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Re-attempts the same channel for as long as the platform keeps rate limiting.
    async fn check_channel_with_backoff(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
        stats: &mut ScanStats,
    ) -> Result<Verdict> {
        loop {
            match self.check_channel(channel, now).await {
                Err(e) => match e.retry_after() {
                    Some(retry_after) => {
                        stats.rate_limit_waits += 1;
                        wait_out(retry_after, &channel.name).await;
                    }
                    None => return Err(e),
                },
                ok => return ok,
            }
        }
    }

    pub async fn check_channel(&self, channel: &Channel, now: DateTime<Utc>) -> Result<Verdict> {
        if !self.policy.in_scope(channel) {
            return Ok(Verdict::OutOfScope);
        }

        let outcome = self.evaluator.evaluate_at(channel, now).await?;

        let metadata = self.gateway.get_channel_info(&channel.id).await?;
        if let Some(exemption) = EligibilityFilter::new(&self.policy).exemption(channel, &metadata)
        {
            return Ok(Verdict::Exempt(exemption));
        }

        if outcome.is_active() {
            return Ok(Verdict::Active);
        }

        let days_inactive = outcome.days_inactive();
        if days_inactive < self.threshold_days {
            return Ok(Verdict::BelowThreshold { days_inactive });
        }
        Ok(Verdict::Candidate { days_inactive })
    }
}

fn absorb(report: &mut ScanReport, results: Vec<(Channel, Result<Verdict>)>) {
    for (channel, result) in results {
        report.stats.channels += 1;
        match result {
            Ok(Verdict::Candidate { days_inactive }) => {
                tracing::debug!(channel = %channel.name, days_inactive, "archive candidate");
                report.candidates.insert(channel, days_inactive);
            }
            Ok(Verdict::OutOfScope) => report.stats.out_of_scope += 1,
            Ok(Verdict::Exempt(reason)) => {
                tracing::debug!(channel = %channel.name, ?reason, "exempt from archival");
                report.stats.exempt += 1;
            }
            Ok(Verdict::Active) => report.stats.active += 1,
            Ok(Verdict::BelowThreshold { .. }) => report.stats.below_threshold += 1,
            Err(error) => {
                tracing::warn!(channel = %channel.name, %error, "error while checking channel");
                report.failures.push(ChannelFailure { channel, error });
            }
        }
    }
}

async fn wait_out(retry_after: Duration, context: &str) {
    tracing::info!(
        retry_after_secs = retry_after.as_secs(),
        context,
        "too many requests, sleeping"
    );
    sleep(retry_after).await;
}
