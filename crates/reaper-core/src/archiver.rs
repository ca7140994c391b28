//! Archival side effects: notices, archive calls, and the pre-archival warning.

use std::{io::Write, sync::Arc};

use crate::{
    domain::{Candidate, CandidateSet, Channel, ChannelId},
    errors::{Error, GatewayError},
    ports::ChannelGateway,
    retry::RetryPolicy,
    Result,
};

pub fn archival_notice(days_inactive: i64) -> String {
    format!("This channel has been inactive for {days_inactive} days and so is being archived.")
}

pub fn warning_text(days_inactive: i64) -> String {
    format!(
        "This channel has been inactive for {days_inactive} days and will soon be archived. \
         If you prefer to not archive this channel, please keep active or add a 'noarchive' \
         to the topic or profile of this channel."
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Archived,
    /// The platform refused the notice, so the archive call was withheld.
    NoticeRejected,
}

#[derive(Debug)]
pub struct ArchiveFailure {
    pub channel: Channel,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub archived: Vec<ChannelId>,
    pub notice_rejected: Vec<ChannelId>,
    pub failures: Vec<ArchiveFailure>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarnOutcome {
    pub already_warned: bool,
    pub posted: bool,
    /// Not posted because the run is live and the archival notice follows.
    pub withheld: bool,
}

impl WarnOutcome {
    /// A prior warning or a withheld post both count as success.
    pub fn success(&self) -> bool {
        self.already_warned || self.posted || self.withheld
    }
}

pub struct Archiver {
    gateway: Arc<dyn ChannelGateway>,
    retry: RetryPolicy,
    history_limit: usize,
    dry_run: bool,
}

impl Archiver {
    pub fn new(
        gateway: Arc<dyn ChannelGateway>,
        retry: RetryPolicy,
        history_limit: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            gateway,
            retry,
            history_limit,
            dry_run,
        }
    }

    /// Single best-effort pass in discovery order. A failing channel is recorded
    /// and the pass moves on.
    pub async fn archive_all(
        &self,
        candidates: &CandidateSet,
        out: &mut dyn Write,
    ) -> Result<ArchiveReport> {
        let mut report = ArchiveReport::default();
        for candidate in candidates {
            writeln!(out, "Archiving channel {} now...", candidate.channel.name)?;
            match self.archive_one(candidate, out).await {
                Ok(ArchiveOutcome::Archived) => {
                    tracing::info!(channel = %candidate.channel.name, "channel archived");
                    report.archived.push(candidate.channel.id.clone());
                }
                Ok(ArchiveOutcome::NoticeRejected) => {
                    tracing::warn!(
                        channel = %candidate.channel.name,
                        "archival notice was not accepted, channel left as is"
                    );
                    report.notice_rejected.push(candidate.channel.id.clone());
                }
                Err(error) => {
                    tracing::error!(channel = %candidate.channel.name, %error, "archival failed");
                    report.failures.push(ArchiveFailure {
                        channel: candidate.channel.clone(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }

    /// Post the notice, then archive only if the notice went through.
    pub async fn archive_one(
        &self,
        candidate: &Candidate,
        out: &mut dyn Write,
    ) -> Result<ArchiveOutcome> {
        let text = archival_notice(candidate.days_inactive);
        writeln!(out, "{text}")?;

        let id = &candidate.channel.id;
        if !self.gateway.post_message(id, &text).await? {
            return Ok(ArchiveOutcome::NoticeRejected);
        }
        self.gateway.archive_channel(id).await?;
        Ok(ArchiveOutcome::Archived)
    }

    /// Post the pre-archival warning unless an identical one is already in history.
    ///
    /// A new warning is only posted in dry-run mode; outside it the real archival
    /// notice follows immediately and a warning would be noise.
    pub async fn warn(
        &self,
        channel: &Channel,
        days_inactive: i64,
        out: &mut dyn Write,
    ) -> Result<WarnOutcome> {
        let text = warning_text(days_inactive);
        let already_warned = self.already_warned(channel, &text).await?;
        writeln!(out, "{text}: Already Warned = {already_warned}")?;

        if already_warned || !self.dry_run {
            return Ok(WarnOutcome {
                already_warned,
                posted: false,
                withheld: !already_warned,
            });
        }

        let posted = self.gateway.post_message(&channel.id, &text).await?;
        Ok(WarnOutcome {
            already_warned,
            posted,
            withheld: false,
        })
    }

    async fn already_warned(&self, channel: &Channel, text: &str) -> Result<bool> {
        let found = self
            .retry
            .run(|| async move {
                if !channel.is_member {
                    self.gateway.join_channel(&channel.id).await?;
                }
                let page = self
                    .gateway
                    .get_history(&channel.id, self.history_limit)
                    .await?;
                Ok::<_, GatewayError>(
                    page.messages
                        .iter()
                        .any(|m| m.is_from_bot() && m.text == text),
                )
            })
            .await?;
        Ok(found)
    }
}
