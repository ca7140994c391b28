//! Activity inference: when did a human last do something in a channel?

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::{
    domain::{Channel, Message},
    errors::{EvaluationError, GatewayError},
    ports::ChannelGateway,
    retry::RetryPolicy,
};

/// Structural notices that never count as activity.
pub const IGNORED_SUBTYPES: [&str; 4] = [
    "channel_leave",
    "channel_join",
    "channel_topic",
    "channel_purpose",
];

/// Bot profile name used by this tool's own notices.
pub const SELF_BOT_NAME: &str = "auto-archive";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivityOutcome {
    /// A countable message exists; inactivity is measured from it.
    Measured {
        last_activity: DateTime<Utc>,
        days_inactive: i64,
    },
    /// Nothing countable in recent history. The channel's last-read marker is the
    /// fallback and the channel is treated as active.
    AssumedActive { last_read: Option<DateTime<Utc>> },
}

impl ActivityOutcome {
    pub fn is_active(&self) -> bool {
        matches!(self, ActivityOutcome::AssumedActive { .. })
    }

    pub fn days_inactive(&self) -> i64 {
        match self {
            ActivityOutcome::Measured { days_inactive, .. } => *days_inactive,
            ActivityOutcome::AssumedActive { .. } => 0,
        }
    }
}

pub struct ActivityEvaluator {
    gateway: Arc<dyn ChannelGateway>,
    retry: RetryPolicy,
    history_limit: usize,
}

impl ActivityEvaluator {
    pub fn new(gateway: Arc<dyn ChannelGateway>, retry: RetryPolicy, history_limit: usize) -> Self {
        Self {
            gateway,
            retry,
            history_limit,
        }
    }

    pub async fn evaluate(&self, channel: &Channel) -> Result<ActivityOutcome, EvaluationError> {
        self.evaluate_at(channel, Utc::now()).await
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit "now".
    pub async fn evaluate_at(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
    ) -> Result<ActivityOutcome, EvaluationError> {
        self.retry
            .run(|| self.attempt(channel, now))
            .await
    }

    async fn attempt(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
    ) -> Result<ActivityOutcome, GatewayError> {
        if !channel.is_member {
            self.gateway.join_channel(&channel.id).await?;
        }

        let page = self
            .gateway
            .get_history(&channel.id, self.history_limit)
            .await?;

        match page.messages.iter().find(|m| counts_as_activity(m)) {
            Some(latest) => {
                let last_activity = parse_ts(&latest.ts)?;
                Ok(ActivityOutcome::Measured {
                    last_activity,
                    days_inactive: days_between(last_activity, now),
                })
            }
            None => {
                let raw = match page.last_read {
                    Some(raw) => Some(raw),
                    None => self.gateway.get_channel_info(&channel.id).await?.last_read,
                };
                let last_read = raw.as_deref().map(parse_ts).transpose()?;
                Ok(ActivityOutcome::AssumedActive { last_read })
            }
        }
    }
}

pub fn counts_as_activity(msg: &Message) -> bool {
    if let Some(subtype) = msg.subtype.as_deref() {
        if IGNORED_SUBTYPES.contains(&subtype) {
            return false;
        }
    }
    !msg.is_from_bot_named(SELF_BOT_NAME)
}

/// Whole days elapsed, floored. Clock skew never yields a negative count.
pub fn days_between(last_activity: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_activity).num_days().max(0)
}

/// Parse a server timestamp: integer seconds, optionally followed by `.micros`.
pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>, GatewayError> {
    let secs = raw.split('.').next().unwrap_or_default();
    secs.trim()
        .parse::<i64>()
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .ok_or_else(|| GatewayError::platform(format!("invalid timestamp {raw:?}")))
}
