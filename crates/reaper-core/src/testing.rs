//! In-memory gateway used by the pipeline tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    config::Config,
    domain::{BotProfile, Channel, ChannelId, ChannelMetadata, ChannelPage, Message, MessagePage},
    errors::GatewayError,
    ports::{ChannelGateway, GatewayResult},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    List(String),
    Info(String),
    History(String),
    Join(String),
    Post(String, String),
    Archive(String),
}

impl Call {
    fn op(&self) -> Op {
        match self {
            Call::List(_) => Op::List,
            Call::Info(_) => Op::Info,
            Call::History(_) => Op::History,
            Call::Join(_) => Op::Join,
            Call::Post(..) => Op::Post,
            Call::Archive(_) => Op::Archive,
        }
    }

    fn key(&self) -> &str {
        match self {
            Call::List(k)
            | Call::Info(k)
            | Call::History(k)
            | Call::Join(k)
            | Call::Post(k, _)
            | Call::Archive(k) => k,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    List,
    Info,
    History,
    Join,
    Post,
    Archive,
}

/// Config without touching the process environment.
pub fn test_config(days_inactive: u32, retry_delay: Option<Duration>) -> Config {
    Config {
        bot_token: secrecy::SecretString::from("xoxb-test"),
        api_base_url: "http://localhost".to_string(),
        days_inactive,
        allowlist_path: "allowlist.txt".into(),
        archivelist_path: "archivelist.txt".into(),
        retry_delay,
        page_size: 1000,
        history_limit: 100,
    }
}

pub fn ts_days_ago(now: DateTime<Utc>, days: i64) -> String {
    (now - chrono::Duration::days(days)).timestamp().to_string()
}

pub fn user_message(ts: impl Into<String>) -> Message {
    Message {
        subtype: None,
        bot_profile: None,
        ts: ts.into(),
        text: "hello".to_string(),
    }
}

pub fn bot_message(bot: &str, ts: impl Into<String>, text: &str) -> Message {
    Message {
        subtype: None,
        bot_profile: Some(BotProfile {
            name: bot.to_string(),
        }),
        ts: ts.into(),
        text: text.to_string(),
    }
}

pub fn subtype_message(subtype: &str, ts: impl Into<String>) -> Message {
    Message {
        subtype: Some(subtype.to_string()),
        ..user_message(ts)
    }
}

pub fn rate_limited(secs: u64) -> GatewayError {
    GatewayError::RateLimited {
        retry_after: Duration::from_secs(secs),
    }
}

/// Records every call; pages are chained with cursors `page-1`, `page-2`, ...
#[derive(Default)]
pub struct FakeGateway {
    pages: Vec<Vec<Channel>>,
    metadata: HashMap<String, ChannelMetadata>,
    histories: Mutex<HashMap<String, MessagePage>>,
    failures: Mutex<VecDeque<(Op, String, GatewayError)>>,
    rejected_posts: Vec<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, channels: Vec<Channel>) -> Self {
        self.pages.push(channels);
        self
    }

    pub fn with_history(self, id: &str, messages: Vec<Message>, last_read: Option<String>) -> Self {
        self.histories.lock().unwrap().insert(
            id.to_string(),
            MessagePage {
                messages,
                last_read,
            },
        );
        self
    }

    pub fn with_metadata(mut self, id: &str, topic: &str, purpose: &str) -> Self {
        let meta = self.metadata.entry(id.to_string()).or_default();
        meta.topic = topic.to_string();
        meta.purpose = purpose.to_string();
        self
    }

    /// Last-read marker served by `get_channel_info` only.
    pub fn with_last_read(mut self, id: &str, ts: impl Into<String>) -> Self {
        self.metadata.entry(id.to_string()).or_default().last_read = Some(ts.into());
        self
    }

    /// Posts to this channel report `ok: false`.
    pub fn rejecting_posts_to(mut self, id: &str) -> Self {
        self.rejected_posts.push(id.to_string());
        self
    }

    /// The next matching call fails once with `err`. Use `""` as key for the first page.
    pub fn fail_once(self, op: Op, key: &str, err: GatewayError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .push_back((op, key.to_string(), err));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: Op, key: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.op() == op && c.key() == key)
            .count()
    }

    pub fn touched(&self, key: &str) -> bool {
        self.calls()
            .iter()
            .any(|c| c.op() != Op::List && c.key() == key)
    }

    fn record(&self, call: Call) -> GatewayResult<()> {
        let op = call.op();
        let key = call.key().to_string();
        self.calls.lock().unwrap().push(call);

        let mut failures = self.failures.lock().unwrap();
        if let Some(pos) = failures.iter().position(|(o, k, _)| *o == op && *k == key) {
            if let Some((_, _, err)) = failures.remove(pos) {
                return Err(err);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelGateway for FakeGateway {
    async fn list_channels(&self, cursor: &str, _limit: usize) -> GatewayResult<ChannelPage> {
        self.record(Call::List(cursor.to_string()))?;
        let index = match cursor.strip_prefix("page-") {
            Some(n) => n.parse::<usize>().unwrap(),
            None => 0,
        };
        let channels = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = if index + 1 < self.pages.len() {
            format!("page-{}", index + 1)
        } else {
            String::new()
        };
        Ok(ChannelPage {
            channels,
            next_cursor,
        })
    }

    async fn get_channel_info(&self, id: &ChannelId) -> GatewayResult<ChannelMetadata> {
        self.record(Call::Info(id.0.clone()))?;
        Ok(self.metadata.get(&id.0).cloned().unwrap_or_default())
    }

    async fn get_history(&self, id: &ChannelId, limit: usize) -> GatewayResult<MessagePage> {
        self.record(Call::History(id.0.clone()))?;
        let mut page = self
            .histories
            .lock()
            .unwrap()
            .get(&id.0)
            .cloned()
            .unwrap_or_default();
        page.messages.truncate(limit);
        Ok(page)
    }

    async fn join_channel(&self, id: &ChannelId) -> GatewayResult<()> {
        self.record(Call::Join(id.0.clone()))
    }

    async fn post_message(&self, id: &ChannelId, text: &str) -> GatewayResult<bool> {
        self.record(Call::Post(id.0.clone(), text.to_string()))?;
        if self.rejected_posts.contains(&id.0) {
            return Ok(false);
        }
        let mut histories = self.histories.lock().unwrap();
        let page = histories.entry(id.0.clone()).or_default();
        page.messages
            .insert(0, bot_message("auto-archive", Utc::now().timestamp().to_string(), text));
        Ok(true)
    }

    async fn archive_channel(&self, id: &ChannelId) -> GatewayResult<()> {
        self.record(Call::Archive(id.0.clone()))
    }
}
