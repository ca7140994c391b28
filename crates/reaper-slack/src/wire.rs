//! Web API payload shapes, reduced to the fields the pipeline reads.

use serde::Deserialize;

use reaper_core::domain::{
    BotProfile, Channel, ChannelId, ChannelMetadata, ChannelPage, Message, MessagePage,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    channels: Vec<WireChannel>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

impl ListResponse {
    pub(crate) fn into_page(self) -> ChannelPage {
        ChannelPage {
            channels: self.channels.into_iter().map(WireChannel::into_channel).collect(),
            next_cursor: self.response_metadata.unwrap_or_default().next_cursor,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InfoResponse {
    pub(crate) channel: WireChannel,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChannel {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_member: bool,
    #[serde(default)]
    is_archived: bool,
    #[serde(default)]
    topic: Option<WireText>,
    #[serde(default)]
    purpose: Option<WireText>,
    #[serde(default)]
    last_read: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireText {
    #[serde(default)]
    value: String,
}

impl WireChannel {
    fn into_channel(self) -> Channel {
        Channel {
            id: ChannelId(self.id),
            name: self.name,
            is_member: self.is_member,
            is_archived: self.is_archived,
        }
    }

    pub(crate) fn metadata(self) -> ChannelMetadata {
        ChannelMetadata {
            topic: self.topic.unwrap_or_default().value,
            purpose: self.purpose.unwrap_or_default().value,
            last_read: self.last_read,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    bot_profile: Option<WireBotProfile>,
    #[serde(default)]
    ts: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireBotProfile {
    #[serde(default)]
    name: String,
}

impl HistoryResponse {
    /// History carries no last-read marker; that comes from `conversations.info`.
    pub(crate) fn into_page(self) -> MessagePage {
        let messages = self
            .messages
            .into_iter()
            .map(|m| Message {
                subtype: m.subtype,
                bot_profile: m.bot_profile.map(|b| BotProfile { name: b.name }),
                ts: m.ts,
                text: m.text,
            })
            .collect();
        MessagePage {
            messages,
            last_read: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JoinResponse {}

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveResponse {}
