use async_trait::async_trait;

use crate::{
    domain::{ChannelId, ChannelMetadata, ChannelPage, MessagePage},
    errors::GatewayError,
};

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Hexagonal port for the messaging platform.
///
/// Slack is the production implementation; tests drive the pipeline through an
/// in-memory fake. Every call may fail with [`GatewayError::RateLimited`] or
/// [`GatewayError::Platform`] and callers never assume success.
#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// One page of non-archived channels. Start with an empty cursor.
    async fn list_channels(&self, cursor: &str, limit: usize) -> GatewayResult<ChannelPage>;

    /// Topic, purpose and last-read marker.
    async fn get_channel_info(&self, id: &ChannelId) -> GatewayResult<ChannelMetadata>;

    /// Up to `limit` most recent messages, newest first. The last-read marker is
    /// optional here; callers fall back to [`get_channel_info`](Self::get_channel_info).
    async fn get_history(&self, id: &ChannelId, limit: usize) -> GatewayResult<MessagePage>;

    async fn join_channel(&self, id: &ChannelId) -> GatewayResult<()>;

    /// `Ok(false)` when the platform answered but refused the message.
    async fn post_message(&self, id: &ChannelId, text: &str) -> GatewayResult<bool>;

    async fn archive_channel(&self, id: &ChannelId) -> GatewayResult<()>;
}
