use async_trait::async_trait;

use crate::{messaging::types::OutboundMessage, Result};

/// Outbound port to the messaging platform.
///
/// Implementations must not retry: a failed send is reported once and the
/// caller decides whether to log or propagate it.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_message(&self, msg: &OutboundMessage) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()>;
}
