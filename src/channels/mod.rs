//! Outbound notification channels.

pub mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;

use crate::analysis::Classification;
use crate::contact::Submission;
use crate::error::ChannelError;

/// Relays a submission (and its analysis, if any) to a human.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logging (e.g. "telegram").
    fn name(&self) -> &str;

    /// Whether the channel has the credentials it needs.
    fn is_configured(&self) -> bool;

    /// Deliver one notification.
    async fn notify(
        &self,
        submission: &Submission,
        analysis: Option<&Classification>,
    ) -> Result<(), ChannelError>;
}
