//! Confirmation mail for new waitlist signups.
//!
//! [`NotificationDispatcher`] renders the email and hands it to a
//! [`MailSender`] on a detached task. Delivery is attempted once; the outcome
//! is logged and reported on a [`DispatchTicket`] that callers are free to drop.

use async_trait::async_trait;
use thiserror::Error;

mod confirmation;
mod dispatcher;
pub mod links;
mod resend;

pub use confirmation::{render_confirmation, CONFIRMATION_SUBJECT};
pub use dispatcher::{DispatchTicket, NotificationDispatcher};
pub use links::{TokenError, UnsubscribeLinks, UnsubscribeSigner};
pub use resend::{ResendConfig, ResendMailer, RESEND_API_URL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail delivery is not configured")]
    NotConfigured,
    #[error("failed to build unsubscribe link: {0}")]
    Link(String),
    #[error("mail transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("delivery task ended without reporting an outcome")]
    Abandoned,
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Stand-in used when no mail provider credentials are configured.
pub struct MissingMailSender;

#[async_trait]
impl MailSender for MissingMailSender {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}
