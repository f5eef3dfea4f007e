use std::sync::Arc;

use shared::protocol::SignupNotice;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::{render_confirmation, MailError, MailSender, UnsubscribeLinks};

/// Receiver for the outcome of one confirmation email.
///
/// Dropping the ticket does not cancel delivery.
pub struct DispatchTicket {
    outcome: oneshot::Receiver<Result<(), MailError>>,
}

impl DispatchTicket {
    pub async fn outcome(self) -> Result<(), MailError> {
        self.outcome.await.unwrap_or(Err(MailError::Abandoned))
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn MailSender>,
    links: UnsubscribeLinks,
    from: String,
}

impl NotificationDispatcher {
    pub fn new(
        sender: Arc<dyn MailSender>,
        links: UnsubscribeLinks,
        from: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            links,
            from: from.into(),
        }
    }

    pub fn links(&self) -> &UnsubscribeLinks {
        &self.links
    }

    /// Send the confirmation email on a detached task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, notice: SignupNotice) -> DispatchTicket {
        let (tx, rx) = oneshot::channel();
        let dispatcher = self.clone();

        tokio::spawn(async move {
            let outcome = dispatcher.deliver(&notice).await;
            match &outcome {
                Ok(()) => info!(email = %notice.email, "waitlist confirmation sent"),
                Err(error) => warn!(
                    email = %notice.email,
                    %error,
                    "waitlist confirmation not sent; signup is kept"
                ),
            }
            let _ = tx.send(outcome);
        });

        DispatchTicket { outcome: rx }
    }

    async fn deliver(&self, notice: &SignupNotice) -> Result<(), MailError> {
        let unsubscribe = self.links.link_for(&notice.email)?;
        let email = render_confirmation(notice, &self.from, &unsubscribe);
        self.sender.send(&email).await
    }
}
