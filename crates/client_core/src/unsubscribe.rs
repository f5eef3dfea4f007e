use shared::protocol::{UnsubscribeRequest, NO_EMAIL_IN_LINK};
use tracing::{info, warn};
use url::{form_urlencoded, Url};

use crate::{ClientError, WaitlistApi};

pub const UNSUBSCRIBE_FAILED_MESSAGE: &str =
    "We encountered an error while trying to unsubscribe you. Please try again later.";

pub const HOME_ROUTE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeStatus {
    Idle,
    Loading,
    Succeeded,
    Failed(String),
}

impl UnsubscribeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// State behind the `/unsubscribe` page.
#[derive(Debug, Clone)]
pub struct UnsubscribePage {
    email: Option<String>,
    token: Option<String>,
    status: UnsubscribeStatus,
}

impl UnsubscribePage {
    /// Read `email` and `token` from a query string, with or without the
    /// leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut email = None;
        let mut token = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "email" if email.is_none() => email = non_blank(&value),
                "token" if token.is_none() => token = non_blank(&value),
                _ => {}
            }
        }
        Self {
            email,
            token,
            status: UnsubscribeStatus::Idle,
        }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or_default())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn status(&self) -> &UnsubscribeStatus {
        &self.status
    }

    pub fn headline(&self) -> &'static str {
        match self.status {
            UnsubscribeStatus::Idle | UnsubscribeStatus::Loading => "Processing Request",
            UnsubscribeStatus::Succeeded => "Successfully Unsubscribed",
            UnsubscribeStatus::Failed(_) => "Unsubscribe Failed",
        }
    }

    /// Move out of `Idle`. Returns the request to send, or `None` when the
    /// link has no email and the page failed straight away.
    pub fn begin(&mut self) -> Option<UnsubscribeRequest> {
        if self.status != UnsubscribeStatus::Idle {
            return None;
        }
        let Some(email) = self.email.clone() else {
            self.status = UnsubscribeStatus::Failed(NO_EMAIL_IN_LINK.to_string());
            return None;
        };
        self.status = UnsubscribeStatus::Loading;
        Some(UnsubscribeRequest {
            email,
            token: self.token.clone(),
        })
    }

    pub fn finish(&mut self, outcome: Result<(), ClientError>) {
        if self.status != UnsubscribeStatus::Loading {
            return;
        }
        self.status = match outcome {
            Ok(()) => UnsubscribeStatus::Succeeded,
            Err(err) => {
                warn!(error = %err, "unsubscribe failed");
                UnsubscribeStatus::Failed(UNSUBSCRIBE_FAILED_MESSAGE.to_string())
            }
        };
    }

    /// Run the page once: begin, call the backend, record the outcome.
    pub async fn run(&mut self, api: &dyn WaitlistApi) -> &UnsubscribeStatus {
        if let Some(request) = self.begin() {
            let outcome = api.unsubscribe(&request).await;
            if outcome.is_ok() {
                info!("unsubscribed from waitlist");
            }
            self.finish(outcome);
        }
        &self.status
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
#[path = "tests/unsubscribe_tests.rs"]
mod tests;
