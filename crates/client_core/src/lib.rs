use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    error::ApiError,
    protocol::{
        SignupReceipt, SubmitSignupRequest, UnsubscribeRequest, UnsubscribeResponse,
        UNSUBSCRIBE_ROUTE, WAITLIST_ROUTE,
    },
};
use thiserror::Error;
use tracing::{info, warn};

pub mod signup_form;
pub mod universities;
pub mod unsubscribe;

pub use signup_form::{FormEffect, FormEvent, FormState, FormStep, SignupForm, SubmitFailure};
pub use universities::{LookupStatus, University, UniversityDirectory};
pub use unsubscribe::{UnsubscribePage, UnsubscribeStatus};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{}", .0.message)]
    Api(ApiError),
    #[error("unsubscribe rejected: {0}")]
    Unsubscribe(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response {status}: {body}")]
    Unexpected { status: u16, body: String },
}

impl ClientError {
    pub fn is_duplicate_email(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_duplicate_email())
    }
}

/// Calls the waitlist backend makes available to the browser-side flows.
#[async_trait]
pub trait WaitlistApi: Send + Sync {
    async fn submit_signup(
        &self,
        request: &SubmitSignupRequest,
    ) -> Result<SignupReceipt, ClientError>;

    async fn unsubscribe(&self, request: &UnsubscribeRequest) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct WaitlistClient {
    http: Client,
    server_url: String,
}

impl WaitlistClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), server_url)
    }

    pub fn with_http_client(http: Client, server_url: impl Into<String>) -> Self {
        Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl WaitlistApi for WaitlistClient {
    async fn submit_signup(
        &self,
        request: &SubmitSignupRequest,
    ) -> Result<SignupReceipt, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.server_url, WAITLIST_ROUTE))
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let receipt: SignupReceipt = response.json().await?;
        info!(position = receipt.signup_position, "joined waitlist");
        Ok(receipt)
    }

    async fn unsubscribe(&self, request: &UnsubscribeRequest) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.server_url, UNSUBSCRIBE_ROUTE))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<UnsubscribeResponse>(&body) {
            Ok(UnsubscribeResponse { success: true, .. }) if status.is_success() => Ok(()),
            Ok(UnsubscribeResponse { message, .. }) => {
                let message = message.unwrap_or_else(|| status.to_string());
                warn!(%status, %message, "unsubscribe rejected");
                Err(ClientError::Unsubscribe(message))
            }
            Err(_) => Err(ClientError::Unexpected {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => return ClientError::Transport(err),
    };
    match serde_json::from_str::<ApiError>(&body) {
        Ok(err) => ClientError::Api(err),
        Err(_) => ClientError::Unexpected {
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
