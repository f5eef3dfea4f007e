//! Waitlist operations behind the HTTP surface.
//!
//! Every function here returns [`ApiError`] so handlers only have to pick a
//! status code.

use std::sync::Arc;

use mailer::{DispatchTicket, NotificationDispatcher, TokenError};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        SignupNotice, SignupReceipt, SubmitSignupRequest, UnsubscribeRequest, NO_EMAIL_IN_LINK,
    },
    validation::validate_signup,
};
use storage::{SignupStore, StoreError};
use tracing::{info, warn};

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn SignupStore>,
    pub notifier: NotificationDispatcher,
}

/// A stored signup plus the pending confirmation email.
pub struct AcceptedSignup {
    pub receipt: SignupReceipt,
    pub confirmation: DispatchTicket,
}

pub async fn submit_signup(
    ctx: &ApiContext,
    request: &SubmitSignupRequest,
) -> Result<AcceptedSignup, ApiError> {
    let signup = validate_signup(request)
        .map_err(|e| ApiError::new(ErrorCode::ValidationFailed, e.to_string()))?;
    let organization = signup.organization.clone();
    let role = signup.role;

    let receipt = ctx.store.insert(signup).await.map_err(store_error)?;
    info!(
        signup_id = %receipt.id,
        position = receipt.signup_position,
        %role,
        "waitlist signup stored"
    );

    let confirmation = ctx.notifier.dispatch(SignupNotice {
        email: receipt.email.clone(),
        organization,
        role,
    });

    Ok(AcceptedSignup {
        receipt,
        confirmation,
    })
}

/// Remove an address from the waitlist. Unknown addresses succeed too.
pub async fn unsubscribe(ctx: &ApiContext, request: &UnsubscribeRequest) -> Result<(), ApiError> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(ApiError::new(ErrorCode::ValidationFailed, NO_EMAIL_IN_LINK));
    }

    if let Some(signer) = ctx.notifier.links().signer() {
        let token = request
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(TokenError::Missing)
            .map_err(invalid_token)?;
        signer.verify(token, email).map_err(invalid_token)?;
    }

    let removed = ctx.store.delete_by_email(email).await.map_err(store_error)?;
    info!(removed, "waitlist unsubscribe processed");
    Ok(())
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.store.health_check().await.map_err(store_error)
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::DuplicateEmail => ApiError::duplicate_email(),
        StoreError::PersistenceFailed(message) => {
            warn!(%message, "signup store failure");
            ApiError::new(ErrorCode::PersistenceFailed, message)
        }
    }
}

fn invalid_token(err: TokenError) -> ApiError {
    ApiError::new(ErrorCode::InvalidToken, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
