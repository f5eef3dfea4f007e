use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Duration;
use mailer::{
    MailSender, MissingMailSender, NotificationDispatcher, ResendConfig, ResendMailer,
    UnsubscribeLinks, UnsubscribeSigner,
};
use server_api::{health, submit_signup, unsubscribe, ApiContext};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        SignupReceipt, SubmitSignupRequest, UnsubscribeRequest, UnsubscribeResponse,
        UNSUBSCRIBE_ROUTE, WAITLIST_ROUTE,
    },
};
use storage::Storage;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, normalize_database_url, Settings};

const MAX_BODY_BYTES: usize = 16 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        store: Arc::new(storage),
        notifier: build_notifier(&settings)?,
    };

    let app = build_router(Arc::new(AppState { api })).layer(cors_layer(&settings)?);

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind_addr '{}'", settings.bind_addr))?;
    info!(%addr, "waitlist server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_notifier(settings: &Settings) -> anyhow::Result<NotificationDispatcher> {
    let public_url = Url::parse(&settings.public_url)
        .with_context(|| format!("invalid public_url '{}'", settings.public_url))?;

    let signer = match settings.unsubscribe_signing_secret.as_deref() {
        Some(secret) if !secret.trim().is_empty() => Some(UnsubscribeSigner::new(
            secret,
            Duration::hours(settings.unsubscribe_token_ttl_hours),
        )),
        _ => {
            warn!(
                "unsubscribe_signing_secret is not set; unsubscribe links carry only the plaintext \
                 email and anyone who knows an address can remove it"
            );
            None
        }
    };

    let sender: Arc<dyn MailSender> = match settings.resend_api_key.as_deref() {
        Some(api_key) if !api_key.trim().is_empty() => Arc::new(ResendMailer::new(ResendConfig {
            api_url: settings.resend_api_url.clone(),
            api_key: api_key.to_string(),
        })),
        _ => {
            warn!("resend_api_key is not set; confirmation emails will not be sent");
            Arc::new(MissingMailSender)
        }
    };

    Ok(NotificationDispatcher::new(
        sender,
        UnsubscribeLinks::new(public_url, signer),
        settings.mail_from.clone(),
    ))
}

fn cors_layer(settings: &Settings) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(60 * 60));
    Ok(match settings.allowed_origin.as_deref() {
        Some(origin) => cors.allow_origin(
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid allowed_origin '{origin}'"))?,
        ),
        None => cors.allow_origin(Any),
    })
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown requested");
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(WAITLIST_ROUTE, post(http_submit_signup))
        .route(UNSUBSCRIBE_ROUTE, post(http_unsubscribe))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match health(&state.api).await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            warn!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn http_submit_signup(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubmitSignupRequest>, JsonRejection>,
) -> Result<Json<SignupReceipt>, (StatusCode, Json<ApiError>)> {
    let Json(request) = body.map_err(|rejection| {
        let error = ApiError::new(ErrorCode::ValidationFailed, rejection.body_text());
        (status_for(error.error_code), Json(error))
    })?;

    // The confirmation ticket is dropped; delivery continues on its own task.
    let accepted = submit_signup(&state.api, &request)
        .await
        .map_err(|e| (status_for(e.error_code), Json(e)))?;
    Ok(Json(accepted.receipt))
}

async fn http_unsubscribe(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<Json<UnsubscribeResponse>, (StatusCode, Json<UnsubscribeResponse>)> {
    let Json(request) = body.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(UnsubscribeResponse::failed(rejection.body_text())),
        )
    })?;

    unsubscribe(&state.api, &request)
        .await
        .map_err(|e| (status_for(e.error_code), Json(UnsubscribeResponse::failed(e.message))))?;
    Ok(Json(UnsubscribeResponse::ok()))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed | ErrorCode::InvalidToken => StatusCode::BAD_REQUEST,
        ErrorCode::DuplicateEmail => StatusCode::CONFLICT,
        ErrorCode::PersistenceFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/scenario_tests.rs"]
mod scenario_tests;
