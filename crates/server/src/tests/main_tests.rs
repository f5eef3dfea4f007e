use super::*;
use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use mailer::{MailError, OutgoingEmail};
use storage::SignupStore;
use tokio::sync::mpsc;
use tower::ServiceExt;

struct ChannelSender {
    tx: mpsc::UnboundedSender<OutgoingEmail>,
}

#[async_trait]
impl MailSender for ChannelSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let _ = self.tx.send(email.clone());
        Ok(())
    }
}

struct TestApp {
    app: Router,
    storage: Storage,
    mail: mpsc::UnboundedReceiver<OutgoingEmail>,
}

async fn test_app() -> TestApp {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let (tx, mail) = mpsc::unbounded_channel();
    let api = ApiContext {
        store: Arc::new(storage.clone()),
        notifier: NotificationDispatcher::new(
            Arc::new(ChannelSender { tx }),
            UnsubscribeLinks::new(
                Url::parse("https://skillbridge.example/").expect("url"),
                None,
            ),
            "hello@skillbridge.example",
        ),
    };
    TestApp {
        app: build_router(Arc::new(AppState { api })),
        storage,
        mail,
    }
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn bath_student() -> serde_json::Value {
    serde_json::json!({
        "email": "a@uni.ac.uk",
        "organization": "University of Bath",
        "role": "Student"
    })
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let TestApp { app, .. } = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn signup_returns_position_and_sends_confirmation() {
    let TestApp {
        app,
        storage,
        mut mail,
    } = test_app().await;

    let response = app
        .oneshot(post_json(WAITLIST_ROUTE, bath_student()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let receipt: SignupReceipt =
        serde_json::from_value(json_body(response).await).expect("receipt");
    assert_eq!(receipt.email, "a@uni.ac.uk");
    assert_eq!(receipt.signup_position, 1);

    let stored = storage.list_signups().await.expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].organization, "University of Bath");

    let sent = mail.recv().await.expect("confirmation attempted");
    assert_eq!(sent.to, vec!["a@uni.ac.uk".to_string()]);
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
    let TestApp { app, storage, .. } = test_app().await;

    let first = app
        .clone()
        .oneshot(post_json(WAITLIST_ROUTE, bath_student()))
        .await
        .expect("first");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json(WAITLIST_ROUTE, bath_student()))
        .await
        .expect("second");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = json_body(second).await;
    assert_eq!(body["error_code"], "duplicate_email");
    assert_eq!(body["message"], "This email is already on the waitlist");
    assert_eq!(storage.count_signups().await.expect("count"), 1);
}

#[tokio::test]
async fn invalid_signup_is_a_validation_failure() {
    let TestApp { app, storage, .. } = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            WAITLIST_ROUTE,
            serde_json::json!({ "email": "nope", "organization": "Acme", "role": "Business" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_code"], "validation_failed");

    let response = app
        .oneshot(post_json(
            WAITLIST_ROUTE,
            serde_json::json!({ "email": "a@uni.ac.uk", "role": "Student" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_code"], "validation_failed");
    assert_eq!(storage.count_signups().await.expect("count"), 0);
}

#[tokio::test]
async fn unsubscribe_removes_signup_and_is_idempotent() {
    let TestApp { app, storage, .. } = test_app().await;
    app.clone()
        .oneshot(post_json(WAITLIST_ROUTE, bath_student()))
        .await
        .expect("signup");

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json(
                UNSUBSCRIBE_ROUTE,
                serde_json::json!({ "email": "a@uni.ac.uk" }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
        assert_eq!(storage.count_signups().await.expect("count"), 0);
    }
}

#[tokio::test]
async fn unsubscribe_without_email_fails() {
    let TestApp { app, .. } = test_app().await;
    let response = app
        .oneshot(post_json(
            UNSUBSCRIBE_ROUTE,
            serde_json::json!({ "email": "" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No email address provided in the link.");
}

#[test]
fn notifier_signs_links_only_when_a_secret_is_configured() {
    let mut settings = Settings::default();
    let plain = build_notifier(&settings).expect("notifier");
    assert!(plain.links().signer().is_none());

    settings.unsubscribe_signing_secret = Some("s3cret".to_string());
    let signed = build_notifier(&settings).expect("notifier");
    assert!(signed.links().signer().is_some());
}

#[test]
fn cors_rejects_malformed_origin() {
    let mut settings = Settings::default();
    settings.allowed_origin = Some("bad\norigin".to_string());
    assert!(cors_layer(&settings).is_err());
}
