use std::path::Path;

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    /// Origin of the landing page; unsubscribe links point here.
    pub public_url: String,
    pub allowed_origin: Option<String>,
    pub mail_from: String,
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub unsubscribe_signing_secret: Option<String>,
    pub unsubscribe_token_ttl_hours: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/waitlist.db".into(),
            public_url: "http://localhost:5173".into(),
            allowed_origin: None,
            mail_from: "onboarding@resend.dev".into(),
            resend_api_key: None,
            resend_api_url: mailer::RESEND_API_URL.into(),
            unsubscribe_signing_secret: None,
            unsubscribe_token_ttl_hours: 24 * 30,
        }
    }
}

/// Defaults, then `server.toml`, then `APP__*` variables, then the
/// conventional `DATABASE_URL` and `RESEND_API_KEY`.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let settings = Config::builder()
        .set_default("bind_addr", defaults.bind_addr)?
        .set_default("database_url", defaults.database_url)?
        .set_default("public_url", defaults.public_url)?
        .set_default("mail_from", defaults.mail_from)?
        .set_default("resend_api_url", defaults.resend_api_url)?
        .set_default(
            "unsubscribe_token_ttl_hours",
            defaults.unsubscribe_token_ttl_hours,
        )?
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("database_url", std::env::var("DATABASE_URL").ok())?
        .set_override_option("resend_api_key", std::env::var("RESEND_API_KEY").ok())?
        .build()
        .with_context(|| format!("failed to load settings from '{}'", path.display()))?;

    settings
        .try_deserialize()
        .context("invalid server settings")
}

/// Turn a bare path or single-colon `sqlite:` URL into `sqlite://...`.
/// `Storage::new` creates the parent directory when it opens the file.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
