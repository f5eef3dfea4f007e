//! Unsubscribe links embedded in confirmation emails.
//!
//! Without a signer a link only carries the recipient address, so anyone who
//! knows an address can remove it from the waitlist. With a signer the link
//! also carries an HS256 token bound to the address and an expiry.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::validation::normalize_email;
use thiserror::Error;
use url::Url;

use crate::MailError;

const TOKEN_PURPOSE: &str = "waitlist-unsubscribe";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("unsubscribe link is missing its token")]
    Missing,
    #[error("unsubscribe token is invalid or expired")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("unsubscribe token does not match this email address")]
    EmailMismatch,
}

#[derive(Debug, Serialize, Deserialize)]
struct UnsubscribeClaims {
    sub: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct UnsubscribeSigner {
    secret: String,
    ttl: Duration,
}

impl fmt::Debug for UnsubscribeSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsubscribeSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl UnsubscribeSigner {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn mint(&self, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = UnsubscribeClaims {
            sub: normalize_email(email),
            purpose: TOKEN_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn verify(&self, token: &str, email: &str) -> Result<(), TokenError> {
        let data = decode::<UnsubscribeClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        if data.claims.purpose != TOKEN_PURPOSE || data.claims.sub != normalize_email(email) {
            return Err(TokenError::EmailMismatch);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UnsubscribeLinks {
    public_url: Url,
    signer: Option<UnsubscribeSigner>,
}

impl UnsubscribeLinks {
    pub fn new(public_url: Url, signer: Option<UnsubscribeSigner>) -> Self {
        Self { public_url, signer }
    }

    pub fn signer(&self) -> Option<&UnsubscribeSigner> {
        self.signer.as_ref()
    }

    /// `{public_url}/unsubscribe?email=...`, plus `&token=...` when signing.
    pub fn link_for(&self, email: &str) -> Result<Url, MailError> {
        let mut url = self.public_url.clone();
        url.path_segments_mut()
            .map_err(|()| MailError::Link(format!("'{}' cannot be a base url", self.public_url)))?
            .pop_if_empty()
            .push("unsubscribe");
        url.set_query(None);
        url.set_fragment(None);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("email", email);
            if let Some(signer) = &self.signer {
                let token = signer
                    .mint(email)
                    .map_err(|e| MailError::Link(format!("token mint failed: {e}")))?;
                query.append_pair("token", &token);
            }
        }
        Ok(url)
    }
}
