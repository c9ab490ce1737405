//! Request authentication with the rolling daily token

use super::types::{AuthConfig, API_DATE_FORMAT};
use chrono::{Local, NaiveDate};
use reqwest::RequestBuilder;
use sha2::{Digest, Sha256};

/// Compute the rolling token of `secret` for a given date
pub fn rolling_token(secret: &str, date: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(format_api_date(date).as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the rolling token of `secret` for today's local date
pub fn current_token(secret: &str) -> String {
    rolling_token(secret, Local::now().date_naive())
}

/// Check a token presented at the inbound boundary against today's token
pub fn validate_token(provided: &str, secret: &str) -> bool {
    !provided.is_empty() && provided == current_token(secret)
}

/// Format a date the way the remote API expects it (`dd/MM/yyyy`)
pub fn format_api_date(date: NaiveDate) -> String {
    date.format(API_DATE_FORMAT).to_string()
}

/// Applies authentication to outgoing requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Get the auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Apply authentication using today's token
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        self.apply_for_date(req, Local::now().date_naive())
    }

    /// Apply authentication using the token for `date`
    pub fn apply_for_date(&self, req: RequestBuilder, date: NaiveDate) -> RequestBuilder {
        let mut req = req;

        if let Some((name, value)) = &self.config.static_header {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(token) = &self.config.token {
            req = req.header(
                token.header_name.as_str(),
                rolling_token(&token.secret, date),
            );
        }

        for (key, value) in &self.config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some((username, password)) = &self.config.basic {
            req = req.basic_auth(username, password.as_ref());
        }

        req
    }
}
