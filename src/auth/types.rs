//! Auth configuration types
//!
//! These types represent the runtime auth configuration derived from an
//! extraction request's option slots and connection info.

use crate::types::StringMap;

/// Date format shared by the rolling token and the API's date filters
pub const API_DATE_FORMAT: &str = "%d/%m/%Y";

/// A header whose value is the rolling daily token of a secret
#[derive(Clone)]
pub struct RollingToken {
    /// Header name carrying the token
    pub header_name: String,
    /// Shared secret hashed together with the current date
    pub secret: String,
}

impl std::fmt::Debug for RollingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollingToken")
            .field("header_name", &self.header_name)
            .field("secret", &"****")
            .finish()
    }
}

/// Authentication configuration applied to every remote API call
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Static header (name, value)
    pub static_header: Option<(String, String)>,
    /// Rolling token header
    pub token: Option<RollingToken>,
    /// Additional custom headers
    pub headers: StringMap,
    /// HTTP basic credentials (username, password)
    pub basic: Option<(String, Option<String>)>,
}

impl AuthConfig {
    /// Create an empty auth config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the static header pair
    #[must_use]
    pub fn with_static_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.static_header = Some((name.into(), value.into()));
        self
    }

    /// Set the rolling token header
    #[must_use]
    pub fn with_token(mut self, header_name: impl Into<String>, secret: impl Into<String>) -> Self {
        self.token = Some(RollingToken {
            header_name: header_name.into(),
            secret: secret.into(),
        });
        self
    }

    /// Add a custom header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set basic credentials
    #[must_use]
    pub fn with_basic(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.basic = Some((username.into(), password));
        self
    }
}
