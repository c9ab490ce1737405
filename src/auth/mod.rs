//! Authentication module
//!
//! The remote API authenticates every call with a static header pair plus a
//! rolling daily token: `hex(SHA-256(secret + dd/MM/yyyy))`. The token is
//! recomputed on every request so a job that runs across midnight keeps
//! authenticating.
//!
//! The same token contract guards the inbound boundary; [`validate_token`]
//! implements the comparison for whatever routing layer sits in front.

mod authenticator;
mod types;

pub use authenticator::{
    current_token, format_api_date, rolling_token, validate_token, Authenticator,
};
pub use types::{AuthConfig, RollingToken, API_DATE_FORMAT};
