//! Page sources
//!
//! The job controller only sees [`PageSource`]. [`ApiPageSource`] is the
//! real implementation: one form-encoded POST per page against the remote
//! API, retried by [`HttpClient`], decoded into an [`Envelope`].

use super::client::HttpClient;
use crate::auth::format_api_date;
use crate::decode::{Envelope, EnvelopeDecoder};
use crate::error::{Error, Result};
use crate::types::{ExtractionFlow, JsonValue};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// From-date used by the basic flow
pub const BASIC_FROM_DATE: &str = "01/01/1900";

/// Something that can produce envelope pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page; `None` requests the unpaginated resource
    async fn fetch_page(&self, page: Option<u32>) -> Result<Envelope>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    async fn fetch_page(&self, page: Option<u32>) -> Result<Envelope> {
        (**self).fetch_page(page).await
    }
}

/// Form body sent with every page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageForm {
    table: String,
    from_field: &'static str,
    from_date: String,
    to_field: &'static str,
    to_date: String,
}

impl PageForm {
    /// Build the form for a flow, resolving the date window against `today`
    pub fn new(
        table: impl Into<String>,
        flow: ExtractionFlow,
        lookback_days: Option<i64>,
        today: NaiveDate,
    ) -> Result<Self> {
        let (from_field, to_field) = flow.date_fields();

        let from_date = if flow.needs_lookback() {
            let days = lookback_days.ok_or_else(|| {
                Error::validation(format!("the {flow} flow requires a lookback in days"))
            })?;
            let from = chrono::Duration::try_days(days)
                .and_then(|d| today.checked_sub_signed(d))
                .ok_or_else(|| Error::validation(format!("lookback of {days} days is out of range")))?;
            format_api_date(from)
        } else {
            BASIC_FROM_DATE.to_string()
        };

        Ok(Self {
            table: table.into(),
            from_field,
            from_date,
            to_field,
            to_date: format_api_date(today),
        })
    }

    /// Form fields for one request
    pub fn fields(&self, page: Option<u32>) -> Vec<(String, String)> {
        let mut fields = vec![
            ("pag".to_string(), self.table.clone()),
            ("cmd".to_string(), "get".to_string()),
            (self.from_field.to_string(), self.from_date.clone()),
            (self.to_field.to_string(), self.to_date.clone()),
            ("start".to_string(), "1".to_string()),
        ];
        if let Some(page) = page {
            fields.push(("page".to_string(), page.to_string()));
        }
        fields
    }
}

/// [`PageSource`] backed by the remote HTTP API
#[derive(Debug)]
pub struct ApiPageSource {
    client: Arc<HttpClient>,
    url: String,
    form: PageForm,
    decoder: EnvelopeDecoder,
}

impl ApiPageSource {
    /// Create a page source
    pub fn new(
        client: Arc<HttpClient>,
        url: impl Into<String>,
        form: PageForm,
        decoder: EnvelopeDecoder,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            form,
            decoder,
        }
    }
}

#[async_trait]
impl PageSource for ApiPageSource {
    async fn fetch_page(&self, page: Option<u32>) -> Result<Envelope> {
        debug!("Fetching page {:?} from {}", page, self.url);
        let body: JsonValue = self
            .client
            .post_form_json(&self.url, self.form.fields(page))
            .await?;
        self.decoder.decode(body)
    }
}
