//! Response envelope decoding
//!
//! The remote API wraps every page in an envelope object:
//!
//! ```text
//! { "totalCount": 37, "itens": [ {..row..}, {..row..} ] }
//! ```
//!
//! Both property names are configurable. Decoding never panics on a
//! malformed body; shape problems surface as [`Error::Envelope`](crate::Error).

mod envelope;

pub use envelope::{
    Envelope, EnvelopeDecoder, DEFAULT_INNER_PROPERTY, DEFAULT_TOTAL_COUNT_FIELD,
};

#[cfg(test)]
mod tests;
