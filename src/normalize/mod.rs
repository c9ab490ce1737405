//! Page normalization
//!
//! Projects one page's raw JSON rows onto the [`MasterSchema`](crate::schema::MasterSchema):
//! every output row has exactly the schema's columns, in the schema's order,
//! with each cell converted to the column's type or null.

mod normalizer;
mod types;

pub use normalizer::{normalize_page, Normalizer};
pub use types::{CellValue, NormalizedPage};
