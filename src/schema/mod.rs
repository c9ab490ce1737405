//! Schema inference module
//!
//! Infers a relational schema from sampled JSON pages.
//!
//! # Features
//!
//! - **Type Inference**: per-column candidate types with a confidence threshold
//! - **Integer Narrowing**: int64 columns narrowed to int32 when every value fits
//! - **Schema Merging**: per-page schemas merged into one ordered [`MasterSchema`]
//! - **Value Parsing**: the textual parsers shared with page normalization

mod inference;
mod types;
pub mod values;

pub use inference::{infer_page_schema, merge_page_schemas, SchemaInferrer};
pub use types::{ColumnSchema, ColumnType, InferenceOptions, MasterSchema};

#[cfg(test)]
mod tests;
