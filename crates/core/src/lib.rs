//! Content models and persistence for the storefront CMS.
//!
//! Records are read and created through the query helpers in [`content`] and
//! modified only through [`mutation::PartialUpdateExecutor`].

pub mod content;
pub mod error;
pub mod mutation;

pub use error::StoreError;
