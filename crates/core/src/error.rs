use thiserror::Error;

use crate::content::validate::ValidationError;

/// Errors raised by content reads, creates and partial updates.
///
/// Variants stay distinct so the HTTP layer can pick a status per kind.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The change set named no fields. Raised before any storage access.
    #[error("no fields to update")]
    NoFieldsRequested,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{entity} with slug '{slug}' already exists")]
    SlugTaken { entity: &'static str, slug: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("could not encode {field}: {source}")]
    Encode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl StoreError {
    /// Map a unique-constraint violation on insert to `SlugTaken`.
    pub(crate) fn from_insert(err: sqlx::Error, entity: &'static str, slug: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::SlugTaken {
                entity,
                slug: slug.to_string(),
            },
            _ => StoreError::Storage(err),
        }
    }
}
