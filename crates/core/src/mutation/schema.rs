//! Closed per-entity schemas consumed by the partial-update executor.
//!
//! Each entity declares an enum of its mutable fields. A change set can only
//! name columns through that enum, so the set of writable columns is fixed at
//! compile time and never derived from request keys.

use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

use super::patch::Patch;
use crate::content::validate::ValidationError;
use crate::error::StoreError;

/// A mutable field of an entity and the column backing it.
pub trait EntityField: Copy + std::fmt::Debug + Send + Sync + 'static {
    /// Field name as it appears in API payloads.
    fn name(self) -> &'static str;

    /// Storage column the field maps to.
    fn column(self) -> &'static str;
}

/// A persisted record kind that supports partial updates.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    type Field: EntityField;
    type Changes: ChangeSet<Field = Self::Field>;

    /// Human-readable name used in errors and logs.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Full column list returned after a mutation.
    const COLUMNS: &'static str;
}

/// A bound value for one column, already in its storage encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    Integer(i32),
    Float(f64),
    Bool(bool),
    Json(Value),
}

impl ColumnValue {
    /// Encode a structured value for a JSONB column.
    pub fn json<T: Serialize>(field: &'static str, value: &T) -> Result<Self, StoreError> {
        serde_json::to_value(value)
            .map(ColumnValue::Json)
            .map_err(|source| StoreError::Encode { field, source })
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(Some(value))
    }
}

impl From<Option<String>> for ColumnValue {
    fn from(value: Option<String>) -> Self {
        ColumnValue::Text(value)
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        ColumnValue::Integer(value)
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        ColumnValue::Float(value)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        ColumnValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<F> {
    pub field: F,
    pub value: ColumnValue,
}

/// A sparse, strongly-typed set of requested field changes.
pub trait ChangeSet: Send + Sync {
    type Field: EntityField;

    /// One assignment per field that is `Patch::Set`, in schema order.
    fn assignments(&self) -> Result<Vec<Assignment<Self::Field>>, StoreError>;

    fn is_empty(&self) -> bool;

    /// Check the requested values before any statement is built.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Collects assignments from `Patch` fields while building a change set.
pub struct Assignments<F> {
    items: Vec<Assignment<F>>,
}

impl<F: EntityField> Assignments<F> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Push `field` if the patch requests a change.
    pub fn set<T>(&mut self, field: F, patch: &Patch<T>) -> &mut Self
    where
        T: Clone + Into<ColumnValue>,
    {
        if let Patch::Set(value) = patch {
            self.items.push(Assignment {
                field,
                value: value.clone().into(),
            });
        }
        self
    }

    /// Push `field` as JSON if the patch requests a change.
    pub fn set_json<T: Serialize>(
        &mut self,
        field: F,
        patch: &Patch<T>,
    ) -> Result<&mut Self, StoreError> {
        if let Patch::Set(value) = patch {
            self.items.push(Assignment {
                field,
                value: ColumnValue::json(field.name(), value)?,
            });
        }
        Ok(self)
    }

    pub fn finish(&mut self) -> Vec<Assignment<F>> {
        std::mem::take(&mut self.items)
    }
}

impl<F: EntityField> Default for Assignments<F> {
    fn default() -> Self {
        Self::new()
    }
}
