use sqlx::{PgPool, Postgres, QueryBuilder};

use super::schema::{Assignment, ChangeSet, ColumnValue, Entity, EntityField};
use crate::error::StoreError;

/// Applies sparse change sets to single records.
///
/// The update, the `updated_at` refresh and the read-back happen in one
/// `UPDATE ... RETURNING` statement inside a transaction, so readers never see
/// changed fields with a stale timestamp. Failures are returned as-is; nothing
/// is retried.
#[derive(Debug, Clone)]
pub struct PartialUpdateExecutor {
    pool: PgPool,
}

impl PartialUpdateExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply `changes` to the `E` record identified by `id` and return the
    /// record as stored after the update.
    pub async fn apply<E: Entity>(&self, id: i64, changes: &E::Changes) -> Result<E, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::NoFieldsRequested);
        }
        changes.validate()?;
        let assignments = changes.assignments()?;
        let fields: Vec<&'static str> = assignments.iter().map(|a| a.field.name()).collect();

        let mut builder = build_update::<E>(id, assignments)?;

        let mut tx = self.pool.begin().await?;
        let record = builder
            .build_query_as::<E>()
            .fetch_optional(&mut *tx)
            .await?;

        let Some(record) = record else {
            // Zero rows matched; dropping the transaction rolls it back.
            return Err(StoreError::NotFound {
                entity: E::NAME,
                id,
            });
        };
        tx.commit().await?;

        tracing::debug!(entity = E::NAME, id, ?fields, "applied partial update");
        Ok(record)
    }
}

/// Build `UPDATE <table> SET <col> = $n, ..., updated_at = statement_timestamp()
/// WHERE id = $m RETURNING <columns>` for the given assignments.
pub fn build_update<E: Entity>(
    id: i64,
    assignments: Vec<Assignment<E::Field>>,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    if assignments.is_empty() {
        return Err(StoreError::NoFieldsRequested);
    }

    let mut builder = QueryBuilder::new("UPDATE ");
    builder.push(E::TABLE).push(" SET ");

    let mut set = builder.separated(", ");
    for Assignment { field, value } in assignments {
        set.push(field.column());
        set.push_unseparated(" = ");
        match value {
            ColumnValue::Text(v) => set.push_bind_unseparated(v),
            ColumnValue::Integer(v) => set.push_bind_unseparated(v),
            ColumnValue::Float(v) => set.push_bind_unseparated(v),
            ColumnValue::Bool(v) => set.push_bind_unseparated(v),
            ColumnValue::Json(v) => set.push_bind_unseparated(v),
        };
    }
    // NOW() is frozen when the transaction begins; the statement start is not.
    set.push("updated_at = statement_timestamp()");

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING ").push(E::COLUMNS);
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::page::{Page, PageChanges, PageField};
    use crate::content::product::{Product, ProductChanges};
    use crate::mutation::patch::Patch;

    #[test]
    fn only_requested_columns_are_written() {
        let changes = PageChanges {
            published: Patch::Set(true),
            ..Default::default()
        };
        let builder = build_update::<Page>(1, changes.assignments().unwrap()).unwrap();

        assert_eq!(
            builder.sql(),
            format!(
                "UPDATE pages SET published = $1, updated_at = statement_timestamp() WHERE id = $2 RETURNING {}",
                Page::COLUMNS
            )
        );
    }

    #[test]
    fn columns_follow_schema_mapping() {
        let changes = PageChanges {
            title: Patch::Set("About".to_string()),
            meta_title: Patch::Set(None),
            ..Default::default()
        };
        let builder = build_update::<Page>(7, changes.assignments().unwrap()).unwrap();
        let sql = builder.sql();

        assert!(sql.starts_with(
            "UPDATE pages SET title = $1, meta_title = $2, updated_at = statement_timestamp() WHERE id = $3"
        ));
        assert!(!sql.contains("subtitle ="));
    }

    #[test]
    fn structured_values_are_bound_as_json() {
        let changes = ProductChanges {
            images: Patch::Set(vec!["/img/a.jpg".to_string()]),
            sort_order: Patch::Set(3),
            ..Default::default()
        };
        let assignments = changes.assignments().unwrap();
        assert_eq!(
            assignments[0].value,
            ColumnValue::Json(serde_json::json!(["/img/a.jpg"]))
        );

        let builder = build_update::<Product>(2, assignments).unwrap();
        assert!(builder
            .sql()
            .starts_with("UPDATE products SET images = $1, sort_order = $2, updated_at = statement_timestamp()"));
    }

    #[test]
    fn timestamp_is_taken_when_the_update_runs() {
        let changes = PageChanges {
            title: Patch::Set("Home".to_string()),
            ..Default::default()
        };
        let builder = build_update::<Page>(1, changes.assignments().unwrap()).unwrap();
        let sql = builder.sql();

        assert!(sql.contains("updated_at = statement_timestamp()"));
        assert!(!sql.contains("NOW()"));
    }

    #[test]
    fn empty_assignment_list_is_rejected() {
        let result = build_update::<Page>(1, Vec::<Assignment<PageField>>::new());
        assert!(matches!(result, Err(StoreError::NoFieldsRequested)));
    }

    #[tokio::test]
    async fn empty_change_set_fails_before_touching_storage() {
        // The pool never connects; reaching the database would error differently.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://unused@localhost:1/unused")
            .unwrap();
        let executor = PartialUpdateExecutor::new(pool);

        let result = executor
            .apply::<Product>(2, &ProductChanges::default())
            .await;
        assert!(matches!(result, Err(StoreError::NoFieldsRequested)));
    }
}
