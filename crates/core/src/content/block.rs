use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, QueryBuilder};

use super::validate::{check_patch, require_text, ValidationError};
use super::{blank_to_none, Visibility};
use crate::error::StoreError;
use crate::mutation::patch::Patch;
use crate::mutation::schema::{Assignment, Assignments, ChangeSet, Entity, EntityField};

const COLUMNS: &str =
    "id, block_type, title, content, page_slug, sort_order, published, created_at, updated_at";

/// A reusable section of content, optionally attached to a page by slug.
/// Maps to the `content_blocks` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub id: i64,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(skip_serializing_if = "crate::content::is_blank")]
    pub title: Option<String>,
    #[sqlx(json)]
    pub content: Map<String, Value>,
    #[serde(skip_serializing_if = "crate::content::is_blank")]
    pub page_slug: Option<String>,
    pub sort_order: i32,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub title: Option<String>,
    pub content: Map<String, Value>,
    pub page_slug: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub published: bool,
}

impl NewContentBlock {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("type", &self.block_type)
    }
}

/// Query parameters for block listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockFilter {
    pub page_slug: Option<String>,
    #[serde(rename = "type")]
    pub block_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentBlockField {
    Type,
    Title,
    Content,
    PageSlug,
    SortOrder,
    Published,
}

impl EntityField for ContentBlockField {
    fn name(self) -> &'static str {
        match self {
            ContentBlockField::Type => "type",
            ContentBlockField::Title => "title",
            ContentBlockField::Content => "content",
            ContentBlockField::PageSlug => "pageSlug",
            ContentBlockField::SortOrder => "sortOrder",
            ContentBlockField::Published => "published",
        }
    }

    fn column(self) -> &'static str {
        match self {
            ContentBlockField::Type => "block_type",
            ContentBlockField::Title => "title",
            ContentBlockField::Content => "content",
            ContentBlockField::PageSlug => "page_slug",
            ContentBlockField::SortOrder => "sort_order",
            ContentBlockField::Published => "published",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ContentBlockChanges {
    #[serde(rename = "type")]
    pub block_type: Patch<String>,
    pub title: Patch<Option<String>>,
    pub content: Patch<Map<String, Value>>,
    pub page_slug: Patch<Option<String>>,
    pub sort_order: Patch<i32>,
    pub published: Patch<bool>,
}

impl ChangeSet for ContentBlockChanges {
    type Field = ContentBlockField;

    fn assignments(&self) -> Result<Vec<Assignment<ContentBlockField>>, StoreError> {
        let mut out = Assignments::new();
        out.set(ContentBlockField::Type, &self.block_type)
            .set(ContentBlockField::Title, &self.title)
            .set_json(ContentBlockField::Content, &self.content)?
            .set(ContentBlockField::PageSlug, &self.page_slug)
            .set(ContentBlockField::SortOrder, &self.sort_order)
            .set(ContentBlockField::Published, &self.published);
        Ok(out.finish())
    }

    fn is_empty(&self) -> bool {
        self.block_type.is_unchanged()
            && self.title.is_unchanged()
            && self.content.is_unchanged()
            && self.page_slug.is_unchanged()
            && self.sort_order.is_unchanged()
            && self.published.is_unchanged()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_patch(&self.block_type, |t| require_text("type", t))
    }
}

impl Entity for ContentBlock {
    type Field = ContentBlockField;
    type Changes = ContentBlockChanges;

    const NAME: &'static str = "content block";
    const TABLE: &'static str = "content_blocks";
    const COLUMNS: &'static str = COLUMNS;
}

impl ContentBlock {
    pub async fn list(
        pool: &PgPool,
        filter: &ContentBlockFilter,
        visibility: Visibility,
    ) -> Result<Vec<ContentBlock>, StoreError> {
        Ok(list_query(filter, visibility)
            .build_query_as::<ContentBlock>()
            .fetch_all(pool)
            .await?)
    }

    pub async fn create(pool: &PgPool, new: NewContentBlock) -> Result<ContentBlock, StoreError> {
        new.validate()?;
        let sql = format!(
            "INSERT INTO content_blocks (block_type, title, content, page_slug, sort_order, published) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        );
        let block = sqlx::query_as::<_, ContentBlock>(&sql)
            .bind(&new.block_type)
            .bind(blank_to_none(new.title))
            .bind(Json(&new.content))
            .bind(blank_to_none(new.page_slug))
            .bind(new.sort_order)
            .bind(new.published)
            .fetch_one(pool)
            .await?;

        tracing::info!(id = block.id, block_type = %block.block_type, "content block created");
        Ok(block)
    }
}

fn list_query(
    filter: &ContentBlockFilter,
    visibility: Visibility,
) -> QueryBuilder<'static, sqlx::Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM content_blocks"));
    visibility.push_where(&mut builder);
    if let Some(page_slug) = &filter.page_slug {
        builder.push(" AND page_slug = ").push_bind(page_slug.clone());
    }
    if let Some(block_type) = &filter.block_type {
        builder.push(" AND block_type = ").push_bind(block_type.clone());
    }
    builder.push(" ORDER BY sort_order ASC, created_at DESC");
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_query_filters_by_page_and_type() {
        let filter: ContentBlockFilter =
            serde_json::from_value(json!({ "pageSlug": "about", "type": "hero" })).unwrap();
        let builder = list_query(&filter, Visibility::Published);
        assert!(builder.sql().ends_with(
            "WHERE published = true AND page_slug = $1 AND block_type = $2 \
             ORDER BY sort_order ASC, created_at DESC"
        ));
    }

    #[test]
    fn type_key_maps_to_block_type_column() {
        let changes: ContentBlockChanges =
            serde_json::from_value(json!({ "type": "banner", "pageSlug": null })).unwrap();
        let assignments = changes.assignments().unwrap();
        let columns: Vec<_> = assignments.iter().map(|a| a.field.column()).collect();
        assert_eq!(columns, ["block_type", "page_slug"]);
    }

    #[test]
    fn blank_type_fails_validation() {
        let changes = ContentBlockChanges {
            block_type: Patch::Set(String::new()),
            ..Default::default()
        };
        assert_eq!(changes.validate(), Err(ValidationError::Empty("type")));
    }

    #[test]
    fn block_serializes_type_key() {
        let now = Utc::now();
        let block = ContentBlock {
            id: 4,
            block_type: "hero".to_string(),
            title: Some(String::new()),
            content: Map::new(),
            page_slug: Some("home".to_string()),
            sort_order: 1,
            published: true,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "hero");
        assert_eq!(value["pageSlug"], "home");
        assert!(value.get("title").is_none());
    }
}
