use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, QueryBuilder};

use super::validate::{check_patch, require_text, validate_slug, ValidationError};
use super::{blank_to_none, Visibility};
use crate::error::StoreError;
use crate::mutation::patch::Patch;
use crate::mutation::schema::{Assignment, Assignments, ChangeSet, Entity, EntityField};

const COLUMNS: &str =
    "id, slug, title, subtitle, content, meta_title, meta_description, published, created_at, updated_at";

/// A routable page of the public site. Maps to the `pages` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "crate::content::is_blank")]
    pub subtitle: Option<String>,
    #[sqlx(json)]
    pub content: Map<String, Value>,
    #[serde(skip_serializing_if = "crate::content::is_blank")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "crate::content::is_blank")]
    pub meta_description: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPage {
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: Map<String, Value>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl NewPage {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_slug(&self.slug)?;
        require_text("title", &self.title)
    }
}

/// Mutable page fields. The slug is fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageField {
    Title,
    Subtitle,
    Content,
    MetaTitle,
    MetaDescription,
    Published,
}

impl EntityField for PageField {
    fn name(self) -> &'static str {
        match self {
            PageField::Title => "title",
            PageField::Subtitle => "subtitle",
            PageField::Content => "content",
            PageField::MetaTitle => "metaTitle",
            PageField::MetaDescription => "metaDescription",
            PageField::Published => "published",
        }
    }

    fn column(self) -> &'static str {
        match self {
            PageField::Title => "title",
            PageField::Subtitle => "subtitle",
            PageField::Content => "content",
            PageField::MetaTitle => "meta_title",
            PageField::MetaDescription => "meta_description",
            PageField::Published => "published",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PageChanges {
    pub title: Patch<String>,
    pub subtitle: Patch<Option<String>>,
    pub content: Patch<Map<String, Value>>,
    pub meta_title: Patch<Option<String>>,
    pub meta_description: Patch<Option<String>>,
    pub published: Patch<bool>,
}

impl ChangeSet for PageChanges {
    type Field = PageField;

    fn assignments(&self) -> Result<Vec<Assignment<PageField>>, StoreError> {
        let mut out = Assignments::new();
        out.set(PageField::Title, &self.title)
            .set(PageField::Subtitle, &self.subtitle)
            .set_json(PageField::Content, &self.content)?
            .set(PageField::MetaTitle, &self.meta_title)
            .set(PageField::MetaDescription, &self.meta_description)
            .set(PageField::Published, &self.published);
        Ok(out.finish())
    }

    fn is_empty(&self) -> bool {
        self.title.is_unchanged()
            && self.subtitle.is_unchanged()
            && self.content.is_unchanged()
            && self.meta_title.is_unchanged()
            && self.meta_description.is_unchanged()
            && self.published.is_unchanged()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_patch(&self.title, |title| require_text("title", title))
    }
}

impl Entity for Page {
    type Field = PageField;
    type Changes = PageChanges;

    const NAME: &'static str = "page";
    const TABLE: &'static str = "pages";
    const COLUMNS: &'static str = COLUMNS;
}

impl Page {
    /// Pages ordered by slug.
    pub async fn list(pool: &PgPool, visibility: Visibility) -> Result<Vec<Page>, StoreError> {
        let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM pages"));
        visibility.push_where(&mut builder);
        builder.push(" ORDER BY slug");
        Ok(builder.build_query_as::<Page>().fetch_all(pool).await?)
    }

    /// A published page by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Page>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM pages WHERE slug = $1 AND published = true");
        Ok(sqlx::query_as::<_, Page>(&sql)
            .bind(slug)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn create(pool: &PgPool, new: NewPage) -> Result<Page, StoreError> {
        new.validate()?;
        let sql = format!(
            "INSERT INTO pages (slug, title, subtitle, content, meta_title, meta_description, published) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        );
        let page = sqlx::query_as::<_, Page>(&sql)
            .bind(&new.slug)
            .bind(&new.title)
            .bind(blank_to_none(new.subtitle))
            .bind(Json(&new.content))
            .bind(blank_to_none(new.meta_title))
            .bind(blank_to_none(new.meta_description))
            .bind(new.published)
            .fetch_one(pool)
            .await
            .map_err(|e| StoreError::from_insert(e, "page", &new.slug))?;

        tracing::info!(id = page.id, slug = %page.slug, "page created");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_set_tracks_presence() {
        let changes: PageChanges = serde_json::from_value(json!({ "published": true })).unwrap();
        assert!(!changes.is_empty());
        assert_eq!(changes.published, Patch::Set(true));
        assert!(changes.title.is_unchanged());

        let assignments = changes.assignments().unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].field, PageField::Published);
    }

    #[test]
    fn empty_body_is_an_empty_change_set() {
        let changes: PageChanges = serde_json::from_value(json!({})).unwrap();
        assert!(changes.is_empty());
        assert!(changes.assignments().unwrap().is_empty());
    }

    #[test]
    fn null_subtitle_clears_the_column() {
        let changes: PageChanges =
            serde_json::from_value(json!({ "subtitle": null, "metaTitle": "Home | Maison" }))
                .unwrap();
        let assignments = changes.assignments().unwrap();
        assert_eq!(assignments[0].field.column(), "subtitle");
        assert_eq!(assignments[0].value, crate::mutation::schema::ColumnValue::Text(None));
        assert_eq!(assignments[1].field.column(), "meta_title");
    }

    #[test]
    fn slug_is_not_a_mutable_field() {
        let result: Result<PageChanges, _> = serde_json::from_value(json!({ "slug": "new" }));
        assert!(result.is_err());
    }

    #[test]
    fn content_must_be_an_object() {
        let result: Result<PageChanges, _> = serde_json::from_value(json!({ "content": [1, 2] }));
        assert!(result.is_err());
    }

    #[test]
    fn blank_title_fails_validation() {
        let changes = PageChanges {
            title: Patch::Set(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(changes.validate(), Err(ValidationError::Empty("title")));
    }

    #[test]
    fn new_page_defaults_to_draft() {
        let new: NewPage = serde_json::from_value(json!({
            "slug": "about",
            "title": "About",
            "content": { "body": "Since 1998" }
        }))
        .unwrap();
        assert!(!new.published);
        assert!(new.subtitle.is_none());
        assert_eq!(new.validate(), Ok(()));
    }

    #[test]
    fn page_serializes_camel_case_and_omits_missing_optionals() {
        let now = Utc::now();
        let page = Page {
            id: 1,
            slug: "home".to_string(),
            title: "Home".to_string(),
            subtitle: None,
            content: Map::new(),
            meta_title: Some("Home".to_string()),
            meta_description: None,
            published: false,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["metaTitle"], "Home");
        assert!(value.get("subtitle").is_none());
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn empty_optional_text_is_omitted_on_read() {
        let now = Utc::now();
        let page = Page {
            id: 1,
            slug: "home".to_string(),
            title: "Home".to_string(),
            subtitle: Some(String::new()),
            content: Map::new(),
            meta_title: Some("Home".to_string()),
            meta_description: Some(String::new()),
            published: true,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&page).unwrap();
        assert!(value.get("subtitle").is_none());
        assert!(value.get("metaDescription").is_none());
        assert_eq!(value["metaTitle"], "Home");
    }
}
