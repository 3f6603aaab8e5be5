use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, QueryBuilder};

use super::validate::{
    check_patch, require_amount, require_text, validate_slug, ValidationError,
};
use super::{blank_to_none, Visibility};
use crate::error::StoreError;
use crate::mutation::patch::Patch;
use crate::mutation::schema::{Assignment, Assignments, ChangeSet, Entity, EntityField};

const COLUMNS: &str = "id, name, slug, description, long_description, price, size, notes, images, \
                       featured, published, sort_order, created_at, updated_at";

/// Fragrance notes, stored as one JSONB document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductNotes {
    pub top: Vec<String>,
    pub heart: Vec<String>,
    pub base: Vec<String>,
}

/// A catalogue product. Maps to the `products` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "crate::content::is_blank")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "crate::content::is_blank")]
    pub long_description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "crate::content::is_blank")]
    pub size: Option<String>,
    #[sqlx(json)]
    pub notes: ProductNotes,
    #[sqlx(json)]
    pub images: Vec<String>,
    pub featured: bool,
    pub published: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub price: f64,
    pub size: Option<String>,
    pub notes: ProductNotes,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_slug(&self.slug)?;
        require_text("name", &self.name)?;
        require_amount("price", self.price)
    }
}

/// Query parameters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub featured: Option<bool>,
    pub limit: Option<i64>,
}

impl ProductFilter {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.limit {
            Some(limit) if limit <= 0 => Err(ValidationError::InvalidLimit),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Name,
    Description,
    LongDescription,
    Price,
    Size,
    Notes,
    Images,
    Featured,
    Published,
    SortOrder,
}

impl EntityField for ProductField {
    fn name(self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Description => "description",
            ProductField::LongDescription => "longDescription",
            ProductField::Price => "price",
            ProductField::Size => "size",
            ProductField::Notes => "notes",
            ProductField::Images => "images",
            ProductField::Featured => "featured",
            ProductField::Published => "published",
            ProductField::SortOrder => "sortOrder",
        }
    }

    fn column(self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Description => "description",
            ProductField::LongDescription => "long_description",
            ProductField::Price => "price",
            ProductField::Size => "size",
            ProductField::Notes => "notes",
            ProductField::Images => "images",
            ProductField::Featured => "featured",
            ProductField::Published => "published",
            ProductField::SortOrder => "sort_order",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductChanges {
    pub name: Patch<String>,
    pub description: Patch<Option<String>>,
    pub long_description: Patch<Option<String>>,
    pub price: Patch<f64>,
    pub size: Patch<Option<String>>,
    pub notes: Patch<ProductNotes>,
    pub images: Patch<Vec<String>>,
    pub featured: Patch<bool>,
    pub published: Patch<bool>,
    pub sort_order: Patch<i32>,
}

impl ChangeSet for ProductChanges {
    type Field = ProductField;

    fn assignments(&self) -> Result<Vec<Assignment<ProductField>>, StoreError> {
        let mut out = Assignments::new();
        out.set(ProductField::Name, &self.name)
            .set(ProductField::Description, &self.description)
            .set(ProductField::LongDescription, &self.long_description)
            .set(ProductField::Price, &self.price)
            .set(ProductField::Size, &self.size)
            .set_json(ProductField::Notes, &self.notes)?
            .set_json(ProductField::Images, &self.images)?
            .set(ProductField::Featured, &self.featured)
            .set(ProductField::Published, &self.published)
            .set(ProductField::SortOrder, &self.sort_order);
        Ok(out.finish())
    }

    fn is_empty(&self) -> bool {
        self.name.is_unchanged()
            && self.description.is_unchanged()
            && self.long_description.is_unchanged()
            && self.price.is_unchanged()
            && self.size.is_unchanged()
            && self.notes.is_unchanged()
            && self.images.is_unchanged()
            && self.featured.is_unchanged()
            && self.published.is_unchanged()
            && self.sort_order.is_unchanged()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_patch(&self.name, |name| require_text("name", name))?;
        check_patch(&self.price, |price| require_amount("price", *price))
    }
}

impl Entity for Product {
    type Field = ProductField;
    type Changes = ProductChanges;

    const NAME: &'static str = "product";
    const TABLE: &'static str = "products";
    const COLUMNS: &'static str = COLUMNS;
}

impl Product {
    /// Products ordered by `sort_order`, newest first within a position.
    pub async fn list(
        pool: &PgPool,
        filter: &ProductFilter,
        visibility: Visibility,
    ) -> Result<Vec<Product>, StoreError> {
        filter.validate()?;
        Ok(list_query(filter, visibility)
            .build_query_as::<Product>()
            .fetch_all(pool)
            .await?)
    }

    /// A published product by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE slug = $1 AND published = true");
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(slug)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn create(pool: &PgPool, new: NewProduct) -> Result<Product, StoreError> {
        new.validate()?;
        let sql = format!(
            "INSERT INTO products (name, slug, description, long_description, price, size, notes, \
             images, featured, published, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(blank_to_none(new.description))
            .bind(blank_to_none(new.long_description))
            .bind(new.price)
            .bind(blank_to_none(new.size))
            .bind(Json(&new.notes))
            .bind(Json(&new.images))
            .bind(new.featured)
            .bind(new.published)
            .bind(new.sort_order)
            .fetch_one(pool)
            .await
            .map_err(|e| StoreError::from_insert(e, "product", &new.slug))?;

        tracing::info!(id = product.id, slug = %product.slug, "product created");
        Ok(product)
    }
}

fn list_query(filter: &ProductFilter, visibility: Visibility) -> QueryBuilder<'static, sqlx::Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM products"));
    visibility.push_where(&mut builder);
    if let Some(featured) = filter.featured {
        builder.push(" AND featured = ").push_bind(featured);
    }
    builder.push(" ORDER BY sort_order ASC, created_at DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }
    builder
}
