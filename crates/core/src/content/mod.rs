//! Pages, products and content blocks: records, creation payloads, change
//! sets and the queries that read and insert them.

pub mod block;
pub mod page;
pub mod product;
pub mod validate;

use sqlx::{Postgres, QueryBuilder};

pub use block::{ContentBlock, ContentBlockChanges, ContentBlockFilter, NewContentBlock};
pub use page::{NewPage, Page, PageChanges};
pub use product::{NewProduct, Product, ProductChanges, ProductFilter, ProductNotes};

/// Which records a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Public site: published records only.
    Published,
    /// Admin: drafts included.
    All,
}

impl Visibility {
    /// Open the WHERE clause; later filters append with `AND`.
    pub(crate) fn push_where(self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Visibility::Published => builder.push(" WHERE published = true"),
            Visibility::All => builder.push(" WHERE true"),
        };
    }
}

/// Optional text from a creation payload, with blanks stored as NULL.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Skip predicate for optional text on read: NULL and `""` are both omitted.
pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}
