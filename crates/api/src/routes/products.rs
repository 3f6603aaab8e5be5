use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use storefront_cms_core::content::{NewProduct, Product, ProductChanges, ProductFilter, Visibility};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Catalogue reads and admin product editing.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cms/products", get(list_published))
        .route("/cms/products/{slug}", get(get_by_slug))
        .route("/cms/admin/products", get(list_all).post(create))
        .route("/cms/admin/products/{id}", put(update).patch(update))
}

#[derive(Debug, Serialize)]
struct ProductList {
    products: Vec<Product>,
}

async fn list_published(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<ProductFilter>, ApiError>,
) -> ApiResult<Json<ProductList>> {
    let products = Product::list(state.pool(), &filter, Visibility::Published).await?;
    Ok(Json(ProductList { products }))
}

async fn list_all(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<ProductFilter>, ApiError>,
) -> ApiResult<Json<ProductList>> {
    let products = Product::list(state.pool(), &filter, Visibility::All).await?;
    Ok(Json(ProductList { products }))
}

async fn get_by_slug(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<Json<Product>> {
    Product::find_by_slug(state.pool(), &slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("product not found".to_string()))
}

async fn create(
    State(state): State<AppState>,
    WithRejection(Json(new), _): WithRejection<Json<NewProduct>, ApiError>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = Product::create(state.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(changes), _): WithRejection<Json<ProductChanges>, ApiError>,
) -> ApiResult<Json<Product>> {
    let product = state.updates().apply::<Product>(id, &changes).await?;
    Ok(Json(product))
}
