use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use storefront_cms_core::content::{NewPage, Page, PageChanges, Visibility};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Public page reads and admin page editing.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cms/pages", get(list_published))
        .route("/cms/pages/{slug}", get(get_by_slug))
        .route("/cms/admin/pages", get(list_all).post(create))
        .route("/cms/admin/pages/{id}", put(update).patch(update))
}

#[derive(Debug, Serialize)]
struct PageList {
    pages: Vec<Page>,
}

async fn list_published(State(state): State<AppState>) -> ApiResult<Json<PageList>> {
    let pages = Page::list(state.pool(), Visibility::Published).await?;
    Ok(Json(PageList { pages }))
}

async fn list_all(State(state): State<AppState>) -> ApiResult<Json<PageList>> {
    let pages = Page::list(state.pool(), Visibility::All).await?;
    Ok(Json(PageList { pages }))
}

async fn get_by_slug(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<Json<Page>> {
    Page::find_by_slug(state.pool(), &slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("page not found".to_string()))
}

async fn create(
    State(state): State<AppState>,
    WithRejection(Json(new), _): WithRejection<Json<NewPage>, ApiError>,
) -> ApiResult<(StatusCode, Json<Page>)> {
    let page = Page::create(state.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(changes), _): WithRejection<Json<PageChanges>, ApiError>,
) -> ApiResult<Json<Page>> {
    let page = state.updates().apply::<Page>(id, &changes).await?;
    Ok(Json(page))
}
