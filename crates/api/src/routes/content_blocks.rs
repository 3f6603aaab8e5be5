use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use storefront_cms_core::content::{
    ContentBlock, ContentBlockChanges, ContentBlockFilter, NewContentBlock, Visibility,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cms/content-blocks", get(list_published))
        .route("/cms/admin/content-blocks", get(list_all).post(create))
        .route("/cms/admin/content-blocks/{id}", put(update).patch(update))
}

#[derive(Debug, Serialize)]
struct BlockList {
    blocks: Vec<ContentBlock>,
}

async fn list_published(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<ContentBlockFilter>, ApiError>,
) -> ApiResult<Json<BlockList>> {
    let blocks = ContentBlock::list(state.pool(), &filter, Visibility::Published).await?;
    Ok(Json(BlockList { blocks }))
}

async fn list_all(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): WithRejection<Query<ContentBlockFilter>, ApiError>,
) -> ApiResult<Json<BlockList>> {
    let blocks = ContentBlock::list(state.pool(), &filter, Visibility::All).await?;
    Ok(Json(BlockList { blocks }))
}

async fn create(
    State(state): State<AppState>,
    WithRejection(Json(new), _): WithRejection<Json<NewContentBlock>, ApiError>,
) -> ApiResult<(StatusCode, Json<ContentBlock>)> {
    let block = ContentBlock::create(state.pool(), new).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn update(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(changes), _): WithRejection<Json<ContentBlockChanges>, ApiError>,
) -> ApiResult<Json<ContentBlock>> {
    let block = state.updates().apply::<ContentBlock>(id, &changes).await?;
    Ok(Json(block))
}
