//! Category handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::infra::http::error::ApiError;
use crate::infra::http::models::{CategoryCreateRequest, CategoryUpdateRequest, SearchQuery};
use crate::infra::http::state::ApiState;

pub async fn list_categories(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.catalog.categories.list().await?;
    Ok(Json(categories))
}

pub async fn search_categories(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .catalog
        .categories
        .search(&query.q, query.limit)
        .await?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.catalog.categories.get(id).await?;
    Ok(Json(category))
}

pub async fn create_category(
    State(state): State<ApiState>,
    Json(payload): Json<CategoryCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.catalog.categories.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.catalog.categories.update(id, payload.into()).await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
