//! Variant handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::infra::http::error::ApiError;
use crate::infra::http::models::{VariantCreateRequest, VariantUpdateRequest, SearchQuery};
use crate::infra::http::state::ApiState;

pub async fn list_variants(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let variants = state.catalog.variants.list().await?;
    Ok(Json(variants))
}

pub async fn search_variants(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let variants = state
        .catalog
        .variants
        .search(&query.q, query.limit)
        .await?;
    Ok(Json(variants))
}

pub async fn get_variant(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let variant = state.catalog.variants.get(id).await?;
    Ok(Json(variant))
}

pub async fn create_variant(
    State(state): State<ApiState>,
    Json(payload): Json<VariantCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let variant = state.catalog.variants.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(variant)))
}

pub async fn update_variant(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<VariantUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let variant = state.catalog.variants.update(id, payload.into()).await?;
    Ok(Json(variant))
}

pub async fn delete_variant(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.variants.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
