//! Product handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::infra::http::error::ApiError;
use crate::infra::http::models::{ProductCreateRequest, ProductUpdateRequest, SearchQuery};
use crate::infra::http::state::ApiState;

pub async fn list_products(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let products = state.catalog.products.list().await?;
    Ok(Json(products))
}

pub async fn search_products(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .catalog
        .products
        .search(&query.q, query.limit)
        .await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.products.get(id).await?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<ApiState>,
    Json(payload): Json<ProductCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.products.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.catalog.products.update(id, payload.into()).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
