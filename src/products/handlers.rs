use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AdminUser,
    error::ApiError,
    products::dto::{CreateProductRequest, Pagination, UpdateProductRequest},
    products::repo::Product,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product))
        .route("/products/:id", delete(delete_product))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = Product::list(&state.db, p.limit, p.offset).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Json(product))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    payload.validate()?;
    let product = Product::create(&state.db, &payload).await?;
    info!(product_id = %product.id, admin_id = %admin_id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    payload.validate()?;
    let product = Product::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    info!(product_id = %product.id, admin_id = %admin_id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !Product::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Product not found"));
    }
    info!(product_id = %id, admin_id = %admin_id, "product deleted");
    Ok(Json(serde_json::json!({ "message": "Product removed" })))
}
