use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    error::ApiError,
    products::repo::Product,
    reviews::dto::{CreateReviewRequest, UpdateReviewRequest},
    reviews::repo::{Review, ReviewWithAuthor},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/products/:id/reviews", get(list_product_reviews))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/reviews/:id", put(update_review))
        .route("/reviews/:id", delete(delete_review))
}

#[instrument(skip(state))]
pub async fn list_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewWithAuthor>>, ApiError> {
    if Product::find_by_id(&state.db, product_id).await?.is_none() {
        return Err(ApiError::not_found("Product not found"));
    }
    let reviews = Review::list_for_product(&state.db, product_id).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    payload.validate()?;

    if Product::find_by_id(&state.db, payload.product_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Product not found"));
    }

    let review = Review::create(
        &state.db,
        user_id,
        payload.product_id,
        payload.rating,
        payload.comment.trim(),
    )
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                warn!(user_id = %user_id, product_id = %payload.product_id, "duplicate review");
                return ApiError::Conflict("You have already reviewed this product".into());
            }
        }
        e.into()
    })?;

    Review::recompute_product_rating(&state.db, payload.product_id).await?;

    info!(review_id = %review.id, product_id = %payload.product_id, "review created");
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    payload.validate()?;

    let existing = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;
    if existing.user_id != user_id {
        warn!(review_id = %id, user_id = %user_id, "review update by non-owner");
        return Err(ApiError::Forbidden("Not your review".into()));
    }

    let review = Review::update(&state.db, id, payload.rating, payload.comment.as_deref()).await?;
    Review::recompute_product_rating(&state.db, review.product_id).await?;

    info!(review_id = %review.id, "review updated");
    Ok(Json(review))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let existing = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;
    if existing.user_id != user_id {
        warn!(review_id = %id, user_id = %user_id, "review delete by non-owner");
        return Err(ApiError::Forbidden("Not your review".into()));
    }

    Review::delete(&state.db, id).await?;
    Review::recompute_product_rating(&state.db, existing.product_id).await?;

    info!(review_id = %id, product_id = %existing.product_id, "review deleted");
    Ok(Json(serde_json::json!({ "message": "Review removed" })))
}
