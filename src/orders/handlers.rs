use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{extractors::AdminUser, services::AuthUser},
    error::ApiError,
    orders::dto::{
        AdminOrderDetails, CreateOrderRequest, OrderDetails, PaymentIntentRequest,
        PaymentIntentResponse,
    },
    orders::repo::Order,
    orders::services,
    state::AppState,
};

pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/create-payment-intent", post(create_payment_intent))
        .route("/orders", post(create_order))
}

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/orders/myorders", get(my_orders))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(all_orders))
        .route("/orders/:id/deliver", put(mark_delivered))
}

#[instrument(skip(state, payload))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let response = services::create_payment_intent(&state, user_id, &payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetails>), ApiError> {
    let details = services::complete_order(&state, user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[instrument(skip(state))]
pub async fn my_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<OrderDetails>>, ApiError> {
    let orders = Order::list_by_user(&state.db, user_id).await?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
pub async fn all_orders(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<Vec<AdminOrderDetails>>, ApiError> {
    let orders = Order::list_all(&state.db).await?;
    Ok(Json(orders))
}

#[instrument(skip(state))]
pub async fn mark_delivered(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = Order::mark_delivered(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    info!(order_id = %order.id, admin_id = %admin_id, "order marked delivered");
    Ok(Json(order))
}
