use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::orders::repo::{Order, OrderItem};

/// Body for `POST /orders/create-payment-intent`. The client sends only
/// product ids; pricing happens server-side against the catalog.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub payment_intent: String,
    pub ephemeral_key: String,
    pub customer: String,
    pub publishable_key: String,
}

/// One checkout line as submitted by the client. Only the product
/// reference is accepted; name, subject and price are re-read from the
/// catalog before persisting, so a tampered price never reaches an order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub order_items: Vec<OrderItemInput>,
    pub payment_method: String,
    /// Handle of the payment intent the client says it completed; the
    /// backend asks the provider, it does not take the client's word.
    pub payment_intent_id: String,
}

/// Order plus its item snapshots, as returned to the owner.
#[derive(Debug, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub order_items: Vec<OrderItem>,
}

/// Admin listing entry: order, items, and the buyer's name/email.
#[derive(Debug, Serialize)]
pub struct AdminOrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub order_items: Vec<OrderItem>,
    pub user_name: String,
    pub user_email: String,
}

