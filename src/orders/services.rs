use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::repo::User,
    checkout::{flow::InvalidTransition, Cart, CartItem, CheckoutFlow},
    error::ApiError,
    orders::dto::{CreateOrderRequest, OrderDetails, PaymentIntentRequest, PaymentIntentResponse},
    orders::repo::Order,
    payment::{to_minor_units, PaymentIntent},
    products::repo::Product,
    state::AppState,
};

fn bug(e: InvalidTransition) -> ApiError {
    // A transition rejection here is a programming error, not client input.
    ApiError::Internal(anyhow::Error::new(e))
}

/// Price the requested products against the catalog and build the cart the
/// checkout will charge for. Unknown ids fail the whole quote; duplicate
/// ids become distinct lines.
async fn quote_cart(state: &AppState, product_ids: &[Uuid]) -> Result<Cart, ApiError> {
    if product_ids.is_empty() {
        return Err(ApiError::validation("No order items"));
    }
    let products = Product::find_many(&state.db, product_ids).await?;
    if products.len() != product_ids.len() {
        return Err(ApiError::not_found("Product not found"));
    }
    let mut cart = Cart::new();
    for product in &products {
        cart.add(CartItem::from(product));
    }
    Ok(cart)
}

/// Reuse the provider customer recorded for this user, creating and
/// caching one on first checkout.
async fn ensure_customer(state: &AppState, user: &User) -> Result<String, ApiError> {
    if let Some(id) = &user.stripe_customer_id {
        return Ok(id.clone());
    }
    let customer_id = state
        .payments
        .create_customer(&user.email, &user.name)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user.id, "create customer failed");
            ApiError::Upstream("Payment initiation failed".into())
        })?;
    User::set_stripe_customer(&state.db, user.id, &customer_id).await?;
    Ok(customer_id)
}

/// Obtain a payment intent for the server-priced cart: authorization
/// handle, ephemeral credential and customer id, all scoped to this
/// attempt. Provider failure surfaces as a generic initiation error with
/// no retry; the client restarts checkout.
pub async fn create_payment_intent(
    state: &AppState,
    user_id: Uuid,
    req: &PaymentIntentRequest,
) -> Result<PaymentIntentResponse, ApiError> {
    let cart = quote_cart(state, &req.product_ids).await?;
    let amount_minor = to_minor_units(cart.total())?;

    let mut flow = CheckoutFlow::new();
    flow.begin().map_err(bug)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    let customer = ensure_customer(state, &user).await?;

    let currency = &state.config.stripe.currency;
    let issued = async {
        let ephemeral_key = state.payments.create_ephemeral_key(&customer).await?;
        let intent = state
            .payments
            .create_payment_intent(amount_minor, currency, &customer)
            .await?;
        anyhow::Ok((ephemeral_key, intent))
    }
    .await;

    let (ephemeral_key, intent) = match issued {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "payment intent creation failed");
            flow.fail("payment initiation failed").map_err(bug)?;
            return Err(ApiError::Upstream("Payment initiation failed".into()));
        }
    };
    flow.intent_received(intent.id.clone()).map_err(bug)?;

    let client_secret = intent
        .client_secret
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("intent missing client secret")))?;

    info!(user_id = %user_id, intent_id = %intent.id, amount = amount_minor,
          "payment intent issued");
    Ok(PaymentIntentResponse {
        payment_intent: client_secret,
        ephemeral_key,
        customer,
        publishable_key: state.config.stripe.publishable_key.clone(),
    })
}

/// Drive the tail of the checkout flow from the provider's verdict.
/// Anything short of a succeeded intent for the exact cart amount, in the
/// configured currency, attached to the caller's own provider customer,
/// ends in `Failed` and the caller persists nothing.
fn settle(
    flow: &mut CheckoutFlow,
    intent: &PaymentIntent,
    expected_minor: i64,
    expected_currency: &str,
    expected_customer: Option<&str>,
) -> Result<(), ApiError> {
    if !intent.is_succeeded() {
        flow.fail(intent.status.clone()).map_err(bug)?;
        return Err(ApiError::validation("Payment has not been completed"));
    }
    if intent.amount != expected_minor {
        flow.fail("amount mismatch").map_err(bug)?;
        return Err(ApiError::validation(
            "Paid amount does not match the order total",
        ));
    }
    if !intent.currency.eq_ignore_ascii_case(expected_currency) {
        flow.fail("currency mismatch").map_err(bug)?;
        return Err(ApiError::validation(
            "Paid currency does not match the order currency",
        ));
    }
    // An intent for someone else's customer (or a caller with no customer
    // on record) is not proof of this user's payment.
    if expected_customer.is_none() || intent.customer.as_deref() != expected_customer {
        flow.fail("customer mismatch").map_err(bug)?;
        return Err(ApiError::validation(
            "Payment does not belong to this customer",
        ));
    }
    flow.confirm().map_err(bug)?;
    Ok(())
}

/// Persist the purchase once the provider confirms the charge. The paid
/// flag is derived from the provider's answer, never from the request.
pub async fn complete_order(
    state: &AppState,
    user_id: Uuid,
    req: &CreateOrderRequest,
) -> Result<OrderDetails, ApiError> {
    if req.order_items.is_empty() {
        return Err(ApiError::validation("No order items"));
    }
    if req.payment_method.trim().is_empty() {
        return Err(ApiError::validation("Payment method is required"));
    }

    let product_ids: Vec<Uuid> = req.order_items.iter().map(|i| i.product_id).collect();
    let cart = quote_cart(state, &product_ids).await?;
    let total = cart.total();
    let expected_minor = to_minor_units(total)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let mut flow = CheckoutFlow::new();
    flow.begin().map_err(bug)?;
    flow.intent_received(req.payment_intent_id.clone())
        .map_err(bug)?;

    let intent = state
        .payments
        .retrieve_payment_intent(&req.payment_intent_id)
        .await
        .map_err(|e| {
            warn!(error = %e, intent_id = %req.payment_intent_id, "intent lookup failed");
            ApiError::Upstream("Payment verification failed".into())
        })?;

    let verdict = settle(
        &mut flow,
        &intent,
        expected_minor,
        &state.config.stripe.currency,
        user.stripe_customer_id.as_deref(),
    );
    if let Err(e) = verdict {
        warn!(user_id = %user_id, intent_id = %intent.id, status = %intent.status,
              "checkout failed, no order created");
        return Err(e);
    }

    let paid_at = OffsetDateTime::now_utc();
    let (order, order_items) = Order::create(
        &state.db,
        user_id,
        cart.items(),
        total,
        req.payment_method.trim(),
        paid_at,
        &intent.id,
        &intent.status,
    )
    .await?;

    info!(order_id = %order.id, user_id = %user_id, total = %order.total_price,
          "order created");
    Ok(OrderDetails { order, order_items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::flow::CheckoutState;
    use crate::orders::dto::OrderItemInput;

    fn intent(status: &str, amount: i64) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".into(),
            client_secret: None,
            status: status.into(),
            amount,
            currency: "eur".into(),
            customer: Some("cus_1".into()),
        }
    }

    fn awaiting_payment() -> CheckoutFlow {
        let mut flow = CheckoutFlow::new();
        flow.begin().unwrap();
        flow.intent_received("pi_1").unwrap();
        flow
    }

    #[test]
    fn succeeded_intent_with_matching_amount_settles_paid() {
        let mut flow = awaiting_payment();
        settle(&mut flow, &intent("succeeded", 2999), 2999, "eur", Some("cus_1")).unwrap();
        assert_eq!(*flow.state(), CheckoutState::Paid);
    }

    #[test]
    fn unpaid_intent_settles_failed_and_errors() {
        let mut flow = awaiting_payment();
        let err = settle(
            &mut flow,
            &intent("requires_payment_method", 2999),
            2999,
            "eur",
            Some("cus_1"),
        )
        .unwrap_err();
        assert_eq!(*flow.state(), CheckoutState::Failed);
        assert!(err.to_string().contains("not been completed"));
    }

    #[test]
    fn amount_mismatch_settles_failed_and_errors() {
        let mut flow = awaiting_payment();
        let err = settle(&mut flow, &intent("succeeded", 1099), 2999, "eur", Some("cus_1"))
            .unwrap_err();
        assert_eq!(*flow.state(), CheckoutState::Failed);
        assert_eq!(flow.failure(), Some("amount mismatch"));
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn currency_mismatch_settles_failed_and_errors() {
        let mut flow = awaiting_payment();
        let err = settle(&mut flow, &intent("succeeded", 2999), 2999, "usd", Some("cus_1"))
            .unwrap_err();
        assert_eq!(*flow.state(), CheckoutState::Failed);
        assert_eq!(flow.failure(), Some("currency mismatch"));
        assert!(err.to_string().contains("currency"));
    }

    #[test]
    fn foreign_or_missing_customer_settles_failed_and_errors() {
        // Intent attached to someone else's customer.
        let mut flow = awaiting_payment();
        let err = settle(&mut flow, &intent("succeeded", 2999), 2999, "eur", Some("cus_2"))
            .unwrap_err();
        assert_eq!(*flow.state(), CheckoutState::Failed);
        assert_eq!(flow.failure(), Some("customer mismatch"));
        assert!(err.to_string().contains("customer"));

        // Caller with no provider customer on record cannot claim any intent.
        let mut flow = awaiting_payment();
        let err = settle(&mut flow, &intent("succeeded", 2999), 2999, "eur", None).unwrap_err();
        assert_eq!(*flow.state(), CheckoutState::Failed);
        assert!(err.to_string().contains("customer"));
    }

    #[tokio::test]
    async fn empty_order_items_are_rejected_before_any_persistence() {
        let state = AppState::fake();
        let req = CreateOrderRequest {
            order_items: Vec::new(),
            payment_method: "card".into(),
            payment_intent_id: "pi_1".into(),
        };
        // The lazy pool never connects; reaching the DB would error with a
        // connection failure rather than this validation message.
        let err = complete_order(&state, Uuid::new_v4(), &req).await.unwrap_err();
        assert!(err.to_string().contains("No order items"));
    }

    #[tokio::test]
    async fn empty_product_list_cannot_be_quoted() {
        let state = AppState::fake();
        let err = quote_cart(&state, &[]).await.unwrap_err();
        assert!(err.to_string().contains("No order items"));
    }

    #[tokio::test]
    async fn blank_payment_method_is_rejected() {
        let state = AppState::fake();
        let req = CreateOrderRequest {
            order_items: vec![OrderItemInput {
                product_id: Uuid::new_v4(),
            }],
            payment_method: "   ".into(),
            payment_intent_id: "pi_1".into(),
        };
        let err = complete_order(&state, Uuid::new_v4(), &req).await.unwrap_err();
        assert!(err.to_string().contains("Payment method"));
    }
}
