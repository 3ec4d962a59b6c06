use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Deserialize;
use tracing::debug;

/// Stripe pins ephemeral keys to an API version; this is the one the
/// mobile SDK we target understands.
const STRIPE_API_VERSION: &str = "2023-10-16";
const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// A single charge authorization at the provider, as much of it as the
/// checkout flow needs: the handle, the client-usable secret, and the
/// provider's verdict on whether the charge went through.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    /// Provider customer the intent was created for, when one was attached.
    pub customer: Option<String>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a provider-side customer record. Callers are expected to cache
    /// the returned id per application user rather than calling this on
    /// every checkout.
    async fn create_customer(&self, email: &str, name: &str) -> anyhow::Result<String>;
    /// Short-lived credential letting the client drive the provider-hosted
    /// payment UI for the given customer.
    async fn create_ephemeral_key(&self, customer_id: &str) -> anyhow::Result<String>;
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        customer_id: &str,
    ) -> anyhow::Result<PaymentIntent>;
    async fn retrieve_payment_intent(&self, intent_id: &str) -> anyhow::Result<PaymentIntent>;
}

/// Thin client for Stripe's REST API (form-encoded requests, JSON responses).
#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct Customer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EphemeralKey {
    secret: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> anyhow::Result<T> {
        let resp = self
            .http
            .post(format!("{}{}", STRIPE_API_BASE, path))
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(form)
            .send()
            .await
            .with_context(|| format!("stripe POST {}", path))?;
        Self::parse(path, resp).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let resp = self
            .http
            .get(format!("{}{}", STRIPE_API_BASE, path))
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .send()
            .await
            .with_context(|| format!("stripe GET {}", path))?;
        Self::parse(path, resp).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        path: &str,
        resp: reqwest::Response,
    ) -> anyhow::Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| "no error detail".into());
            anyhow::bail!("stripe {} returned {}: {}", path, status, message);
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("decode stripe {} response", path))
    }
}

#[async_trait]
impl PaymentProvider for StripeGateway {
    async fn create_customer(&self, email: &str, name: &str) -> anyhow::Result<String> {
        let customer: Customer = self
            .post("/customers", &[("email", email), ("name", name)])
            .await?;
        debug!(customer_id = %customer.id, "stripe customer created");
        Ok(customer.id)
    }

    async fn create_ephemeral_key(&self, customer_id: &str) -> anyhow::Result<String> {
        let key: EphemeralKey = self
            .post("/ephemeral_keys", &[("customer", customer_id)])
            .await?;
        Ok(key.secret)
    }

    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        customer_id: &str,
    ) -> anyhow::Result<PaymentIntent> {
        let amount = amount_minor.to_string();
        let intent: PaymentIntent = self
            .post(
                "/payment_intents",
                &[
                    ("amount", amount.as_str()),
                    ("currency", currency),
                    ("customer", customer_id),
                    ("automatic_payment_methods[enabled]", "true"),
                ],
            )
            .await?;
        debug!(intent_id = %intent.id, amount = amount_minor, "payment intent created");
        Ok(intent)
    }

    async fn retrieve_payment_intent(&self, intent_id: &str) -> anyhow::Result<PaymentIntent> {
        self.get(&format!("/payment_intents/{}", intent_id)).await
    }
}

/// Convert a decimal price to the provider's minor units (cents).
/// Rejects amounts that carry sub-cent precision instead of silently
/// rounding money.
pub fn to_minor_units(amount: Decimal) -> anyhow::Result<i64> {
    anyhow::ensure!(!amount.is_sign_negative(), "amount must be non-negative");
    let cents = amount * Decimal::from(100);
    anyhow::ensure!(
        cents.fract().is_zero(),
        "amount {} has sub-cent precision",
        amount
    );
    cents
        .to_i64()
        .with_context(|| format!("amount {} out of range", amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn minor_units_for_whole_and_fractional_amounts() {
        assert_eq!(to_minor_units(Decimal::from_str("29.99").unwrap()).unwrap(), 2999);
        assert_eq!(to_minor_units(Decimal::from_str("10").unwrap()).unwrap(), 1000);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn minor_units_rejects_negative_and_subcent() {
        assert!(to_minor_units(Decimal::from_str("-1.00").unwrap()).is_err());
        assert!(to_minor_units(Decimal::from_str("9.999").unwrap()).is_err());
    }

    #[test]
    fn intent_status_check() {
        let intent = PaymentIntent {
            id: "pi_1".into(),
            client_secret: Some("pi_1_secret".into()),
            status: "succeeded".into(),
            amount: 2999,
            currency: "eur".into(),
            customer: Some("cus_1".into()),
        };
        assert!(intent.is_succeeded());

        let pending = PaymentIntent {
            status: "requires_payment_method".into(),
            ..intent
        };
        assert!(!pending.is_succeeded());
    }
}
