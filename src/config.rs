use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub publishable_key: String,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub stripe: StripeConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "studystore".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "studystore-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        // Provider keys come from the environment only, never from source.
        let stripe = StripeConfig {
            secret_key: std::env::var("STRIPE_SECRET_KEY")?,
            publishable_key: std::env::var("STRIPE_PUBLISHABLE_KEY")?,
            currency: std::env::var("STRIPE_CURRENCY").unwrap_or_else(|_| "eur".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            stripe,
        })
    }
}
