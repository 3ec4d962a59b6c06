use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    /// Provider-side customer id, filled in lazily on first checkout so a
    /// returning buyer reuses one customer record instead of minting a new
    /// one per payment intent.
    pub stripe_customer_id: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, is_admin, stripe_customer_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, is_admin, stripe_customer_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, is_admin, stripe_customer_id, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_name(db: &PgPool, id: Uuid, name: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET name = $2
            WHERE id = $1
            RETURNING id, name, email, password_hash, is_admin, stripe_customer_id, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Remember the provider customer id after the first checkout.
    pub async fn set_stripe_customer(
        db: &PgPool,
        id: Uuid,
        customer_id: &str,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET stripe_customer_id = $2 WHERE id = $1")
            .bind(id)
            .bind(customer_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
