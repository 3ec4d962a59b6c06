use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Review joined with the reviewer's display name for listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub author_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Review {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, user_id, product_id, rating, comment, created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(review)
    }

    pub async fn list_for_product(
        db: &PgPool,
        product_id: Uuid,
    ) -> anyhow::Result<Vec<ReviewWithAuthor>> {
        let rows = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            SELECT r.id, r.user_id, r.product_id, r.rating, r.comment,
                   u.name AS author_name, r.created_at, r.updated_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Insert a review. The UNIQUE (user_id, product_id) constraint is the
    /// arbiter of "one review per user per product"; callers translate the
    /// unique violation into a duplicate error.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        product_id: Uuid,
        rating: i32,
        comment: &str,
    ) -> Result<Review, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (user_id, product_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, product_id, rating, comment, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        rating: Option<i32>,
        comment: Option<&str>,
    ) -> anyhow::Result<Review> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews SET
                rating = COALESCE($2, rating),
                comment = COALESCE($3, comment),
                updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, product_id, rating, comment, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(comment)
        .fetch_one(db)
        .await?;
        Ok(review)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Full recompute of the product's materialized aggregate: mean rating
    /// (two decimals) and review count, zeros when no reviews remain. Runs
    /// after every review write; not transactional with it, so a crash in
    /// between leaves the aggregate stale until the next write.
    pub async fn recompute_product_rating(db: &PgPool, product_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE products SET
                ratings = COALESCE(
                    (SELECT ROUND(AVG(rating), 2) FROM reviews WHERE product_id = $1),
                    0
                ),
                number_of_reviews = (SELECT COUNT(*) FROM reviews WHERE product_id = $1),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .execute(db)
        .await?;
        Ok(())
    }
}
