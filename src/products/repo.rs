use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::products::dto::{CreateProductRequest, UpdateProductRequest};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "product_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Certificate,
    Notes,
    Exam,
}

/// Catalog record. `ratings` and `number_of_reviews` are materialized
/// aggregates maintained by the reviews module.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub subject_name: String,
    pub subject_code: String,
    pub price: Decimal,
    pub image: String,
    pub description: String,
    pub kind: ProductKind,
    pub pdf_link: String,
    pub ratings: Decimal,
    pub number_of_reviews: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Product {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, subject_name, subject_code, price, image, description,
                   kind, pdf_link, ratings, number_of_reviews, created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, subject_name, subject_code, price, image, description,
                   kind, pdf_link, ratings, number_of_reviews, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    /// Fetch the subset of `ids` that exist, preserving the request order.
    pub async fn find_many(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.name, p.subject_name, p.subject_code, p.price, p.image,
                   p.description, p.kind, p.pdf_link, p.ratings, p.number_of_reviews,
                   p.created_at, p.updated_at
            FROM UNNEST($1::uuid[]) WITH ORDINALITY AS req(id, ord)
            JOIN products p ON p.id = req.id
            ORDER BY req.ord
            "#,
        )
        .bind(ids)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(db: &PgPool, req: &CreateProductRequest) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, subject_name, subject_code, price, image,
                                  description, kind, pdf_link)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, subject_name, subject_code, price, image, description,
                      kind, pdf_link, ratings, number_of_reviews, created_at, updated_at
            "#,
        )
        .bind(&req.name)
        .bind(&req.subject_name)
        .bind(&req.subject_code)
        .bind(req.price)
        .bind(&req.image)
        .bind(&req.description)
        .bind(req.kind)
        .bind(&req.pdf_link)
        .fetch_one(db)
        .await?;
        Ok(product)
    }

    /// Partial update: absent fields keep their stored values.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        req: &UpdateProductRequest,
    ) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                subject_name = COALESCE($3, subject_name),
                subject_code = COALESCE($4, subject_code),
                price = COALESCE($5, price),
                image = COALESCE($6, image),
                description = COALESCE($7, description),
                kind = COALESCE($8, kind),
                pdf_link = COALESCE($9, pdf_link),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, subject_name, subject_code, price, image, description,
                      kind, pdf_link, ratings, number_of_reviews, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.subject_name)
        .bind(&req.subject_code)
        .bind(req.price)
        .bind(&req.image)
        .bind(&req.description)
        .bind(req.kind)
        .bind(&req.pdf_link)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
