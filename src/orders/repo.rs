use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::checkout::CartItem;
use crate::orders::dto::{AdminOrderDetails, OrderDetails};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_price: Decimal,
    pub payment_method: String,
    pub is_paid: bool,
    pub paid_at: Option<OffsetDateTime>,
    pub payment_intent_id: Option<String>,
    pub payment_status: Option<String>,
    pub is_delivered: bool,
    pub delivered_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Denormalized item snapshot; never re-joined against the catalog, so
/// later product edits leave historical orders untouched.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub subject_name: String,
    pub subject_code: String,
    pub price: Decimal,
    pub image: String,
}

/// Row shape for the admin listing (orders joined with users).
#[derive(Debug, Clone, FromRow)]
struct AdminOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_price: Decimal,
    pub payment_method: String,
    pub is_paid: bool,
    pub paid_at: Option<OffsetDateTime>,
    pub payment_intent_id: Option<String>,
    pub payment_status: Option<String>,
    pub is_delivered: bool,
    pub delivered_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub user_name: String,
    pub user_email: String,
}

impl Order {
    /// Persist the order and its item snapshots in one transaction; a
    /// failure on any item leaves nothing behind.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        items: &[CartItem],
        total_price: Decimal,
        payment_method: &str,
        paid_at: OffsetDateTime,
        payment_intent_id: &str,
        payment_status: &str,
    ) -> anyhow::Result<(Order, Vec<OrderItem>)> {
        let mut tx = db.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, total_price, payment_method, is_paid, paid_at,
                                payment_intent_id, payment_status)
            VALUES ($1, $2, $3, TRUE, $4, $5, $6)
            RETURNING id, user_id, total_price, payment_method, is_paid, paid_at,
                      payment_intent_id, payment_status, is_delivered, delivered_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(total_price)
        .bind(payment_method)
        .bind(paid_at)
        .bind(payment_intent_id)
        .bind(payment_status)
        .fetch_one(&mut *tx)
        .await?;

        let mut order_items = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, OrderItem>(
                r#"
                INSERT INTO order_items (order_id, product_id, name, subject_name,
                                         subject_code, price, image)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, order_id, product_id, name, subject_name, subject_code,
                          price, image
                "#,
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(&item.subject_name)
            .bind(&item.subject_code)
            .bind(item.price)
            .bind(&item.image)
            .fetch_one(&mut *tx)
            .await?;
            order_items.push(row);
        }

        tx.commit().await?;
        Ok((order, order_items))
    }

    /// The caller's orders, newest first, items embedded.
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<OrderDetails>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, total_price, payment_method, is_paid, paid_at,
                   payment_intent_id, payment_status, is_delivered, delivered_at, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        let items = Self::items_for(db, &orders).await?;
        Ok(assemble(orders, items))
    }

    /// All orders with buyer name/email, newest first. Admin only.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<AdminOrderDetails>> {
        let rows = sqlx::query_as::<_, AdminOrderRow>(
            r#"
            SELECT o.id, o.user_id, o.total_price, o.payment_method, o.is_paid, o.paid_at,
                   o.payment_intent_id, o.payment_status, o.is_delivered, o.delivered_at,
                   o.created_at, u.name AS user_name, u.email AS user_email
            FROM orders o
            JOIN users u ON u.id = o.user_id
            ORDER BY o.created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;

        let orders: Vec<Order> = rows
            .iter()
            .map(|r| Order {
                id: r.id,
                user_id: r.user_id,
                total_price: r.total_price,
                payment_method: r.payment_method.clone(),
                is_paid: r.is_paid,
                paid_at: r.paid_at,
                payment_intent_id: r.payment_intent_id.clone(),
                payment_status: r.payment_status.clone(),
                is_delivered: r.is_delivered,
                delivered_at: r.delivered_at,
                created_at: r.created_at,
            })
            .collect();
        let mut items = Self::items_for(db, &orders).await?;

        Ok(rows
            .into_iter()
            .zip(orders)
            .map(|(row, order)| AdminOrderDetails {
                order_items: items.remove(&row.id).unwrap_or_default(),
                user_name: row.user_name,
                user_email: row.user_email,
                order,
            })
            .collect())
    }

    /// Delivery transition, set by trusted backend code only.
    pub async fn mark_delivered(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET is_delivered = TRUE, delivered_at = now()
            WHERE id = $1
            RETURNING id, user_id, total_price, payment_method, is_paid, paid_at,
                      payment_intent_id, payment_status, is_delivered, delivered_at, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(order)
    }

    async fn items_for(
        db: &PgPool,
        orders: &[Order],
    ) -> anyhow::Result<std::collections::HashMap<Uuid, Vec<OrderItem>>> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let rows = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name, subject_name, subject_code, price, image
            FROM order_items
            WHERE order_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(db)
        .await?;

        let mut by_order: std::collections::HashMap<Uuid, Vec<OrderItem>> =
            std::collections::HashMap::new();
        for row in rows {
            by_order.entry(row.order_id).or_default().push(row);
        }
        Ok(by_order)
    }
}

fn assemble(
    orders: Vec<Order>,
    mut items: std::collections::HashMap<Uuid, Vec<OrderItem>>,
) -> Vec<OrderDetails> {
    orders
        .into_iter()
        .map(|order| OrderDetails {
            order_items: items.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect()
}
