use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, OrderId};
use domain::{Item, Order, OrderState};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{OrderRepository, Result, StoreError};

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new repository on top of a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_item(row: &PgRow) -> Result<Item> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::CorruptRow(format!("negative item quantity {quantity}")))?;

        Ok(Item {
            id: ItemId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            quantity,
        })
    }

    fn row_to_order(row: &PgRow, items: Vec<Item>) -> Result<Order> {
        let code: i16 = row.try_get("state")?;
        let state = OrderState::from_code(code)
            .ok_or_else(|| StoreError::CorruptRow(format!("unknown state code {code}")))?;

        Ok(Order::restore(
            OrderId::new(row.try_get::<String, _>("order_id")?),
            state,
            row.try_get::<DateTime<Utc>, _>("state_updated_at")?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
            row.try_get::<DateTime<Utc>, _>("updated_at")?,
            items,
        ))
    }

    async fn items_for(&self, order_id: &OrderId) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, quantity
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: &Order) -> Result<()> {
        let order_id = order.id().clone();

        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, state, state_updated_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id.as_str())
        .bind(order.state().code())
        .bind(order.state_updated_at())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::AlreadyExists(order_id.clone());
            }
            StoreError::Database(e)
        })?;

        for item in order.items() {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                StoreError::CorruptRow(format!("item quantity {} out of range", item.quantity))
            })?;

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, name, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(item.id.as_str())
            .bind(order_id.as_str())
            .bind(&item.name)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(order_id = %order_id, items = order.item_count(), "order persisted");
        Ok(())
    }

    async fn get_by_id(&self, id: &OrderId) -> Result<Order> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT order_id, state, state_updated_at, created_at, updated_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let items = self.items_for(id).await?;
        Self::row_to_order(&row, items)
    }

    async fn get_by_state(&self, state: OrderState) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, state, state_updated_at, created_at, updated_at
            FROM orders
            WHERE state = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(state.code())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows
            .iter()
            .map(|row| row.try_get::<String, _>("order_id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, order_id, name, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<String, Vec<Item>> = HashMap::new();
        for row in &item_rows {
            let order_id: String = row.try_get("order_id")?;
            items_by_order
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }

        rows.iter()
            .zip(ids)
            .map(|(row, id)| {
                let items = items_by_order.remove(&id).unwrap_or_default();
                Self::row_to_order(row, items)
            })
            .collect()
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET state = $2, state_updated_at = $3, updated_at = $4
            WHERE order_id = $1
            "#,
        )
        .bind(order.id().as_str())
        .bind(order.state().code())
        .bind(order.state_updated_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(order_id = %order.id(), "update matched no order row");
        }

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
