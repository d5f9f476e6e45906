//! Work orders repository for database operations.
//!
//! The claim and auto-claim paths are single conditional UPDATEs so that
//! concurrent attempts are serialized by Postgres rather than by
//! application-level locking. Archive and restore move the row between
//! `work_orders` and `work_orders_archive` inside one transaction.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::work_order::{HistoryEntry, NewWorkOrder, WorkOrder, WorkOrderRow, WorkOrderStatus},
};

use super::WorkOrderStore;

#[derive(Clone)]
pub struct PgWorkOrderStore {
    pool: Pool<Postgres>,
}

impl PgWorkOrderStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkOrderStore for PgWorkOrderStore {
    async fn next_sequence(&self, month: &str) -> AppResult<i64> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO work_order_counters (month, seq)
            VALUES ($1, 1)
            ON CONFLICT (month) DO UPDATE SET seq = work_order_counters.seq + 1
            RETURNING seq
            "#,
        )
        .bind(month)
        .fetch_one(&self.pool)
        .await?;
        Ok(seq)
    }

    async fn insert(&self, work_order: NewWorkOrder) -> AppResult<WorkOrder> {
        let row = sqlx::query_as::<_, WorkOrderRow>(
            r#"
            INSERT INTO work_orders
                (number, machine_id, component_id, order_type, priority,
                 description, status, created_by, history)
            VALUES ($1, $2, $3, $4, $5, $6, 'open', $7, $8)
            RETURNING *
            "#,
        )
        .bind(&work_order.number)
        .bind(work_order.machine_id)
        .bind(work_order.component_id)
        .bind(&work_order.order_type)
        .bind(&work_order.priority)
        .bind(&work_order.description)
        .bind(&work_order.created_by)
        .bind(sqlx::types::Json(&work_order.history))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get(&self, id: i64) -> AppResult<Option<WorkOrder>> {
        let row = sqlx::query_as::<_, WorkOrderRow>("SELECT * FROM work_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(WorkOrder::from))
    }

    async fn list(
        &self,
        status: Option<WorkOrderStatus>,
        limit: i64,
    ) -> AppResult<Vec<WorkOrder>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, WorkOrderRow>(
                    r#"
                    SELECT * FROM work_orders
                    WHERE status = $1
                    ORDER BY created_at DESC
                    LIMIT $2
                    "#,
                )
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, WorkOrderRow>(
                    "SELECT * FROM work_orders ORDER BY created_at DESC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(WorkOrder::from).collect())
    }

    async fn try_claim(
        &self,
        id: i64,
        actor_id: i64,
        actor_name: &str,
        entry: HistoryEntry,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE work_orders
            SET assigned_to = $2, assigned_name = $3, assigned_at = $4,
                status = 'in_progress', history = history || $5
            WHERE id = $1 AND assigned_to IS NULL AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .bind(actor_name)
        .bind(entry.timestamp)
        .bind(sqlx::types::Json(&entry))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_assign(&self, id: i64, actor_id: i64, actor_name: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE work_orders
            SET assigned_to = $2, assigned_name = $3, assigned_at = NOW()
            WHERE id = $1 AND assigned_to IS NULL
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .bind(actor_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: i64,
        status: WorkOrderStatus,
        entry: HistoryEntry,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE work_orders SET status = $2, history = history || $3 WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(sqlx::types::Json(&entry))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn archive(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let copied = sqlx::query(
            r#"
            INSERT INTO work_orders_archive
            SELECT * FROM work_orders WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if copied.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Work order {} not found",
                id
            )));
        }

        sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_archive(&self) -> AppResult<Vec<WorkOrder>> {
        let rows = sqlx::query_as::<_, WorkOrderRow>(
            "SELECT * FROM work_orders_archive ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(WorkOrder::from).collect())
    }

    async fn get_archived(&self, id: i64) -> AppResult<Option<WorkOrder>> {
        let row =
            sqlx::query_as::<_, WorkOrderRow>("SELECT * FROM work_orders_archive WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(WorkOrder::from))
    }

    async fn restore(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let archived = sqlx::query("SELECT id FROM work_orders_archive WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if archived.is_none() {
            return Err(AppError::NotFound(format!(
                "Work order {} not found in archive",
                id
            )));
        }

        let restored = sqlx::query(
            r#"
            INSERT INTO work_orders
            SELECT * FROM work_orders_archive WHERE id = $1
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if restored.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "An active work order with this id already exists".to_string(),
            ));
        }

        sqlx::query("DELETE FROM work_orders_archive WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_open(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM work_orders WHERE status IN ('open', 'in_progress')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a migrated database; run with
    // DATABASE_URL=... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn restore_into_occupied_id_conflicts() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect(&url)
            .await
            .unwrap();
        let store = PgWorkOrderStore::new(pool.clone());

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO work_orders
                (number, machine_id, order_type, priority, description,
                 status, created_by, history)
            VALUES ('WO-TEST-OCCUPIED', 1, 'corrective', 'low',
                    'occupied id scenario', 'closed', 'tester', '[]')
            RETURNING id
            "#,
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO work_orders_archive SELECT * FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let err = store.restore(id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM work_orders_archive WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }
}
