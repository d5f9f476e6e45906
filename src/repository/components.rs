//! Components repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::component::{Component, NewComponent},
};

use super::ComponentStore;

#[derive(Clone)]
pub struct PgComponentStore {
    pool: Pool<Postgres>,
}

impl PgComponentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComponentStore for PgComponentStore {
    async fn insert(&self, component: NewComponent) -> AppResult<Component> {
        let row = sqlx::query_as::<_, Component>(
            r#"
            INSERT INTO components
                (machine_id, code, name, install_date, status,
                 lifetime_hours, lifetime_cycles, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(component.machine_id)
        .bind(&component.code)
        .bind(&component.name)
        .bind(&component.install_date)
        .bind(&component.status)
        .bind(component.lifetime_hours)
        .bind(component.lifetime_cycles)
        .bind(&component.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Component>> {
        let component = sqlx::query_as::<_, Component>("SELECT * FROM components WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(component)
    }

    async fn list(&self) -> AppResult<Vec<Component>> {
        let components =
            sqlx::query_as::<_, Component>("SELECT * FROM components ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(components)
    }

    async fn list_by_machine(&self, machine_id: i64) -> AppResult<Vec<Component>> {
        let components = sqlx::query_as::<_, Component>(
            "SELECT * FROM components WHERE machine_id = $1 ORDER BY name ASC",
        )
        .bind(machine_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(components)
    }

    async fn update(&self, component: &Component) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE components
            SET code = $2, name = $3, install_date = $4, status = $5,
                lifetime_hours = $6, lifetime_cycles = $7, notes = $8
            WHERE id = $1
            "#,
        )
        .bind(component.id)
        .bind(&component.code)
        .bind(&component.name)
        .bind(&component.install_date)
        .bind(&component.status)
        .bind(component.lifetime_hours)
        .bind(component.lifetime_cycles)
        .bind(&component.notes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM components WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_machine(&self, machine_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM components WHERE machine_id = $1")
            .bind(machine_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM components")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
