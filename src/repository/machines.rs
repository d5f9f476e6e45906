//! Machines repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::machine::{Machine, NewMachine},
};

use super::MachineStore;

#[derive(Clone)]
pub struct PgMachineStore {
    pool: Pool<Postgres>,
}

impl PgMachineStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MachineStore for PgMachineStore {
    async fn insert(&self, machine: NewMachine) -> AppResult<Machine> {
        let row = sqlx::query_as::<_, Machine>(
            r#"
            INSERT INTO machines (code, name, machine_type, location, install_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&machine.code)
        .bind(&machine.name)
        .bind(&machine.machine_type)
        .bind(&machine.location)
        .bind(&machine.install_date)
        .bind(&machine.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Machine>> {
        let machine = sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(machine)
    }

    async fn list(&self) -> AppResult<Vec<Machine>> {
        let machines =
            sqlx::query_as::<_, Machine>("SELECT * FROM machines ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(machines)
    }

    async fn update(&self, machine: &Machine) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE machines
            SET code = $2, name = $3, machine_type = $4, location = $5,
                install_date = $6, status = $7
            WHERE id = $1
            "#,
        )
        .bind(machine.id)
        .bind(&machine.code)
        .bind(&machine.name)
        .bind(&machine.machine_type)
        .bind(&machine.location)
        .bind(&machine.install_date)
        .bind(&machine.status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM machines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM machines")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
