//! Maintenance schedules repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::schedule::{MaintenanceSchedule, NewSchedule},
};

use super::ScheduleStore;

#[derive(Clone)]
pub struct PgScheduleStore {
    pool: Pool<Postgres>,
}

impl PgScheduleStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for PgScheduleStore {
    async fn insert(&self, schedule: NewSchedule) -> AppResult<MaintenanceSchedule> {
        let row = sqlx::query_as::<_, MaintenanceSchedule>(
            r#"
            INSERT INTO maintenance_schedules
                (machine_id, machine_name, task, frequency_days,
                 last_done, next_due, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(schedule.machine_id)
        .bind(&schedule.machine_name)
        .bind(&schedule.task)
        .bind(schedule.frequency_days)
        .bind(schedule.last_done)
        .bind(schedule.next_due)
        .bind(&schedule.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get(&self, id: i64) -> AppResult<Option<MaintenanceSchedule>> {
        let schedule = sqlx::query_as::<_, MaintenanceSchedule>(
            "SELECT * FROM maintenance_schedules WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    async fn list(&self) -> AppResult<Vec<MaintenanceSchedule>> {
        let schedules = sqlx::query_as::<_, MaintenanceSchedule>(
            "SELECT * FROM maintenance_schedules ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(schedules)
    }

    async fn list_history(
        &self,
        machine_id: Option<i64>,
    ) -> AppResult<Vec<MaintenanceSchedule>> {
        let schedules = match machine_id {
            Some(machine_id) => {
                sqlx::query_as::<_, MaintenanceSchedule>(
                    r#"
                    SELECT * FROM maintenance_schedules
                    WHERE machine_id = $1
                    ORDER BY last_done DESC
                    "#,
                )
                .bind(machine_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MaintenanceSchedule>(
                    "SELECT * FROM maintenance_schedules ORDER BY last_done DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(schedules)
    }

    async fn update(&self, schedule: &MaintenanceSchedule) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE maintenance_schedules
            SET machine_id = $2, machine_name = $3, task = $4,
                frequency_days = $5, last_done = $6, next_due = $7
            WHERE id = $1
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.machine_id)
        .bind(&schedule.machine_name)
        .bind(&schedule.task)
        .bind(schedule.frequency_days)
        .bind(schedule.last_done)
        .bind(schedule.next_due)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM maintenance_schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn due_before(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<MaintenanceSchedule>> {
        let schedules = sqlx::query_as::<_, MaintenanceSchedule>(
            r#"
            SELECT * FROM maintenance_schedules
            WHERE next_due <= $1
            ORDER BY next_due ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(schedules)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_schedules WHERE next_due < $1")
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
