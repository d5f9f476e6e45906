//! Repository layer: one store interface per entity.
//!
//! Core logic depends only on these traits. `Repository::postgres` wires the
//! sqlx-backed implementations; `Repository::in_memory` wires the in-memory
//! store used by service tests.

pub mod components;
pub mod machines;
pub mod memory;
pub mod schedules;
pub mod users;
pub mod work_orders;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        component::{Component, NewComponent},
        machine::{Machine, NewMachine},
        schedule::{MaintenanceSchedule, NewSchedule},
        user::{Role, User},
        work_order::{HistoryEntry, NewWorkOrder, WorkOrder, WorkOrderStatus},
    },
};

#[async_trait]
pub trait MachineStore: Send + Sync {
    async fn insert(&self, machine: NewMachine) -> AppResult<Machine>;
    async fn get(&self, id: i64) -> AppResult<Option<Machine>>;
    /// Newest first
    async fn list(&self) -> AppResult<Vec<Machine>>;
    /// Full-row update; returns false when the machine does not exist
    async fn update(&self, machine: &Machine) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait ComponentStore: Send + Sync {
    async fn insert(&self, component: NewComponent) -> AppResult<Component>;
    async fn get(&self, id: i64) -> AppResult<Option<Component>>;
    async fn list(&self) -> AppResult<Vec<Component>>;
    /// Name ascending
    async fn list_by_machine(&self, machine_id: i64) -> AppResult<Vec<Component>>;
    async fn update(&self, component: &Component) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
    /// Cascade helper; returns the number of components removed
    async fn delete_by_machine(&self, machine_id: i64) -> AppResult<u64>;
    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    /// Atomically advance and return the per-month sequence counter
    async fn next_sequence(&self, month: &str) -> AppResult<i64>;
    async fn insert(&self, work_order: NewWorkOrder) -> AppResult<WorkOrder>;
    async fn get(&self, id: i64) -> AppResult<Option<WorkOrder>>;
    /// Newest first, capped at `limit`
    async fn list(
        &self,
        status: Option<WorkOrderStatus>,
        limit: i64,
    ) -> AppResult<Vec<WorkOrder>>;
    /// Conditional claim: succeeds only while the work order is unassigned
    /// AND still `open`. Sets assignment, moves to `in_progress` and appends
    /// the history entry in a single storage update.
    async fn try_claim(
        &self,
        id: i64,
        actor_id: i64,
        actor_name: &str,
        entry: HistoryEntry,
    ) -> AppResult<bool>;
    /// Conditional assignment only (auto-claim path): succeeds only while
    /// the work order is unassigned. Does not touch status or history.
    async fn try_assign(&self, id: i64, actor_id: i64, actor_name: &str) -> AppResult<bool>;
    /// Set status and append the history entry in one update
    async fn set_status(
        &self,
        id: i64,
        status: WorkOrderStatus,
        entry: HistoryEntry,
    ) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
    /// Move active -> archive; both steps appear atomic to readers
    async fn archive(&self, id: i64) -> AppResult<()>;
    async fn list_archive(&self) -> AppResult<Vec<WorkOrder>>;
    async fn get_archived(&self, id: i64) -> AppResult<Option<WorkOrder>>;
    /// Move archive -> active; fails with `Conflict` when an active record
    /// with the same id already exists
    async fn restore(&self, id: i64) -> AppResult<()>;
    async fn count(&self) -> AppResult<i64>;
    /// Work orders in `open` or `in_progress`
    async fn count_open(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn insert(&self, schedule: NewSchedule) -> AppResult<MaintenanceSchedule>;
    async fn get(&self, id: i64) -> AppResult<Option<MaintenanceSchedule>>;
    async fn list(&self) -> AppResult<Vec<MaintenanceSchedule>>;
    /// Sorted by `last_done` descending, optionally filtered by machine
    async fn list_history(&self, machine_id: Option<i64>)
        -> AppResult<Vec<MaintenanceSchedule>>;
    async fn update(&self, schedule: &MaintenanceSchedule) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
    /// Schedules due at or before `now`, capped at `limit`
    async fn due_before(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<MaintenanceSchedule>>;
    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, username: &str, password_hash: &str, role: Role) -> AppResult<User>;
    async fn get(&self, id: i64) -> AppResult<Option<User>>;
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn list(&self) -> AppResult<Vec<User>>;
    async fn update(&self, user: &User) -> AppResult<bool>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

/// Main repository struct bundling the per-entity stores
#[derive(Clone)]
pub struct Repository {
    pub machines: Arc<dyn MachineStore>,
    pub components: Arc<dyn ComponentStore>,
    pub work_orders: Arc<dyn WorkOrderStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    /// Create a repository backed by the given Postgres pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            machines: Arc::new(machines::PgMachineStore::new(pool.clone())),
            components: Arc::new(components::PgComponentStore::new(pool.clone())),
            work_orders: Arc::new(work_orders::PgWorkOrderStore::new(pool.clone())),
            schedules: Arc::new(schedules::PgScheduleStore::new(pool.clone())),
            users: Arc::new(users::PgUserStore::new(pool)),
        }
    }

    /// Create a repository backed by the in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::InMemoryStore::default());
        Self {
            machines: store.clone(),
            components: store.clone(),
            work_orders: store.clone(),
            schedules: store.clone(),
            users: store,
        }
    }
}
