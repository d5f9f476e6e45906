//! In-memory store implementing every entity interface.
//!
//! Backs the service unit tests. A single mutex over the whole state makes
//! the conditional claim/assign updates atomic, matching what the Postgres
//! implementation gets from single-statement UPDATEs. The lock is never held
//! across an await point.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        component::{Component, NewComponent},
        machine::{Machine, NewMachine},
        schedule::{MaintenanceSchedule, NewSchedule},
        user::{Role, User},
        work_order::{HistoryEntry, NewWorkOrder, WorkOrder, WorkOrderStatus},
    },
};

use super::{ComponentStore, MachineStore, ScheduleStore, UserStore, WorkOrderStore};

#[derive(Default)]
struct State {
    machines: HashMap<i64, Machine>,
    components: HashMap<i64, Component>,
    work_orders: HashMap<i64, WorkOrder>,
    work_orders_archive: HashMap<i64, WorkOrder>,
    schedules: HashMap<i64, MaintenanceSchedule>,
    users: HashMap<i64, User>,
    counters: HashMap<String, i64>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<State>,
}

#[async_trait]
impl MachineStore for InMemoryStore {
    async fn insert(&self, machine: NewMachine) -> AppResult<Machine> {
        let mut state = self.inner.lock().unwrap();
        let id = state.next_id();
        let machine = Machine {
            id,
            code: machine.code,
            name: machine.name,
            machine_type: machine.machine_type,
            location: machine.location,
            install_date: machine.install_date,
            status: machine.status,
            created_at: Utc::now(),
        };
        state.machines.insert(id, machine.clone());
        Ok(machine)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Machine>> {
        Ok(self.inner.lock().unwrap().machines.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Machine>> {
        let state = self.inner.lock().unwrap();
        let mut machines: Vec<Machine> = state.machines.values().cloned().collect();
        machines.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(machines)
    }

    async fn update(&self, machine: &Machine) -> AppResult<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.machines.get_mut(&machine.id) {
            Some(existing) => {
                *existing = machine.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().machines.remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.inner.lock().unwrap().machines.len() as i64)
    }
}

#[async_trait]
impl ComponentStore for InMemoryStore {
    async fn insert(&self, component: NewComponent) -> AppResult<Component> {
        let mut state = self.inner.lock().unwrap();
        let id = state.next_id();
        let component = Component {
            id,
            machine_id: component.machine_id,
            code: component.code,
            name: component.name,
            install_date: component.install_date,
            status: component.status,
            lifetime_hours: component.lifetime_hours,
            lifetime_cycles: component.lifetime_cycles,
            notes: component.notes,
            created_at: Utc::now(),
        };
        state.components.insert(id, component.clone());
        Ok(component)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Component>> {
        Ok(self.inner.lock().unwrap().components.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Component>> {
        let state = self.inner.lock().unwrap();
        let mut components: Vec<Component> = state.components.values().cloned().collect();
        components.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(components)
    }

    async fn list_by_machine(&self, machine_id: i64) -> AppResult<Vec<Component>> {
        let state = self.inner.lock().unwrap();
        let mut components: Vec<Component> = state
            .components
            .values()
            .filter(|c| c.machine_id == machine_id)
            .cloned()
            .collect();
        components.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(components)
    }

    async fn update(&self, component: &Component) -> AppResult<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.components.get_mut(&component.id) {
            Some(existing) => {
                *existing = component.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().components.remove(&id).is_some())
    }

    async fn delete_by_machine(&self, machine_id: i64) -> AppResult<u64> {
        let mut state = self.inner.lock().unwrap();
        let ids: Vec<i64> = state
            .components
            .values()
            .filter(|c| c.machine_id == machine_id)
            .map(|c| c.id)
            .collect();
        for id in &ids {
            state.components.remove(id);
        }
        Ok(ids.len() as u64)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.inner.lock().unwrap().components.len() as i64)
    }
}

#[async_trait]
impl WorkOrderStore for InMemoryStore {
    async fn next_sequence(&self, month: &str) -> AppResult<i64> {
        let mut state = self.inner.lock().unwrap();
        let seq = state.counters.entry(month.to_string()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn insert(&self, work_order: NewWorkOrder) -> AppResult<WorkOrder> {
        let mut state = self.inner.lock().unwrap();
        let id = state.next_id();
        let work_order = WorkOrder {
            id,
            number: work_order.number,
            machine_id: work_order.machine_id,
            component_id: work_order.component_id,
            order_type: work_order.order_type,
            priority: work_order.priority,
            description: work_order.description,
            status: WorkOrderStatus::Open,
            created_by: work_order.created_by,
            created_at: Utc::now(),
            assigned_to: None,
            assigned_name: None,
            assigned_at: None,
            history: work_order.history,
        };
        state.work_orders.insert(id, work_order.clone());
        Ok(work_order)
    }

    async fn get(&self, id: i64) -> AppResult<Option<WorkOrder>> {
        Ok(self.inner.lock().unwrap().work_orders.get(&id).cloned())
    }

    async fn list(
        &self,
        status: Option<WorkOrderStatus>,
        limit: i64,
    ) -> AppResult<Vec<WorkOrder>> {
        let state = self.inner.lock().unwrap();
        let mut orders: Vec<WorkOrder> = state
            .work_orders
            .values()
            .filter(|wo| status.map_or(true, |s| wo.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders.truncate(limit as usize);
        Ok(orders)
    }

    async fn try_claim(
        &self,
        id: i64,
        actor_id: i64,
        actor_name: &str,
        entry: HistoryEntry,
    ) -> AppResult<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.work_orders.get_mut(&id) {
            Some(wo) if wo.assigned_to.is_none() && wo.status == WorkOrderStatus::Open => {
                wo.assigned_to = Some(actor_id);
                wo.assigned_name = Some(actor_name.to_string());
                wo.assigned_at = Some(entry.timestamp);
                wo.status = WorkOrderStatus::InProgress;
                wo.history.push(entry);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_assign(&self, id: i64, actor_id: i64, actor_name: &str) -> AppResult<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.work_orders.get_mut(&id) {
            Some(wo) if wo.assigned_to.is_none() => {
                wo.assigned_to = Some(actor_id);
                wo.assigned_name = Some(actor_name.to_string());
                wo.assigned_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_status(
        &self,
        id: i64,
        status: WorkOrderStatus,
        entry: HistoryEntry,
    ) -> AppResult<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.work_orders.get_mut(&id) {
            Some(wo) => {
                wo.status = status;
                wo.history.push(entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().work_orders.remove(&id).is_some())
    }

    async fn archive(&self, id: i64) -> AppResult<()> {
        let mut state = self.inner.lock().unwrap();
        match state.work_orders.remove(&id) {
            Some(wo) => {
                state.work_orders_archive.insert(id, wo);
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Work order {} not found", id))),
        }
    }

    async fn list_archive(&self) -> AppResult<Vec<WorkOrder>> {
        let state = self.inner.lock().unwrap();
        let mut orders: Vec<WorkOrder> = state.work_orders_archive.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn get_archived(&self, id: i64) -> AppResult<Option<WorkOrder>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .work_orders_archive
            .get(&id)
            .cloned())
    }

    async fn restore(&self, id: i64) -> AppResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.work_orders.contains_key(&id) && state.work_orders_archive.contains_key(&id) {
            return Err(AppError::Conflict(
                "An active work order with this id already exists".to_string(),
            ));
        }
        match state.work_orders_archive.remove(&id) {
            Some(wo) => {
                state.work_orders.insert(id, wo);
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Work order {} not found in archive",
                id
            ))),
        }
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.inner.lock().unwrap().work_orders.len() as i64)
    }

    async fn count_open(&self) -> AppResult<i64> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .work_orders
            .values()
            .filter(|wo| {
                matches!(
                    wo.status,
                    WorkOrderStatus::Open | WorkOrderStatus::InProgress
                )
            })
            .count() as i64)
    }
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn insert(&self, schedule: NewSchedule) -> AppResult<MaintenanceSchedule> {
        let mut state = self.inner.lock().unwrap();
        let id = state.next_id();
        let schedule = MaintenanceSchedule {
            id,
            machine_id: schedule.machine_id,
            machine_name: schedule.machine_name,
            task: schedule.task,
            frequency_days: schedule.frequency_days,
            last_done: schedule.last_done,
            next_due: schedule.next_due,
            created_by: schedule.created_by,
            created_at: Utc::now(),
        };
        state.schedules.insert(id, schedule.clone());
        Ok(schedule)
    }

    async fn get(&self, id: i64) -> AppResult<Option<MaintenanceSchedule>> {
        Ok(self.inner.lock().unwrap().schedules.get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<MaintenanceSchedule>> {
        let state = self.inner.lock().unwrap();
        let mut schedules: Vec<MaintenanceSchedule> = state.schedules.values().cloned().collect();
        schedules.sort_by_key(|s| s.id);
        Ok(schedules)
    }

    async fn list_history(
        &self,
        machine_id: Option<i64>,
    ) -> AppResult<Vec<MaintenanceSchedule>> {
        let state = self.inner.lock().unwrap();
        let mut schedules: Vec<MaintenanceSchedule> = state
            .schedules
            .values()
            .filter(|s| machine_id.map_or(true, |m| s.machine_id == m))
            .cloned()
            .collect();
        schedules.sort_by(|a, b| b.last_done.cmp(&a.last_done));
        Ok(schedules)
    }

    async fn update(&self, schedule: &MaintenanceSchedule) -> AppResult<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.schedules.get_mut(&schedule.id) {
            Some(existing) => {
                *existing = schedule.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().schedules.remove(&id).is_some())
    }

    async fn due_before(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<MaintenanceSchedule>> {
        let state = self.inner.lock().unwrap();
        let mut schedules: Vec<MaintenanceSchedule> = state
            .schedules
            .values()
            .filter(|s| s.next_due <= now)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.next_due);
        schedules.truncate(limit as usize);
        Ok(schedules)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let state = self.inner.lock().unwrap();
        Ok(state.schedules.values().filter(|s| s.next_due < now).count() as i64)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert(&self, username: &str, password_hash: &str, role: Role) -> AppResult<User> {
        let mut state = self.inner.lock().unwrap();
        let id = state.next_id();
        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: Utc::now(),
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let state = self.inner.lock().unwrap();
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn update(&self, user: &User) -> AppResult<bool> {
        let mut state = self.inner.lock().unwrap();
        match state.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.inner.lock().unwrap().users.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_order(number: &str) -> NewWorkOrder {
        NewWorkOrder {
            number: number.to_string(),
            machine_id: 1,
            component_id: None,
            order_type: "corrective".to_string(),
            priority: "low".to_string(),
            description: "Replace worn belt".to_string(),
            created_by: "sari".to_string(),
            history: vec![HistoryEntry::new(WorkOrderStatus::Open, "sari", None)],
        }
    }

    #[tokio::test]
    async fn restore_into_occupied_id_conflicts() {
        let store = InMemoryStore::default();
        let orders: &dyn WorkOrderStore = &store;

        let wo = orders.insert(work_order("WO-2024-03-0001")).await.unwrap();
        orders.archive(wo.id).await.unwrap();

        // Re-occupy the active slot under the archived id
        {
            let mut state = store.inner.lock().unwrap();
            let archived = state.work_orders_archive.get(&wo.id).cloned().unwrap();
            state.work_orders.insert(wo.id, archived);
        }

        let err = orders.restore(wo.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Both copies survive a refused restore
        assert!(orders.get(wo.id).await.unwrap().is_some());
        assert!(orders.get_archived(wo.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn restore_of_unknown_id_is_not_found() {
        let store = InMemoryStore::default();
        let orders: &dyn WorkOrderStore = &store;
        let err = orders.restore(999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
