//! Dashboard statistics service

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::schedule::MaintenanceSchedule, repository::Repository};

/// Top-level dashboard counters
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_wo: i64,
    /// Work orders in `open` or `in_progress`
    pub open_wo: i64,
    pub overdue_tasks: i64,
    pub total_machines: i64,
    pub total_components: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        Ok(DashboardStats {
            total_wo: self.repository.work_orders.count().await?,
            open_wo: self.repository.work_orders.count_open().await?,
            overdue_tasks: self.repository.schedules.count_overdue(Utc::now()).await?,
            total_machines: self.repository.machines.count().await?,
            total_components: self.repository.components.count().await?,
        })
    }

    /// Schedules already due, capped at ten, soonest first
    pub async fn alerts(&self) -> AppResult<Vec<MaintenanceSchedule>> {
        self.repository.schedules.due_before(Utc::now(), 10).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            machine::CreateMachine,
            schedule::ScheduleInput,
            user::{Actor, Role},
            work_order::CreateWorkOrder,
        },
        services::{
            machines::MachineService, schedules::ScheduleService, work_orders::WorkOrderService,
        },
    };

    #[tokio::test]
    async fn dashboard_counts_reflect_repository_state() {
        let repository = Repository::in_memory();
        let machine = MachineService::new(repository.clone())
            .create(CreateMachine {
                code: "PRS-01".to_string(),
                name: "Press Line 1".to_string(),
                machine_type: "hydraulic press".to_string(),
                location: "Hall A".to_string(),
                install_date: "2022-06-01".to_string(),
                status: None,
            })
            .await
            .unwrap();

        let actor = Actor {
            id: 1,
            username: "sari".to_string(),
            role: Role::Supervisor,
        };
        WorkOrderService::new(repository.clone())
            .create(
                &actor,
                CreateWorkOrder {
                    machine_id: machine.id,
                    component_id: None,
                    order_type: "corrective".to_string(),
                    priority: "high".to_string(),
                    description: "Oil leak at main cylinder".to_string(),
                },
            )
            .await
            .unwrap();

        ScheduleService::new(repository.clone())
            .create(
                "sari",
                ScheduleInput {
                    machine_id: machine.id,
                    machine_name: machine.name.clone(),
                    task: "Grease main bearings".to_string(),
                    frequency_days: 30,
                    last_done: "2024-01-01".to_string(),
                },
            )
            .await
            .unwrap();

        let service = StatsService::new(repository);
        let stats = service.dashboard().await.unwrap();
        assert_eq!(stats.total_wo, 1);
        assert_eq!(stats.open_wo, 1);
        assert_eq!(stats.total_machines, 1);
        assert_eq!(stats.total_components, 0);
        assert_eq!(stats.overdue_tasks, 1);

        let alerts = service.alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
    }
}
