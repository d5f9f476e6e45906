//! Business logic services

pub mod components;
pub mod machines;
pub mod schedules;
pub mod stats;
pub mod users;
pub mod work_orders;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UserService,
    pub machines: machines::MachineService,
    pub components: components::ComponentService,
    pub work_orders: work_orders::WorkOrderService,
    pub schedules: schedules::ScheduleService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            users: users::UserService::new(repository.clone(), auth_config),
            machines: machines::MachineService::new(repository.clone()),
            components: components::ComponentService::new(repository.clone()),
            work_orders: work_orders::WorkOrderService::new(repository.clone()),
            schedules: schedules::ScheduleService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
