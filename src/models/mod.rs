//! Data models for the CMMS server

pub mod component;
pub mod machine;
pub mod schedule;
pub mod user;
pub mod work_order;

// Re-export commonly used types
pub use component::Component;
pub use machine::Machine;
pub use schedule::{MaintenanceSchedule, UrgencyBucket};
pub use user::{Actor, Role, User};
pub use work_order::{HistoryEntry, WorkOrder, WorkOrderStatus};
