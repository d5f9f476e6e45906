//! Maintenance schedule model and derived views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Recurring preventive-maintenance task for one machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaintenanceSchedule {
    pub id: i64,
    pub machine_id: i64,
    /// Denormalized for display; not re-joined at read time
    pub machine_name: String,
    pub task: String,
    pub frequency_days: i32,
    pub last_done: DateTime<Utc>,
    /// Always `last_done + frequency_days`, persisted redundantly
    pub next_due: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Urgency bucket derived from the days remaining until `next_due`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyBucket {
    Overdue,
    DueSoon,
    OnTrack,
}

impl UrgencyBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyBucket::Overdue => "overdue",
            UrgencyBucket::DueSoon => "due_soon",
            UrgencyBucket::OnTrack => "on_track",
        }
    }
}

/// Normalized fields for inserting a schedule
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub machine_id: i64,
    pub machine_name: String,
    pub task: String,
    pub frequency_days: i32,
    pub last_done: DateTime<Utc>,
    pub next_due: DateTime<Utc>,
    pub created_by: String,
}

/// Fields shared by schedule create and update requests
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ScheduleInput {
    pub machine_id: i64,
    #[validate(length(min = 1, message = "Machine name is required"))]
    pub machine_name: String,
    #[validate(length(min = 1, message = "Task is required"))]
    pub task: String,
    pub frequency_days: i32,
    /// RFC 3339 timestamp or plain `YYYY-MM-DD` date
    pub last_done: String,
}

/// Schedule annotated with days left and urgency, for listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleWithStatus {
    pub id: i64,
    pub machine_name: String,
    pub task: String,
    pub frequency_days: i32,
    /// `%d %b %Y`
    pub last_done: String,
    /// `%d %b %Y`
    pub next_due: String,
    pub days_left: i64,
    pub status: UrgencyBucket,
}

/// Aggregate counts over all schedules
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaintenanceStats {
    pub overdue_maintenance: i64,
    pub due_today: i64,
    pub upcoming_soon: i64,
    pub total_schedules: i64,
}

/// History view: schedules sorted by last completion, with a presentational
/// label (`Completed` when the next due date has not passed yet)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleHistoryEntry {
    pub id: i64,
    pub machine_id: i64,
    pub machine_name: String,
    pub task: String,
    pub frequency_days: i32,
    /// `%d %B %Y`
    pub last_done: String,
    /// `%d %B %Y`
    pub next_due: String,
    pub status: String,
}
