//! Work order model, status machine vocabulary and projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

/// Work order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Open,
    InProgress,
    WaitingSparepart,
    Completed,
    Closed,
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "open",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::WaitingSparepart => "waiting_sparepart",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Closed => "closed",
        }
    }

    /// Statuses a caller may request through the status-update operation.
    /// `open` is only ever set at creation.
    pub const SETTABLE: &'static [WorkOrderStatus] = &[
        WorkOrderStatus::InProgress,
        WorkOrderStatus::WaitingSparepart,
        WorkOrderStatus::Completed,
        WorkOrderStatus::Closed,
    ];

    /// Statuses from which a work order may be archived
    pub fn is_archivable(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Closed)
    }
}

impl std::fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WorkOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(WorkOrderStatus::Open),
            "in_progress" => Ok(WorkOrderStatus::InProgress),
            "waiting_sparepart" => Ok(WorkOrderStatus::WaitingSparepart),
            "completed" => Ok(WorkOrderStatus::Completed),
            "closed" => Ok(WorkOrderStatus::Closed),
            _ => Err(format!("Invalid work order status: {}", s)),
        }
    }
}

// SQLx conversion for WorkOrderStatus (stored as TEXT)
impl sqlx::Type<Postgres> for WorkOrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for WorkOrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for WorkOrderStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// One entry of the append-only status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub status: WorkOrderStatus,
    pub timestamp: DateTime<Utc>,
    pub by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HistoryEntry {
    pub fn new(status: WorkOrderStatus, by: &str, note: Option<String>) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
            by: by.to_string(),
            note,
        }
    }
}

/// Internal row structure for database queries (history as JSONB)
#[derive(Debug, Clone, FromRow)]
pub struct WorkOrderRow {
    pub id: i64,
    pub number: String,
    pub machine_id: i64,
    pub component_id: Option<i64>,
    pub order_type: String,
    pub priority: String,
    pub description: String,
    pub status: WorkOrderStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub assigned_to: Option<i64>,
    pub assigned_name: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub history: sqlx::types::Json<Vec<HistoryEntry>>,
}

impl From<WorkOrderRow> for WorkOrder {
    fn from(row: WorkOrderRow) -> Self {
        WorkOrder {
            id: row.id,
            number: row.number,
            machine_id: row.machine_id,
            component_id: row.component_id,
            order_type: row.order_type,
            priority: row.priority,
            description: row.description,
            status: row.status,
            created_by: row.created_by,
            created_at: row.created_at,
            assigned_to: row.assigned_to,
            assigned_name: row.assigned_name,
            assigned_at: row.assigned_at,
            history: row.history.0,
        }
    }
}

/// The central mutable entity of the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkOrder {
    pub id: i64,
    /// Generated sequential number, `WO-<YYYY-MM>-<seq>`
    pub number: String,
    pub machine_id: i64,
    pub component_id: Option<i64>,
    pub order_type: String,
    pub priority: String,
    pub description: String,
    pub status: WorkOrderStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub assigned_to: Option<i64>,
    pub assigned_name: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    /// Append-only, chronologically ordered
    pub history: Vec<HistoryEntry>,
}

impl WorkOrder {
    /// Whether the given actor currently owns this work order
    pub fn is_owner(&self, actor_id: i64) -> bool {
        self.assigned_to == Some(actor_id)
    }
}

/// Fields needed to insert a new work order
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub number: String,
    pub machine_id: i64,
    pub component_id: Option<i64>,
    pub order_type: String,
    pub priority: String,
    pub description: String,
    pub created_by: String,
    pub history: Vec<HistoryEntry>,
}

/// Create work order request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWorkOrder {
    pub machine_id: i64,
    pub component_id: Option<i64>,
    #[validate(length(min = 1, message = "Work order type is required"))]
    pub order_type: String,
    #[validate(length(min = 1, message = "Priority is required"))]
    pub priority: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

/// Status update request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatus {
    pub status: String,
    pub note: Option<String>,
}

/// List/archive projection: work order enriched with display names
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkOrderSummary {
    pub id: i64,
    pub number: String,
    pub order_type: String,
    pub priority: String,
    pub status: WorkOrderStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub machine_id: i64,
    /// `"CODE - Name"`, or a placeholder when the machine is gone
    pub machine_name: String,
    /// `"CODE - Name"`, or `"-"` when there is no component
    pub component_name: String,
    pub assigned_name: Option<String>,
    pub history: Vec<HistoryEntry>,
}

/// Detail projection for a single work order
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkOrderDetail {
    #[serde(flatten)]
    pub work_order: WorkOrder,
    pub machine_name: String,
    pub component_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            WorkOrderStatus::Open,
            WorkOrderStatus::InProgress,
            WorkOrderStatus::WaitingSparepart,
            WorkOrderStatus::Completed,
            WorkOrderStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<WorkOrderStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<WorkOrderStatus>().is_err());
    }

    #[test]
    fn open_is_not_settable() {
        assert!(!WorkOrderStatus::SETTABLE.contains(&WorkOrderStatus::Open));
        assert_eq!(WorkOrderStatus::SETTABLE.len(), 4);
    }

    #[test]
    fn only_completed_and_closed_are_archivable() {
        assert!(WorkOrderStatus::Completed.is_archivable());
        assert!(WorkOrderStatus::Closed.is_archivable());
        assert!(!WorkOrderStatus::Open.is_archivable());
        assert!(!WorkOrderStatus::InProgress.is_archivable());
        assert!(!WorkOrderStatus::WaitingSparepart.is_archivable());
    }
}
