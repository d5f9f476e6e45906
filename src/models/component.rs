//! Component model and request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Component wear status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Good,
    Warning,
    Critical,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Good => "good",
            ComponentStatus::Warning => "warning",
            ComponentStatus::Critical => "critical",
        }
    }
}

impl std::str::FromStr for ComponentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "good" => Ok(ComponentStatus::Good),
            "warning" => Ok(ComponentStatus::Warning),
            "critical" => Ok(ComponentStatus::Critical),
            _ => Err(format!("Invalid component status: {}", s)),
        }
    }
}

/// Machine component, owned by exactly one machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Component {
    pub id: i64,
    pub machine_id: i64,
    /// Component code, stored uppercase
    pub code: String,
    pub name: String,
    pub install_date: String,
    pub status: String,
    pub lifetime_hours: i64,
    pub lifetime_cycles: i64,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Component {
    /// Display label used by work-order projections
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// Normalized fields for inserting a component
#[derive(Debug, Clone)]
pub struct NewComponent {
    pub machine_id: i64,
    pub code: String,
    pub name: String,
    pub install_date: String,
    pub status: String,
    pub lifetime_hours: i64,
    pub lifetime_cycles: i64,
    pub notes: String,
}

/// Create component request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateComponent {
    #[validate(length(min = 1, message = "Component code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "Component name is required"))]
    pub name: String,
    pub install_date: Option<String>,
    pub status: Option<String>,
    pub lifetime_hours: Option<i64>,
    pub lifetime_cycles: Option<i64>,
    pub notes: Option<String>,
}

/// Update component request; absent fields are left untouched
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateComponent {
    pub code: Option<String>,
    pub name: Option<String>,
    pub install_date: Option<String>,
    pub status: Option<String>,
    pub lifetime_hours: Option<i64>,
    pub lifetime_cycles: Option<i64>,
    pub notes: Option<String>,
}
