//! Machine model and request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Industrial machine tracked by the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Machine {
    pub id: i64,
    /// Unique identity code, stored uppercase
    pub code: String,
    pub name: String,
    pub machine_type: String,
    pub location: String,
    pub install_date: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Machine {
    /// Display label used by work-order projections
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// Normalized fields for inserting a machine
#[derive(Debug, Clone)]
pub struct NewMachine {
    pub code: String,
    pub name: String,
    pub machine_type: String,
    pub location: String,
    pub install_date: String,
    pub status: String,
}

/// Create machine request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMachine {
    #[validate(length(min = 1, message = "Machine code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "Machine name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Machine type is required"))]
    pub machine_type: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[validate(length(min = 1, message = "Install date is required"))]
    pub install_date: String,
    pub status: Option<String>,
}

/// Update machine request; blank fields are ignored
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMachine {
    pub code: Option<String>,
    pub name: Option<String>,
    pub machine_type: Option<String>,
    pub location: Option<String>,
    pub install_date: Option<String>,
    pub status: Option<String>,
}
