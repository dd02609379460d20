use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::StaffUser;

/// Row of the `staff_users` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StaffUserRow {
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StaffUserRow> for StaffUser {
    fn from(row: StaffUserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role,
            department: row.department,
            is_active: row.is_active,
        }
    }
}
