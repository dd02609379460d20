use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::{ClientAccount, Contact, ContactStatus};

/// Row of the `accounts` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRow> for ClientAccount {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            is_active: row.is_active,
            contacts: Vec::new(),
        }
    }
}

/// Row of the `contacts` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub account_id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: String,
}

impl TryFrom<ContactRow> for Contact {
    type Error = String;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            account_id: row.account_id,
            name: row.name,
            email: row.email,
            status: row.status.parse::<ContactStatus>()?,
        })
    }
}
