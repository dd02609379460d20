use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::{ClientAccount, Contact, PrincipalStore, StaffUser, StoreError};
use crate::database::models::{AccountRow, ContactRow, StaffUserRow};

/// PostgreSQL-backed principal lookups. Read-only.
#[derive(Clone, Debug)]
pub struct PgPrincipalStore {
    pool: PgPool,
}

impl PgPrincipalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend_error(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    async fn staff_user(&self, id: i64) -> Result<Option<StaffUser>, StoreError> {
        let query = r#"
            SELECT
                id, email, first_name, last_name, role, department,
                is_active, created_at, updated_at
            FROM staff_users
            WHERE id = $1
        "#;

        let row = sqlx::query_as::<_, StaffUserRow>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(row.map(StaffUser::from))
    }

    async fn client_account(&self, id: i64) -> Result<Option<ClientAccount>, StoreError> {
        let query = r#"
            SELECT id, name, email, is_active, created_at, updated_at
            FROM accounts
            WHERE id = $1
        "#;

        let row = sqlx::query_as::<_, AccountRow>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(row.map(ClientAccount::from))
    }

    async fn account_contacts(&self, account_id: i64) -> Result<Vec<Contact>, StoreError> {
        let query = r#"
            SELECT id, account_id, name, email, status
            FROM contacts
            WHERE account_id = $1
            AND status = 'ACTIVE'
            ORDER BY id
        "#;

        let rows = sqlx::query_as::<_, ContactRow>(query)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(backend_error)?;

        let contacts = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                Contact::try_from(row)
                    .map_err(|e| tracing::warn!("Skipping contact {}: {}", id, e))
                    .ok()
            })
            .collect();

        Ok(contacts)
    }
}
