use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

use super::principal::{ClientAccount, Contact, StaffUser};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("principal store unavailable: {0}")]
    Unavailable(String),

    #[error("principal store query failed: {0}")]
    Backend(String),
}

/// Read-only lookup of the records a credential can refer to
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn staff_user(&self, id: i64) -> Result<Option<StaffUser>, StoreError>;

    async fn client_account(&self, id: i64) -> Result<Option<ClientAccount>, StoreError>;

    async fn account_contacts(&self, account_id: i64) -> Result<Vec<Contact>, StoreError>;
}

/// In-process store for tests and local fixtures
#[derive(Default)]
pub struct MemoryPrincipalStore {
    staff_users: RwLock<HashMap<i64, StaffUser>>,
    accounts: RwLock<HashMap<i64, ClientAccount>>,
    contacts: RwLock<Vec<Contact>>,
    unavailable: AtomicBool,
    lookups: AtomicUsize,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_staff_user(&self, user: StaffUser) {
        self.staff_users.write().await.insert(user.id, user);
    }

    pub async fn insert_account(&self, account: ClientAccount) {
        self.accounts.write().await.insert(account.id, account);
    }

    pub async fn insert_contact(&self, contact: Contact) {
        self.contacts.write().await.push(contact);
    }

    /// Make every lookup fail, simulating an outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of lookups served so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn staff_user(&self, id: i64) -> Result<Option<StaffUser>, StoreError> {
        self.check_available()?;
        Ok(self.staff_users.read().await.get(&id).cloned())
    }

    async fn client_account(&self, id: i64) -> Result<Option<ClientAccount>, StoreError> {
        self.check_available()?;
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    // Returns every contact of the account; status filtering is the gate's job.
    async fn account_contacts(&self, account_id: i64) -> Result<Vec<Contact>, StoreError> {
        self.check_available()?;
        Ok(self
            .contacts
            .read()
            .await
            .iter()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect())
    }
}
