use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Duration;
use std::sync::Arc;

use crate::auth::{
    Claims, ClientAccount, Contact, ContactStatus, JwtKeys, MemoryPrincipalStore, StaffUser,
};

/// Fixtures shared by the unit tests
pub const TEST_SECRET: &str = "unit-test-secret";

pub fn keys() -> JwtKeys {
    JwtKeys::new(TEST_SECRET).expect("test secret is not empty")
}

pub fn token_for(id: i64, kind: &str) -> String {
    keys()
        .sign(&Claims::new(id, kind, Duration::hours(24)))
        .expect("sign test token")
}

pub fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value"),
    );
    headers
}

pub fn staff(id: i64, is_active: bool) -> StaffUser {
    StaffUser {
        id,
        email: Some(format!("staff{}@example.com", id)),
        first_name: Some("Sam".to_string()),
        last_name: Some("Lee".to_string()),
        role: Some("admin".to_string()),
        department: Some("operations".to_string()),
        is_active,
    }
}

pub fn account(id: i64, is_active: bool) -> ClientAccount {
    ClientAccount {
        id,
        name: Some("Acme".to_string()),
        email: None,
        is_active,
        contacts: Vec::new(),
    }
}

pub fn contact(id: i64, account_id: i64, status: ContactStatus) -> Contact {
    Contact {
        id,
        account_id,
        name: None,
        email: None,
        status,
    }
}

/// Staff 42 (active), 43 (inactive); accounts 7 (active), 8 (inactive);
/// account 7 has contacts 1 and 4 active, 2 inactive, 3 pending.
pub async fn seeded_store() -> Arc<MemoryPrincipalStore> {
    let store = Arc::new(MemoryPrincipalStore::new());
    store.insert_staff_user(staff(42, true)).await;
    store.insert_staff_user(staff(43, false)).await;
    store.insert_account(account(7, true)).await;
    store.insert_account(account(8, false)).await;
    store.insert_contact(contact(1, 7, ContactStatus::Active)).await;
    store.insert_contact(contact(2, 7, ContactStatus::Inactive)).await;
    store.insert_contact(contact(3, 7, ContactStatus::Pending)).await;
    store.insert_contact(contact(4, 7, ContactStatus::Active)).await;
    store
}
