#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

use portal_api::auth::{
    Claims, ClientAccount, Contact, ContactStatus, JwtKeys, MemoryPrincipalStore, StaffUser,
};

pub const SECRET: &str = "integration-test-secret";

pub fn keys() -> JwtKeys {
    JwtKeys::new(SECRET).expect("non-empty secret")
}

pub fn sign(claims: &Claims) -> String {
    keys().sign(claims).expect("sign token")
}

pub fn token(id: i64, kind: &str) -> String {
    sign(&Claims::new(id, kind, Duration::hours(24)))
}

pub fn staff(id: i64, is_active: bool) -> StaffUser {
    StaffUser {
        id,
        email: Some(format!("user{}@example.com", id)),
        first_name: Some("Robin".to_string()),
        last_name: Some("Park".to_string()),
        role: Some("manager".to_string()),
        department: Some("accounts".to_string()),
        is_active,
    }
}

pub fn account(id: i64, is_active: bool) -> ClientAccount {
    ClientAccount {
        id,
        name: Some(format!("Account {}", id)),
        email: Some(format!("billing{}@example.com", id)),
        is_active,
        contacts: Vec::new(),
    }
}

pub fn contact(id: i64, account_id: i64, status: ContactStatus) -> Contact {
    Contact {
        id,
        account_id,
        name: Some(format!("Contact {}", id)),
        email: None,
        status,
    }
}

/// Staff 42 active, 43 inactive; account 7 active with mixed contacts, 8 inactive.
pub async fn seeded_store() -> Arc<MemoryPrincipalStore> {
    let store = Arc::new(MemoryPrincipalStore::new());
    store.insert_staff_user(staff(42, true)).await;
    store.insert_staff_user(staff(43, false)).await;
    store.insert_account(account(7, true)).await;
    store.insert_account(account(8, false)).await;
    store.insert_contact(contact(100, 7, ContactStatus::Active)).await;
    store.insert_contact(contact(101, 7, ContactStatus::Inactive)).await;
    store.insert_contact(contact(102, 7, ContactStatus::Active)).await;
    store.insert_contact(contact(103, 7, ContactStatus::Pending)).await;
    store.insert_contact(contact(200, 8, ContactStatus::Active)).await;
    store
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("build request")
}

/// Drive one request through the router and decode the JSON body
pub async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}
