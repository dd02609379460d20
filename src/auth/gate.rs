use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use super::principal::{
    AuthContext, ClientAccount, ContactStatus, Principal, PrincipalKind, StaffUser,
};
use super::store::PrincipalStore;
use super::token::{Claims, JwtKeys};

/// How far the gate goes after the signature checks out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    /// Attach the decoded claims as the principal, no store lookup
    TrustClaims,
    /// Look the principal up and require an active record
    VerifyRecord,
}

impl FromStr for GateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claims" | "trust_claims" => Ok(GateMode::TrustClaims),
            "store" | "verify_record" => Ok(GateMode::VerifyRecord),
            other => Err(format!("unknown gate mode '{}'", other)),
        }
    }
}

/// Rejections produced by the gate. All of them are terminal 401s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingCredential,

    /// Malformed, wrongly signed or expired. Callers cannot tell which.
    #[error("Invalid token")]
    InvalidCredential,

    #[error("Invalid token type")]
    UnknownPrincipalKind,

    #[error("User not found or inactive")]
    InactiveUser,

    #[error("Account not found or inactive")]
    InactiveAccount,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    pub fn to_json(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("record verification requires a principal store")]
    MissingStore,
}

enum Resolution {
    Claims,
    Store {
        store: Arc<dyn PrincipalStore>,
        attach_contacts: bool,
    },
}

struct GateInner {
    keys: JwtKeys,
    resolution: Resolution,
}

/// Request authentication gate.
///
/// Cheap to clone; all state is immutable and shared, so any number of
/// requests can be authenticated concurrently.
#[derive(Clone)]
pub struct AuthGate {
    inner: Arc<GateInner>,
}

impl AuthGate {
    pub fn builder(keys: JwtKeys, mode: GateMode) -> AuthGateBuilder {
        AuthGateBuilder {
            keys,
            mode,
            store: None,
            attach_contacts: true,
        }
    }

    /// Gate that trusts verified claims without a store lookup
    pub fn trust_claims(keys: JwtKeys) -> Self {
        Self {
            inner: Arc::new(GateInner {
                keys,
                resolution: Resolution::Claims,
            }),
        }
    }

    /// Gate that requires an active record behind every credential
    pub fn verify_records(keys: JwtKeys, store: Arc<dyn PrincipalStore>) -> Self {
        Self {
            inner: Arc::new(GateInner {
                keys,
                resolution: Resolution::Store {
                    store,
                    attach_contacts: true,
                },
            }),
        }
    }

    pub fn mode(&self) -> GateMode {
        match self.inner.resolution {
            Resolution::Claims => GateMode::TrustClaims,
            Resolution::Store { .. } => GateMode::VerifyRecord,
        }
    }

    /// Authenticate a request from its headers.
    ///
    /// The principal is derived from scratch on every call.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let token = extract_bearer_token(headers).ok_or(AuthError::MissingCredential)?;

        let claims = self.inner.keys.verify(token).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            AuthError::InvalidCredential
        })?;

        let kind = claims.kind.parse::<PrincipalKind>().map_err(|e| {
            tracing::warn!("Rejecting token for id {}: {}", claims.id, e);
            AuthError::UnknownPrincipalKind
        })?;

        let principal = match &self.inner.resolution {
            Resolution::Claims => principal_from_claims(kind, &claims),
            Resolution::Store { store, attach_contacts } => {
                resolve_from_store(store.as_ref(), kind, claims.id, *attach_contacts).await?
            }
        };

        tracing::debug!("Authenticated {} principal {}", principal.kind(), principal.id());

        Ok(AuthContext { principal, claims })
    }

    /// Put every route of `router` behind the gate
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(axum::middleware::from_fn_with_state(
            self.clone(),
            crate::middleware::auth::require_auth,
        ))
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").field("mode", &self.mode()).finish()
    }
}

pub struct AuthGateBuilder {
    keys: JwtKeys,
    mode: GateMode,
    store: Option<Arc<dyn PrincipalStore>>,
    attach_contacts: bool,
}

impl AuthGateBuilder {
    pub fn store(mut self, store: Arc<dyn PrincipalStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the account's active contacts to client principals
    pub fn attach_contacts(mut self, attach: bool) -> Self {
        self.attach_contacts = attach;
        self
    }

    pub fn build(self) -> Result<AuthGate, GateError> {
        let resolution = match self.mode {
            GateMode::TrustClaims => Resolution::Claims,
            GateMode::VerifyRecord => Resolution::Store {
                store: self.store.ok_or(GateError::MissingStore)?,
                attach_contacts: self.attach_contacts,
            },
        };

        Ok(AuthGate {
            inner: Arc::new(GateInner {
                keys: self.keys,
                resolution,
            }),
        })
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn principal_from_claims(kind: PrincipalKind, claims: &Claims) -> Principal {
    match kind {
        PrincipalKind::Internal => Principal::Internal(StaffUser::from_claims(claims)),
        PrincipalKind::Client => Principal::Client(ClientAccount::from_claims(claims)),
    }
}

async fn resolve_from_store(
    store: &dyn PrincipalStore,
    kind: PrincipalKind,
    id: i64,
    attach_contacts: bool,
) -> Result<Principal, AuthError> {
    let lookup_failed = |e: super::store::StoreError| {
        tracing::error!("Principal lookup failed for {} {}: {}", kind, id, e);
        AuthError::InvalidCredential
    };

    match kind {
        PrincipalKind::Internal => {
            let user = store
                .staff_user(id)
                .await
                .map_err(lookup_failed)?
                .filter(|user| user.is_active)
                .ok_or_else(|| {
                    tracing::warn!("Staff user {} not found or inactive", id);
                    AuthError::InactiveUser
                })?;

            Ok(Principal::Internal(user))
        }
        PrincipalKind::Client => {
            let mut account = store
                .client_account(id)
                .await
                .map_err(lookup_failed)?
                .filter(|account| account.is_active)
                .ok_or_else(|| {
                    tracing::warn!("Client account {} not found or inactive", id);
                    AuthError::InactiveAccount
                })?;

            if attach_contacts {
                account.contacts = store.account_contacts(id).await.map_err(lookup_failed)?;
                account.contacts.retain(|c| c.status == ContactStatus::Active);
            } else {
                account.contacts.clear();
            }

            Ok(Principal::Client(account))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryPrincipalStore;
    use crate::testing::{account, bearer, contact, keys, seeded_store, staff, token_for};
    use axum::http::HeaderValue;
    use chrono::Duration;

    async fn store_gate() -> (AuthGate, Arc<MemoryPrincipalStore>) {
        let store = seeded_store().await;
        let gate = AuthGate::verify_records(keys(), store.clone());
        (gate, store)
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&bearer("abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_bearer_token(&basic), None);

        let mut empty = HeaderMap::new();
        empty.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer_token(&empty), None);
    }

    #[test]
    fn test_gate_mode_parsing() {
        assert_eq!("claims".parse::<GateMode>(), Ok(GateMode::TrustClaims));
        assert_eq!("STORE".parse::<GateMode>(), Ok(GateMode::VerifyRecord));
        assert!("ldap".parse::<GateMode>().is_err());
    }

    #[test]
    fn test_verify_mode_requires_store() {
        let result = AuthGate::builder(keys(), GateMode::VerifyRecord).build();
        assert!(matches!(result, Err(GateError::MissingStore)));

        let gate = AuthGate::builder(keys(), GateMode::TrustClaims).build().unwrap();
        assert_eq!(gate.mode(), GateMode::TrustClaims);
    }

    #[test]
    fn test_rejection_body() {
        assert_eq!(
            AuthError::UnknownPrincipalKind.to_json(),
            json!({ "error": "Invalid token type" })
        );
        assert_eq!(AuthError::MissingCredential.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_token() {
        let (gate, store) = store_gate().await;
        let err = gate.authenticate(&HeaderMap::new()).await.unwrap_err();

        assert_eq!(err, AuthError::MissingCredential);
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_expired_and_forged_tokens_look_the_same() {
        let (gate, store) = store_gate().await;

        let expired = keys()
            .sign(&Claims::new(42, "internal", Duration::hours(-2)))
            .unwrap();
        let forged = JwtKeys::new("not-the-secret")
            .unwrap()
            .sign(&Claims::new(42, "internal", Duration::hours(24)))
            .unwrap();

        let expired_err = gate.authenticate(&bearer(&expired)).await.unwrap_err();
        let forged_err = gate.authenticate(&bearer(&forged)).await.unwrap_err();

        assert_eq!(expired_err, AuthError::InvalidCredential);
        assert_eq!(expired_err.to_json(), forged_err.to_json());
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_active_internal_user() {
        let (gate, _) = store_gate().await;
        let ctx = gate.authenticate(&bearer(&token_for(42, "internal"))).await.unwrap();

        assert_eq!(ctx.principal, Principal::Internal(staff(42, true)));
        assert_eq!(ctx.claims.id, 42);
    }

    #[tokio::test]
    async fn test_inactive_internal_user() {
        let (gate, _) = store_gate().await;

        let inactive = gate.authenticate(&bearer(&token_for(43, "internal"))).await;
        let missing = gate.authenticate(&bearer(&token_for(99, "internal"))).await;

        assert_eq!(inactive.unwrap_err(), AuthError::InactiveUser);
        assert_eq!(missing.unwrap_err(), AuthError::InactiveUser);
    }

    #[tokio::test]
    async fn test_client_gets_only_active_contacts() {
        let (gate, _) = store_gate().await;
        let ctx = gate.authenticate(&bearer(&token_for(7, "client"))).await.unwrap();

        let Principal::Client(account) = ctx.principal else {
            panic!("expected client principal");
        };
        let ids: Vec<i64> = account.contacts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!(account.contacts.iter().all(|c| c.status == ContactStatus::Active));
    }

    #[tokio::test]
    async fn test_client_without_contacts() {
        let store = Arc::new(MemoryPrincipalStore::new());
        store.insert_account(account(7, true)).await;
        store.insert_contact(contact(1, 7, ContactStatus::Active)).await;

        let gate = AuthGate::builder(keys(), GateMode::VerifyRecord)
            .store(store)
            .attach_contacts(false)
            .build()
            .unwrap();
        let ctx = gate.authenticate(&bearer(&token_for(7, "client"))).await.unwrap();

        assert_eq!(ctx.principal, Principal::Client(account(7, true)));
    }

    #[tokio::test]
    async fn test_inactive_account() {
        let (gate, _) = store_gate().await;
        let err = gate.authenticate(&bearer(&token_for(8, "client"))).await.unwrap_err();

        assert_eq!(err, AuthError::InactiveAccount);
        assert_eq!(err.to_string(), "Account not found or inactive");
    }

    #[tokio::test]
    async fn test_kind_decides_which_store_is_consulted() {
        let (gate, _) = store_gate().await;

        // Account 7 exists, staff user 7 does not.
        let err = gate.authenticate(&bearer(&token_for(7, "internal"))).await.unwrap_err();
        assert_eq!(err, AuthError::InactiveUser);

        // Staff user 42 exists, account 42 does not.
        let err = gate.authenticate(&bearer(&token_for(42, "client"))).await.unwrap_err();
        assert_eq!(err, AuthError::InactiveAccount);
    }

    #[tokio::test]
    async fn test_unknown_kind() {
        let (gate, store) = store_gate().await;
        let err = gate.authenticate(&bearer(&token_for(7, "bogus"))).await.unwrap_err();

        assert_eq!(err, AuthError::UnknownPrincipalKind);
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_store_outage_maps_to_invalid_token() {
        let (gate, store) = store_gate().await;
        store.set_unavailable(true);

        let err = gate.authenticate(&bearer(&token_for(42, "internal"))).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredential);
    }

    #[tokio::test]
    async fn test_same_token_same_outcome() {
        let (gate, store) = store_gate().await;
        let headers = bearer(&token_for(42, "internal"));

        let first = gate.authenticate(&headers).await.unwrap();
        let second = gate.authenticate(&headers).await.unwrap();

        assert_eq!(first.principal, second.principal);
        // No caching between calls.
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn test_trust_claims_skips_store() {
        let gate = AuthGate::trust_claims(keys());
        let claims = Claims::new(42, "internal", Duration::hours(1))
            .with_role("manager")
            .with_department("sales");
        let token = keys().sign(&claims).unwrap();

        let ctx = gate.authenticate(&bearer(&token)).await.unwrap();
        let Principal::Internal(user) = ctx.principal else {
            panic!("expected internal principal");
        };
        assert_eq!(user.id, 42);
        assert_eq!(user.role.as_deref(), Some("manager"));
        assert_eq!(user.department.as_deref(), Some("sales"));
    }

    #[tokio::test]
    async fn test_trust_claims_still_checks_kind() {
        let gate = AuthGate::trust_claims(keys());
        let err = gate.authenticate(&bearer(&token_for(1, "vendor"))).await.unwrap_err();

        assert_eq!(err, AuthError::UnknownPrincipalKind);
    }
}
