use axum::extract::Extension;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{AuthContext, Contact, Principal};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user: Principal,
    pub expires_at: Option<String>,
}

/// GET /api/auth/whoami - The principal the gate resolved for this request
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user": { "type": "internal", "id": 42, "email": "...", "isActive": true },
///     "expires_at": "2025-01-02T12:00:00+00:00"
///   }
/// }
/// ```
pub async fn whoami(context: Option<Extension<AuthContext>>) -> ApiResult<WhoamiResponse> {
    let Extension(context) = context.ok_or_else(|| {
        ApiError::internal_server_error("Authentication context missing from request")
    })?;

    let expires_at = DateTime::<Utc>::from_timestamp(context.claims.exp, 0).map(|t| t.to_rfc3339());

    Ok(ApiResponse::success(WhoamiResponse {
        user: context.principal,
        expires_at,
    }))
}

/// GET /api/auth/contacts - Active contacts of the calling client account
pub async fn contacts(Extension(principal): Extension<Principal>) -> ApiResult<Vec<Contact>> {
    match principal {
        Principal::Client(account) => Ok(ApiResponse::success(account.contacts)),
        Principal::Internal(user) => {
            tracing::debug!("Staff user {} requested client contacts", user.id);
            Err(ApiError::forbidden("Only client accounts have contacts"))
        }
    }
}
