use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::token::Claims;

/// Which store a credential's `id` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Internal,
    Client,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Internal => "internal",
            PrincipalKind::Client => "client",
        }
    }
}

impl FromStr for PrincipalKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(PrincipalKind::Internal),
            "client" => Ok(PrincipalKind::Client),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown principal kind '{0}'")]
pub struct UnknownKind(pub String);

/// Staff member of the admin / CRM side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

impl StaffUser {
    /// Principal built straight from claims, used when the gate trusts the token.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email.clone(),
            first_name: None,
            last_name: None,
            role: claims.role.clone(),
            department: claims.department.clone(),
            is_active: true,
        }
    }
}

/// Client organisation using the portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAccount {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl ClientAccount {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.id,
            name: None,
            email: claims.email.clone(),
            is_active: true,
            contacts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub account_id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: ContactStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContactStatus {
    Active,
    Inactive,
    Pending,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Active => "ACTIVE",
            ContactStatus::Inactive => "INACTIVE",
            ContactStatus::Pending => "PENDING",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ContactStatus::Active),
            "INACTIVE" => Ok(ContactStatus::Inactive),
            "PENDING" => Ok(ContactStatus::Pending),
            other => Err(format!("unknown contact status '{}'", other)),
        }
    }
}

/// Identity resolved from a verified credential.
///
/// Serializes flat with a `type` tag, e.g. `{"type": "internal", "id": 42, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Principal {
    Internal(StaffUser),
    Client(ClientAccount),
}

impl Principal {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Internal(_) => PrincipalKind::Internal,
            Principal::Client(_) => PrincipalKind::Client,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Principal::Internal(user) => user.id,
            Principal::Client(account) => account.id,
        }
    }
}

/// Attached to every request that passes the gate
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub claims: Claims,
}
