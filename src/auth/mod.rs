pub mod gate;
pub mod principal;
pub mod store;
pub mod token;

pub use gate::{extract_bearer_token, AuthError, AuthGate, AuthGateBuilder, GateError, GateMode};
pub use principal::{
    AuthContext, ClientAccount, Contact, ContactStatus, Principal, PrincipalKind, StaffUser,
};
pub use store::{MemoryPrincipalStore, PrincipalStore, StoreError};
pub use token::{Claims, JwtKeys, TokenError, DEFAULT_TOKEN_TTL_HOURS};
