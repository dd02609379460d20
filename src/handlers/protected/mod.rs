// handlers/protected/mod.rs - Protected handlers
//
// Every route in here is wrapped by `AuthGate::protect`, so handlers can rely
// on `AuthContext` and `Principal` being present in the request extensions.
pub mod auth;
