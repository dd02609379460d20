pub mod manager;
pub mod models;
pub mod store;

pub use manager::{Database, DatabaseError};
pub use store::PgPrincipalStore;
