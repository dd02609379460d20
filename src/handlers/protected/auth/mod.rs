pub mod session;

// Re-export handler functions for use in routing
pub use session::contacts as session_contacts;
pub use session::whoami as session_whoami;
