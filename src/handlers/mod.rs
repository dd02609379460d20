// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) and Protected (behind the auth gate).
pub mod protected; // Gate required (/api/*)
pub mod public;    // No authentication (/, /health)
