// handlers/public/mod.rs - Public handlers (no authentication required)
pub mod system;

pub use system::{health, root};
