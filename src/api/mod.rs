//! API layer - proxy fallback, health probes and admin endpoints

pub mod admin;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod state;
pub mod types;

pub use router::create_router;
pub use state::AppState;
