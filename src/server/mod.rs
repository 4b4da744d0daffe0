//! HTTP surface: `/ask`, `/keep-alive` and `/health` over shared, read-only client state.

mod errors;
mod handlers;
mod router;
mod state;

pub use router::router;
pub use state::AppState;
