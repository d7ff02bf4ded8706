//! HTTP front-end for the account ledger
//!
//! ```text
//! request → router → (token guard) → handler → AccountService → Repository
//! ```
//! Handlers answer with JSON; failures use the `{"error": ...}` envelope.

pub mod deadline;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
