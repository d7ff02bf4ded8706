//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions.

mod accounts;
mod token;

pub use accounts::{AccountService, CreatedAccount, LoginResult};
pub use token::{Claims, TokenService};
