//! Core domain entities
//!
//! Pure data structures and ledger rules - no I/O.

mod account;
mod request;
pub mod result;
mod transfer;

pub use account::{Account, ACCOUNT_NUMBER_RANGE};
pub use request::{decode_json, CreateAccountRequest, LoginRequest, TransferRequest};
pub use transfer::{apply_transfer, OverdraftPolicy, TransferReceipt};
