//! Repository port - account storage abstraction

use std::time::Instant;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, TransferReceipt};

/// Account storage abstraction
///
/// Implementations (adapters) provide the actual persistence. Methods block
/// on I/O; async callers should run them on a blocking thread.
pub trait Repository: Send + Sync {
    /// Create the schema if it does not exist yet. Safe to call repeatedly.
    fn ensure_schema(&self) -> Result<()>;

    /// Insert a new account and populate `account.id` with the store-assigned key
    fn create_account(&self, account: &mut Account) -> Result<()>;

    /// Get account by id, `Error::NotFound` when absent
    fn get_account(&self, id: i64) -> Result<Account>;

    /// Get the account with the lowest id among those matching `email`
    fn get_account_by_email(&self, email: &str) -> Result<Account>;

    /// All accounts, ordered by id ascending
    fn get_accounts(&self) -> Result<Vec<Account>>;

    /// Hard delete, `Error::NotFound` when no row matched
    fn delete_account(&self, id: i64) -> Result<()>;

    /// Atomically move `amount` from one account to another
    fn transfer(&self, from: i64, to: i64, amount: i64) -> Result<TransferReceipt> {
        self.transfer_until(from, to, amount, None)
    }

    /// Same as [`transfer`](Self::transfer), but gives up with
    /// `Error::DeadlineExceeded` and applies nothing if `deadline` has passed
    /// by the time the change would be committed
    fn transfer_until(
        &self,
        from: i64,
        to: i64,
        amount: i64,
        deadline: Option<Instant>,
    ) -> Result<TransferReceipt>;
}

/// `Error::DeadlineExceeded` once `deadline` has passed
pub fn check_deadline(deadline: Option<Instant>) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded(
            "request deadline passed before commit".to_string(),
        )),
        _ => Ok(()),
    }
}
