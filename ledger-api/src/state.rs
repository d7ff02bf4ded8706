//! Shared handler state

use std::sync::Arc;

use ledger_core::services::AccountService;
use ledger_core::LedgerContext;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(accounts: AccountService) -> Self {
        Self {
            accounts: Arc::new(accounts),
        }
    }

    pub fn from_context(context: &LedgerContext) -> Self {
        Self::new(context.account_service.clone())
    }

    /// Run a storage-bound call on the blocking pool
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&AccountService) -> ledger_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let accounts = Arc::clone(&self.accounts);
        tokio::task::spawn_blocking(move || f(&accounts))
            .await
            .map_err(|e| ApiError::Internal(format!("storage task failed: {}", e)))?
            .map_err(ApiError::from)
    }
}
