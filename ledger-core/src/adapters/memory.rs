//! In-memory repository - backs tests and throwaway servers without a database

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use crate::domain::result::{Error, Result};
use crate::domain::{apply_transfer, Account, OverdraftPolicy, TransferReceipt};
use crate::ports::{check_deadline, Repository};

#[derive(Default)]
struct State {
    next_id: i64,
    accounts: BTreeMap<i64, Account>,
}

/// Repository keeping accounts in a map, keyed and ordered by id
pub struct MemoryRepository {
    state: Mutex<State>,
    overdraft: OverdraftPolicy,
}

impl MemoryRepository {
    pub fn new(overdraft: OverdraftPolicy) -> Self {
        Self {
            state: Mutex::new(State::default()),
            overdraft,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| Error::database(format!("state lock poisoned: {}", e)))
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new(OverdraftPolicy::default())
    }
}

impl Repository for MemoryRepository {
    fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    fn create_account(&self, account: &mut Account) -> Result<()> {
        let mut state = self.lock()?;
        state.next_id += 1;
        account.id = state.next_id;
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn get_account(&self, id: i64) -> Result<Account> {
        self.lock()?
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("account {}", id)))
    }

    fn get_account_by_email(&self, email: &str) -> Result<Account> {
        self.lock()?
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("account {}", email)))
    }

    fn get_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.lock()?.accounts.values().cloned().collect())
    }

    fn delete_account(&self, id: i64) -> Result<()> {
        self.lock()?
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("account {}", id)))
    }

    fn transfer_until(
        &self,
        from: i64,
        to: i64,
        amount: i64,
        deadline: Option<Instant>,
    ) -> Result<TransferReceipt> {
        let mut state = self.lock()?;

        // Work on copies so a rejected transfer leaves the map untouched
        let mut source = state
            .accounts
            .get(&from)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("account {}", from)))?;
        let mut destination = state
            .accounts
            .get(&to)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("account {}", to)))?;

        let receipt = apply_transfer(&mut source, &mut destination, amount, self.overdraft)?;
        check_deadline(deadline)?;

        state.accounts.insert(source.id, source);
        state.accounts.insert(destination.id, destination);
        Ok(receipt)
    }
}
