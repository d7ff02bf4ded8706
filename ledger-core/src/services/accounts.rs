//! Account service - account lifecycle, login and access checks

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{Account, CreateAccountRequest, LoginRequest, TransferReceipt};
use crate::ports::Repository;
use crate::services::{Claims, TokenService};

/// A newly created account together with its first token
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    pub account: Account,
    pub token: String,
}

/// Response body of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResult {
    pub number: i64,
    pub token: String,
}

/// Orchestrates the account model, the repository and the token service
#[derive(Clone)]
pub struct AccountService {
    repository: Arc<dyn Repository>,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(repository: Arc<dyn Repository>, tokens: TokenService) -> Self {
        Self { repository, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Open, persist and issue a token for a new account
    pub fn create_account(&self, request: &CreateAccountRequest) -> Result<CreatedAccount> {
        let mut account = Account::open(request.email.as_str(), request.password.as_deref())?;
        self.repository.create_account(&mut account)?;

        let token = self.tokens.issue(account.number)?;
        info!(id = account.id, number = account.number, "account created");
        debug!(id = account.id, %token, "issued account token");

        Ok(CreatedAccount { account, token })
    }

    /// Verify email and password and issue a fresh token
    ///
    /// Unknown emails and wrong passwords both come back as
    /// `Error::Unauthorized` so callers cannot tell them apart.
    pub fn login(&self, request: &LoginRequest) -> Result<LoginResult> {
        let account = match self.repository.get_account_by_email(&request.email) {
            Ok(account) => account,
            Err(Error::NotFound(_)) => return Err(Error::unauthorized("unknown email")),
            Err(e) => return Err(e),
        };
        account.verify_password(&request.password)?;

        let token = self.tokens.issue(account.number)?;
        info!(id = account.id, "login succeeded");
        Ok(LoginResult {
            number: account.number,
            token,
        })
    }

    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        self.repository.get_accounts()
    }

    pub fn get_account(&self, id: i64) -> Result<Account> {
        self.repository.get_account(id)
    }

    pub fn delete_account(&self, id: i64) -> Result<()> {
        self.repository.delete_account(id)?;
        info!(id, "account deleted");
        Ok(())
    }

    /// Move funds between two accounts, applying nothing if `deadline`
    /// passes before the change is committed
    pub fn transfer(
        &self,
        from: i64,
        to: i64,
        amount: i64,
        deadline: Option<Instant>,
    ) -> Result<TransferReceipt> {
        let receipt = self.repository.transfer_until(from, to, amount, deadline)?;
        info!(from, to, amount, "transfer completed");
        Ok(receipt)
    }

    /// Check that `token` grants access to account `id`
    ///
    /// The token must validate and its account number must equal the
    /// stored account's number. A missing account is reported as
    /// `Error::Unauthorized`, never as not-found.
    pub fn authorize(&self, token: &str, id: i64) -> Result<Account> {
        let claims = self.tokens.validate(token)?;
        self.authorize_claims(&claims, id)
    }

    /// Same as [`authorize`](Self::authorize) for claims that were already validated
    pub fn authorize_claims(&self, claims: &Claims, id: i64) -> Result<Account> {
        let account = match self.repository.get_account(id) {
            Ok(account) => account,
            Err(Error::NotFound(_)) => {
                return Err(Error::unauthorized(format!("account {} not found", id)))
            }
            Err(e) => return Err(e),
        };

        if account.number != claims.account_number {
            warn!(id, "token account number does not match");
            return Err(Error::unauthorized("account number mismatch"));
        }
        Ok(account)
    }
}
