//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection, OptionalExt};
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{apply_transfer, Account, OverdraftPolicy, TransferReceipt};
use crate::ports::{check_deadline, Repository};
use crate::schema::ACCOUNTS_SCHEMA;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const SELECT_ACCOUNT: &str =
    "SELECT id, number, email, encrypted_pwd, balance, created_at::VARCHAR FROM accounts";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    overdraft: OverdraftPolicy,
}

impl DuckDbRepository {
    /// Open (or create) a file-backed database
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process.
    pub fn new(db_path: &Path, overdraft: OverdraftPolicy) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                        overdraft,
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            error = %err_msg,
                            "database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(Error::from).unwrap_or_else(|| {
            Error::database(format!("failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Open a private in-memory database
    pub fn open_in_memory(overdraft: OverdraftPolicy) -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
            overdraft,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Path of the backing file, `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("connection lock poisoned: {}", e)))
    }

    fn select_by_id(conn: &Connection, id: i64) -> Result<Account> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?", SELECT_ACCOUNT))?;
        stmt.query_row(params![id], AccountRow::from_row)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("account {}", id)))?
            .into_account()
    }

    fn update_balance(conn: &Connection, account: &Account) -> Result<()> {
        conn.execute(
            "UPDATE accounts SET balance = ? WHERE id = ?",
            params![account.balance, account.id],
        )?;
        Ok(())
    }
}

impl Repository for DuckDbRepository {
    fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(ACCOUNTS_SCHEMA)?;
        Ok(())
    }

    fn create_account(&self, account: &mut Account) -> Result<()> {
        let conn = self.lock()?;
        let id: i64 = conn.query_row(
            "INSERT INTO accounts (number, email, encrypted_pwd, balance, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
            params![
                account.number,
                account.email,
                account.encrypted_password,
                account.balance,
                account.created_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
            |row| row.get(0),
        )?;
        account.id = id;
        debug!(id, "account inserted");
        Ok(())
    }

    fn get_account(&self, id: i64) -> Result<Account> {
        let conn = self.lock()?;
        Self::select_by_id(&conn, id)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Account> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE email = ? ORDER BY id LIMIT 1",
            SELECT_ACCOUNT
        ))?;
        stmt.query_row(params![email], AccountRow::from_row)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("account {}", email)))?
            .into_account()
    }

    fn get_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_ACCOUNT))?;
        let rows = stmt.query_map([], AccountRow::from_row)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?.into_account()?);
        }
        Ok(accounts)
    }

    fn delete_account(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM accounts WHERE id = ?", params![id])?;
        if affected == 0 {
            return Err(Error::not_found(format!("account {}", id)));
        }
        Ok(())
    }

    fn transfer_until(
        &self,
        from: i64,
        to: i64,
        amount: i64,
        deadline: Option<Instant>,
    ) -> Result<TransferReceipt> {
        let mut conn = self.lock()?;
        // Dropping the transaction without commit rolls back
        let tx = conn.transaction()?;

        let mut source = Self::select_by_id(&tx, from)?;
        let mut destination = Self::select_by_id(&tx, to)?;
        let receipt = apply_transfer(&mut source, &mut destination, amount, self.overdraft)?;

        Self::update_balance(&tx, &source)?;
        Self::update_balance(&tx, &destination)?;
        check_deadline(deadline)?;
        tx.commit()?;

        debug!(from, to, amount, "transfer committed");
        Ok(receipt)
    }
}

/// Raw column values, converted outside the driver callback so that
/// timestamp parse failures surface as our own error type
struct AccountRow {
    id: i64,
    number: i64,
    email: String,
    encrypted_pwd: Option<String>,
    balance: i64,
    created_at: String,
}

impl AccountRow {
    // Column order follows SELECT_ACCOUNT
    fn from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            number: row.get(1)?,
            email: row.get(2)?,
            encrypted_pwd: row.get(3)?,
            balance: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_account(self) -> Result<Account> {
        Ok(Account {
            id: self.id,
            number: self.number,
            email: self.email,
            encrypted_password: self.encrypted_pwd,
            balance: self.balance,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::database(format!("bad created_at '{}': {}", s, e)))
}
