//! Ledger Core - account ledger business logic
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, transfers, request shapes)
//! - **ports**: Trait definitions for external dependencies (Repository)
//! - **services**: Business logic orchestration (accounts, tokens)
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod schema;
pub mod services;

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use adapters::{DuckDbRepository, MemoryRepository};
use config::Config;
use ports::Repository;
use services::{AccountService, TokenService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{Account, OverdraftPolicy, TransferReceipt};

/// Main context for ledger operations
///
/// Holds the configuration, the repository and the services built on it.
pub struct LedgerContext {
    pub config: Config,
    pub repository: Arc<dyn Repository>,
    pub account_service: AccountService,
}

impl LedgerContext {
    /// Open the configured database and initialize its schema
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let repository: Arc<dyn Repository> = match &config.database_path {
            Some(path) => {
                info!(path = %path.display(), "opening database");
                Arc::new(DuckDbRepository::new(path, config.overdraft)?)
            }
            None => {
                info!("opening in-memory database");
                Arc::new(DuckDbRepository::open_in_memory(config.overdraft)?)
            }
        };

        Self::with_repository(config, repository)
    }

    /// Build a context around an existing repository
    pub fn with_repository(config: Config, repository: Arc<dyn Repository>) -> Result<Self> {
        config.validate()?;
        repository.ensure_schema()?;

        let ttl = i64::try_from(config.token_ttl_secs)
            .map(Duration::seconds)
            .map_err(|_| Error::Config("token ttl out of range".to_string()))?;
        let tokens = TokenService::new(&config.jwt_secret, ttl)?;
        let account_service = AccountService::new(Arc::clone(&repository), tokens);

        Ok(Self {
            config,
            repository,
            account_service,
        })
    }

    /// Context backed by a process-local map instead of a database
    pub fn in_memory(config: Config) -> Result<Self> {
        let repository = Arc::new(MemoryRepository::new(config.overdraft));
        Self::with_repository(config, repository)
    }
}
