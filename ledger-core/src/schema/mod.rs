//! Database schema - embedded SQL
//!
//! The script is compiled into the binary with include_str! and only uses
//! `IF NOT EXISTS` statements, so running it on every start is a no-op once
//! the tables exist.

/// Schema bootstrap script for the accounts table
pub const ACCOUNTS_SCHEMA: &str = include_str!("accounts.sql");
