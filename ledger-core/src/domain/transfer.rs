//! Transfer domain model - moving balance between two accounts

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::Account;

/// Whether a transfer may drive the source balance below zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdraftPolicy {
    #[default]
    Deny,
    Allow,
}

impl std::str::FromStr for OverdraftPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "allow" => Ok(Self::Allow),
            other => Err(Error::Config(format!("unknown overdraft policy '{}'", other))),
        }
    }
}

/// Outcome of a committed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from: i64,
    pub to: i64,
    pub amount: i64,
    pub from_balance: i64,
    pub to_balance: i64,
}

/// Debit `from` and credit `to` by `amount`
///
/// Either both balances change or neither does. Storage adapters call this
/// inside their atomic section and persist the two accounts afterwards.
pub fn apply_transfer(
    from: &mut Account,
    to: &mut Account,
    amount: i64,
    policy: OverdraftPolicy,
) -> Result<TransferReceipt> {
    if amount <= 0 {
        return Err(Error::validation("transfer amount must be positive"));
    }
    if from.id == to.id {
        return Err(Error::validation("cannot transfer to the same account"));
    }

    let from_balance = from
        .balance
        .checked_sub(amount)
        .ok_or_else(|| Error::validation("transfer would overflow source balance"))?;
    let to_balance = to
        .balance
        .checked_add(amount)
        .ok_or_else(|| Error::validation("transfer would overflow destination balance"))?;

    if from_balance < 0 && policy == OverdraftPolicy::Deny {
        return Err(Error::InsufficientFunds {
            account: from.id,
            balance: from.balance,
            requested: amount,
        });
    }

    from.balance = from_balance;
    to.balance = to_balance;

    Ok(TransferReceipt {
        from: from.id,
        to: to.id,
        amount,
        from_balance,
        to_balance,
    })
}
