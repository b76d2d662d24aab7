//! # Access control and guards
//!
//! Every mutating entry point runs its guards first and touches state only
//! after all of them pass. The helpers here are free functions so that the
//! factory, the pools and the token all apply identical rules.
//!
//! | Guard                          | Rejection             |
//! |--------------------------------|-----------------------|
//! | [`Ownership::require_owner`]   | `Unauthorized`        |
//! | [`require_non_zero_address`]   | `ZeroAddress`         |
//! | [`require_non_zero_amount`]    | `ZeroAmount`          |
//! | [`require_non_empty`]          | `EmptyString`         |
//! | [`require_within_cap`]         | `AmountExceedsLimit`  |
//! | [`require_sufficient_balance`] | `AmountExceeds`       |
//! | [`require_uninitialized`]      | `AlreadyInitialized`  |
//! | [`require_initialized`]        | `NotInitialized`      |
//!
//! Initialization is split in two: [`require_uninitialized`] is the first
//! check of every `initialize`, and [`guard_once`] flips the flag as the
//! first effect once all validation has passed.

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::types::{Address, Amount};

pub fn require_non_zero_address(address: &Address) -> Result<()> {
    if address.is_zero() {
        return Err(Error::ZeroAddress);
    }
    Ok(())
}

pub fn require_non_zero_amount(amount: Amount) -> Result<()> {
    if amount == 0 {
        return Err(Error::ZeroAmount);
    }
    Ok(())
}

pub fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::EmptyString { field });
    }
    Ok(())
}

/// Bounds a single contribution; `amount == cap` is accepted.
pub fn require_within_cap(amount: Amount, cap: Amount) -> Result<()> {
    if amount > cap {
        return Err(Error::AmountExceedsLimit { amount, cap });
    }
    Ok(())
}

pub fn require_sufficient_balance(amount: Amount, balance: Amount) -> Result<()> {
    if amount > balance {
        return Err(Error::AmountExceeds {
            amount,
            available: balance,
        });
    }
    Ok(())
}

pub fn require_uninitialized(initialized: bool) -> Result<()> {
    if initialized {
        return Err(Error::AlreadyInitialized);
    }
    Ok(())
}

pub fn require_initialized(initialized: bool) -> Result<()> {
    if !initialized {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

/// Flip the one-time initialization flag. Never resets.
pub fn guard_once(initialized: &mut bool) -> Result<()> {
    require_uninitialized(*initialized)?;
    *initialized = true;
    Ok(())
}

/// Single-owner authorization.
///
/// Exactly one owner at a time; the null principal is never accepted as
/// owner once an instance is initialized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: Address,
}

impl Ownership {
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn require_owner(&self, caller: &Address) -> Result<()> {
        if self.owner.is_zero() || *caller != self.owner {
            return Err(Error::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Install the first owner. Callers validate `owner` beforehand.
    pub(crate) fn assign(&mut self, owner: Address) -> Address {
        core::mem::replace(&mut self.owner, owner)
    }

    /// Hand ownership to `new_owner`. Returns the previous owner.
    pub fn transfer(&mut self, caller: &Address, new_owner: Address) -> Result<Address> {
        self.require_owner(caller)?;
        require_non_zero_address(&new_owner)?;
        Ok(core::mem::replace(&mut self.owner, new_owner))
    }
}
