//! Rejection reasons shared by every instance.
//!
//! A call that returns an [`Error`] leaves no trace: guards run before any
//! effect and the ledger discards the records of a failed call.

use thiserror::Error;

use crate::types::{Address, Amount, ContractKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("caller {caller} is not the owner")]
    Unauthorized { caller: Address },

    #[error("the zero address is not allowed")]
    ZeroAddress,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("`{field}` must not be empty")]
    EmptyString { field: &'static str },

    #[error("amount {amount} exceeds the per-contribution limit {cap}")]
    AmountExceedsLimit { amount: Amount, cap: Amount },

    #[error("amount {amount} exceeds the available {available}")]
    AmountExceeds { amount: Amount, available: Amount },

    #[error("instance is already initialized")]
    AlreadyInitialized,

    #[error("instance is not initialized")]
    NotInitialized,

    #[error("account {account} is not whitelisted")]
    NotWhitelisted { account: Address },

    #[error("spender {spender} has allowance {allowance}, needs {needed}")]
    AllowanceInsufficient {
        spender: Address,
        allowance: Amount,
        needed: Amount,
    },

    #[error("account {account} holds {balance} tokens, needs {needed}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        needed: Amount,
    },

    #[error("account {account} holds {balance} native units, needs {needed}")]
    InsufficientFunds {
        account: Address,
        balance: Amount,
        needed: Amount,
    },

    #[error("value transfers outside the defined entry points are rejected")]
    FunctionCallError,

    #[error("native transfer to {to} failed")]
    NativeTransferFailed { to: Address },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("instance {address} is already executing")]
    Reentrancy { address: Address },

    #[error("no instance at {address}")]
    NoInstance { address: Address },

    #[error("instance at {address} is not a {expected}")]
    WrongInstanceKind {
        address: Address,
        expected: ContractKind,
    },
}

impl Error {
    /// Stable numeric code, suitable for logs and API payloads.
    pub fn code(&self) -> u32 {
        match self {
            Error::Unauthorized { .. } => 1,
            Error::ZeroAddress => 2,
            Error::ZeroAmount => 3,
            Error::EmptyString { .. } => 4,
            Error::AmountExceedsLimit { .. } => 5,
            Error::AmountExceeds { .. } => 6,
            Error::AlreadyInitialized => 7,
            Error::NotInitialized => 8,
            Error::NotWhitelisted { .. } => 9,
            Error::AllowanceInsufficient { .. } => 10,
            Error::InsufficientBalance { .. } => 11,
            Error::InsufficientFunds { .. } => 12,
            Error::FunctionCallError => 13,
            Error::NativeTransferFailed { .. } => 14,
            Error::Overflow => 15,
            Error::Reentrancy { .. } => 16,
            Error::NoInstance { .. } => 17,
            Error::WrongInstanceKind { .. } => 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAddressError {
    #[error("invalid hex in address `{0}`")]
    InvalidHex(String),

    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

pub type Result<T> = core::result::Result<T, Error>;
