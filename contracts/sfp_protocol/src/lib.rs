//! # SFP Protocol
//!
//! Root crate of the **Smart Funding Pool (SFP)** protocol. A whitelist-gated
//! [`Factory`] creates one [`ProjectPool`] per project; every pool accepts
//! capped contributions in native currency or in any fungible token and
//! forwards them to its beneficiary in the same call. A [`GovernanceToken`]
//! provides an owner-gated fungible supply.
//!
//! | Phase        | Entry Point(s)                                               |
//! |--------------|--------------------------------------------------------------|
//! | Deployment   | [`Ledger::deploy_beacon`], [`Ledger::deploy_factory`], [`Ledger::deploy_token`] |
//! | Bootstrap    | `Factory::initialize`, `GovernanceToken::initialize`         |
//! | Admin        | `set_whitelist_status`, `change_beacon_address`, `transfer_ownership` |
//! | Creation     | [`Factory::create_project`]                                  |
//! | Funding      | `contribute_native`, `contribute_erc20`                      |
//! | Supply       | `mint`, `burn`                                               |
//! | Recovery     | `withdraw_stuck_tokens`                                      |
//! | Upgrades     | [`Ledger::upgrade_beacon`], [`Ledger::upgrade_proxy`]        |
//!
//! ## Architecture
//!
//! Instances are hosted by the in-process [`Ledger`], which executes calls,
//! moves native value and keeps the event log. Guards live in [`guard`];
//! the fungible ledger shared by tokens and pools lives in [`token`].
//! Entry points are reached through the typed clients returned by
//! [`Ledger::factory`], [`Ledger::pool`], [`Ledger::token`] and
//! [`Ledger::fungible`].

pub mod beacon;
pub mod errors;
pub mod events;
pub mod factory;
pub mod guard;
pub mod ledger;
pub mod pool;
pub mod token;
pub mod types;

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_factory;
#[cfg(test)]
mod test_ledger;

pub use beacon::Beacon;
pub use errors::{Error, ParseAddressError, Result};
pub use events::{Event, EventRecord};
pub use factory::{Factory, FactoryClient};
pub use guard::Ownership;
pub use ledger::{CallContext, Code, Contract, Instance, Ledger};
pub use pool::{PoolClient, ProjectPool};
pub use token::{Fungible, FungibleClient, GovernanceToken, TokenClient, TokenLedger};
pub use types::{Address, Amount, ContractKind, Implementation, DECIMALS};
