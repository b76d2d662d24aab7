//! # Factory
//!
//! Whitelist-gated registry of project pools. Every pool is created from
//! the beacon the factory currently points at and is initialized in the same
//! call, with the creator as beneficiary.
//!
//! | Entry point              | Gate        |
//! |--------------------------|-------------|
//! | `initialize`             | once        |
//! | `change_beacon_address`  | owner       |
//! | `set_whitelist_status`   | owner       |
//! | `create_project`         | whitelisted |
//! | `withdraw_stuck_tokens`  | owner       |
//! | `transfer_ownership`     | owner       |
//!
//! The registry is append-only: a creator's pools keep their index forever.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Error, Result};
use crate::events::Event;
use crate::guard::{self, Ownership};
use crate::ledger::{CallContext, Ledger};
use crate::token;
use crate::types::{Address, Amount};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Factory {
    initialized: bool,
    ownership: Ownership,
    beacon: Address,
    whitelist: BTreeSet<Address>,
    projects: BTreeMap<Address, Vec<Address>>,
}

impl Factory {
    /// One-time setup; the caller becomes the owner.
    pub fn initialize(&mut self, ctx: &mut CallContext<'_>, beacon: Address) -> Result<()> {
        guard::require_uninitialized(self.initialized)?;
        guard::require_non_zero_address(&beacon)?;
        let owner = ctx.caller();
        guard::require_non_zero_address(&owner)?;

        guard::guard_once(&mut self.initialized)?;
        self.beacon = beacon;
        let previous_owner = self.ownership.assign(owner);
        ctx.emit(Event::OwnershipTransferred {
            previous_owner,
            new_owner: owner,
        });
        Ok(())
    }

    pub fn change_beacon_address(&mut self, ctx: &mut CallContext<'_>, new_beacon: Address) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        self.ownership.require_owner(&ctx.caller())?;
        guard::require_non_zero_address(&new_beacon)?;

        let old_beacon = core::mem::replace(&mut self.beacon, new_beacon);
        ctx.emit(Event::BeaconAddressChanged {
            old_beacon,
            new_beacon,
        });
        Ok(())
    }

    pub fn set_whitelist_status(
        &mut self,
        ctx: &mut CallContext<'_>,
        account: Address,
        status: bool,
    ) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        self.ownership.require_owner(&ctx.caller())?;
        guard::require_non_zero_address(&account)?;

        if status {
            self.whitelist.insert(account);
        } else {
            self.whitelist.remove(&account);
        }
        ctx.emit(Event::WhitelistStatusUpdated { account, status });
        Ok(())
    }

    /// Create and initialize a pool owned by the caller.
    ///
    /// Validation order: whitelist, amount, project name, token symbol,
    /// token name. The pool repeats its own validation on initialization.
    pub fn create_project(
        &mut self,
        ctx: &mut CallContext<'_>,
        amount: Amount,
        project_name: &str,
        token_name: &str,
        token_symbol: &str,
    ) -> Result<Address> {
        guard::require_initialized(self.initialized)?;
        let creator = ctx.caller();
        if !self.whitelist(&creator) {
            return Err(Error::NotWhitelisted { account: creator });
        }
        guard::require_non_zero_amount(amount)?;
        guard::require_non_empty("project_name", project_name)?;
        guard::require_non_empty("token_symbol", token_symbol)?;
        guard::require_non_empty("token_name", token_name)?;

        let this = ctx.this();
        let pool = ctx
            .ledger()
            .create_instance(this, self.beacon, |pool, pctx| {
                pool.initialize(pctx, amount, project_name, token_name, token_symbol, creator)
            })?;

        self.projects.entry(creator).or_default().push(pool);
        ctx.emit(Event::ProjectCreated {
            amount,
            project_name: project_name.to_owned(),
            token_symbol: token_symbol.to_owned(),
            token_name: token_name.to_owned(),
            creator,
            pool,
        });
        info!(factory = %this, %creator, %pool, project_name, "project created");
        Ok(pool)
    }

    pub fn withdraw_stuck_tokens(
        &mut self,
        ctx: &mut CallContext<'_>,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        self.ownership.require_owner(&ctx.caller())?;
        token::withdraw_stuck_tokens(ctx, None, token, self.owner(), amount)
    }

    pub fn transfer_ownership(&mut self, ctx: &mut CallContext<'_>, new_owner: Address) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        let previous_owner = self.ownership.transfer(&ctx.caller(), new_owner)?;
        ctx.emit(Event::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn beacon_address(&self) -> Address {
        self.beacon
    }

    pub fn whitelist(&self, account: &Address) -> bool {
        self.whitelist.contains(account)
    }

    /// The `index`-th pool created by `creator`.
    pub fn projects(&self, creator: &Address, index: usize) -> Option<Address> {
        self.projects_of(creator).get(index).copied()
    }

    pub fn projects_of(&self, creator: &Address) -> &[Address] {
        self.projects.get(creator).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Client for a deployed [`Factory`].
pub struct FactoryClient<'a> {
    ledger: &'a mut Ledger,
    address: Address,
}

impl<'a> FactoryClient<'a> {
    pub fn new(ledger: &'a mut Ledger, address: Address) -> Self {
        FactoryClient { ledger, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn initialize(&mut self, caller: Address, beacon: Address) -> Result<()> {
        self.ledger
            .invoke::<Factory, _>(caller, self.address, 0, |factory, ctx| {
                factory.initialize(ctx, beacon)
            })
    }

    pub fn change_beacon_address(&mut self, caller: Address, new_beacon: Address) -> Result<()> {
        self.ledger
            .invoke::<Factory, _>(caller, self.address, 0, |factory, ctx| {
                factory.change_beacon_address(ctx, new_beacon)
            })
    }

    pub fn set_whitelist_status(&mut self, caller: Address, account: Address, status: bool) -> Result<()> {
        self.ledger
            .invoke::<Factory, _>(caller, self.address, 0, |factory, ctx| {
                factory.set_whitelist_status(ctx, account, status)
            })
    }

    /// Returns the address of the new pool.
    pub fn create_project(
        &mut self,
        caller: Address,
        amount: Amount,
        project_name: &str,
        token_name: &str,
        token_symbol: &str,
    ) -> Result<Address> {
        self.ledger
            .invoke::<Factory, _>(caller, self.address, 0, |factory, ctx| {
                factory.create_project(ctx, amount, project_name, token_name, token_symbol)
            })
    }

    pub fn withdraw_stuck_tokens(&mut self, caller: Address, token: Address, amount: Amount) -> Result<()> {
        self.ledger
            .invoke::<Factory, _>(caller, self.address, 0, |factory, ctx| {
                factory.withdraw_stuck_tokens(ctx, token, amount)
            })
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.ledger
            .invoke::<Factory, _>(caller, self.address, 0, |factory, ctx| {
                factory.transfer_ownership(ctx, new_owner)
            })
    }

    pub fn owner(&self) -> Result<Address> {
        Ok(self.state()?.owner())
    }

    pub fn beacon_address(&self) -> Result<Address> {
        Ok(self.state()?.beacon_address())
    }

    pub fn whitelist(&self, account: &Address) -> Result<bool> {
        Ok(self.state()?.whitelist(account))
    }

    pub fn projects(&self, creator: &Address, index: usize) -> Result<Option<Address>> {
        Ok(self.state()?.projects(creator, index))
    }

    pub fn state(&self) -> Result<&Factory> {
        self.ledger.view::<Factory>(&self.address)
    }
}
