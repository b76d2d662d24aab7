//! # Project pool
//!
//! One pool per project. A pool accepts contributions in native currency or
//! in any fungible token, each bounded by the pool's `cap`, and forwards
//! them to its beneficiary within the same call. The beneficiary is the
//! pool owner, who also controls the pool's own governance supply.
//!
//! ```text
//! Uninitialized ──initialize──► Initialized
//! ```
//!
//! The cap bounds every single contribution; there is no running total.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::Result;
use crate::events::Event;
use crate::guard::{self, Ownership};
use crate::ledger::{CallContext, Ledger};
use crate::token::{self, Fungible, TokenLedger};
use crate::types::{Address, Amount};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectPool {
    initialized: bool,
    ownership: Ownership,
    cap: Amount,
    project_name: String,
    /// Governance supply; carries `token_name` and `token_symbol`.
    token: TokenLedger,
}

impl ProjectPool {
    /// One-time setup. Validation order: cap, project name, token name,
    /// token symbol, beneficiary.
    pub fn initialize(
        &mut self,
        ctx: &mut CallContext<'_>,
        cap: Amount,
        project_name: &str,
        token_name: &str,
        token_symbol: &str,
        beneficiary: Address,
    ) -> Result<()> {
        guard::require_uninitialized(self.initialized)?;
        guard::require_non_zero_amount(cap)?;
        guard::require_non_empty("project_name", project_name)?;
        guard::require_non_empty("token_name", token_name)?;
        guard::require_non_empty("token_symbol", token_symbol)?;
        guard::require_non_zero_address(&beneficiary)?;

        guard::guard_once(&mut self.initialized)?;
        self.cap = cap;
        self.project_name = project_name.to_owned();
        self.token = TokenLedger::new(token_name, token_symbol);
        let previous_owner = self.ownership.assign(beneficiary);
        ctx.emit(Event::OwnershipTransferred {
            previous_owner,
            new_owner: beneficiary,
        });
        info!(pool = %ctx.this(), %beneficiary, cap = %cap, project_name, "pool initialized");
        Ok(())
    }

    /// Forward the value attached to the call to the beneficiary.
    pub fn contribute_native(&mut self, ctx: &mut CallContext<'_>) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        let amount = ctx.value();
        guard::require_non_zero_amount(amount)?;
        guard::require_within_cap(amount, self.cap)?;

        let this = ctx.this();
        let contributor = ctx.caller();
        ctx.ledger()
            .forward_native(this, self.beneficiary(), amount)?;
        ctx.emit(Event::ContributedNative {
            contributor,
            amount,
        });
        Ok(())
    }

    /// Pull `amount` of `token` from the caller straight to the beneficiary.
    /// The caller must have approved this pool beforehand.
    pub fn contribute_erc20(
        &mut self,
        ctx: &mut CallContext<'_>,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        guard::require_non_zero_address(&token)?;
        guard::require_non_zero_amount(amount)?;
        guard::require_within_cap(amount, self.cap)?;

        let contributor = ctx.caller();
        let beneficiary = self.beneficiary();
        token::pull_tokens(
            ctx,
            Some(&mut self.token),
            token,
            contributor,
            beneficiary,
            amount,
        )?;
        ctx.emit(Event::ContributedErc20 {
            contributor,
            token,
            amount,
        });
        Ok(())
    }

    /// Send tokens that reached the pool outside the contribution path to
    /// the owner.
    pub fn withdraw_stuck_tokens(
        &mut self,
        ctx: &mut CallContext<'_>,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        self.ownership.require_owner(&ctx.caller())?;
        let owner = self.owner();
        token::withdraw_stuck_tokens(ctx, Some(&mut self.token), token, owner, amount)
    }

    pub fn mint(&mut self, ctx: &mut CallContext<'_>, to: Address, amount: Amount) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        token::owner_mint(&self.ownership, &mut self.token, ctx, to, amount)
    }

    pub fn burn(&mut self, ctx: &mut CallContext<'_>, from: Address, amount: Amount) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        token::owner_burn(&self.ownership, &mut self.token, ctx, from, amount)
    }

    /// Hand the pool, and with it the beneficiary role, to `new_owner`.
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

    pub fn beneficiary(&self) -> Address {
        self.ownership.owner()
    }

    pub fn cap(&self) -> Amount {
        self.cap
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn token_name(&self) -> &str {
        self.token.name()
    }

    pub fn token_symbol(&self) -> &str {
        self.token.symbol()
    }
}

impl Fungible for ProjectPool {
    fn token_ledger(&self) -> Result<&TokenLedger> {
        guard::require_initialized(self.initialized)?;
        Ok(&self.token)
    }

    fn token_ledger_mut(&mut self) -> Result<&mut TokenLedger> {
        guard::require_initialized(self.initialized)?;
        Ok(&mut self.token)
    }
}

/// Client for a [`ProjectPool`].
pub struct PoolClient<'a> {
    ledger: &'a mut Ledger,
    address: Address,
}

impl<'a> PoolClient<'a> {
    pub fn new(ledger: &'a mut Ledger, address: Address) -> Self {
        PoolClient { ledger, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn initialize(
        &mut self,
        caller: Address,
        cap: Amount,
        project_name: &str,
        token_name: &str,
        token_symbol: &str,
        beneficiary: Address,
    ) -> Result<()> {
        self.ledger
            .invoke::<ProjectPool, _>(caller, self.address, 0, |pool, ctx| {
                pool.initialize(ctx, cap, project_name, token_name, token_symbol, beneficiary)
            })
    }

    /// Attach `amount` of native currency and contribute it.
    pub fn contribute_native(&mut self, caller: Address, amount: Amount) -> Result<()> {
        self.ledger
            .invoke::<ProjectPool, _>(caller, self.address, amount, |pool, ctx| {
                pool.contribute_native(ctx)
            })
    }

    pub fn contribute_erc20(&mut self, caller: Address, token: Address, amount: Amount) -> Result<()> {
        self.ledger
            .invoke::<ProjectPool, _>(caller, self.address, 0, |pool, ctx| {
                pool.contribute_erc20(ctx, token, amount)
            })
    }

    pub fn withdraw_stuck_tokens(
        &mut self,
        caller: Address,
        token: Address,
        amount: Amount,
    ) -> Result<()> {
        self.ledger
            .invoke::<ProjectPool, _>(caller, self.address, 0, |pool, ctx| {
                pool.withdraw_stuck_tokens(ctx, token, amount)
            })
    }

    pub fn mint(&mut self, caller: Address, to: Address, amount: Amount) -> Result<()> {
        self.ledger
            .invoke::<ProjectPool, _>(caller, self.address, 0, |pool, ctx| {
                pool.mint(ctx, to, amount)
            })
    }

    pub fn burn(&mut self, caller: Address, from: Address, amount: Amount) -> Result<()> {
        self.ledger
            .invoke::<ProjectPool, _>(caller, self.address, 0, |pool, ctx| {
                pool.burn(ctx, from, amount)
            })
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.ledger
            .invoke::<ProjectPool, _>(caller, self.address, 0, |pool, ctx| {
                pool.transfer_ownership(ctx, new_owner)
            })
    }

    pub fn owner(&self) -> Result<Address> {
        Ok(self.state()?.owner())
    }

    pub fn cap(&self) -> Result<Amount> {
        Ok(self.state()?.cap())
    }

    pub fn balance_of(&self, account: &Address) -> Result<Amount> {
        Ok(self.ledger.view_fungible(&self.address)?.balance_of(account))
    }

    pub fn total_supply(&self) -> Result<Amount> {
        Ok(self.ledger.view_fungible(&self.address)?.total_supply())
    }

    pub fn state(&self) -> Result<&ProjectPool> {
        self.ledger.view::<ProjectPool>(&self.address)
    }
}
