//! # Governance token
//!
//! [`TokenLedger`] is the fungible balance/allowance ledger shared by the
//! standalone [`GovernanceToken`] and by every project pool, which carries
//! its own governance supply.
//!
//! Supply only changes through owner-authorized `mint`/`burn`:
//!
//! | Operation | Guards                                          | Records              |
//! |-----------|-------------------------------------------------|----------------------|
//! | `mint`    | owner, non-zero `to`, non-zero amount           | `Transfer`, `Minted` |
//! | `burn`    | owner, non-zero `from`, non-zero amount, balance | `Transfer`, `Burned` |
//!
//! `transfer`, `approve` and `transfer_from` follow conventional fungible
//! semantics and are open to every holder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::events::Event;
use crate::guard::{self, Ownership};
use crate::ledger::{CallContext, Ledger};
use crate::types::{Address, Amount, DECIMALS};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    name: String,
    symbol: String,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
}

impl TokenLedger {
    pub(crate) fn new(name: &str, symbol: &str) -> Self {
        TokenLedger {
            name: name.to_owned(),
            symbol: symbol.to_owned(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        DECIMALS
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Accounts with a non-zero balance, ordered by address.
    pub fn holders(&self) -> impl Iterator<Item = (Address, Amount)> + '_ {
        self.balances.iter().map(|(account, balance)| (*account, *balance))
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn transfer(
        &mut self,
        ctx: &mut CallContext<'_>,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.check_transfer(&from, &to, amount)?;
        self.move_balance(from, to, amount);
        ctx.emit(Event::Transfer {
            from,
            to,
            value: amount,
        });
        Ok(())
    }

    pub(crate) fn approve(
        &mut self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<()> {
        guard::require_non_zero_address(&owner)?;
        guard::require_non_zero_address(&spender)?;
        self.set_allowance(owner, spender, amount);
        ctx.emit(Event::Approval {
            owner,
            spender,
            value: amount,
        });
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// An allowance of `Amount::MAX` is never decreased.
    pub(crate) fn transfer_from(
        &mut self,
        ctx: &mut CallContext<'_>,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        let allowance = self.allowance(&from, &spender);
        if amount > allowance {
            return Err(Error::AllowanceInsufficient {
                spender,
                allowance,
                needed: amount,
            });
        }
        self.check_transfer(&from, &to, amount)?;

        if allowance != Amount::MAX {
            self.set_allowance(from, spender, allowance - amount);
        }
        self.move_balance(from, to, amount);
        ctx.emit(Event::Transfer {
            from,
            to,
            value: amount,
        });
        Ok(())
    }

    fn mint(&mut self, ctx: &mut CallContext<'_>, to: Address, amount: Amount) -> Result<()> {
        let supply = self.total_supply.checked_add(amount).ok_or(Error::Overflow)?;
        let balance = self.balance_of(&to).checked_add(amount).ok_or(Error::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        ctx.emit(Event::Transfer {
            from: Address::ZERO,
            to,
            value: amount,
        });
        Ok(())
    }

    fn burn(&mut self, ctx: &mut CallContext<'_>, from: Address, amount: Amount) -> Result<()> {
        let balance = self.balance_of(&from);
        guard::require_sufficient_balance(amount, balance)?;
        self.total_supply -= amount;
        self.set_balance(from, balance - amount);
        ctx.emit(Event::Transfer {
            from,
            to: Address::ZERO,
            value: amount,
        });
        Ok(())
    }

    fn check_transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        guard::require_non_zero_address(from)?;
        guard::require_non_zero_address(to)?;
        let balance = self.balance_of(from);
        if amount > balance {
            return Err(Error::InsufficientBalance {
                account: *from,
                balance,
                needed: amount,
            });
        }
        Ok(())
    }

    /// Callers run [`Self::check_transfer`] first.
    fn move_balance(&mut self, from: Address, to: Address, amount: Amount) {
        if from == to || amount == 0 {
            return;
        }
        let from_balance = self.balance_of(&from);
        let to_balance = self.balance_of(&to);
        self.set_balance(from, from_balance - amount);
        // Bounded by total supply, which fits in an Amount.
        self.set_balance(to, to_balance + amount);
    }

    fn set_balance(&mut self, account: Address, balance: Amount) {
        if balance == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        let spenders = self.allowances.entry(owner).or_default();
        if amount == 0 {
            spenders.remove(&spender);
            if spenders.is_empty() {
                self.allowances.remove(&owner);
            }
        } else {
            spenders.insert(spender, amount);
        }
    }
}

/// Instances that carry a [`TokenLedger`].
pub trait Fungible {
    fn token_ledger(&self) -> Result<&TokenLedger>;

    fn token_ledger_mut(&mut self) -> Result<&mut TokenLedger>;
}

/// Owner-gated mint shared by the token and the pools.
pub(crate) fn owner_mint(
    ownership: &Ownership,
    ledger: &mut TokenLedger,
    ctx: &mut CallContext<'_>,
    to: Address,
    amount: Amount,
) -> Result<()> {
    ownership.require_owner(&ctx.caller())?;
    guard::require_non_zero_address(&to)?;
    guard::require_non_zero_amount(amount)?;
    ledger.mint(ctx, to, amount)?;
    ctx.emit(Event::Minted { to, amount });
    Ok(())
}

/// Owner-gated burn shared by the token and the pools.
pub(crate) fn owner_burn(
    ownership: &Ownership,
    ledger: &mut TokenLedger,
    ctx: &mut CallContext<'_>,
    from: Address,
    amount: Amount,
) -> Result<()> {
    ownership.require_owner(&ctx.caller())?;
    guard::require_non_zero_address(&from)?;
    guard::require_non_zero_amount(amount)?;
    ledger.burn(ctx, from, amount)?;
    ctx.emit(Event::Burned { from, amount });
    Ok(())
}

/// Recover tokens held by the executing instance and send them to `recipient`.
///
/// `own` is the executing instance's ledger, used when `token` is the
/// instance itself.
pub(crate) fn withdraw_stuck_tokens(
    ctx: &mut CallContext<'_>,
    own: Option<&mut TokenLedger>,
    token: Address,
    recipient: Address,
    amount: Amount,
) -> Result<()> {
    guard::require_non_zero_address(&token)?;
    guard::require_non_zero_amount(amount)?;
    let this = ctx.this();

    match own {
        Some(own) if token == this => {
            guard::require_sufficient_balance(amount, own.balance_of(&this))?;
            own.transfer(ctx, this, recipient, amount)?;
        }
        _ => {
            let held = ctx.ledger().view_fungible(&token)?.balance_of(&this);
            guard::require_sufficient_balance(amount, held)?;
            ctx.ledger().call_fungible(this, token, |ledger, tctx| {
                ledger.transfer(tctx, this, recipient, amount)
            })?;
        }
    }

    ctx.emit(Event::StuckTokensWithdrawn { token, amount });
    Ok(())
}

/// Pull `amount` of `token` from `from` to `to`, spending the executing
/// instance's allowance.
pub(crate) fn pull_tokens(
    ctx: &mut CallContext<'_>,
    own: Option<&mut TokenLedger>,
    token: Address,
    from: Address,
    to: Address,
    amount: Amount,
) -> Result<()> {
    let this = ctx.this();
    match own {
        Some(own) if token == this => own.transfer_from(ctx, this, from, to, amount),
        _ => ctx.ledger().call_fungible(this, token, |ledger, tctx| {
            ledger.transfer_from(tctx, this, from, to, amount)
        }),
    }
}

/// Standalone governance token.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GovernanceToken {
    initialized: bool,
    ownership: Ownership,
    ledger: TokenLedger,
}

impl GovernanceToken {
    /// One-time setup; the caller becomes the owner.
    pub fn initialize(&mut self, ctx: &mut CallContext<'_>, name: &str, symbol: &str) -> Result<()> {
        guard::require_uninitialized(self.initialized)?;
        guard::require_non_empty("name", name)?;
        guard::require_non_empty("symbol", symbol)?;
        let owner = ctx.caller();
        guard::require_non_zero_address(&owner)?;

        guard::guard_once(&mut self.initialized)?;
        self.ledger = TokenLedger::new(name, symbol);
        let previous_owner = self.ownership.assign(owner);
        ctx.emit(Event::OwnershipTransferred {
            previous_owner,
            new_owner: owner,
        });
        Ok(())
    }

    pub fn mint(&mut self, ctx: &mut CallContext<'_>, to: Address, amount: Amount) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        owner_mint(&self.ownership, &mut self.ledger, ctx, to, amount)
    }

    pub fn burn(&mut self, ctx: &mut CallContext<'_>, from: Address, amount: Amount) -> Result<()> {
        guard::require_initialized(self.initialized)?;
        owner_burn(&self.ownership, &mut self.ledger, ctx, from, amount)
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

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Fungible for GovernanceToken {
    fn token_ledger(&self) -> Result<&TokenLedger> {
        guard::require_initialized(self.initialized)?;
        Ok(&self.ledger)
    }

    fn token_ledger_mut(&mut self) -> Result<&mut TokenLedger> {
        guard::require_initialized(self.initialized)?;
        Ok(&mut self.ledger)
    }
}

/// Client for a deployed [`GovernanceToken`].
pub struct TokenClient<'a> {
    ledger: &'a mut Ledger,
    address: Address,
}

impl<'a> TokenClient<'a> {
    pub fn new(ledger: &'a mut Ledger, address: Address) -> Self {
        TokenClient { ledger, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn initialize(&mut self, caller: Address, name: &str, symbol: &str) -> Result<()> {
        self.ledger
            .invoke::<GovernanceToken, _>(caller, self.address, 0, |token, ctx| {
                token.initialize(ctx, name, symbol)
            })
    }

    pub fn mint(&mut self, caller: Address, to: Address, amount: Amount) -> Result<()> {
        self.ledger
            .invoke::<GovernanceToken, _>(caller, self.address, 0, |token, ctx| {
                token.mint(ctx, to, amount)
            })
    }

    pub fn burn(&mut self, caller: Address, from: Address, amount: Amount) -> Result<()> {
        self.ledger
            .invoke::<GovernanceToken, _>(caller, self.address, 0, |token, ctx| {
                token.burn(ctx, from, amount)
            })
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.ledger
            .invoke::<GovernanceToken, _>(caller, self.address, 0, |token, ctx| {
                token.transfer_ownership(ctx, new_owner)
            })
    }

    pub fn owner(&self) -> Result<Address> {
        Ok(self.ledger.view::<GovernanceToken>(&self.address)?.owner())
    }

    pub fn balance_of(&self, account: &Address) -> Result<Amount> {
        Ok(self.ledger.view_fungible(&self.address)?.balance_of(account))
    }

    pub fn total_supply(&self) -> Result<Amount> {
        Ok(self.ledger.view_fungible(&self.address)?.total_supply())
    }
}

/// Client for the fungible primitive of a token or pool.
pub struct FungibleClient<'a> {
    ledger: &'a mut Ledger,
    address: Address,
}

impl<'a> FungibleClient<'a> {
    pub fn new(ledger: &'a mut Ledger, address: Address) -> Self {
        FungibleClient { ledger, address }
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> Result<()> {
        self.ledger.call_fungible(caller, self.address, |ledger, ctx| {
            ledger.transfer(ctx, caller, to, amount)
        })
    }

    pub fn approve(&mut self, caller: Address, spender: Address, amount: Amount) -> Result<()> {
        self.ledger.call_fungible(caller, self.address, |ledger, ctx| {
            ledger.approve(ctx, caller, spender, amount)
        })
    }

    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.ledger.call_fungible(caller, self.address, |ledger, ctx| {
            ledger.transfer_from(ctx, caller, from, to, amount)
        })
    }

    pub fn balance_of(&self, account: &Address) -> Result<Amount> {
        Ok(self.ledger.view_fungible(&self.address)?.balance_of(account))
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Result<Amount> {
        Ok(self
            .ledger
            .view_fungible(&self.address)?
            .allowance(owner, spender))
    }

    pub fn total_supply(&self) -> Result<Amount> {
        Ok(self.ledger.view_fungible(&self.address)?.total_supply())
    }

    pub fn name(&self) -> Result<String> {
        Ok(self.ledger.view_fungible(&self.address)?.name().to_owned())
    }

    pub fn symbol(&self) -> Result<String> {
        Ok(self.ledger.view_fungible(&self.address)?.symbol().to_owned())
    }

    pub fn decimals(&self) -> Result<u32> {
        Ok(self.ledger.view_fungible(&self.address)?.decimals())
    }
}
