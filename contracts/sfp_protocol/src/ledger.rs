//! # Ledger runtime
//!
//! The in-process host for every instance: it stores instance state, carries
//! native balances, executes calls and keeps the ordered event log.
//!
//! ## Call model
//!
//! | Step | Effect                                                          |
//! |------|-----------------------------------------------------------------|
//! | 1    | The target instance is taken out of the arena                   |
//! | 2    | Attached value moves from the caller to the target              |
//! | 3    | The entry point runs with a [`CallContext`]                     |
//! | 4    | The instance goes back into the arena                           |
//! | 5    | On failure: attached value is refunded, records are discarded   |
//!
//! While an instance is out of the arena it is marked as executing; any
//! nested call that reaches it fails with [`Error::Reentrancy`]. Entry
//! points order their guards before their effects, so a failing call never
//! leaves partial state behind.
//!
//! ## Deployment model
//!
//! Factories and tokens live behind an upgradeable proxy administered by
//! their deployer. Pools are created by the factory and resolve their code
//! through a [`Beacon`]; upgrading the beacon upgrades every pool at once.
//! State is never touched by an upgrade.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::beacon::Beacon;
use crate::errors::{Error, Result};
use crate::events::{Event, EventRecord};
use crate::factory::{Factory, FactoryClient};
use crate::guard;
use crate::pool::{PoolClient, ProjectPool};
use crate::token::{Fungible, FungibleClient, GovernanceToken, TokenClient, TokenLedger};
use crate::types::{Address, Amount, ContractKind, Implementation};

/// State of a hosted instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Instance {
    Beacon(Beacon),
    Factory(Factory),
    ProjectPool(ProjectPool),
    GovernanceToken(GovernanceToken),
}

impl Instance {
    pub fn kind(&self) -> ContractKind {
        match self {
            Instance::Beacon(_) => ContractKind::Beacon,
            Instance::Factory(_) => ContractKind::Factory,
            Instance::ProjectPool(_) => ContractKind::ProjectPool,
            Instance::GovernanceToken(_) => ContractKind::GovernanceToken,
        }
    }

    fn fungible(&self, address: Address) -> Result<&TokenLedger> {
        match self {
            Instance::GovernanceToken(token) => token.token_ledger(),
            Instance::ProjectPool(pool) => pool.token_ledger(),
            _ => Err(Error::WrongInstanceKind {
                address,
                expected: ContractKind::GovernanceToken,
            }),
        }
    }

    fn fungible_mut(&mut self, address: Address) -> Result<&mut TokenLedger> {
        match self {
            Instance::GovernanceToken(token) => token.token_ledger_mut(),
            Instance::ProjectPool(pool) => pool.token_ledger_mut(),
            _ => Err(Error::WrongInstanceKind {
                address,
                expected: ContractKind::GovernanceToken,
            }),
        }
    }
}

/// Typed access to one [`Instance`] variant.
pub trait Contract: Sized {
    const KIND: ContractKind;

    fn from_instance(instance: &Instance) -> Option<&Self>;

    fn from_instance_mut(instance: &mut Instance) -> Option<&mut Self>;
}

macro_rules! impl_contract {
    ($ty:ty, $variant:ident) => {
        impl Contract for $ty {
            const KIND: ContractKind = ContractKind::$variant;

            fn from_instance(instance: &Instance) -> Option<&Self> {
                match instance {
                    Instance::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_instance_mut(instance: &mut Instance) -> Option<&mut Self> {
                match instance {
                    Instance::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_contract!(Beacon, Beacon);
impl_contract!(Factory, Factory);
impl_contract!(ProjectPool, ProjectPool);
impl_contract!(GovernanceToken, GovernanceToken);

/// Where an instance's behavior code comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Code {
    /// Fixed code (beacons).
    Static(Implementation),
    /// Upgradeable by `admin`.
    Proxy {
        admin: Address,
        implementation: Implementation,
    },
    /// Resolved through a beacon.
    BeaconProxy { beacon: Address },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Deployment {
    code: Code,
    state: Instance,
}

/// Execution environment handed to an entry point.
pub struct CallContext<'a> {
    ledger: &'a mut Ledger,
    caller: Address,
    this: Address,
    value: Amount,
}

impl CallContext<'_> {
    /// The authenticated principal that issued the call.
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Address of the executing instance.
    pub fn this(&self) -> Address {
        self.this
    }

    /// Native value attached to the call, already credited to [`Self::this`].
    pub fn value(&self) -> Amount {
        self.value
    }

    pub(crate) fn emit(&mut self, event: Event) {
        let this = self.this;
        self.ledger.record(this, event);
    }

    pub(crate) fn ledger(&mut self) -> &mut Ledger {
        &mut *self.ledger
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Number of committed top-level calls.
    sequence: u64,
    nonces: BTreeMap<Address, u64>,
    native: BTreeMap<Address, Amount>,
    deployments: BTreeMap<Address, Deployment>,
    events: Vec<EventRecord>,
    #[serde(skip)]
    executing: BTreeSet<Address>,
    #[serde(skip)]
    depth: u32,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Records emitted by `contract`, in log order.
    pub fn events_from<'a>(
        &'a self,
        contract: &'a Address,
    ) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.events.iter().filter(move |r| r.contract == *contract)
    }

    /// `true` when `address` hosts an instance (executing or not).
    pub fn hosts(&self, address: &Address) -> bool {
        self.deployments.contains_key(address) || self.executing.contains(address)
    }

    pub fn kind_of(&self, address: &Address) -> Option<ContractKind> {
        self.deployments.get(address).map(|d| d.state.kind())
    }

    /// Every hosted instance with its kind, ordered by address.
    pub fn instances(&self) -> impl Iterator<Item = (Address, ContractKind)> + '_ {
        self.deployments
            .iter()
            .map(|(address, d)| (*address, d.state.kind()))
    }

    pub fn native_balance(&self, account: &Address) -> Amount {
        self.native.get(account).copied().unwrap_or(0)
    }

    pub fn code_of(&self, address: &Address) -> Result<&Code> {
        self.deployment(address).map(|d| &d.code)
    }

    /// The behavior revision currently serving `address`.
    pub fn implementation_of(&self, address: &Address) -> Result<Implementation> {
        match &self.deployment(address)?.code {
            Code::Static(implementation) | Code::Proxy { implementation, .. } => {
                Ok(*implementation)
            }
            Code::BeaconProxy { beacon } => Ok(self.view::<Beacon>(beacon)?.implementation()),
        }
    }

    /// Borrow the state of the instance at `address`.
    pub fn view<C: Contract>(&self, address: &Address) -> Result<&C> {
        let deployment = self.deployment(address)?;
        C::from_instance(&deployment.state).ok_or(Error::WrongInstanceKind {
            address: *address,
            expected: C::KIND,
        })
    }

    /// Borrow the fungible ledger of a token or pool.
    pub fn view_fungible(&self, address: &Address) -> Result<&TokenLedger> {
        self.deployment(address)?.state.fungible(*address)
    }

    fn deployment(&self, address: &Address) -> Result<&Deployment> {
        match self.deployments.get(address) {
            Some(deployment) => Ok(deployment),
            None if self.executing.contains(address) => Err(Error::Reentrancy { address: *address }),
            None => Err(Error::NoInstance { address: *address }),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Clients
    // ─────────────────────────────────────────────────────────

    pub fn factory(&mut self, address: Address) -> FactoryClient<'_> {
        FactoryClient::new(self, address)
    }

    pub fn pool(&mut self, address: Address) -> PoolClient<'_> {
        PoolClient::new(self, address)
    }

    pub fn token(&mut self, address: Address) -> TokenClient<'_> {
        TokenClient::new(self, address)
    }

    pub fn fungible(&mut self, address: Address) -> FungibleClient<'_> {
        FungibleClient::new(self, address)
    }

    // ─────────────────────────────────────────────────────────
    // Native currency
    // ─────────────────────────────────────────────────────────

    /// Credit `account` with freshly issued native currency.
    pub fn fund(&mut self, account: Address, amount: Amount) -> Result<()> {
        guard::require_non_zero_address(&account)?;
        let balance = self
            .native_balance(&account)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        self.native.insert(account, balance);
        Ok(())
    }

    /// A plain value transfer carrying optional call data.
    ///
    /// Instances define no receive path: any value sent to them outside an
    /// entry point is rejected with [`Error::FunctionCallError`], with or
    /// without data.
    pub fn send_value(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        data: &[u8],
    ) -> Result<()> {
        self.transact(|ledger| {
            ledger.require_external_caller(&from)?;
            if ledger.hosts(&to) {
                debug!(%from, %to, amount = %amount, data_len = data.len(), "unsolicited value rejected");
                return Err(Error::FunctionCallError);
            }
            guard::require_non_zero_address(&to)?;
            ledger.move_native(from, to, amount)
        })
    }

    /// Pay native currency out of an executing instance.
    pub(crate) fn forward_native(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        if to.is_zero() || self.hosts(&to) {
            return Err(Error::NativeTransferFailed { to });
        }
        self.move_native(from, to, amount)
    }

    fn move_native(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let from_balance = self.native_balance(&from);
        if amount > from_balance {
            return Err(Error::InsufficientFunds {
                account: from,
                balance: from_balance,
                needed: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .native_balance(&to)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        self.native.insert(from, from_balance - amount);
        self.native.insert(to, to_balance);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Deployment tooling
    // ─────────────────────────────────────────────────────────

    /// Deploy a beacon owned by `deployer` pointing at `implementation`.
    pub fn deploy_beacon(
        &mut self,
        deployer: Address,
        implementation: Implementation,
    ) -> Result<Address> {
        self.transact(|ledger| {
            guard::require_non_zero_address(&deployer)?;
            let address = ledger.next_address(deployer);
            ledger.deployments.insert(
                address,
                Deployment {
                    code: Code::Static(Implementation::initial(ContractKind::Beacon)),
                    state: Instance::Beacon(Beacon::new(deployer, implementation)),
                },
            );
            ledger.record(
                address,
                Event::OwnershipTransferred {
                    previous_owner: Address::ZERO,
                    new_owner: deployer,
                },
            );
            ledger.record(address, Event::Upgraded { implementation });
            info!(%address, %implementation, "beacon deployed");
            Ok(address)
        })
    }

    /// Point `beacon` at new code. Only the beacon owner may do this.
    pub fn upgrade_beacon(
        &mut self,
        caller: Address,
        beacon: Address,
        implementation: Implementation,
    ) -> Result<()> {
        self.invoke::<Beacon, _>(caller, beacon, 0, |b, ctx| b.upgrade_to(ctx, implementation))?;
        info!(%beacon, %implementation, "beacon upgraded");
        Ok(())
    }

    /// Deploy an uninitialized factory behind a proxy administered by `deployer`.
    pub fn deploy_factory(&mut self, deployer: Address) -> Result<Address> {
        self.deploy_proxy(deployer, Instance::Factory(Factory::default()))
    }

    /// Deploy an uninitialized governance token behind a proxy administered by `deployer`.
    pub fn deploy_token(&mut self, deployer: Address) -> Result<Address> {
        self.deploy_proxy(deployer, Instance::GovernanceToken(GovernanceToken::default()))
    }

    fn deploy_proxy(&mut self, deployer: Address, state: Instance) -> Result<Address> {
        self.transact(|ledger| {
            guard::require_non_zero_address(&deployer)?;
            let implementation = Implementation::initial(state.kind());
            let address = ledger.next_address(deployer);
            ledger.deployments.insert(
                address,
                Deployment {
                    code: Code::Proxy {
                        admin: deployer,
                        implementation,
                    },
                    state,
                },
            );
            ledger.record(address, Event::Upgraded { implementation });
            info!(%address, %implementation, "proxy deployed");
            Ok(address)
        })
    }

    /// Swap the code behind a proxy while keeping its state.
    pub fn upgrade_proxy(
        &mut self,
        caller: Address,
        proxy: Address,
        implementation: Implementation,
    ) -> Result<()> {
        self.transact(|ledger| {
            if ledger.executing.contains(&proxy) {
                return Err(Error::Reentrancy { address: proxy });
            }
            let deployment = ledger
                .deployments
                .get_mut(&proxy)
                .ok_or(Error::NoInstance { address: proxy })?;
            let kind = deployment.state.kind();
            match &mut deployment.code {
                Code::Proxy {
                    admin,
                    implementation: current,
                } => {
                    if caller != *admin {
                        return Err(Error::Unauthorized { caller });
                    }
                    if implementation.kind != kind {
                        return Err(Error::WrongInstanceKind {
                            address: proxy,
                            expected: kind,
                        });
                    }
                    *current = implementation;
                }
                Code::Static(_) | Code::BeaconProxy { .. } => {
                    return Err(Error::Unauthorized { caller });
                }
            }
            ledger.record(proxy, Event::Upgraded { implementation });
            info!(%proxy, %implementation, "proxy upgraded");
            Ok(())
        })
    }

    /// Create a pool bound to `beacon` and run `init` on it.
    ///
    /// Creation and initialization are one step: if `init` fails the
    /// instance is discarded and the creator's nonce is restored.
    pub(crate) fn create_instance<R>(
        &mut self,
        creator: Address,
        beacon: Address,
        init: impl FnOnce(&mut ProjectPool, &mut CallContext<'_>) -> Result<R>,
    ) -> Result<Address> {
        let template = self.view::<Beacon>(&beacon)?.implementation();
        if template.kind != ContractKind::ProjectPool {
            return Err(Error::WrongInstanceKind {
                address: beacon,
                expected: ContractKind::ProjectPool,
            });
        }

        let nonce = self.nonces.get(&creator).copied().unwrap_or(0);
        let address = self.next_address(creator);
        self.deployments.insert(
            address,
            Deployment {
                code: Code::BeaconProxy { beacon },
                state: Instance::ProjectPool(ProjectPool::default()),
            },
        );

        match self.invoke::<ProjectPool, R>(creator, address, 0, init) {
            Ok(_) => {
                debug!(%creator, %address, %beacon, "instance created");
                Ok(address)
            }
            Err(err) => {
                self.deployments.remove(&address);
                self.nonces.insert(creator, nonce);
                Err(err)
            }
        }
    }

    fn next_address(&mut self, deployer: Address) -> Address {
        let nonce = self.nonces.entry(deployer).or_insert(0);
        let address = Address::derive(&deployer, *nonce);
        *nonce += 1;
        address
    }

    // ─────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────

    /// Run `f` against the instance of kind `C` at `target`.
    pub(crate) fn invoke<C: Contract, R>(
        &mut self,
        caller: Address,
        target: Address,
        value: Amount,
        f: impl FnOnce(&mut C, &mut CallContext<'_>) -> Result<R>,
    ) -> Result<R> {
        self.invoke_instance(caller, target, value, |instance, ctx| {
            let contract = C::from_instance_mut(instance).ok_or(Error::WrongInstanceKind {
                address: ctx.this(),
                expected: C::KIND,
            })?;
            f(contract, ctx)
        })
    }

    /// Run `f` against the fungible ledger of the token or pool at `token`.
    pub(crate) fn call_fungible<R>(
        &mut self,
        caller: Address,
        token: Address,
        f: impl FnOnce(&mut TokenLedger, &mut CallContext<'_>) -> Result<R>,
    ) -> Result<R> {
        self.invoke_instance(caller, token, 0, |instance, ctx| {
            let ledger = instance.fungible_mut(ctx.this())?;
            f(ledger, ctx)
        })
    }

    fn invoke_instance<R>(
        &mut self,
        caller: Address,
        target: Address,
        value: Amount,
        f: impl FnOnce(&mut Instance, &mut CallContext<'_>) -> Result<R>,
    ) -> Result<R> {
        let top_level = self.depth == 0;
        self.transact(|ledger| {
            if top_level {
                ledger.require_external_caller(&caller)?;
            }
            if ledger.executing.contains(&target) {
                return Err(Error::Reentrancy { address: target });
            }
            let mut deployment = ledger
                .deployments
                .remove(&target)
                .ok_or(Error::NoInstance { address: target })?;

            if value > 0 {
                if let Err(err) = ledger.move_native(caller, target, value) {
                    ledger.deployments.insert(target, deployment);
                    return Err(err);
                }
            }

            debug!(%caller, %target, kind = %deployment.state.kind(), value = %value, "invoke");
            ledger.executing.insert(target);
            let result = {
                let mut ctx = CallContext {
                    ledger: &mut *ledger,
                    caller,
                    this: target,
                    value,
                };
                f(&mut deployment.state, &mut ctx)
            };
            ledger.executing.remove(&target);
            ledger.deployments.insert(target, deployment);

            if let Err(err) = &result {
                debug!(%caller, %target, code = err.code(), "call rejected: {err}");
                if value > 0 {
                    let refund = ledger.move_native(target, caller, value);
                    debug_assert!(refund.is_ok(), "refund of attached value failed");
                }
            }
            result
        })
    }

    /// Instances only act through their own entry points: outside a call,
    /// an address that hosts an instance cannot be named as the caller.
    fn require_external_caller(&self, caller: &Address) -> Result<()> {
        if self.hosts(caller) {
            return Err(Error::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Scope a unit of work: records emitted by a failed unit are dropped,
    /// and each committed top-level unit advances [`Self::sequence`].
    fn transact<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let mark = self.events.len();
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        match result {
            Ok(value) => {
                if self.depth == 0 {
                    self.sequence += 1;
                }
                Ok(value)
            }
            Err(err) => {
                self.events.truncate(mark);
                Err(err)
            }
        }
    }

    fn record(&mut self, contract: Address, event: Event) {
        let record = EventRecord {
            seq: self.events.len() as u64,
            ledger: self.sequence + 1,
            contract,
            event,
        };
        self.events.push(record);
    }
}
