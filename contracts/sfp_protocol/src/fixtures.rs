//! Shared setup for the test modules.

use crate::events::Event;
use crate::ledger::Ledger;
use crate::types::{Address, Amount, ContractKind, Implementation};

pub const E18: Amount = 1_000_000_000_000_000_000;

pub struct World {
    pub ledger: Ledger,
    pub deployer: Address,
    pub alice: Address,
    pub bob: Address,
    pub beacon: Address,
    pub factory: Address,
    pub token: Address,
}

/// Beacon, initialized factory and initialized governance token, all owned
/// by `deployer`.
pub fn setup() -> World {
    let mut ledger = Ledger::new();
    let deployer = Address::from_seed("deployer");
    let alice = Address::from_seed("alice");
    let bob = Address::from_seed("bob");

    let beacon = ledger
        .deploy_beacon(deployer, Implementation::initial(ContractKind::ProjectPool))
        .unwrap();
    let factory = ledger.deploy_factory(deployer).unwrap();
    ledger.factory(factory).initialize(deployer, beacon).unwrap();
    let token = ledger.deploy_token(deployer).unwrap();
    ledger
        .token(token)
        .initialize(deployer, "Ukraine University", "UU")
        .unwrap();

    World {
        ledger,
        deployer,
        alice,
        bob,
        beacon,
        factory,
        token,
    }
}

/// [`setup`] plus a pool created by a whitelisted `alice`.
pub fn setup_with_pool(cap: Amount) -> (World, Address) {
    let mut w = setup();
    w.ledger
        .factory(w.factory)
        .set_whitelist_status(w.deployer, w.alice, true)
        .unwrap();
    let pool = w
        .ledger
        .factory(w.factory)
        .create_project(w.alice, cap, "Demo", "Demo Token", "DTK")
        .unwrap();
    (w, pool)
}

/// Mint `amount` governance tokens to `to` and let `spender` pull them.
pub fn fund_tokens(w: &mut World, to: Address, spender: Address, amount: Amount) {
    let (deployer, token) = (w.deployer, w.token);
    w.ledger.token(token).mint(deployer, to, amount).unwrap();
    w.ledger.fungible(token).approve(to, spender, amount).unwrap();
}

pub fn last_event(ledger: &Ledger) -> &Event {
    &ledger.events().last().expect("no events recorded").event
}
