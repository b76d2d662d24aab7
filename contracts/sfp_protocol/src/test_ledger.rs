use crate::errors::Error;
use crate::fixtures::{setup, setup_with_pool, E18};
use crate::invariants::assert_untouched;
use crate::ledger::{Code, Ledger};
use crate::pool::ProjectPool;
use crate::token::GovernanceToken;
use crate::types::{Address, ContractKind, Implementation};

#[test]
fn test_plain_value_to_instances_rejected() {
    let (mut w, pool) = setup_with_pool(1_000);
    let bob = w.bob;
    w.ledger.fund(bob, 10 * E18).unwrap();

    for target in [pool, w.factory, w.token] {
        for data in [&b""[..], &b"\x12\x34"[..]] {
            let before = w.ledger.clone();
            assert_eq!(
                w.ledger.send_value(bob, target, E18, data),
                Err(Error::FunctionCallError)
            );
            assert_untouched(&before, &w.ledger, &[bob, target]);
        }
    }
}

#[test]
fn test_plain_value_between_accounts() {
    let mut w = setup();
    let (alice, bob) = (w.alice, w.bob);
    w.ledger.fund(alice, 100).unwrap();

    w.ledger.send_value(alice, bob, 40, b"memo").unwrap();
    assert_eq!(w.ledger.native_balance(&alice), 60);
    assert_eq!(w.ledger.native_balance(&bob), 40);

    assert_eq!(
        w.ledger.send_value(alice, Address::ZERO, 1, &[]),
        Err(Error::ZeroAddress)
    );
    assert_eq!(
        w.ledger.send_value(alice, bob, 61, &[]),
        Err(Error::InsufficientFunds {
            account: alice,
            balance: 60,
            needed: 61
        })
    );
}

#[test]
fn test_fund_rejects_zero_address() {
    let mut ledger = Ledger::new();
    assert_eq!(ledger.fund(Address::ZERO, 1), Err(Error::ZeroAddress));
}

#[test]
fn test_reentrant_call_rejected() {
    let mut w = setup();
    let (deployer, factory) = (w.deployer, w.factory);
    // The factory asks itself for its balance while executing.
    assert_eq!(
        w.ledger.factory(factory).withdraw_stuck_tokens(deployer, factory, 1),
        Err(Error::Reentrancy { address: factory })
    );
    // The arena is restored afterwards.
    assert_eq!(w.ledger.kind_of(&factory), Some(ContractKind::Factory));
    assert!(w.ledger.view::<crate::factory::Factory>(&factory).is_ok());
}

#[test]
fn test_instances_cannot_be_named_as_outside_callers() {
    let (mut w, pool) = setup_with_pool(1_000);
    let (deployer, alice, bob, factory, token) = (w.deployer, w.alice, w.bob, w.factory, w.token);
    w.ledger.token(token).mint(deployer, factory, 500).unwrap();
    w.ledger.pool(pool).mint(alice, pool, 300).unwrap();
    w.ledger.fund(bob, 10).unwrap();

    let before = w.ledger.clone();
    assert_eq!(
        w.ledger.fungible(token).transfer(factory, bob, 500),
        Err(Error::Unauthorized { caller: factory })
    );
    assert_eq!(
        w.ledger.fungible(pool).transfer(pool, bob, 300),
        Err(Error::Unauthorized { caller: pool })
    );
    assert_eq!(
        w.ledger.fungible(token).approve(factory, bob, 500),
        Err(Error::Unauthorized { caller: factory })
    );
    assert_eq!(
        w.ledger.send_value(pool, bob, 0, &[]),
        Err(Error::Unauthorized { caller: pool })
    );
    assert_untouched(&before, &w.ledger, &[factory, pool, bob]);
    assert_eq!(w.ledger.fungible(token).balance_of(&bob).unwrap(), 0);
    assert_eq!(w.ledger.sequence(), before.sequence());

    // The owner path still works.
    w.ledger
        .factory(factory)
        .withdraw_stuck_tokens(deployer, token, 500)
        .unwrap();
    assert_eq!(w.ledger.fungible(token).balance_of(&deployer).unwrap(), 500);
}

#[test]
fn test_view_errors() {
    let w = setup();
    let nowhere = Address::from_seed("nowhere");
    assert_eq!(
        w.ledger.view::<ProjectPool>(&nowhere).err(),
        Some(Error::NoInstance { address: nowhere })
    );
    assert_eq!(
        w.ledger.view::<ProjectPool>(&w.token).err(),
        Some(Error::WrongInstanceKind {
            address: w.token,
            expected: ContractKind::ProjectPool
        })
    );
    assert_eq!(
        w.ledger.view_fungible(&w.factory).err(),
        Some(Error::WrongInstanceKind {
            address: w.factory,
            expected: ContractKind::GovernanceToken
        })
    );
}

#[test]
fn test_pool_client_against_wrong_kind() {
    let mut w = setup();
    let (bob, token) = (w.bob, w.token);
    assert_eq!(
        w.ledger.pool(token).contribute_erc20(bob, token, 1),
        Err(Error::WrongInstanceKind {
            address: token,
            expected: ContractKind::ProjectPool
        })
    );
}

#[test]
fn test_beacon_upgrade_reaches_every_pool() {
    let (mut w, first) = setup_with_pool(1_000);
    let (deployer, alice, beacon, factory) = (w.deployer, w.alice, w.beacon, w.factory);
    let second = w
        .ledger
        .factory(factory)
        .create_project(alice, 2_000, "Second", "Second Token", "SND")
        .unwrap();
    w.ledger.pool(first).mint(alice, alice, 7).unwrap();

    let v2 = Implementation::initial(ContractKind::ProjectPool).next();
    assert_eq!(
        w.ledger.upgrade_beacon(alice, beacon, v2),
        Err(Error::Unauthorized { caller: alice })
    );
    w.ledger.upgrade_beacon(deployer, beacon, v2).unwrap();

    assert_eq!(w.ledger.implementation_of(&first).unwrap(), v2);
    assert_eq!(w.ledger.implementation_of(&second).unwrap(), v2);
    // State survives the upgrade.
    assert_eq!(w.ledger.pool(first).balance_of(&alice).unwrap(), 7);
    assert_eq!(w.ledger.pool(second).cap().unwrap(), 2_000);
}

#[test]
fn test_beacon_upgrade_rejects_other_kind() {
    let mut w = setup();
    let (deployer, beacon) = (w.deployer, w.beacon);
    assert_eq!(
        w.ledger
            .upgrade_beacon(deployer, beacon, Implementation::initial(ContractKind::Factory)),
        Err(Error::WrongInstanceKind {
            address: beacon,
            expected: ContractKind::ProjectPool
        })
    );
}

#[test]
fn test_proxy_upgrade_is_admin_only() {
    let (mut w, pool) = setup_with_pool(1_000);
    let (deployer, alice, token, factory) = (w.deployer, w.alice, w.token, w.factory);
    let v2 = Implementation::initial(ContractKind::GovernanceToken).next();

    assert_eq!(
        w.ledger.upgrade_proxy(alice, token, v2),
        Err(Error::Unauthorized { caller: alice })
    );
    assert_eq!(
        w.ledger.upgrade_proxy(deployer, factory, v2),
        Err(Error::WrongInstanceKind {
            address: factory,
            expected: ContractKind::Factory
        })
    );
    // Pools follow their beacon and cannot be upgraded one by one.
    assert_eq!(
        w.ledger
            .upgrade_proxy(deployer, pool, Implementation::initial(ContractKind::ProjectPool).next()),
        Err(Error::Unauthorized { caller: deployer })
    );

    w.ledger.upgrade_proxy(deployer, token, v2).unwrap();
    assert_eq!(
        w.ledger.code_of(&token).unwrap(),
        &Code::Proxy {
            admin: deployer,
            implementation: v2
        }
    );
    assert_eq!(
        w.ledger.view::<GovernanceToken>(&token).unwrap().owner(),
        deployer
    );
}

#[test]
fn test_addresses_are_deterministic() {
    let a = setup_with_pool(1_000);
    let b = setup_with_pool(1_000);
    assert_eq!(a.1, b.1);
    assert_eq!(a.0.factory, b.0.factory);
    assert_eq!(a.0.ledger.events(), b.0.ledger.events());
}

#[test]
fn test_snapshot_round_trip_resumes() {
    let (mut w, pool) = setup_with_pool(1_000 * E18);
    let (alice, bob, factory) = (w.alice, w.bob, w.factory);
    w.ledger.fund(bob, 10_000 * E18).unwrap();
    w.ledger.pool(pool).contribute_native(bob, 1_000 * E18).unwrap();

    let json = serde_json::to_string(&w.ledger).unwrap();
    let mut restored: Ledger = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.sequence(), w.ledger.sequence());
    assert_eq!(restored.events(), w.ledger.events());
    assert_eq!(restored.native_balance(&bob), w.ledger.native_balance(&bob));
    assert_eq!(restored.pool(pool).cap().unwrap(), 1_000 * E18);

    let next_original = w
        .ledger
        .factory(factory)
        .create_project(alice, 1, "Next", "Next Token", "NXT")
        .unwrap();
    let next_restored = restored
        .factory(factory)
        .create_project(alice, 1, "Next", "Next Token", "NXT")
        .unwrap();
    assert_eq!(next_original, next_restored);
}
