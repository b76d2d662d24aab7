use crate::errors::Error;
use crate::events::Event;
use crate::fixtures::{last_event, setup, setup_with_pool, E18};
use crate::invariants::assert_untouched;
use crate::types::{Address, ContractKind, Implementation};

#[test]
fn test_initialize_once() {
    let mut w = setup();
    let (deployer, beacon) = (w.deployer, w.beacon);
    assert_eq!(w.ledger.factory(w.factory).owner().unwrap(), deployer);
    assert_eq!(w.ledger.factory(w.factory).beacon_address().unwrap(), beacon);
    assert_eq!(
        w.ledger.factory(w.factory).initialize(deployer, beacon),
        Err(Error::AlreadyInitialized)
    );
    assert_eq!(
        w.ledger.factory(w.factory).initialize(w.alice, Address::ZERO),
        Err(Error::AlreadyInitialized)
    );
}

#[test]
fn test_initialize_rejects_zero_beacon() {
    let mut w = setup();
    let fresh = w.ledger.deploy_factory(w.deployer).unwrap();
    assert_eq!(
        w.ledger.factory(fresh).initialize(w.deployer, Address::ZERO),
        Err(Error::ZeroAddress)
    );
    assert!(!w.ledger.factory(fresh).state().unwrap().is_initialized());
}

#[test]
fn test_uninitialized_factory_rejects_calls() {
    let mut w = setup();
    let fresh = w.ledger.deploy_factory(w.deployer).unwrap();
    assert_eq!(
        w.ledger.factory(fresh).set_whitelist_status(w.deployer, w.alice, true),
        Err(Error::NotInitialized)
    );
    assert_eq!(
        w.ledger.factory(fresh).create_project(w.alice, 1, "P", "T", "S"),
        Err(Error::NotInitialized)
    );
}

#[test]
fn test_whitelist_gates_creation() {
    let mut w = setup();
    let (deployer, alice) = (w.deployer, w.alice);
    let factory = w.factory;

    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 1_000, "Demo", "Demo Token", "DTK"),
        Err(Error::NotWhitelisted { account: alice })
    );

    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();
    assert!(w.ledger.factory(factory).whitelist(&alice).unwrap());
    assert_eq!(
        last_event(&w.ledger),
        &Event::WhitelistStatusUpdated {
            account: alice,
            status: true
        }
    );
    assert!(w
        .ledger
        .factory(factory)
        .create_project(alice, 1_000, "Demo", "Demo Token", "DTK")
        .is_ok());

    w.ledger.factory(factory).set_whitelist_status(deployer, alice, false).unwrap();
    assert!(!w.ledger.factory(factory).whitelist(&alice).unwrap());
    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 1_000, "Demo", "Demo Token", "DTK"),
        Err(Error::NotWhitelisted { account: alice })
    );
}

#[test]
fn test_whitelist_guards() {
    let mut w = setup();
    let (deployer, alice) = (w.deployer, w.alice);
    assert_eq!(
        w.ledger.factory(w.factory).set_whitelist_status(alice, alice, true),
        Err(Error::Unauthorized { caller: alice })
    );
    assert_eq!(
        w.ledger.factory(w.factory).set_whitelist_status(deployer, Address::ZERO, true),
        Err(Error::ZeroAddress)
    );
    assert!(!w.ledger.factory(w.factory).whitelist(&Address::ZERO).unwrap());
}

#[test]
fn test_whitelist_status_is_membership() {
    let mut w = setup();
    let (deployer, alice, bob) = (w.deployer, w.alice, w.bob);
    let factory = w.factory;

    // Repeated grants collapse into one membership.
    for _ in 0..2 {
        w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();
    }
    w.ledger.factory(factory).set_whitelist_status(deployer, alice, false).unwrap();
    assert!(!w.ledger.factory(factory).whitelist(&alice).unwrap());

    // Revoking an account that was never listed still records the call.
    w.ledger.factory(factory).set_whitelist_status(deployer, bob, false).unwrap();
    assert!(!w.ledger.factory(factory).whitelist(&bob).unwrap());
    assert_eq!(
        last_event(&w.ledger),
        &Event::WhitelistStatusUpdated {
            account: bob,
            status: false
        }
    );

    // Membership survives a snapshot round trip.
    w.ledger.factory(factory).set_whitelist_status(deployer, bob, true).unwrap();
    let json = serde_json::to_string(&w.ledger).unwrap();
    let mut restored: crate::ledger::Ledger = serde_json::from_str(&json).unwrap();
    assert!(restored.factory(factory).whitelist(&bob).unwrap());
    assert!(!restored.factory(factory).whitelist(&alice).unwrap());
}

#[test]
fn test_create_project_validation_order() {
    let mut w = setup();
    let (deployer, alice, bob) = (w.deployer, w.alice, w.bob);
    let factory = w.factory;
    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();

    // Whitelist is checked before anything else.
    assert_eq!(
        w.ledger.factory(factory).create_project(bob, 0, "", "", ""),
        Err(Error::NotWhitelisted { account: bob })
    );
    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 0, "", "", ""),
        Err(Error::ZeroAmount)
    );
    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 1, "", "", ""),
        Err(Error::EmptyString {
            field: "project_name"
        })
    );
    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 1, "P", "", ""),
        Err(Error::EmptyString {
            field: "token_symbol"
        })
    );
    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 1, "P", "", "S"),
        Err(Error::EmptyString {
            field: "token_name"
        })
    );
    assert_eq!(w.ledger.factory(factory).projects(&alice, 0).unwrap(), None);
}

#[test]
fn test_registry_is_append_only() {
    let (mut w, first) = setup_with_pool(1_000);
    let alice = w.alice;
    let factory = w.factory;
    let second = w
        .ledger
        .factory(factory)
        .create_project(alice, 2_000, "Second", "Second Token", "SND")
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(w.ledger.factory(factory).projects(&alice, 0).unwrap(), Some(first));
    assert_eq!(w.ledger.factory(factory).projects(&alice, 1).unwrap(), Some(second));
    assert_eq!(w.ledger.factory(factory).projects(&alice, 2).unwrap(), None);
    assert_eq!(w.ledger.kind_of(&second), Some(ContractKind::ProjectPool));

    // Un-whitelisting does not touch existing entries.
    let deployer = w.deployer;
    w.ledger.factory(factory).set_whitelist_status(deployer, alice, false).unwrap();
    assert_eq!(
        w.ledger.factory(factory).state().unwrap().projects_of(&alice),
        &[first, second]
    );
}

#[test]
fn test_change_beacon_address() {
    let mut w = setup();
    let (deployer, alice, old_beacon) = (w.deployer, w.alice, w.beacon);
    let factory = w.factory;
    let new_beacon = w
        .ledger
        .deploy_beacon(deployer, Implementation::initial(ContractKind::ProjectPool))
        .unwrap();

    assert_eq!(
        w.ledger.factory(factory).change_beacon_address(alice, new_beacon),
        Err(Error::Unauthorized { caller: alice })
    );
    assert_eq!(
        w.ledger.factory(factory).change_beacon_address(deployer, Address::ZERO),
        Err(Error::ZeroAddress)
    );

    w.ledger.factory(factory).change_beacon_address(deployer, new_beacon).unwrap();
    assert_eq!(
        last_event(&w.ledger),
        &Event::BeaconAddressChanged {
            old_beacon,
            new_beacon
        }
    );

    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();
    let pool = w
        .ledger
        .factory(factory)
        .create_project(alice, 10, "P", "T", "S")
        .unwrap();
    assert_eq!(
        w.ledger.code_of(&pool).unwrap(),
        &crate::ledger::Code::BeaconProxy { beacon: new_beacon }
    );
}

#[test]
fn test_create_project_with_wrong_template_rolls_back() {
    let mut w = setup();
    let (deployer, alice) = (w.deployer, w.alice);
    let factory = w.factory;
    let token_beacon = w
        .ledger
        .deploy_beacon(deployer, Implementation::initial(ContractKind::GovernanceToken))
        .unwrap();
    w.ledger.factory(factory).change_beacon_address(deployer, token_beacon).unwrap();
    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();

    let before = w.ledger.clone();
    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 10, "P", "T", "S"),
        Err(Error::WrongInstanceKind {
            address: token_beacon,
            expected: ContractKind::ProjectPool
        })
    );
    assert_untouched(&before, &w.ledger, &[alice]);
    assert_eq!(w.ledger.instances().count(), before.instances().count());
}

#[test]
fn test_creation_with_unknown_beacon_rejected() {
    let mut w = setup();
    let (deployer, alice) = (w.deployer, w.alice);
    let factory = w.factory;
    let nowhere = Address::from_seed("nowhere");
    w.ledger.factory(factory).change_beacon_address(deployer, nowhere).unwrap();
    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();
    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 10, "P", "T", "S"),
        Err(Error::NoInstance { address: nowhere })
    );
}

#[test]
fn test_factory_withdraw_stuck_tokens() {
    let mut w = setup();
    let (deployer, bob, token, factory) = (w.deployer, w.bob, w.token, w.factory);
    w.ledger.token(token).mint(deployer, bob, 3 * E18).unwrap();
    w.ledger.fungible(token).transfer(bob, factory, 3 * E18).unwrap();

    assert_eq!(
        w.ledger.factory(factory).withdraw_stuck_tokens(bob, token, 1),
        Err(Error::Unauthorized { caller: bob })
    );
    w.ledger.factory(factory).withdraw_stuck_tokens(deployer, token, 3 * E18).unwrap();
    assert_eq!(w.ledger.fungible(token).balance_of(&deployer).unwrap(), 3 * E18);
    assert_eq!(w.ledger.fungible(token).balance_of(&factory).unwrap(), 0);
    assert_eq!(
        w.ledger.factory(factory).withdraw_stuck_tokens(deployer, token, 1),
        Err(Error::AmountExceeds {
            amount: 1,
            available: 0
        })
    );
}

#[test]
fn test_factory_transfer_ownership() {
    let mut w = setup();
    let (deployer, alice, bob) = (w.deployer, w.alice, w.bob);
    let factory = w.factory;
    w.ledger.factory(factory).transfer_ownership(deployer, alice).unwrap();
    assert_eq!(w.ledger.factory(factory).owner().unwrap(), alice);
    assert_eq!(
        w.ledger.factory(factory).set_whitelist_status(deployer, bob, true),
        Err(Error::Unauthorized { caller: deployer })
    );
    w.ledger.factory(factory).set_whitelist_status(alice, bob, true).unwrap();
}
