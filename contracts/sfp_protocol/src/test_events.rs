use crate::errors::Error;
use crate::events::{Event, EventRecord};
use crate::fixtures::{last_event, setup, E18};
use crate::invariants::assert_log_well_formed;
use crate::types::{Address, ContractKind, Implementation};

fn names(records: &[EventRecord]) -> Vec<&'static str> {
    records.iter().map(|r| r.event.name()).collect()
}

#[test]
fn test_end_to_end_project_and_erc20_contribution() {
    let mut w = setup();
    let (deployer, alice, token, factory) = (w.deployer, w.alice, w.token, w.factory);

    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();
    let pool = w
        .ledger
        .factory(factory)
        .create_project(alice, 1000, "Demo", "Demo Token", "DTK")
        .unwrap();

    assert!(!pool.is_zero());
    let created = w.ledger.events().last().unwrap().clone();
    assert_eq!(created.contract, factory);
    assert_eq!(
        created.event,
        Event::ProjectCreated {
            amount: 1000,
            project_name: "Demo".into(),
            token_symbol: "DTK".into(),
            token_name: "Demo Token".into(),
            creator: alice,
            pool,
        }
    );

    w.ledger.token(token).mint(deployer, alice, 2000).unwrap();
    w.ledger.fungible(token).approve(alice, pool, 2000).unwrap();
    w.ledger.pool(pool).contribute_erc20(alice, token, 1000).unwrap();

    let contributed = w.ledger.events().last().unwrap();
    assert_eq!(contributed.contract, pool);
    assert_eq!(
        contributed.event,
        Event::ContributedErc20 {
            contributor: alice,
            token,
            amount: 1000
        }
    );
    // Contributor and beneficiary coincide: the balance is unchanged.
    assert_eq!(w.ledger.fungible(token).balance_of(&alice).unwrap(), 2000);
    assert_log_well_formed(w.ledger.events());
}

#[test]
fn test_project_creation_records_in_order() {
    let mut w = setup();
    let (deployer, alice, factory) = (w.deployer, w.alice, w.factory);
    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();
    let mark = w.ledger.events().len();

    let pool = w
        .ledger
        .factory(factory)
        .create_project(alice, 5, "P", "T", "S")
        .unwrap();

    let tail = &w.ledger.events()[mark..];
    assert_eq!(names(tail), ["OwnershipTransferred", "ProjectCreated"]);
    assert_eq!(tail[0].contract, pool);
    assert_eq!(
        tail[0].event,
        Event::OwnershipTransferred {
            previous_owner: Address::ZERO,
            new_owner: alice
        }
    );
    // Both records belong to the same top-level call.
    assert_eq!(tail[0].ledger, tail[1].ledger);
    assert_eq!(tail[1].ledger, w.ledger.sequence());
}

#[test]
fn test_deployment_records() {
    let w = setup();
    let beacon_records: Vec<_> = w.ledger.events_from(&w.beacon).map(|r| r.event.clone()).collect();
    assert_eq!(
        beacon_records,
        [
            Event::OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: w.deployer
            },
            Event::Upgraded {
                implementation: Implementation::initial(ContractKind::ProjectPool)
            },
        ]
    );

    let factory_records: Vec<_> = w.ledger.events_from(&w.factory).map(|r| r.event.name()).collect();
    assert_eq!(factory_records, ["Upgraded", "OwnershipTransferred"]);
    assert_log_well_formed(w.ledger.events());
}

#[test]
fn test_failed_call_records_nothing() {
    let mut w = setup();
    let (alice, factory) = (w.alice, w.factory);
    let len = w.ledger.events().len();
    let sequence = w.ledger.sequence();

    assert_eq!(
        w.ledger.factory(factory).create_project(alice, 1, "P", "T", "S"),
        Err(Error::NotWhitelisted { account: alice })
    );
    assert_eq!(w.ledger.events().len(), len);
    assert_eq!(w.ledger.sequence(), sequence);
}

#[test]
fn test_nested_failure_discards_outer_records() {
    let mut w = setup();
    let (deployer, alice, token, factory) = (w.deployer, w.alice, w.token, w.factory);
    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();
    let pool = w
        .ledger
        .factory(factory)
        .create_project(alice, 100, "P", "T", "S")
        .unwrap();
    w.ledger.token(token).mint(deployer, alice, 50).unwrap();
    let len = w.ledger.events().len();

    assert!(w.ledger.pool(pool).contribute_erc20(alice, token, 50).is_err());
    assert_eq!(w.ledger.events().len(), len);
    assert!(!matches!(last_event(&w.ledger), Event::ContributedErc20 { .. }));
}

#[test]
fn test_native_contribution_record_shape() {
    let mut w = setup();
    let (deployer, alice, bob, factory) = (w.deployer, w.alice, w.bob, w.factory);
    w.ledger.factory(factory).set_whitelist_status(deployer, alice, true).unwrap();
    let pool = w
        .ledger
        .factory(factory)
        .create_project(alice, E18, "P", "T", "S")
        .unwrap();
    w.ledger.fund(bob, E18).unwrap();
    w.ledger.pool(pool).contribute_native(bob, E18).unwrap();

    let record = w.ledger.events().last().unwrap();
    assert_eq!(record.contract, pool);
    assert_eq!(record.event.actor(), Some(bob));
    assert_eq!(record.event.amount(), Some(E18));
}

#[test]
fn test_event_json_uses_record_names() {
    let event = Event::ContributedErc20 {
        contributor: Address::from_seed("alice"),
        token: Address::from_seed("token"),
        amount: 1000,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert!(json.get("ContributedERC20").is_some());
    assert_eq!(json["ContributedERC20"]["amount"], 1000);

    let back: Event = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}
