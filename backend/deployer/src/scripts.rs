//! Deployment scripts run against the devnet ledger.
//!
//! | Script       | Steps                                                        |
//! |--------------|--------------------------------------------------------------|
//! | `deploy`     | beacon, factory proxy, token proxy                           |
//! | `setup_demo` | whitelist, create pool, mint, approve, contribute            |
//! | `upgrade`    | next revision for the beacon, the factory and the token      |
//!
//! Every script acts as the configured deployer account.

use serde::Serialize;
use sfp_protocol::{Address, Amount, Beacon, ContractKind, Event, Implementation, Ledger};
use tracing::info;

use crate::config::Config;
use crate::errors::{DeployerError, Result};
use crate::records::DeploymentRecord;

const E18: Amount = 1_000_000_000_000_000_000;

pub const DEMO_PROJECT_AMOUNT: Amount = 1_000 * E18;
pub const DEMO_PROJECT_NAME: &str = "Demo Pool";
pub const DEMO_TOKEN_NAME: &str = "DemoToken";
pub const DEMO_TOKEN_SYMBOL: &str = "DEMO";
pub const DEMO_MINT_AMOUNT: Amount = 2_000 * E18;
pub const DEMO_CONTRIBUTION: Amount = DEMO_MINT_AMOUNT / 2;

pub fn deployer_account(config: &Config) -> Address {
    Address::from_seed(&config.deployer_seed)
}

/// Deploy the beacon, the factory and the governance token.
pub fn deploy(ledger: &mut Ledger, config: &Config) -> Result<DeploymentRecord> {
    let deployer = deployer_account(config);
    info!("Deploying contracts from an account: {deployer}");

    if ledger.native_balance(&deployer) == 0 {
        ledger.fund(deployer, config.deployer_funding)?;
        info!("Funded {deployer} with {} native units", config.deployer_funding);
    }

    let beacon = ledger.deploy_beacon(deployer, Implementation::initial(ContractKind::ProjectPool))?;
    info!("Beacon deployed at: {beacon}");

    let factory = ledger.deploy_factory(deployer)?;
    ledger.factory(factory).initialize(deployer, beacon)?;
    info!("Factory proxy deployed at: {factory}");

    let token = ledger.deploy_token(deployer)?;
    ledger
        .token(token)
        .initialize(deployer, &config.token_name, &config.token_symbol)?;
    info!(name = %config.token_name, symbol = %config.token_symbol, "Token deployed at: {token}");

    Ok(DeploymentRecord {
        factory,
        beacon,
        token,
        latest_project_pool: None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoSummary {
    pub pool: Address,
    pub contributor: Address,
    pub contributed: Amount,
}

/// Create a demo pool through the factory and contribute to it.
///
/// Records the new pool as `latest_project_pool`.
pub fn setup_demo(
    ledger: &mut Ledger,
    config: &Config,
    record: &mut DeploymentRecord,
) -> Result<DemoSummary> {
    let signer = deployer_account(config);
    let DeploymentRecord { factory, token, .. } = *record;

    // Step 1: whitelist.
    ledger.factory(factory).set_whitelist_status(signer, signer, true)?;
    info!("Step 1: whitelisted {signer}");

    // Step 2: create the pool and read its address back from the log.
    let mark = ledger.events().len();
    ledger.factory(factory).create_project(
        signer,
        DEMO_PROJECT_AMOUNT,
        DEMO_PROJECT_NAME,
        DEMO_TOKEN_NAME,
        DEMO_TOKEN_SYMBOL,
    )?;
    let pool = created_pool(ledger, factory, mark)?;
    record.latest_project_pool = Some(pool);
    info!("Step 2: new project pool at {pool}");

    // Step 3: mint.
    ledger.token(token).mint(signer, signer, DEMO_MINT_AMOUNT)?;
    info!("Step 3: minted {DEMO_MINT_AMOUNT} tokens for {signer}");

    // Step 4: approve the pool.
    let allowance = DEMO_MINT_AMOUNT * 2;
    ledger.fungible(token).approve(signer, pool, allowance)?;
    info!("Step 4: approved {allowance} for {pool}");

    // Step 5: contribute.
    ledger.pool(pool).contribute_erc20(signer, token, DEMO_CONTRIBUTION)?;
    info!("Step 5: contributed {DEMO_CONTRIBUTION} tokens to {pool}");

    Ok(DemoSummary {
        pool,
        contributor: signer,
        contributed: DEMO_CONTRIBUTION,
    })
}

/// The pool announced by the first `ProjectCreated` the factory emitted
/// after position `mark`.
fn created_pool(ledger: &Ledger, factory: Address, mark: usize) -> Result<Address> {
    ledger.events()[mark..]
        .iter()
        .filter(|r| r.contract == factory)
        .find_map(|r| match &r.event {
            Event::ProjectCreated { pool, .. } if !pool.is_zero() => Some(*pool),
            _ => None,
        })
        .ok_or_else(|| {
            DeployerError::MissingRecord("ProjectCreated not found in the factory log".to_string())
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeSummary {
    pub beacon: Implementation,
    pub factory: Implementation,
    pub token: Implementation,
}

/// Move the beacon, the factory and the token to their next revision.
pub fn upgrade(
    ledger: &mut Ledger,
    config: &Config,
    record: &DeploymentRecord,
) -> Result<UpgradeSummary> {
    let deployer = deployer_account(config);
    info!("Updating contracts from an account: {deployer}");

    // The beacon serves pool code; its own code is not upgradeable.
    let beacon = ledger.view::<Beacon>(&record.beacon)?.implementation().next();
    ledger.upgrade_beacon(deployer, record.beacon, beacon)?;

    let factory = ledger.implementation_of(&record.factory)?.next();
    ledger.upgrade_proxy(deployer, record.factory, factory)?;

    let token = ledger.implementation_of(&record.token)?.next();
    ledger.upgrade_proxy(deployer, record.token, token)?;

    info!(%beacon, %factory, %token, "Update process complete");
    Ok(UpgradeSummary {
        beacon,
        factory,
        token,
    })
}
