//! Records emitted by successful calls.
//!
//! Field order inside each variant is the record shape consumers rely on:
//! indexed fields first, value fields after.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, Implementation};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    Upgraded {
        implementation: Implementation,
    },
    Transfer {
        from: Address,
        to: Address,
        value: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: Amount,
    },
    Minted {
        to: Address,
        amount: Amount,
    },
    Burned {
        from: Address,
        amount: Amount,
    },
    ContributedNative {
        contributor: Address,
        amount: Amount,
    },
    #[serde(rename = "ContributedERC20")]
    ContributedErc20 {
        contributor: Address,
        token: Address,
        amount: Amount,
    },
    StuckTokensWithdrawn {
        token: Address,
        amount: Amount,
    },
    BeaconAddressChanged {
        old_beacon: Address,
        new_beacon: Address,
    },
    WhitelistStatusUpdated {
        account: Address,
        status: bool,
    },
    ProjectCreated {
        amount: Amount,
        project_name: String,
        token_symbol: String,
        token_name: String,
        creator: Address,
        pool: Address,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::OwnershipTransferred { .. } => "OwnershipTransferred",
            Event::Upgraded { .. } => "Upgraded",
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::Minted { .. } => "Minted",
            Event::Burned { .. } => "Burned",
            Event::ContributedNative { .. } => "ContributedNative",
            Event::ContributedErc20 { .. } => "ContributedERC20",
            Event::StuckTokensWithdrawn { .. } => "StuckTokensWithdrawn",
            Event::BeaconAddressChanged { .. } => "BeaconAddressChanged",
            Event::WhitelistStatusUpdated { .. } => "WhitelistStatusUpdated",
            Event::ProjectCreated { .. } => "ProjectCreated",
        }
    }

    /// The principal the record is primarily about, if any.
    pub fn actor(&self) -> Option<Address> {
        match self {
            Event::OwnershipTransferred { new_owner, .. } => Some(*new_owner),
            Event::Transfer { from, .. } => Some(*from),
            Event::Approval { owner, .. } => Some(*owner),
            Event::Minted { to, .. } => Some(*to),
            Event::Burned { from, .. } => Some(*from),
            Event::ContributedNative { contributor, .. }
            | Event::ContributedErc20 { contributor, .. } => Some(*contributor),
            Event::WhitelistStatusUpdated { account, .. } => Some(*account),
            Event::ProjectCreated { creator, .. } => Some(*creator),
            Event::Upgraded { .. }
            | Event::StuckTokensWithdrawn { .. }
            | Event::BeaconAddressChanged { .. } => None,
        }
    }

    pub fn amount(&self) -> Option<Amount> {
        match self {
            Event::Transfer { value, .. } | Event::Approval { value, .. } => Some(*value),
            Event::Minted { amount, .. }
            | Event::Burned { amount, .. }
            | Event::ContributedNative { amount, .. }
            | Event::ContributedErc20 { amount, .. }
            | Event::StuckTokensWithdrawn { amount, .. }
            | Event::ProjectCreated { amount, .. } => Some(*amount),
            Event::OwnershipTransferred { .. }
            | Event::Upgraded { .. }
            | Event::BeaconAddressChanged { .. }
            | Event::WhitelistStatusUpdated { .. } => None,
        }
    }
}

/// An [`Event`] as stored in the ledger's log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub seq: u64,
    /// Sequence number of the top-level call that produced the record.
    pub ledger: u64,
    /// Emitting instance.
    pub contract: Address,
    pub event: Event,
}
