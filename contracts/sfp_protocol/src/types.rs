//! # Types
//!
//! Shared value types used across all modules of the SFP protocol.
//!
//! ## Addresses
//!
//! Principals are 20-byte identifiers rendered as `0x`-prefixed lowercase
//! hex. [`Address::ZERO`] is the null principal: it can never own an
//! instance, receive minted tokens, or be whitelisted.
//!
//! Instance addresses are derived from `(deployer, nonce)` so that replaying
//! the same sequence of deployments always yields the same addresses.
//!
//! ## Implementations
//!
//! Behavior code is identified by an [`Implementation`] (kind + revision).
//! Upgrading swaps the revision while every instance keeps its state.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::errors::ParseAddressError;

/// Token and native-currency quantities. Never negative.
pub type Amount = u128;

/// Decimal places reported by every fungible ledger.
pub const DECIMALS: u32 = 18;

/// A 20-byte principal.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The null principal.
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Deterministic account address for a human-readable seed.
    ///
    /// Used by tooling and tests to name externally owned accounts
    /// (`"deployer"`, `"alice"`, ...).
    pub fn from_seed(seed: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"sfp:account:");
        hasher.update(seed.as_bytes());
        Self::from_digest(&hasher.finalize())
    }

    /// Address of the `nonce`-th instance created by `deployer`.
    pub(crate) fn derive(deployer: &Address, nonce: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"sfp:instance:");
        hasher.update(deployer.0);
        hasher.update(nonce.to_be_bytes());
        Self::from_digest(&hasher.finalize())
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..32]);
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let raw = hex::decode(digits).map_err(|_| ParseAddressError::InvalidHex(s.to_string()))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|raw: Vec<u8>| ParseAddressError::InvalidLength(raw.len()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The kinds of instance the ledger can host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    Beacon,
    Factory,
    ProjectPool,
    GovernanceToken,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractKind::Beacon => "Beacon",
            ContractKind::Factory => "Factory",
            ContractKind::ProjectPool => "ProjectPool",
            ContractKind::GovernanceToken => "GovernanceToken",
        };
        f.write_str(name)
    }
}

/// Identifies a revision of behavior code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Implementation {
    pub kind: ContractKind,
    pub revision: u32,
}

impl Implementation {
    pub const fn initial(kind: ContractKind) -> Self {
        Implementation { kind, revision: 1 }
    }

    /// The revision that follows this one.
    pub fn next(self) -> Self {
        Implementation {
            kind: self.kind,
            revision: self.revision.saturating_add(1),
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.kind, self.revision)
    }
}
