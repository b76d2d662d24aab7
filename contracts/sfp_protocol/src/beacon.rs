//! Upgradeable beacon: the shared code template pools resolve their
//! behavior through.

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::events::Event;
use crate::guard::Ownership;
use crate::ledger::CallContext;
use crate::types::{Address, Implementation};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Beacon {
    ownership: Ownership,
    implementation: Implementation,
}

impl Beacon {
    pub(crate) fn new(owner: Address, implementation: Implementation) -> Self {
        let mut ownership = Ownership::default();
        ownership.assign(owner);
        Beacon {
            ownership,
            implementation,
        }
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn implementation(&self) -> Implementation {
        self.implementation
    }

    /// Owner-only. The new code must be for the same kind of instance.
    pub fn upgrade_to(&mut self, ctx: &mut CallContext<'_>, implementation: Implementation) -> Result<()> {
        self.ownership.require_owner(&ctx.caller())?;
        if implementation.kind != self.implementation.kind {
            return Err(Error::WrongInstanceKind {
                address: ctx.this(),
                expected: self.implementation.kind,
            });
        }
        self.implementation = implementation;
        ctx.emit(Event::Upgraded { implementation });
        Ok(())
    }
}
