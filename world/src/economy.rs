//! Resource counter and the gate that guards construction.

use grid_siege_core::{BuildError, Resources, StructureKind};

/// Shared mutable resource counter.
///
/// Debits only happen through [`try_build`](Self::try_build), which refuses to
/// overdraw. Rewards and penalties are unconditional, so the balance may go
/// negative after an escape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Economy {
    resources: Resources,
}

impl Economy {
    /// Creates an economy holding the provided starting balance.
    #[must_use]
    pub const fn new(starting: Resources) -> Self {
        Self {
            resources: starting,
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn resources(&self) -> Resources {
        self.resources
    }

    /// Debits `cost` when the balance covers it, otherwise leaves the counter untouched.
    pub fn try_build(&mut self, kind: StructureKind, cost: Resources) -> Result<(), BuildError> {
        if !self.resources.covers(cost) {
            tracing::debug!(
                ?kind,
                required = cost.get(),
                available = self.resources.get(),
                "build refused by economy gate"
            );
            return Err(BuildError::InsufficientFunds {
                required: cost,
                available: self.resources,
            });
        }

        self.resources = self.resources - cost;
        Ok(())
    }

    /// Adds a kill reward to the balance.
    pub fn grant(&mut self, amount: Resources) {
        self.resources = self.resources + amount;
    }

    /// Subtracts an escape penalty from the balance.
    pub fn penalize(&mut self, amount: Resources) {
        self.resources = self.resources - amount;
    }
}
