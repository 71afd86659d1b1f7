use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    /// P, who proves the channel state to the host ledger
    Prover,
    /// V, who verifies it and can dispute a stale state
    Verifier,
}

impl Party {
    pub fn counterparty(self) -> Self {
        match self {
            Party::Prover => Party::Verifier,
            Party::Verifier => Party::Prover,
        }
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Party::Prover => "P",
            Party::Verifier => "V",
        })
    }
}

/// Collateral credited to each party
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DepositLedger {
    prover: u128,
    verifier: u128,
}

impl DepositLedger {
    pub fn get(&self, party: Party) -> u128 {
        match party {
            Party::Prover => self.prover,
            Party::Verifier => self.verifier,
        }
    }

    /// Adds `amount` to the party's balance, returning `None` and leaving the ledger untouched
    /// if the total would overflow.
    pub fn credit(&mut self, party: Party, amount: u128) -> Option<u128> {
        self.total().checked_add(amount)?;
        let balance = match party {
            Party::Prover => &mut self.prover,
            Party::Verifier => &mut self.verifier,
        };
        *balance += amount;
        Some(*balance)
    }

    pub fn total(&self) -> u128 {
        self.prover + self.verifier
    }
}
