use crate::{
    attestation::HostAddress,
    commitments::ChannelBalance,
    ledger::{DepositLedger, Party},
};
use serde::Serialize;

/// Whatever holds the collateral on the host ledger
pub trait Custody {
    fn credit(&mut self, recipient: &HostAddress, amount: u128);
}

/// A custody which only records what it is told to pay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordingCustody {
    pub credits: Vec<(HostAddress, u128)>,
}

impl Custody for RecordingCustody {
    fn credit(&mut self, recipient: &HostAddress, amount: u128) {
        self.credits.push((*recipient, amount));
    }
}

impl RecordingCustody {
    pub fn total_to(&self, recipient: &HostAddress) -> u128 {
        self.credits.iter().filter(|(address, _)| address == recipient).map(|(_, amount)| amount).sum()
    }
}

/// The final split of the collateral
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub prover: u128,
    pub verifier: u128,
}

impl Distribution {
    pub fn all_to(party: Party, ledger: &DepositLedger) -> Self {
        match party {
            Party::Prover => Self { prover: ledger.total(), verifier: 0 },
            Party::Verifier => Self { prover: 0, verifier: ledger.total() },
        }
    }

    pub fn refund(ledger: &DepositLedger) -> Self {
        Self { prover: ledger.get(Party::Prover), verifier: ledger.get(Party::Verifier) }
    }

    /// Splits the collateral in proportion to the channel balances, the rounding remainder
    /// going to V. An empty channel refunds the deposits.
    pub fn pro_rata(balance: &ChannelBalance, ledger: &DepositLedger) -> Self {
        if balance.is_empty() {
            return Self::refund(ledger);
        }
        let total = ledger.total();
        let prover = scale(total, balance.prover as u128, balance.prover as u128 + balance.verifier as u128);
        Self { prover, verifier: total - prover }
    }

    pub fn get(&self, party: Party) -> u128 {
        match party {
            Party::Prover => self.prover,
            Party::Verifier => self.verifier,
        }
    }
}

/// `floor(total * part / whole)` for `part <= whole`, without overflowing. A `whole` above
/// `u64::MAX` loses its lowest bits.
fn scale(total: u128, mut part: u128, mut whole: u128) -> u128 {
    while whole > u64::MAX as u128 {
        part >>= 1;
        whole >>= 1;
    }
    (total / whole) * part + (total % whole) * part / whole
}
