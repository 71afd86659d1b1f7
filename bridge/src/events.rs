//! The audit log of a contract. Every completed call appends exactly one event.

use crate::attestation::HostAddress;
use serde::Serialize;

pub mod labels {
    pub const SETUP_COMPLETED: &str = "Setup completed";
    pub const COINS_LOCKED: &str = "Coins locked!";
    pub const PROOF_OPTIMISTICALLY_VERIFIED: &str = "Proof optimistically verified";
    pub const PROOF_VERIFIED: &str = "Proof successfully verified";
    pub const PROOF_VERIFICATION_FAILED: &str = "Proof verification failed";
    pub const DISPUTE_OPENED: &str = "Dispute opened";
    pub const DISPUTE_NOT_OPENED: &str = "Failed to open dispute";
    pub const VALID_DISPUTE_RESOLVED: &str = "Valid Dispute resolved";
    pub const VALID_DISPUTE_UNRESOLVED: &str = "Valid Dispute unresolved";
    pub const INVALID_DISPUTE_RESOLVED: &str = "Invalid Dispute resolved";
    pub const INVALID_DISPUTE_UNRESOLVED: &str = "Invalid Dispute unresolved";
    pub const ALL_FUNDS_TO_V: &str = "All funds given to V";
    pub const ALL_FUNDS_TO_P: &str = "All funds given to P";
    pub const PROOF_FUNDS_DISTRIBUTED: &str = "Valid proof submitted and funds distributed";
    pub const FUNDS_DISTRIBUTED: &str = "Funds distributed";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum Event {
    #[serde(rename = "lockEvent")]
    Lock { label: &'static str, addr: HostAddress, amount: u128 },

    #[serde(rename = "stateEvent")]
    State { label: &'static str, success: bool },
}

impl Event {
    pub fn state(label: &'static str, success: bool) -> Self {
        Event::State { label, success }
    }

    pub fn lock(addr: HostAddress, amount: u128) -> Self {
        Event::Lock { label: labels::COINS_LOCKED, addr, amount }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Event::Lock { label, .. } | Event::State { label, .. } => label,
        }
    }

    pub fn success(&self) -> bool {
        match self {
            Event::Lock { .. } => true,
            Event::State { success, .. } => *success,
        }
    }
}
