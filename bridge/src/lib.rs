pub mod attestation;
pub mod commitments;
pub mod dispute;
pub mod errors;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod outcome;
pub mod params;
pub mod scenario;
pub mod settlement;
pub mod setup;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use errors::RejectReason;
pub use escrow::{Bridge, ContractPhase};
pub use events::Event;
pub use outcome::{CallResult, Outcome};
pub use params::BridgeParams;
