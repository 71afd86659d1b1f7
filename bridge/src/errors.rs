use crate::attestation::HostAddress;
use alba_consensus_core::hashing::sighash_type::SigHashTypeError;
use alba_txscript::TxScriptError;
use thiserror::Error;

/// Structural violations. A rejected call changes no state and emits no event.
#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum RejectReason {
    #[error("Setup not completed")]
    SetupNotCompleted,

    #[error("Setup already completed")]
    SetupAlreadyCompleted,

    #[error("Contract already settled")]
    AlreadySettled,

    #[error("Invalid signatures over setup data")]
    InvalidSetupSignatures,

    #[error("Invalid sighash mode: {0}")]
    InvalidSigHashType(#[from] SigHashTypeError),

    #[error("Malformed funding script: {0}")]
    MalformedFundingScript(TxScriptError),

    #[error("Funding script does not lock the coins to P and V")]
    FundingKeysMismatch,

    #[error("Sender {0} is not a party of the contract")]
    UnknownSender(HostAddress),

    #[error("Deposit amount is zero")]
    EmptyDeposit,

    #[error("Deposit exceeds the collateral the contract can hold")]
    DepositOverflow,

    #[error("Transaction of {0} bytes exceeds the accepted size")]
    TransactionTooLarge(usize),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(#[from] TxScriptError),

    #[error("CTxP locked")]
    ProverCommitmentLocked,

    #[error("CTxV locked")]
    VerifierCommitmentLocked,

    #[error("P's commitment transaction does not hardcode V's revocation key")]
    ProverRevocationKey,

    #[error("V's commitment transaction does not hardcode P's revocation key")]
    VerifierRevocationKey,

    #[error("Amount mismatch between p2pkh of P and lightning HTLC of V")]
    ProverPayoutMismatch,

    #[error("Amount mismatch between p2pkh of V and lightning HTLC of P")]
    VerifierPayoutMismatch,

    #[error("The p2pkh in P's unlocked commitment transaction does not correspond to Verifier's one")]
    ProverPayeeMismatch,

    #[error("The p2pkh in V's unlocked commitment transaction does not correspond to Prover's one")]
    VerifierPayeeMismatch,

    #[error("CTxP does not spend funding Tx")]
    ProverCommitmentNotFunded,

    #[error("CTxV does not spend funding Tx")]
    VerifierCommitmentNotFunded,

    #[error("Invalid signature of V over CTxP")]
    MissingVerifierSignature,

    #[error("Invalid signature of P over CTxV")]
    MissingProverSignature,

    #[error("CTxP is unlocked or its timelocked is smaller than/equal to T + T_rel")]
    InsufficientDisputeTimelock,

    #[error("Invalid signature")]
    InvalidSignature,
}

pub type RejectResult<T> = std::result::Result<T, RejectReason>;
