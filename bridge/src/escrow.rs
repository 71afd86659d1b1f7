//! The escrow contract, holding P's and V's collateral until the channel is settled.
//!
//! Every call either commits and appends one [`Event`] to the audit log, or is rejected and
//! leaves the contract untouched. Calls depending on time take the host ledger's current time,
//! in seconds, as `now`.

use crate::{
    attestation::{HostAddress, HostSignature, optimistic_proof_digest, verify_host_signature},
    commitments::{ChannelBalance, check_disputed_pair, check_final_pair, check_funding, is_countersigned, parse_commitment},
    dispute::{DisputeRecord, DisputeState},
    errors::{RejectReason, RejectResult},
    events::{Event, labels},
    ledger::{DepositLedger, Party},
    outcome::{CallResult, Outcome},
    params::BridgeParams,
    settlement::{Custody, Distribution},
    setup::{SetupRecord, SetupRequest},
};
use alba_core::{debug, info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RecordedProof {
    /// Both parties attested the channel state off-chain
    Optimistic,
    /// The final commitment pair, or the commitment revealed by a resolved dispute
    Full(ChannelBalance),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisputePhase {
    Opened,
    ResolvedValid,
    ResolvedInvalid,
    /// Opened, and P can no longer answer it
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "detail", rename_all = "kebab-case")]
pub enum ContractPhase {
    Uninitialized,
    Initialized,
    Proof(RecordedProof),
    Dispute(DisputePhase),
    Settled,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bridge {
    #[serde(skip)]
    params: BridgeParams,
    setup: Option<SetupRecord>,
    deposits: DepositLedger,
    proof: Option<RecordedProof>,
    dispute: Option<DisputeState>,
    settlement: Option<Distribution>,
    events: Vec<Event>,
}

impl Bridge {
    pub fn new(params: BridgeParams) -> Self {
        Self { params, ..Default::default() }
    }

    pub fn params(&self) -> &BridgeParams {
        &self.params
    }

    pub fn setup_record(&self) -> Option<&SetupRecord> {
        self.setup.as_ref()
    }

    pub fn deposits(&self) -> &DepositLedger {
        &self.deposits
    }

    pub fn proof(&self) -> Option<&RecordedProof> {
        self.proof.as_ref()
    }

    pub fn dispute_state(&self) -> Option<&DisputeState> {
        self.dispute.as_ref()
    }

    pub fn settlement(&self) -> Option<&Distribution> {
        self.settlement.as_ref()
    }

    /// The audit log, oldest first
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn phase(&self, now: u64) -> ContractPhase {
        if self.settlement.is_some() {
            return ContractPhase::Settled;
        }
        let Some(setup) = &self.setup else {
            return ContractPhase::Uninitialized;
        };
        match (&self.dispute, &self.proof) {
            (Some(DisputeState::Opened(record)), _) if record.is_final(now, setup.relative_timelock) => {
                ContractPhase::Dispute(DisputePhase::TimedOut)
            }
            (Some(DisputeState::Opened(_)), _) => ContractPhase::Dispute(DisputePhase::Opened),
            (Some(DisputeState::ResolvedValid), _) => ContractPhase::Dispute(DisputePhase::ResolvedValid),
            (Some(DisputeState::ResolvedInvalid), _) => ContractPhase::Dispute(DisputePhase::ResolvedInvalid),
            (None, Some(proof)) => ContractPhase::Proof(*proof),
            (None, None) => ContractPhase::Initialized,
        }
    }

    pub fn setup(&mut self, request: SetupRequest, sig_p: &HostSignature, sig_v: &HostSignature) -> CallResult {
        let result = self.try_setup(request, sig_p, sig_v);
        self.commit("setup", result)
    }

    /// Credits a transfer of `amount` received from `sender`
    pub fn deposit(&mut self, sender: HostAddress, amount: u128) -> CallResult {
        let result = self.try_deposit(sender, amount);
        self.commit("deposit", result)
    }

    pub fn optimistic_submit_proof(&mut self, sig_p: &HostSignature, sig_v: &HostSignature, epoch: u64) -> CallResult {
        let result = self.try_optimistic_submit_proof(sig_p, sig_v, epoch);
        self.commit("optimistic_submit_proof", result)
    }

    pub fn submit_proof(&mut self, ctx_p: &[u8], ctx_v: &[u8], now: u64) -> CallResult {
        let result = self.try_submit_proof(ctx_p, ctx_v, now);
        self.commit("submit_proof", result)
    }

    pub fn dispute(&mut self, ctx_p_locked: &[u8], ctx_v: &[u8], now: u64) -> CallResult {
        let result = self.try_dispute(ctx_p_locked, ctx_v, now);
        self.commit("dispute", result)
    }

    pub fn resolve_valid_dispute(&mut self, ctx_p_unlocked: &[u8], now: u64) -> CallResult {
        let result = self.try_resolve_valid_dispute(ctx_p_unlocked, now);
        self.commit("resolve_valid_dispute", result)
    }

    pub fn resolve_invalid_dispute(&mut self, revocation_secret: &[u8]) -> CallResult {
        let result = self.try_resolve_invalid_dispute(revocation_secret);
        self.commit("resolve_invalid_dispute", result)
    }

    /// Distributes the collateral through `custody`. A contract is settled once.
    pub fn settle(&mut self, custody: &mut impl Custody, now: u64) -> CallResult {
        let result = self.try_settle(custody, now);
        self.commit("settle", result)
    }

    fn commit(&mut self, call: &str, result: RejectResult<Event>) -> CallResult {
        match result {
            Ok(event) => {
                let outcome = Outcome::from(&event);
                if outcome.success {
                    info!("{call}: {}", outcome.label);
                } else {
                    warn!("{call}: {}", outcome.label);
                }
                self.events.push(event);
                CallResult::Completed(outcome)
            }
            Err(reason) => {
                debug!("{call} rejected: {reason}");
                CallResult::Rejected(reason)
            }
        }
    }

    fn initialized(&self) -> RejectResult<&SetupRecord> {
        if self.settlement.is_some() {
            return Err(RejectReason::AlreadySettled);
        }
        self.setup.as_ref().ok_or(RejectReason::SetupNotCompleted)
    }

    fn try_setup(&mut self, request: SetupRequest, sig_p: &HostSignature, sig_v: &HostSignature) -> RejectResult<Event> {
        if self.settlement.is_some() {
            return Err(RejectReason::AlreadySettled);
        }
        if self.setup.is_some() {
            return Err(RejectReason::SetupAlreadyCompleted);
        }
        let record = SetupRecord::authorize(request, sig_p, sig_v)?;
        debug!("channel funded by {}, T = {}, T_rel = {}", record.funding_outpoint, record.timelock, record.relative_timelock);
        self.setup = Some(record);
        Ok(Event::state(labels::SETUP_COMPLETED, true))
    }

    fn try_deposit(&mut self, sender: HostAddress, amount: u128) -> RejectResult<Event> {
        let setup = self.initialized()?;
        let party = setup.party_of(&sender).ok_or(RejectReason::UnknownSender(sender))?;
        if amount == 0 {
            return Err(RejectReason::EmptyDeposit);
        }
        let balance = self.deposits.credit(party, amount).ok_or(RejectReason::DepositOverflow)?;
        debug!("{party} locked {amount}, {balance} in total");
        Ok(Event::lock(sender, amount))
    }

    fn try_optimistic_submit_proof(&mut self, sig_p: &HostSignature, sig_v: &HostSignature, epoch: u64) -> RejectResult<Event> {
        let setup = self.initialized()?;
        let digest = optimistic_proof_digest(epoch);
        if !verify_host_signature(digest, sig_p, &setup.address_p) || !verify_host_signature(digest, sig_v, &setup.address_v) {
            return Ok(Event::state(labels::PROOF_VERIFICATION_FAILED, false));
        }
        // A full proof carries the balances and is kept
        if self.proof.is_none() {
            self.proof = Some(RecordedProof::Optimistic);
        }
        Ok(Event::state(labels::PROOF_OPTIMISTICALLY_VERIFIED, true))
    }

    fn try_submit_proof(&mut self, ctx_p: &[u8], ctx_v: &[u8], now: u64) -> RejectResult<Event> {
        let setup = self.initialized()?;
        let ctx_p = parse_commitment(ctx_p, self.params.max_transaction_size)?;
        let ctx_v = parse_commitment(ctx_v, self.params.max_transaction_size)?;
        let balance = check_final_pair(setup, &ctx_p, &ctx_v)?;
        if now < setup.timelock {
            return Ok(Event::state(labels::PROOF_VERIFICATION_FAILED, false));
        }
        debug!("channel closes with P = {}, V = {}", balance.prover, balance.verifier);
        self.proof = Some(RecordedProof::Full(balance));
        Ok(Event::state(labels::PROOF_VERIFIED, true))
    }

    fn try_dispute(&mut self, raw_ctx_p: &[u8], raw_ctx_v: &[u8], now: u64) -> RejectResult<Event> {
        let setup = self.initialized()?;
        let ctx_p = parse_commitment(raw_ctx_p, self.params.max_transaction_size)?;
        let ctx_v = parse_commitment(raw_ctx_v, self.params.max_transaction_size)?;
        check_disputed_pair(setup, &ctx_p, &ctx_v)?;
        if now < setup.timelock || self.dispute.is_some() {
            return Ok(Event::state(labels::DISPUTE_NOT_OPENED, false));
        }
        let record = DisputeRecord::open(&ctx_p, now);
        let counter = ChannelBalance::of_verifier_commitment(&ctx_v);
        debug!(
            "V disputes CTxP {} locked until {}, CTxV holds P = {}, V = {}",
            record.disputed_txid, record.lock_time, counter.prover, counter.verifier
        );
        self.dispute = Some(DisputeState::Opened(record));
        Ok(Event::state(labels::DISPUTE_OPENED, true))
    }

    fn try_resolve_valid_dispute(&mut self, ctx_p_unlocked: &[u8], now: u64) -> RejectResult<Event> {
        let setup = self.initialized()?;
        let ctx_p = parse_commitment(ctx_p_unlocked, self.params.max_transaction_size)?;
        if ctx_p.is_locked() {
            return Err(RejectReason::ProverCommitmentLocked);
        }
        check_funding(setup, &ctx_p, Party::Prover)?;
        if !is_countersigned(setup, &ctx_p, Party::Prover)? {
            return Err(RejectReason::InvalidSignature);
        }
        match &self.dispute {
            Some(DisputeState::Opened(record)) if record.is_within_window(now, setup.relative_timelock) => {
                let balance = ChannelBalance::of_prover_commitment(&ctx_p);
                debug!(
                    "dispute over {} answered with CTxP {}: P = {}, V = {}",
                    record.disputed_txid,
                    ctx_p.tx().id(),
                    balance.prover,
                    balance.verifier
                );
                self.dispute = Some(DisputeState::ResolvedValid);
                self.proof = Some(RecordedProof::Full(balance));
                Ok(Event::state(labels::VALID_DISPUTE_RESOLVED, true))
            }
            _ => Ok(Event::state(labels::VALID_DISPUTE_UNRESOLVED, false)),
        }
    }

    fn try_resolve_invalid_dispute(&mut self, revocation_secret: &[u8]) -> RejectResult<Event> {
        self.initialized()?;
        match &self.dispute {
            Some(DisputeState::Opened(record)) if record.is_revoked_by(revocation_secret) => {
                self.dispute = Some(DisputeState::ResolvedInvalid);
                Ok(Event::state(labels::INVALID_DISPUTE_RESOLVED, true))
            }
            _ => Ok(Event::state(labels::INVALID_DISPUTE_UNRESOLVED, false)),
        }
    }

    fn try_settle(&mut self, custody: &mut impl Custody, now: u64) -> RejectResult<Event> {
        if self.settlement.is_some() {
            return Err(RejectReason::AlreadySettled);
        }
        let window = self.setup.as_ref().map_or(0, |setup| setup.relative_timelock);
        let (label, distribution) = match (&self.dispute, &self.proof) {
            (Some(DisputeState::ResolvedInvalid), _) => (labels::ALL_FUNDS_TO_V, Distribution::all_to(Party::Verifier, &self.deposits)),
            // Left unanswered past its window, a dispute stands in V's favor
            (Some(DisputeState::Opened(record)), _) if record.is_final(now, window) => {
                (labels::ALL_FUNDS_TO_V, Distribution::all_to(Party::Verifier, &self.deposits))
            }
            (Some(DisputeState::Opened(_)), _) => (labels::ALL_FUNDS_TO_P, Distribution::all_to(Party::Prover, &self.deposits)),
            (_, Some(RecordedProof::Full(balance))) => {
                (labels::PROOF_FUNDS_DISTRIBUTED, Distribution::pro_rata(balance, &self.deposits))
            }
            (_, Some(RecordedProof::Optimistic)) => (labels::PROOF_FUNDS_DISTRIBUTED, Distribution::refund(&self.deposits)),
            (_, None) => (labels::FUNDS_DISTRIBUTED, Distribution::refund(&self.deposits)),
        };
        if let Some(setup) = &self.setup {
            for party in [Party::Prover, Party::Verifier] {
                let amount = distribution.get(party);
                if amount > 0 {
                    custody.credit(&setup.address(party), amount);
                }
            }
        }
        debug!("settled with P = {}, V = {}", distribution.prover, distribution.verifier);
        self.settlement = Some(distribution);
        Ok(Event::state(label, true))
    }
}
