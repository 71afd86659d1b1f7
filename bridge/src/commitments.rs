//! Checks of commitment transactions against the stored setup.

use crate::{
    errors::{RejectReason, RejectResult},
    ledger::Party,
    setup::SetupRecord,
};
use alba_hashes::hash160;
use alba_txscript::commitment::CommitmentTx;
use serde::Serialize;

/// Channel balances, in satoshis, as agreed by a pair of commitment transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelBalance {
    pub prover: u64,
    pub verifier: u64,
}

impl ChannelBalance {
    /// P's commitment pays P through its HTLC and V directly
    pub fn of_prover_commitment(ctx_p: &CommitmentTx) -> Self {
        Self { prover: ctx_p.htlc().value, verifier: ctx_p.p2pkh().value }
    }

    /// V's commitment pays V through its HTLC and P directly
    pub fn of_verifier_commitment(ctx_v: &CommitmentTx) -> Self {
        Self { prover: ctx_v.p2pkh().value, verifier: ctx_v.htlc().value }
    }

    pub fn is_empty(&self) -> bool {
        self.prover == 0 && self.verifier == 0
    }
}

pub fn parse_commitment(raw: &[u8], max_size: usize) -> RejectResult<CommitmentTx> {
    if raw.len() > max_size {
        return Err(RejectReason::TransactionTooLarge(raw.len()));
    }
    Ok(CommitmentTx::parse(raw)?)
}

/// The commitment spends the funding output recorded at setup
pub fn check_funding(setup: &SetupRecord, ctx: &CommitmentTx, owner: Party) -> RejectResult<()> {
    if ctx.spends(&setup.funding_outpoint) {
        return Ok(());
    }
    Err(match owner {
        Party::Prover => RejectReason::ProverCommitmentNotFunded,
        Party::Verifier => RejectReason::VerifierCommitmentNotFunded,
    })
}

/// Whether the commitment owned by `owner` carries its counterparty's signature
pub fn is_countersigned(setup: &SetupRecord, ctx: &CommitmentTx, owner: Party) -> RejectResult<bool> {
    Ok(ctx.carries_signature_of(&setup.funding_script, setup.sighash_type, setup.key(owner.counterparty()))?)
}

pub fn check_countersigned(setup: &SetupRecord, ctx: &CommitmentTx, owner: Party) -> RejectResult<()> {
    if is_countersigned(setup, ctx, owner)? {
        return Ok(());
    }
    Err(match owner {
        Party::Prover => RejectReason::MissingVerifierSignature,
        Party::Verifier => RejectReason::MissingProverSignature,
    })
}

/// Verifies that CTxP and CTxV describe the same, final channel state, returning the balances
/// it assigns.
pub fn check_final_pair(setup: &SetupRecord, ctx_p: &CommitmentTx, ctx_v: &CommitmentTx) -> RejectResult<ChannelBalance> {
    if ctx_p.is_locked() {
        return Err(RejectReason::ProverCommitmentLocked);
    }
    if ctx_v.is_locked() {
        return Err(RejectReason::VerifierCommitmentLocked);
    }

    if ctx_p.htlc().pk1 != setup.pk_v {
        return Err(RejectReason::ProverRevocationKey);
    }
    if ctx_v.htlc().pk1 != setup.pk_p {
        return Err(RejectReason::VerifierRevocationKey);
    }

    if ctx_p.p2pkh().value != ctx_v.htlc().value {
        return Err(RejectReason::ProverPayoutMismatch);
    }
    if ctx_v.p2pkh().value != ctx_p.htlc().value {
        return Err(RejectReason::VerifierPayoutMismatch);
    }

    if ctx_p.p2pkh().pubkey_hash != hash160(setup.pk_v) {
        return Err(RejectReason::ProverPayeeMismatch);
    }
    if ctx_v.p2pkh().pubkey_hash != hash160(setup.pk_p) {
        return Err(RejectReason::VerifierPayeeMismatch);
    }

    check_funding(setup, ctx_p, Party::Prover)?;
    check_funding(setup, ctx_v, Party::Verifier)?;
    check_countersigned(setup, ctx_p, Party::Prover)?;
    check_countersigned(setup, ctx_v, Party::Verifier)?;

    Ok(ChannelBalance::of_prover_commitment(ctx_p))
}

/// Verifies a locked CTxP V claims to be revoked, with the CTxV submitted alongside it
pub fn check_disputed_pair(setup: &SetupRecord, ctx_p: &CommitmentTx, ctx_v: &CommitmentTx) -> RejectResult<()> {
    if u64::from(ctx_p.lock_time().value()) <= setup.dispute_timelock() {
        return Err(RejectReason::InsufficientDisputeTimelock);
    }
    check_funding(setup, ctx_p, Party::Prover)?;
    check_funding(setup, ctx_v, Party::Verifier)?;
    check_countersigned(setup, ctx_p, Party::Prover)?;
    check_countersigned(setup, ctx_v, Party::Verifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{ChannelFixture, CommitmentSpec};
    use alba_consensus_core::tx::{TransactionId, TransactionOutpoint};

    fn parse(raw: &[u8]) -> CommitmentTx {
        parse_commitment(raw, usize::MAX).unwrap()
    }

    #[test]
    fn test_final_pair() {
        let fixture = ChannelFixture::new();
        let setup = fixture.setup_record();
        let ctx_p = parse(&fixture.prover_commitment(&CommitmentSpec::default()));
        let ctx_v = parse(&fixture.verifier_commitment(&CommitmentSpec::default()));
        let balance = check_final_pair(&setup, &ctx_p, &ctx_v).unwrap();
        assert_eq!(balance, ChannelBalance { prover: CommitmentSpec::default().prover, verifier: CommitmentSpec::default().verifier });
        assert_eq!(balance, ChannelBalance::of_verifier_commitment(&ctx_v));
    }

    #[test]
    fn test_final_pair_violations() {
        let fixture = ChannelFixture::new();
        let setup = fixture.setup_record();
        let other_outpoint = TransactionOutpoint::new(TransactionId::from_le_u64(9), 0);

        struct Test {
            name: &'static str,
            ctx_p: CommitmentSpec,
            ctx_v: CommitmentSpec,
            expected: RejectReason,
        }
        let base = CommitmentSpec::default();
        let tests = vec![
            Test {
                name: "P locked",
                ctx_p: CommitmentSpec { lock_time: 1, ..base.clone() },
                ctx_v: base.clone(),
                expected: RejectReason::ProverCommitmentLocked,
            },
            Test {
                name: "both locked",
                ctx_p: CommitmentSpec { lock_time: 1, ..base.clone() },
                ctx_v: CommitmentSpec { lock_time: 1, ..base.clone() },
                expected: RejectReason::ProverCommitmentLocked,
            },
            Test {
                name: "V locked",
                ctx_p: base.clone(),
                ctx_v: CommitmentSpec { lock_time: 1, ..base.clone() },
                expected: RejectReason::VerifierCommitmentLocked,
            },
            Test {
                name: "P revocation key",
                ctx_p: CommitmentSpec { revocation_key: Some(Party::Prover), ..base.clone() },
                ctx_v: base.clone(),
                expected: RejectReason::ProverRevocationKey,
            },
            Test {
                name: "V revocation key",
                ctx_p: base.clone(),
                ctx_v: CommitmentSpec { revocation_key: Some(Party::Verifier), ..base.clone() },
                expected: RejectReason::VerifierRevocationKey,
            },
            Test {
                name: "V balance disagrees",
                ctx_p: CommitmentSpec { verifier: base.verifier + 1, ..base.clone() },
                ctx_v: base.clone(),
                expected: RejectReason::ProverPayoutMismatch,
            },
            Test {
                name: "P balance disagrees",
                ctx_p: base.clone(),
                ctx_v: CommitmentSpec { prover: base.prover - 1, ..base.clone() },
                expected: RejectReason::VerifierPayoutMismatch,
            },
            Test {
                name: "P pays itself",
                ctx_p: CommitmentSpec { payee: Some(Party::Prover), ..base.clone() },
                ctx_v: base.clone(),
                expected: RejectReason::ProverPayeeMismatch,
            },
            Test {
                name: "V pays itself",
                ctx_p: base.clone(),
                ctx_v: CommitmentSpec { payee: Some(Party::Verifier), ..base.clone() },
                expected: RejectReason::VerifierPayeeMismatch,
            },
            Test {
                name: "P spends another output",
                ctx_p: CommitmentSpec { spends: Some(other_outpoint), ..base.clone() },
                ctx_v: base.clone(),
                expected: RejectReason::ProverCommitmentNotFunded,
            },
            Test {
                name: "V spends another output",
                ctx_p: base.clone(),
                ctx_v: CommitmentSpec { spends: Some(other_outpoint), ..base.clone() },
                expected: RejectReason::VerifierCommitmentNotFunded,
            },
            Test {
                name: "P lacks V's signature",
                ctx_p: CommitmentSpec { countersigned: false, ..base.clone() },
                ctx_v: base.clone(),
                expected: RejectReason::MissingVerifierSignature,
            },
            Test {
                name: "V lacks P's signature",
                ctx_p: base.clone(),
                ctx_v: CommitmentSpec { countersigned: false, ..base.clone() },
                expected: RejectReason::MissingProverSignature,
            },
        ];
        for test in tests {
            let ctx_p = parse(&fixture.prover_commitment(&test.ctx_p));
            let ctx_v = parse(&fixture.verifier_commitment(&test.ctx_v));
            assert_eq!(check_final_pair(&setup, &ctx_p, &ctx_v), Err(test.expected), "{}", test.name);
        }
    }

    #[test]
    fn test_disputed_pair() {
        let fixture = ChannelFixture::new();
        let setup = fixture.setup_record();
        let threshold = setup.dispute_timelock() as u32;
        let ctx_v = parse(&fixture.verifier_commitment(&CommitmentSpec::default()));

        for (lock_time, accepted) in [(0, false), (threshold, false), (threshold + 1, true)] {
            let ctx_p = parse(&fixture.prover_commitment(&CommitmentSpec { lock_time, ..Default::default() }));
            let result = check_disputed_pair(&setup, &ctx_p, &ctx_v);
            if accepted {
                assert_eq!(result, Ok(()), "lock time {lock_time}");
            } else {
                assert_eq!(result, Err(RejectReason::InsufficientDisputeTimelock), "lock time {lock_time}");
            }
        }

        let unsigned = parse(&fixture.prover_commitment(&CommitmentSpec { lock_time: threshold + 1, countersigned: false, ..Default::default() }));
        assert_eq!(check_disputed_pair(&setup, &unsigned, &ctx_v), Err(RejectReason::MissingVerifierSignature));
    }

    #[test]
    fn test_parse_commitment() {
        let raw = ChannelFixture::new().prover_commitment(&CommitmentSpec::default());
        assert_eq!(parse_commitment(&raw, raw.len() - 1).map(|_| ()), Err(RejectReason::TransactionTooLarge(raw.len())));
        assert!(parse_commitment(&raw, raw.len()).is_ok());
        assert!(matches!(parse_commitment(&raw[..raw.len() - 1], usize::MAX), Err(RejectReason::MalformedTransaction(_))));
    }
}
