//! Replays of a contract's life from a TOML description, as run by `alba-bridge replay`.
//!
//! ```toml
//! [channel]
//! prover-secret = "0a0a…"
//! verifier-secret = "0b0b…"
//! funding-txid = "…"
//! funding-index = 1
//! timelock = 1000
//! relative-timelock = 100
//!
//! [[call]]
//! call = "deposit"
//! party = "prover"
//! amount = 500
//!
//! [[call]]
//! call = "submit-proof"
//! ctx-p = "02000000…"
//! ctx-v = "02000000…"
//! now = 1200
//!
//! [[call]]
//! call = "settle"
//! ```
//!
//! The secrets sign the setup and optimistic attestations on behalf of the parties. The funding
//! script is the 2-of-2 script of their keys.

use crate::{
    attestation::{HostAddress, HostSignature, optimistic_proof_digest, sign_host_digest},
    escrow::Bridge,
    ledger::Party,
    outcome::CallResult,
    params::BridgeParams,
    settlement::RecordingCustody,
    setup::SetupRequest,
};
use alba_consensus_core::{hashing::sighash_type::SIG_HASH_ALL, tx::TransactionId};
use alba_core::time::unix_now_secs;
use alba_hashes::Hash;
use alba_txscript::standard::{MultisigCreateError, funding_script};
use secp256k1::{PublicKey, SECP256K1, SecretKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("invalid scenario: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid party secret: {0}")]
    Secret(#[from] secp256k1::Error),

    #[error(transparent)]
    FundingScript(#[from] MultisigCreateError),
}

fn default_sighash_type() -> u32 {
    SIG_HASH_ALL.to_u32()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ChannelConfig {
    #[serde(with = "hex::serde")]
    pub prover_secret: [u8; 32],
    #[serde(with = "hex::serde")]
    pub verifier_secret: [u8; 32],
    pub funding_txid: TransactionId,
    pub funding_index: u32,
    #[serde(default = "default_sighash_type")]
    pub sighash_type: u32,
    pub timelock: u64,
    pub relative_timelock: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "call", rename_all = "kebab-case", deny_unknown_fields)]
pub enum ScenarioCall {
    Deposit {
        party: Party,
        amount: u64,
    },
    /// A transfer from an address which is not a party of the contract
    ForeignDeposit {
        address: HostAddress,
        amount: u64,
    },
    OptimisticSubmitProof {
        epoch: u64,
        /// Parties whose attestation is genuine, both by default. The others sign another epoch.
        signers: Option<Vec<Party>>,
    },
    #[serde(rename_all = "kebab-case")]
    SubmitProof {
        #[serde(with = "hex::serde")]
        ctx_p: Vec<u8>,
        #[serde(with = "hex::serde")]
        ctx_v: Vec<u8>,
        /// Host-ledger clock in seconds, the wall clock if omitted
        now: Option<u64>,
    },
    #[serde(rename_all = "kebab-case")]
    Dispute {
        #[serde(with = "hex::serde")]
        ctx_p: Vec<u8>,
        #[serde(with = "hex::serde")]
        ctx_v: Vec<u8>,
        now: Option<u64>,
    },
    #[serde(rename_all = "kebab-case")]
    ResolveValidDispute {
        #[serde(with = "hex::serde")]
        ctx_p: Vec<u8>,
        now: Option<u64>,
    },
    ResolveInvalidDispute {
        #[serde(with = "hex::serde")]
        secret: Vec<u8>,
    },
    Settle {
        now: Option<u64>,
    },
}

fn clock(now: Option<u64>) -> u64 {
    now.unwrap_or_else(unix_now_secs)
}

impl ScenarioCall {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioCall::Deposit { .. } | ScenarioCall::ForeignDeposit { .. } => "deposit",
            ScenarioCall::OptimisticSubmitProof { .. } => "optimistic-submit-proof",
            ScenarioCall::SubmitProof { .. } => "submit-proof",
            ScenarioCall::Dispute { .. } => "dispute",
            ScenarioCall::ResolveValidDispute { .. } => "resolve-valid-dispute",
            ScenarioCall::ResolveInvalidDispute { .. } => "resolve-invalid-dispute",
            ScenarioCall::Settle { .. } => "settle",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Scenario {
    pub channel: ChannelConfig,
    #[serde(default, rename = "call")]
    pub calls: Vec<ScenarioCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum StepReport {
    Completed { call: &'static str, label: &'static str, success: bool },
    Rejected { call: &'static str, reason: String },
}

impl StepReport {
    fn new(call: &'static str, result: CallResult) -> Self {
        match result {
            CallResult::Completed(outcome) => StepReport::Completed { call, label: outcome.label, success: outcome.success },
            CallResult::Rejected(reason) => StepReport::Rejected { call, reason: reason.to_string() },
        }
    }
}

/// The state a scenario leaves behind
#[derive(Debug, Clone, Serialize)]
pub struct Replay {
    pub steps: Vec<StepReport>,
    pub bridge: Bridge,
    pub custody: RecordingCustody,
}

struct Signers {
    prover: SecretKey,
    verifier: SecretKey,
}

impl Signers {
    fn secret(&self, party: Party) -> &SecretKey {
        match party {
            Party::Prover => &self.prover,
            Party::Verifier => &self.verifier,
        }
    }

    fn key(&self, party: Party) -> PublicKey {
        PublicKey::from_secret_key(SECP256K1, self.secret(party))
    }

    fn sign(&self, party: Party, digest: Hash) -> HostSignature {
        sign_host_digest(digest, self.secret(party))
    }
}

impl Scenario {
    pub fn from_toml(s: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(s)?)
    }

    /// Runs the setup, then every call in order
    pub fn replay(&self, params: BridgeParams) -> Result<Replay, ScenarioError> {
        let channel = &self.channel;
        let signers =
            Signers { prover: SecretKey::from_slice(&channel.prover_secret)?, verifier: SecretKey::from_slice(&channel.verifier_secret)? };
        let pk_p = signers.key(Party::Prover).serialize();
        let pk_v = signers.key(Party::Verifier).serialize();
        let request = SetupRequest {
            funding_txid: channel.funding_txid,
            funding_script: funding_script(&pk_p, &pk_v)?,
            funding_index: channel.funding_index,
            sighash_type: channel.sighash_type,
            pk_p,
            pk_v,
            timelock: channel.timelock,
            relative_timelock: channel.relative_timelock,
        };

        let mut bridge = Bridge::new(params);
        let mut custody = RecordingCustody::default();
        let digest = request.digest();
        let setup = bridge.setup(request, &signers.sign(Party::Prover, digest), &signers.sign(Party::Verifier, digest));
        let mut steps = vec![StepReport::new("setup", setup)];

        for call in &self.calls {
            let result = match call {
                ScenarioCall::Deposit { party, amount } => {
                    bridge.deposit(HostAddress::from_public_key(&signers.key(*party)), u128::from(*amount))
                }
                ScenarioCall::ForeignDeposit { address, amount } => bridge.deposit(*address, u128::from(*amount)),
                ScenarioCall::OptimisticSubmitProof { epoch, signers: genuine } => {
                    let attest = |party: Party| {
                        let genuine = genuine.as_ref().is_none_or(|parties| parties.contains(&party));
                        let epoch = if genuine { *epoch } else { epoch.wrapping_add(1) };
                        signers.sign(party, optimistic_proof_digest(epoch))
                    };
                    bridge.optimistic_submit_proof(&attest(Party::Prover), &attest(Party::Verifier), *epoch)
                }
                ScenarioCall::SubmitProof { ctx_p, ctx_v, now } => bridge.submit_proof(ctx_p, ctx_v, clock(*now)),
                ScenarioCall::Dispute { ctx_p, ctx_v, now } => bridge.dispute(ctx_p, ctx_v, clock(*now)),
                ScenarioCall::ResolveValidDispute { ctx_p, now } => bridge.resolve_valid_dispute(ctx_p, clock(*now)),
                ScenarioCall::ResolveInvalidDispute { secret } => bridge.resolve_invalid_dispute(secret),
                ScenarioCall::Settle { now } => bridge.settle(&mut custody, clock(*now)),
            };
            steps.push(StepReport::new(call.name(), result));
        }

        Ok(Replay { steps, bridge, custody })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::labels,
        testutils::{ChannelFixture, CommitmentSpec, PROVER_SECRET, VERIFIER_SECRET},
    };

    fn scenario(fixture: &ChannelFixture, calls: &str) -> String {
        let funding = fixture.funding_outpoint();
        format!(
            "[channel]\nprover-secret = \"{}\"\nverifier-secret = \"{}\"\nfunding-txid = \"{}\"\nfunding-index = {}\ntimelock = {}\nrelative-timelock = {}\n\n{calls}",
            hex::encode(PROVER_SECRET),
            hex::encode(VERIFIER_SECRET),
            funding.transaction_id,
            funding.index,
            fixture.timelock,
            fixture.relative_timelock,
        )
    }

    #[test]
    fn test_replay_full_proof() {
        let fixture = ChannelFixture::new();
        let ctx_p = hex::encode(fixture.prover_commitment(&CommitmentSpec::default()));
        let ctx_v = hex::encode(fixture.verifier_commitment(&CommitmentSpec::default()));
        let toml = scenario(
            &fixture,
            &format!(
                r#"
[[call]]
call = "deposit"
party = "prover"
amount = 600

[[call]]
call = "deposit"
party = "verifier"
amount = 400

[[call]]
call = "foreign-deposit"
address = "0x0000000000000000000000000000000000000001"
amount = 5

[[call]]
call = "submit-proof"
ctx-p = "{ctx_p}"
ctx-v = "{ctx_v}"
now = 1000

[[call]]
call = "settle"

[[call]]
call = "settle"
"#
            ),
        );
        let replay = Scenario::from_toml(&toml).unwrap().replay(BridgeParams::default()).unwrap();
        let labels: Vec<String> = replay
            .steps
            .iter()
            .map(|step| match step {
                StepReport::Completed { label, .. } => label.to_string(),
                StepReport::Rejected { reason, .. } => reason.clone(),
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                labels::SETUP_COMPLETED.to_string(),
                labels::COINS_LOCKED.to_string(),
                labels::COINS_LOCKED.to_string(),
                "Sender 0x0000000000000000000000000000000000000001 is not a party of the contract".to_string(),
                labels::PROOF_VERIFIED.to_string(),
                labels::PROOF_FUNDS_DISTRIBUTED.to_string(),
                "Contract already settled".to_string(),
            ]
        );
        assert_eq!(replay.custody.total_to(&fixture.address(Party::Prover)), 700);
        assert_eq!(replay.custody.total_to(&fixture.address(Party::Verifier)), 300);
        assert_eq!(replay.bridge.events().len(), 5);
    }

    #[test]
    fn test_replay_timed_out_dispute() {
        let fixture = ChannelFixture::new();
        let stale = CommitmentSpec { lock_time: (fixture.timelock + fixture.relative_timelock + 1) as u32, ..Default::default() };
        let ctx_p = hex::encode(fixture.prover_commitment(&stale));
        let ctx_v = hex::encode(fixture.verifier_commitment(&CommitmentSpec::default()));
        let at = |settle_at: u64| {
            scenario(
                &fixture,
                &format!(
                    r#"
[[call]]
call = "deposit"
party = "prover"
amount = 600

[[call]]
call = "dispute"
ctx-p = "{ctx_p}"
ctx-v = "{ctx_v}"
now = {}

[[call]]
call = "settle"
now = {settle_at}
"#,
                    fixture.timelock
                ),
            )
        };

        let in_window = Scenario::from_toml(&at(fixture.timelock + fixture.relative_timelock - 1)).unwrap();
        let replay = in_window.replay(BridgeParams::default()).unwrap();
        assert_eq!(replay.steps[3], StepReport::Completed { call: "settle", label: labels::ALL_FUNDS_TO_P, success: true });
        assert_eq!(replay.custody.total_to(&fixture.address(Party::Prover)), 600);

        let timed_out = Scenario::from_toml(&at(fixture.timelock + fixture.relative_timelock)).unwrap();
        let replay = timed_out.replay(BridgeParams::default()).unwrap();
        assert_eq!(replay.steps[3], StepReport::Completed { call: "settle", label: labels::ALL_FUNDS_TO_V, success: true });
        assert_eq!(replay.custody.total_to(&fixture.address(Party::Verifier)), 600);
    }

    #[test]
    fn test_replay_optimistic_signers() {
        let fixture = ChannelFixture::new();
        let toml = scenario(
            &fixture,
            r#"
[[call]]
call = "optimistic-submit-proof"
epoch = 4
signers = ["prover"]

[[call]]
call = "optimistic-submit-proof"
epoch = 4
"#,
        );
        let replay = Scenario::from_toml(&toml).unwrap().replay(BridgeParams::default()).unwrap();
        assert_eq!(
            replay.steps[1],
            StepReport::Completed { call: "optimistic-submit-proof", label: labels::PROOF_VERIFICATION_FAILED, success: false }
        );
        assert_eq!(
            replay.steps[2],
            StepReport::Completed { call: "optimistic-submit-proof", label: labels::PROOF_OPTIMISTICALLY_VERIFIED, success: true }
        );
        let json = serde_json::to_value(&replay.steps[2]).unwrap();
        assert_eq!(json["result"], "completed");
    }

    #[test]
    fn test_invalid_scenarios() {
        let fixture = ChannelFixture::new();
        assert!(matches!(Scenario::from_toml(&scenario(&fixture, "[[call]]\ncall = \"withdraw\"")), Err(ScenarioError::Toml(_))));
        assert!(matches!(Scenario::from_toml("[channel]\nprover-secret = \"00\""), Err(ScenarioError::Toml(_))));

        let zero_secret = scenario(&fixture, "").replace(&hex::encode(PROVER_SECRET), &"00".repeat(32));
        assert!(matches!(Scenario::from_toml(&zero_secret).unwrap().replay(BridgeParams::default()), Err(ScenarioError::Secret(_))));
    }
}
