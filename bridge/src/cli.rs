use alba_bridge::{BridgeParams, scenario::Scenario};
use alba_consensus_core::{hashing::sighash_type::SigHashType, parse::parse_transaction};
use alba_txscript::{
    raw::{extract_compressed_pk, get_signatures, get_tx_digest},
    script_class::ScriptClass,
    standard::classify_and_extract,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Logging filters, e.g. `info,alba_bridge=trace`
    #[arg(long, default_value = "info")]
    pub loglevel: String,

    /// Directory to write log files to, in addition to the console
    #[arg(long)]
    pub logdir: Option<String>,

    /// TOML file overriding the default bridge parameters
    #[arg(long)]
    pub params: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a raw transaction and classify its outputs
    Decode { tx: String },

    /// Signature digest of the first input of a transaction spending an output locked by `script`
    Digest {
        tx: String,
        script: String,
        /// Sighash mode, the configured default if omitted
        #[arg(long)]
        sighash: Option<u32>,
    },

    /// DER signatures of the first input of a signed transaction
    Signatures { tx: String },

    /// The two public keys of a 2-of-2 funding script
    FundingKeys { script: String },

    /// Replay a contract scenario and print its steps and final state
    Replay { scenario: PathBuf },
}

fn decode_hex(name: &str, value: &str) -> anyhow::Result<Vec<u8>> {
    hex::decode(value.trim().trim_start_matches("0x")).with_context(|| format!("{name} is not valid hex"))
}

impl Cli {
    pub fn bridge_params(&self) -> anyhow::Result<BridgeParams> {
        let Some(path) = &self.params else {
            return Ok(BridgeParams::default());
        };
        let contents = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        BridgeParams::from_toml(&contents).with_context(|| format!("invalid parameters in {}", path.display()))
    }
}

impl Command {
    pub fn run(&self, params: BridgeParams) -> anyhow::Result<Value> {
        match self {
            Command::Decode { tx } => {
                let tx = parse_transaction(&decode_hex("tx", tx)?)?;
                let outputs: Vec<Value> = tx
                    .outputs
                    .iter()
                    .enumerate()
                    .map(|(index, output)| {
                        json!({
                            "index": index,
                            "class": ScriptClass::from_script(&output.script_public_key),
                            "parsed": classify_and_extract(output.value, &output.script_public_key).ok(),
                        })
                    })
                    .collect();
                Ok(json!({ "txid": tx.id(), "locked": tx.lock_time.is_locked(), "transaction": tx, "outputs": outputs }))
            }
            Command::Digest { tx, script, sighash } => {
                let hash_type = match sighash {
                    Some(value) => SigHashType::from_u32(*value)?,
                    None => params.default_sighash_type,
                };
                let digest = get_tx_digest(&decode_hex("tx", tx)?, &decode_hex("script", script)?, hash_type)?;
                Ok(json!({ "digest": digest, "sighash": hash_type }))
            }
            Command::Signatures { tx } => Ok(serde_json::to_value(get_signatures(&decode_hex("tx", tx)?)?)?),
            Command::FundingKeys { script } => {
                let (pk_p, pk_v) = extract_compressed_pk(&decode_hex("script", script)?)?;
                Ok(json!({ "pk-p": hex::encode(pk_p), "pk-v": hex::encode(pk_v) }))
            }
            Command::Replay { scenario } => {
                let contents = std::fs::read_to_string(scenario).with_context(|| format!("cannot read {}", scenario.display()))?;
                let replay = Scenario::from_toml(&contents)?.replay(params)?;
                Ok(serde_json::to_value(&replay)?)
            }
        }
    }
}
