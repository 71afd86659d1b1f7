use crate::{
    opcodes::parse_script_strict,
    standard::{extract_compressed_public_keys, match_htlc, match_null_data, match_p2pkh},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum Error {
    #[error("Invalid script class {0}")]
    InvalidScriptClass(String),
}

/// Standard classes of locking scripts
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptClass {
    /// None of the recognized forms.
    NonStandard,

    /// Revocable payout of a commitment transaction.
    Htlc,

    /// Pay to pubkey hash.
    PubKeyHash,

    /// Provably unspendable data carrier.
    NullData,

    /// 2-of-2 multi-signature funding output.
    Funding,
}

const NON_STANDARD: &str = "nonstandard";
const HTLC: &str = "htlc";
const PUB_KEY_HASH: &str = "pubkeyhash";
const NULL_DATA: &str = "nulldata";
const FUNDING: &str = "funding";

impl ScriptClass {
    pub fn from_script(script: &[u8]) -> Self {
        let Ok(ops) = parse_script_strict(script) else {
            return ScriptClass::NonStandard;
        };
        if match_htlc(0, &ops).is_some() {
            ScriptClass::Htlc
        } else if match_p2pkh(0, &ops).is_some() {
            ScriptClass::PubKeyHash
        } else if match_null_data(0, &ops).is_some() {
            ScriptClass::NullData
        } else if extract_compressed_public_keys(script).is_ok() {
            ScriptClass::Funding
        } else {
            ScriptClass::NonStandard
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ScriptClass::NonStandard => NON_STANDARD,
            ScriptClass::Htlc => HTLC,
            ScriptClass::PubKeyHash => PUB_KEY_HASH,
            ScriptClass::NullData => NULL_DATA,
            ScriptClass::Funding => FUNDING,
        }
    }
}

impl Display for ScriptClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptClass {
    type Err = Error;

    fn from_str(script_class: &str) -> Result<Self, Self::Err> {
        match script_class {
            NON_STANDARD => Ok(ScriptClass::NonStandard),
            HTLC => Ok(ScriptClass::Htlc),
            PUB_KEY_HASH => Ok(ScriptClass::PubKeyHash),
            NULL_DATA => Ok(ScriptClass::NullData),
            FUNDING => Ok(ScriptClass::Funding),

            _ => Err(Error::InvalidScriptClass(script_class.to_string())),
        }
    }
}

impl TryFrom<&str> for ScriptClass {
    type Error = Error;

    fn try_from(script_class: &str) -> Result<Self, Self::Error> {
        script_class.parse()
    }
}
