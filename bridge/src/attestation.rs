//! Host-ledger identities and the signatures P and V make over protocol messages.
//!
//! A party is known to the host ledger by the last 20 bytes of the Keccak-256 digest of its
//! uncompressed public key. Attestations are 65-byte recoverable signatures `r ‖ s ‖ v` made over
//! the raw 32-byte message digest, `v` being the recovery id either bare (0, 1) or offset by 27.

use alba_hashes::{Hash, Hasher, HasherBase, KeccakHash};
use alba_txscript::CompressedPublicKey;
use secp256k1::{
    Message, PublicKey, SECP256K1, SecretKey,
    ecdsa::{RecoverableSignature, RecoveryId},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

pub const HOST_ADDRESS_SIZE: usize = 20;
pub const HOST_SIGNATURE_SIZE: usize = 65;

/// Offset some signers add to the recovery id
const RECOVERY_ID_OFFSET: u8 = 27;

#[derive(Error, PartialEq, Debug, Clone)]
pub enum AttestationError {
    #[error("expected {expected} bytes, found {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Secp256k1(#[from] secp256k1::Error),
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], AttestationError> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| AttestationError::InvalidLength { expected: N, found: bytes.len() })
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct HostAddress([u8; HOST_ADDRESS_SIZE]);

impl HostAddress {
    pub const fn from_bytes(bytes: [u8; HOST_ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; HOST_ADDRESS_SIZE] {
        &self.0
    }

    pub fn from_public_key(key: &PublicKey) -> Self {
        let digest = KeccakHash::hash(&key.serialize_uncompressed()[1..]).as_bytes();
        let mut bytes = [0u8; HOST_ADDRESS_SIZE];
        bytes.copy_from_slice(&digest[digest.len() - HOST_ADDRESS_SIZE..]);
        Self(bytes)
    }

    /// The address of the key a Bitcoin script refers to
    pub fn from_compressed(key: &CompressedPublicKey) -> Result<Self, AttestationError> {
        Ok(Self::from_public_key(&PublicKey::from_slice(key)?))
    }
}

impl Display for HostAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for HostAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for HostAddress {
    type Err = AttestationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Self)
    }
}

impl Serialize for HostAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HostAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A recoverable host-ledger signature, `r ‖ s ‖ v`
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct HostSignature([u8; HOST_SIGNATURE_SIZE]);

impl HostSignature {
    pub const fn from_bytes(bytes: [u8; HOST_SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AttestationError> {
        <[u8; HOST_SIGNATURE_SIZE]>::try_from(bytes)
            .map(Self)
            .map_err(|_| AttestationError::InvalidLength { expected: HOST_SIGNATURE_SIZE, found: bytes.len() })
    }

    pub const fn as_bytes(&self) -> &[u8; HOST_SIGNATURE_SIZE] {
        &self.0
    }

    fn recovery_id(&self) -> Option<RecoveryId> {
        let v = self.0[HOST_SIGNATURE_SIZE - 1];
        let id = match v {
            0 | 1 => v,
            27 | 28 => v - RECOVERY_ID_OFFSET,
            _ => return None,
        };
        RecoveryId::from_i32(id as i32).ok()
    }

    /// The key that produced this signature over `digest`
    pub fn recover(&self, digest: Hash) -> Option<PublicKey> {
        let id = self.recovery_id()?;
        let sig = RecoverableSignature::from_compact(&self.0[..HOST_SIGNATURE_SIZE - 1], id).ok()?;
        SECP256K1.recover_ecdsa(&Message::from_digest(digest.as_bytes()), &sig).ok()
    }
}

impl Display for HostSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for HostSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for HostSignature {
    type Err = AttestationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Self)
    }
}

impl Serialize for HostSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HostSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether `signature` was made over `digest` by the owner of `expected`
pub fn verify_host_signature(digest: Hash, signature: &HostSignature, expected: &HostAddress) -> bool {
    signature.recover(digest).is_some_and(|key| HostAddress::from_public_key(&key) == *expected)
}

/// Signs `digest` the way a host-ledger wallet does, with `v` offset by 27
pub fn sign_host_digest(digest: Hash, secret_key: &SecretKey) -> HostSignature {
    let sig = SECP256K1.sign_ecdsa_recoverable(&Message::from_digest(digest.as_bytes()), secret_key);
    let (id, compact) = sig.serialize_compact();
    let mut bytes = [0u8; HOST_SIGNATURE_SIZE];
    bytes[..HOST_SIGNATURE_SIZE - 1].copy_from_slice(&compact);
    bytes[HOST_SIGNATURE_SIZE - 1] = id.to_i32() as u8 + RECOVERY_ID_OFFSET;
    HostSignature(bytes)
}

/// The message both parties sign to attest a channel state off-chain
pub fn optimistic_proof_digest(epoch: u64) -> Hash {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&epoch.to_be_bytes());
    let mut hasher = KeccakHash::new();
    hasher.update(word);
    hasher.finalize()
}
