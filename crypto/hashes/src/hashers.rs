use crate::Hash;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

pub trait HasherBase {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;
}

pub trait Hasher: HasherBase + Clone + Default {
    fn finalize(self) -> Hash;
    fn reset(&mut self);
    #[inline(always)]
    fn hash<A: AsRef<[u8]>>(data: A) -> Hash {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Serializers write through the same interface as hashers, so encodings and digests cannot drift apart
impl HasherBase for Vec<u8> {
    #[inline(always)]
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.extend_from_slice(data.as_ref());
        self
    }
}

macro_rules! sha256_hasher {
    ($(#[$meta:meta])* $name:ident, $rounds:literal) => {
        $(#[$meta])*
        #[derive(Clone, Default)]
        pub struct $name(Sha256);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(Sha256::new())
            }
        }

        impl HasherBase for $name {
            #[inline(always)]
            fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
                self.0.update(data);
                self
            }
        }

        impl Hasher for $name {
            #[inline]
            fn finalize(self) -> Hash {
                let mut digest: [u8; 32] = self.0.finalize().into();
                for _ in 1..$rounds {
                    digest = Sha256::digest(digest).into();
                }
                Hash::from_bytes(digest)
            }

            #[inline(always)]
            fn reset(&mut self) {
                self.0 = Sha256::new();
            }
        }
    };
}

sha256_hasher!(
    /// Single SHA-256, used for revocation secrets and as the inner step of HASH160
    Sha256Hash,
    1
);
sha256_hasher!(
    /// Double SHA-256 over a legacy transaction serialization. The digest is in wire order.
    TransactionID,
    2
);
sha256_hasher!(
    /// Double SHA-256 over a signature-hash preimage
    TransactionSigningHash,
    2
);

/// Keccak-256 (the pre-standard SHA-3 padding), the host ledger's hash
#[derive(Clone, Default)]
pub struct KeccakHash(Keccak256);

impl KeccakHash {
    #[inline]
    pub fn new() -> Self {
        Self(Keccak256::new())
    }
}

impl HasherBase for KeccakHash {
    #[inline(always)]
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.0.update(data);
        self
    }
}

impl Hasher for KeccakHash {
    #[inline]
    fn finalize(self) -> Hash {
        Hash::from_bytes(self.0.finalize().into())
    }

    #[inline(always)]
    fn reset(&mut self) {
        self.0 = Keccak256::new();
    }
}

pub const HASH160_SIZE: usize = 20;

/// RIPEMD-160 of SHA-256, the public key hash of pay-to-pubkey-hash scripts
pub fn hash160(data: impl AsRef<[u8]>) -> [u8; HASH160_SIZE] {
    let sha = Sha256::digest(data.as_ref());
    Ripemd160::digest(sha).into()
}
