use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SIG_HASH_ALL: SigHashType = SigHashType(0x01);
pub const SIG_HASH_NONE: SigHashType = SigHashType(0x02);
pub const SIG_HASH_SINGLE: SigHashType = SigHashType(0x03);
pub const SIG_HASH_ANY_ONE_CAN_PAY: SigHashType = SigHashType(0x80);

/// SIG_HASH_MASK defines the number of bits of the hash type which are used
/// to identify which outputs are signed.
pub const SIG_HASH_MASK: u32 = 0x1f;

const ALLOWED_SIG_HASH_TYPES_VALUES: [u32; 6] = [
    SIG_HASH_ALL.0,
    SIG_HASH_NONE.0,
    SIG_HASH_SINGLE.0,
    SIG_HASH_ALL.0 | SIG_HASH_ANY_ONE_CAN_PAY.0,
    SIG_HASH_NONE.0 | SIG_HASH_ANY_ONE_CAN_PAY.0,
    SIG_HASH_SINGLE.0 | SIG_HASH_ANY_ONE_CAN_PAY.0,
];

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum SigHashTypeError {
    #[error("invalid sighash type {0:#x}")]
    InvalidSigHashType(u32),
}

/// The signature-hash mode. It is appended to the preimage as a 4-byte integer and to a
/// signature as its low byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SigHashType(u32);

impl SigHashType {
    pub fn is_sighash_all(self) -> bool {
        !self.is_sighash_none() && !self.is_sighash_single()
    }

    pub fn is_sighash_none(self) -> bool {
        self.0 & SIG_HASH_MASK == SIG_HASH_NONE.0
    }

    pub fn is_sighash_single(self) -> bool {
        self.0 & SIG_HASH_MASK == SIG_HASH_SINGLE.0
    }

    pub fn is_sighash_anyone_can_pay(self) -> bool {
        self.0 & SIG_HASH_ANY_ONE_CAN_PAY.0 == SIG_HASH_ANY_ONE_CAN_PAY.0
    }

    pub fn to_u32(self) -> u32 {
        self.0
    }

    /// The byte a signature made under this mode ends with
    pub fn to_signature_byte(self) -> u8 {
        self.0 as u8
    }

    pub fn from_u32(val: u32) -> Result<Self, SigHashTypeError> {
        if !ALLOWED_SIG_HASH_TYPES_VALUES.contains(&val) {
            return Err(SigHashTypeError::InvalidSigHashType(val));
        }
        Ok(Self(val))
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        SIG_HASH_ALL
    }
}

impl TryFrom<u32> for SigHashType {
    type Error = SigHashTypeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value)
    }
}

impl From<SigHashType> for u32 {
    fn from(value: SigHashType) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes() {
        struct Test {
            value: u32,
            all: bool,
            none: bool,
            single: bool,
            anyone_can_pay: bool,
        }

        let tests = vec![
            Test { value: 0x01, all: true, none: false, single: false, anyone_can_pay: false },
            Test { value: 0x02, all: false, none: true, single: false, anyone_can_pay: false },
            Test { value: 0x03, all: false, none: false, single: true, anyone_can_pay: false },
            Test { value: 0x81, all: true, none: false, single: false, anyone_can_pay: true },
            Test { value: 0x82, all: false, none: true, single: false, anyone_can_pay: true },
            Test { value: 0x83, all: false, none: false, single: true, anyone_can_pay: true },
        ];

        for test in tests {
            let hash_type = SigHashType::from_u32(test.value).unwrap();
            assert_eq!(hash_type.is_sighash_all(), test.all, "{:#x}", test.value);
            assert_eq!(hash_type.is_sighash_none(), test.none, "{:#x}", test.value);
            assert_eq!(hash_type.is_sighash_single(), test.single, "{:#x}", test.value);
            assert_eq!(hash_type.is_sighash_anyone_can_pay(), test.anyone_can_pay, "{:#x}", test.value);
            assert_eq!(hash_type.to_signature_byte() as u32, test.value);
        }
    }

    #[test]
    fn test_invalid_modes() {
        for value in [0x00, 0x04, 0x80, 0x84, 0x101] {
            assert_eq!(SigHashType::from_u32(value), Err(SigHashTypeError::InvalidSigHashType(value)));
        }
    }
}
