use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum TxParseError {
    #[error("read of {needed} bytes out of bounds, {remaining} remaining")]
    OutOfBounds { needed: usize, remaining: usize },

    #[error("integer width of {0} bytes is not within 1..=8")]
    InvalidIntegerWidth(usize),

    #[error("compact size {0} is not minimally encoded")]
    NonMinimalCompactSize(u64),

    #[error("Tx has too many inputs (>1): {0}")]
    TooManyInputs(u64),

    #[error("Tx has no inputs (segwit serialization is not supported)")]
    NoInputs,

    #[error("{0} trailing bytes after lock time")]
    TrailingBytes(usize),
}

pub type TxParseResult<T> = std::result::Result<T, TxParseError>;
