pub mod errors;
pub mod hashing;
pub mod parse;
pub mod reader;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;
pub mod tx;
