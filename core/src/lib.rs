extern crate self as alba_core;

pub mod log;
pub mod time;

#[doc(hidden)]
pub use ::log as __log;
