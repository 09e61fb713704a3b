//! # Tandem Common
//!
//! Shared primitives with no domain knowledge. Currently hosts the
//! cryptographic primitives used to seal refresh credentials at rest.

pub mod crypto;
pub mod error;

pub use error::{CommonError, CommonResult};
