//! Error taxonomy: stable error codes plus the domain-level error type.

pub mod domain;
pub mod error_code;

pub use error_code::ErrorCode;
