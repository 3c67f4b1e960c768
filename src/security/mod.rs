//! Security module: webhook request authentication

pub mod signature;

pub use signature::{SIGNATURE_HEADER, compute_signature, validate_signature};
