// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

use displaydoc::Display;
use thiserror::Error;

/// Errors of the signature crate
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum OmniSignatureError {
    /// parsing error: {0}
    ParsingError(String),
    /// signing error: {0}
    SigningError(String),
    /// signature verification error: {0}
    VerificationError(String),
}
