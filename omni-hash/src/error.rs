// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

use displaydoc::Display;
use thiserror::Error;

/// Errors of the hash crate
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum OmniHashError {
    /// parsing error: {0}
    ParsingError(String),
}
