// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

use displaydoc::Display;
use thiserror::Error;

use crate::collection::CollectionError;

/// Errors of the models crate
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ModelsError {
    /// serialization error: {0}
    SerializeError(#[from] omni_serialization::SerializeError),
    /// deserialization error: {0}
    DeserializeError(String),
    /// missing argument: {0}
    MissingArgument(String),
    /// malformed darc: {0}
    MalformedDarc(String),
    /// omni_hash error: {0}
    HashError(#[from] omni_hash::OmniHashError),
    /// signature engine error: {0}
    SignatureError(#[from] omni_signature::OmniSignatureError),
    /// collection error: {0}
    CollectionError(#[from] CollectionError),
}
