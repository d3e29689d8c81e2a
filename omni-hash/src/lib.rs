// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Cryptographic digesting for the omniledger transaction core.

#![warn(missing_docs)]

pub use error::OmniHashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};
pub use settings::HASH_SIZE_BYTES;

mod error;
mod hash;
mod settings;
