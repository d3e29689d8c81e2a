// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Ed25519 keys and signatures used to sign instruction digests.

#![warn(missing_docs)]

pub use error::OmniSignatureError;
pub use signature_impl::{
    KeyPair, PublicKey, PublicKeyDeserializer, Signature, SignatureDeserializer,
    PUBLIC_KEY_SIZE_BYTES, SECRET_KEY_SIZE_BYTES, SIGNATURE_SIZE_BYTES,
};

mod error;
mod signature_impl;
