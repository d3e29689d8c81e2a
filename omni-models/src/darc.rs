// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Contract with the external darc policy engine.
//!
//! This core never evaluates a policy itself. It only assembles
//! [`Request`] values for the engine to verify, and parses just enough of a
//! serialized [`Darc`] to bind an evolution signature to the exact new
//! version of the document.

use crate::constants::MAX_DARC_RULES_SIZE;
use crate::error::ModelsError;
use crate::serialization::{VecU8Deserializer, VecU8Serializer};
use omni_hash::{Hash, HashDeserializer, HASH_SIZE_BYTES};
use omni_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use omni_signature::{KeyPair, PublicKey, PublicKeyDeserializer, PUBLIC_KEY_SIZE_BYTES};
use nom::error::context;
use nom::sequence::tuple;
use nom::Parser;
use nom::{
    error::{ContextError, ParseError},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;
use std::str::FromStr;

/// Size of a darc base identifier
pub const DARC_ID_SIZE_BYTES: usize = HASH_SIZE_BYTES;

/// The reserved action that replaces a darc with its next version. Requests
/// for it are verified against the new version's identifier, not against the
/// instruction digest.
pub const DARC_EVOLVE_ACTION: &str = "invoke:evolve";

/// Base identifier of an access-control policy document.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DarcId(Hash);

impl std::fmt::Display for DarcId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for DarcId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DarcId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DarcId(Hash::from_str(s)?))
    }
}

impl DarcId {
    /// darc id to bytes
    pub fn to_bytes(&self) -> &[u8; DARC_ID_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// darc id from bytes
    pub fn from_bytes(data: &[u8; DARC_ID_SIZE_BYTES]) -> DarcId {
        DarcId(Hash::from_bytes(data))
    }
}

/// Deserializer for `DarcId`
#[derive(Default, Clone)]
pub struct DarcIdDeserializer {
    hash_deserializer: HashDeserializer,
}

impl DarcIdDeserializer {
    /// Creates a deserializer for `DarcId`
    pub const fn new() -> Self {
        Self {
            hash_deserializer: HashDeserializer::new(),
        }
    }
}

impl Deserializer<DarcId> for DarcIdDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], DarcId, E> {
        context("Failed DarcId deserialization", |input| {
            self.hash_deserializer.deserialize(input)
        })
        .map(DarcId)
        .parse(buffer)
    }
}

/// Identity a darc rule can grant rights to. Only ed25519 identities are
/// carried at this layer, the engine may know more kinds.
#[derive(Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Identity(PublicKey);

impl Identity {
    /// Creates an identity from a public key
    pub fn new(public_key: PublicKey) -> Self {
        Identity(public_key)
    }

    /// The public key backing this identity
    pub fn public_key(&self) -> &PublicKey {
        &self.0
    }

    /// Canonical bytes of the identity
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE_BYTES] {
        self.0.to_bytes()
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deserializer for `Identity`
#[derive(Default, Clone)]
pub struct IdentityDeserializer {
    public_key_deserializer: PublicKeyDeserializer,
}

impl IdentityDeserializer {
    /// Creates a deserializer for `Identity`
    pub const fn new() -> Self {
        Self {
            public_key_deserializer: PublicKeyDeserializer::new(),
        }
    }
}

impl Deserializer<Identity> for IdentityDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Identity, E> {
        context("Failed Identity deserialization", |input| {
            self.public_key_deserializer.deserialize(input)
        })
        .map(Identity)
        .parse(buffer)
    }
}

/// One signature entry on an instruction: the signing identity plus the raw
/// signature bytes. The bytes are empty while the two-pass signing protocol
/// is between its passes.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct DarcSignature {
    /// who signed
    pub signer: Identity,
    /// raw signature bytes over the request digest
    pub signature: Vec<u8>,
}

/// Serializer for `DarcSignature`
pub struct DarcSignatureSerializer {
    signature_serializer: VecU8Serializer,
}

impl DarcSignatureSerializer {
    /// Creates a new `DarcSignatureSerializer`
    pub const fn new() -> Self {
        Self {
            signature_serializer: VecU8Serializer::new(),
        }
    }
}

impl Default for DarcSignatureSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<DarcSignature> for DarcSignatureSerializer {
    fn serialize(&self, value: &DarcSignature, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend(value.signer.to_bytes());
        self.signature_serializer
            .serialize(&value.signature, buffer)?;
        Ok(())
    }
}

/// Deserializer for `DarcSignature`
pub struct DarcSignatureDeserializer {
    identity_deserializer: IdentityDeserializer,
    signature_deserializer: VecU8Deserializer,
}

impl DarcSignatureDeserializer {
    /// Creates a new `DarcSignatureDeserializer`
    pub const fn new() -> Self {
        Self {
            identity_deserializer: IdentityDeserializer::new(),
            signature_deserializer: VecU8Deserializer::new(
                Included(0),
                Included(crate::constants::MAX_SIGNATURE_SIZE),
            ),
        }
    }
}

impl Default for DarcSignatureDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<DarcSignature> for DarcSignatureDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], DarcSignature, E> {
        context(
            "Failed DarcSignature deserialization",
            tuple((
                context("Failed signer deserialization", |input| {
                    self.identity_deserializer.deserialize(input)
                }),
                context("Failed signature deserialization", |input| {
                    self.signature_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(signer, signature)| DarcSignature { signer, signature })
        .parse(buffer)
    }
}

/// Capability to sign digests on behalf of one identity.
pub trait Signer {
    /// The identity verifiers will check signatures against
    fn identity(&self) -> Identity;
    /// Sign the given digest, returning raw signature bytes
    fn sign(&self, digest: &Hash) -> Result<Vec<u8>, ModelsError>;
}

impl Signer for KeyPair {
    fn identity(&self) -> Identity {
        Identity::new(self.get_public_key())
    }

    fn sign(&self, digest: &Hash) -> Result<Vec<u8>, ModelsError> {
        Ok(KeyPair::sign(self, digest)?.to_bytes().to_vec())
    }
}

/// A versioned access-control policy document.
///
/// Only the shape needed at this layer is modeled: the rule expressions are
/// an opaque blob the external engine interprets.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Darc {
    /// version counter, incremented by each evolution
    pub version: u64,
    /// base identifier, `None` for a genesis (version 0) darc
    pub base_id: Option<DarcId>,
    /// opaque rule expressions evaluated by the policy engine
    pub rules: Vec<u8>,
}

impl Darc {
    /// The identifier of this exact version: the digest of the canonical
    /// encoding.
    pub fn id(&self) -> Result<DarcId, ModelsError> {
        let mut buffer = Vec::new();
        DarcSerializer::new().serialize(self, &mut buffer)?;
        Ok(DarcId(Hash::compute_from(&buffer)))
    }

    /// The base identifier shared by all versions of this document.
    pub fn base_id(&self) -> Result<DarcId, ModelsError> {
        if self.version == 0 {
            return self.id();
        }
        self.base_id
            .ok_or_else(|| ModelsError::MalformedDarc("non-genesis darc without base id".into()))
    }
}

/// Serializer for `Darc`
pub struct DarcSerializer {
    version_serializer: U64VarIntSerializer,
    rules_serializer: VecU8Serializer,
}

impl DarcSerializer {
    /// Creates a new `DarcSerializer`
    pub const fn new() -> Self {
        Self {
            version_serializer: U64VarIntSerializer::new(),
            rules_serializer: VecU8Serializer::new(),
        }
    }
}

impl Default for DarcSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Darc> for DarcSerializer {
    fn serialize(&self, value: &Darc, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.version_serializer.serialize(&value.version, buffer)?;
        match &value.base_id {
            Some(base_id) => {
                buffer.push(1u8);
                buffer.extend(base_id.to_bytes());
            }
            None => buffer.push(0u8),
        }
        self.rules_serializer.serialize(&value.rules, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Darc`
pub struct DarcDeserializer {
    version_deserializer: U64VarIntDeserializer,
    darc_id_deserializer: DarcIdDeserializer,
    rules_deserializer: VecU8Deserializer,
}

impl DarcDeserializer {
    /// Creates a new `DarcDeserializer`
    pub const fn new() -> Self {
        Self {
            version_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            darc_id_deserializer: DarcIdDeserializer::new(),
            rules_deserializer: VecU8Deserializer::new(Included(0), Included(MAX_DARC_RULES_SIZE)),
        }
    }
}

impl Default for DarcDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Darc> for DarcDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Darc, E> {
        context("Failed Darc deserialization", |buffer: &'a [u8]| {
            let (input, version) = context("Failed version deserialization", |input| {
                self.version_deserializer.deserialize(input)
            })(buffer)?;
            let (input, tag) = nom::number::complete::be_u8(input)?;
            let (input, base_id) = match tag {
                0 => (input, None),
                1 => {
                    let (input, base_id) =
                        context("Failed base_id deserialization", |input| {
                            self.darc_id_deserializer.deserialize(input)
                        })(input)?;
                    (input, Some(base_id))
                }
                _ => {
                    return Err(nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::Tag,
                    )))
                }
            };
            let (input, rules) = context("Failed rules deserialization", |input| {
                self.rules_deserializer.deserialize(input)
            })(input)?;
            Ok((
                input,
                Darc {
                    version,
                    base_id,
                    rules,
                },
            ))
        })(buffer)
    }
}

/// The tuple handed to the policy engine to decide accept or reject for one
/// instruction. Assembled here, verified elsewhere.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Request {
    /// base id of the governing darc
    pub base_id: DarcId,
    /// the action the signers want to perform
    pub action: String,
    /// the message the signatures are verified against
    pub msg: Vec<u8>,
    /// the signing identities
    pub identities: Vec<Identity>,
    /// one raw signature per identity
    pub signatures: Vec<Vec<u8>>,
}

impl Request {
    /// Assemble a request.
    pub fn new(
        base_id: DarcId,
        action: String,
        msg: Vec<u8>,
        identities: Vec<Identity>,
        signatures: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            base_id,
            action,
            msg,
            identities,
            signatures,
        }
    }

    /// The digest signers actually sign: base id, action, message and the
    /// signing identities, in that order. Signature bytes are excluded so
    /// the digest is stable across the two signing passes.
    pub fn hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend(self.base_id.to_bytes());
        data.extend(self.action.as_bytes());
        data.extend(&self.msg);
        for identity in &self.identities {
            data.extend(identity.to_bytes());
        }
        Hash::compute_from(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omni_serialization::DeserializeError;
    use serial_test::serial;

    fn genesis_darc() -> Darc {
        Darc {
            version: 0,
            base_id: None,
            rules: b"invoke:evolve <- ed25519:owner".to_vec(),
        }
    }

    #[test]
    #[serial]
    fn test_darc_roundtrip() {
        let darc = Darc {
            version: 3,
            base_id: Some(DarcId::from_bytes(&[42u8; DARC_ID_SIZE_BYTES])),
            rules: vec![1, 2, 3],
        };
        let mut buffer = Vec::new();
        DarcSerializer::new().serialize(&darc, &mut buffer).unwrap();
        let (rest, decoded) = DarcDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(darc, decoded);
    }

    #[test]
    #[serial]
    fn test_darc_id_is_version_bound() {
        let darc = genesis_darc();
        let mut evolved = darc.clone();
        evolved.version = 1;
        evolved.base_id = Some(darc.id().unwrap());
        assert_ne!(darc.id().unwrap(), evolved.id().unwrap());
        assert_eq!(darc.base_id().unwrap(), darc.id().unwrap());
        assert_eq!(evolved.base_id().unwrap(), darc.id().unwrap());
    }

    #[test]
    #[serial]
    fn test_darc_base_id_missing() {
        let darc = Darc {
            version: 2,
            base_id: None,
            rules: Vec::new(),
        };
        darc.base_id()
            .expect_err("non-genesis darc without base id must be rejected");
    }

    #[test]
    #[serial]
    fn test_request_hash_covers_identities() {
        let base_id = DarcId::from_bytes(&[7u8; DARC_ID_SIZE_BYTES]);
        let identity = Signer::identity(&KeyPair::generate());
        let request = Request::new(
            base_id,
            "invoke:transfer".to_string(),
            vec![1, 2, 3],
            vec![identity],
            vec![Vec::new()],
        );
        let mut without_identity = request.clone();
        without_identity.identities.clear();
        assert_ne!(request.hash(), without_identity.hash());

        // signature bytes must not change the digest
        let mut with_signature = request.clone();
        with_signature.signatures = vec![vec![9u8; 64]];
        assert_eq!(request.hash(), with_signature.hash());
    }
}
