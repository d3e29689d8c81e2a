// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

use crate::error::OmniSignatureError;
use ed25519_dalek::{Signer as _, Verifier as _};
use omni_hash::Hash;
use omni_serialization::Deserializer;
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use std::{convert::TryInto, str::FromStr};

/// Size of a public key
pub const PUBLIC_KEY_SIZE_BYTES: usize = 32;
/// Size of a secret key
pub const SECRET_KEY_SIZE_BYTES: usize = 32;
/// Size of a signature
pub const SIGNATURE_SIZE_BYTES: usize = 64;

/// `KeyPair` is used to produce signatures over digests
#[derive(Clone)]
pub struct KeyPair(ed25519_dalek::SigningKey);

impl std::fmt::Display for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl FromStr for KeyPair {
    type Err = OmniSignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPair::from_bs58_check(s)
    }
}

impl KeyPair {
    /// Generate a new `KeyPair`
    ///
    /// # Example
    ///  ```
    /// # use omni_signature::KeyPair;
    /// # use omni_hash::Hash;
    /// let keypair = KeyPair::generate();
    /// let data = Hash::compute_from("Hello World!".as_bytes());
    /// let signature = keypair.sign(&data).unwrap();
    /// ```
    pub fn generate() -> KeyPair {
        let mut rng = rand::rngs::OsRng;
        KeyPair(ed25519_dalek::SigningKey::generate(&mut rng))
    }

    /// Returns the `Signature` produced by signing the given digest with
    /// this keypair's secret key.
    pub fn sign(&self, hash: &Hash) -> Result<Signature, OmniSignatureError> {
        Ok(Signature(self.0.try_sign(hash.to_bytes()).map_err(
            |err| OmniSignatureError::SigningError(format!("{}", err)),
        )?))
    }

    /// Return the bytes representing the secret key
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Convert a byte array of size `SECRET_KEY_SIZE_BYTES` to a `KeyPair`
    ///
    /// # Example
    /// ```
    /// # use omni_signature::KeyPair;
    /// let keypair = KeyPair::generate();
    /// let bytes = keypair.to_bytes();
    /// let keypair2 = KeyPair::from_bytes(&bytes);
    /// ```
    pub fn from_bytes(data: &[u8; SECRET_KEY_SIZE_BYTES]) -> Self {
        KeyPair(ed25519_dalek::SigningKey::from_bytes(data))
    }

    /// Get the public key of the keypair
    pub fn get_public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Encode the keypair into its base58check form
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.to_bytes()).with_check().into_string()
    }

    /// Decode a base58check encoded keypair
    pub fn from_bs58_check(data: &str) -> Result<Self, OmniSignatureError> {
        let decoded = bs58::decode(data)
            .with_check(None)
            .into_vec()
            .map_err(|err| {
                OmniSignatureError::ParsingError(format!(
                    "secret key bs58_check parsing error: {}",
                    err
                ))
            })?;
        Ok(KeyPair::from_bytes(
            &decoded.as_slice().try_into().map_err(|err| {
                OmniSignatureError::ParsingError(format!(
                    "secret key bs58_check parsing error: {}",
                    err
                ))
            })?,
        ))
    }
}

/// Public key used to check that a digest was signed
/// with the corresponding secret key.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct PublicKey(ed25519_dalek::VerifyingKey);

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl FromStr for PublicKey {
    type Err = OmniSignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::from_bs58_check(s)
    }
}

impl PublicKey {
    /// Checks if the `Signature` over the given digest
    /// was produced with the secret key matching this `PublicKey`
    pub fn verify_signature(
        &self,
        hash: &Hash,
        signature: &Signature,
    ) -> Result<(), OmniSignatureError> {
        self.0.verify(hash.to_bytes(), &signature.0).map_err(|err| {
            OmniSignatureError::VerificationError(format!("{}", err))
        })
    }

    /// Serialize a `PublicKey` using `bs58` encoding with checksum.
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.to_bytes()).with_check().into_string()
    }

    /// Return the bytes representing the public key
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Deserialize a `PublicKey` from bytes
    pub fn from_bytes(data: &[u8; PUBLIC_KEY_SIZE_BYTES]) -> Result<Self, OmniSignatureError> {
        ed25519_dalek::VerifyingKey::from_bytes(data)
            .map(Self)
            .map_err(|err| {
                OmniSignatureError::ParsingError(format!("public key bytes parsing error: {}", err))
            })
    }

    /// Deserialize a `PublicKey` using `bs58` encoding with checksum.
    pub fn from_bs58_check(data: &str) -> Result<Self, OmniSignatureError> {
        let decoded = bs58::decode(data)
            .with_check(None)
            .into_vec()
            .map_err(|err| {
                OmniSignatureError::ParsingError(format!(
                    "public key bs58_check parsing error: {}",
                    err
                ))
            })?;
        PublicKey::from_bytes(&decoded.as_slice().try_into().map_err(|err| {
            OmniSignatureError::ParsingError(format!(
                "public key bs58_check parsing error: {}",
                err
            ))
        })?)
    }
}

impl ::serde::Serialize for PublicKey {
    /// human readable serialization uses `to_bs58_check`,
    /// binary serialization uses raw bytes
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_bs58_check())
        } else {
            s.serialize_bytes(&self.to_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for PublicKey {
    /// human readable deserialization expects a `bs58` check string,
    /// binary deserialization expects raw bytes
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<PublicKey, D::Error> {
        if d.is_human_readable() {
            struct Base58CheckVisitor;

            impl<'de> ::serde::de::Visitor<'de> for Base58CheckVisitor {
                type Value = PublicKey;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("an ASCII base58check string")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    if let Ok(v_str) = std::str::from_utf8(v) {
                        PublicKey::from_bs58_check(v_str).map_err(E::custom)
                    } else {
                        Err(E::invalid_value(::serde::de::Unexpected::Bytes(v), &self))
                    }
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    PublicKey::from_bs58_check(v).map_err(E::custom)
                }
            }
            d.deserialize_str(Base58CheckVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = PublicKey;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a bytestring")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    PublicKey::from_bytes(v.try_into().map_err(E::custom)?).map_err(E::custom)
                }
            }

            d.deserialize_bytes(BytesVisitor)
        }
    }
}

/// Deserializer for `PublicKey`
#[derive(Default, Clone)]
pub struct PublicKeyDeserializer;

impl PublicKeyDeserializer {
    /// Creates a deserializer for `PublicKey`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<PublicKey> for PublicKeyDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], PublicKey, E> {
        context("Failed public key deserialization", |input: &'a [u8]| {
            if buffer.len() < PUBLIC_KEY_SIZE_BYTES {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            let key = PublicKey::from_bytes(
                buffer[..PUBLIC_KEY_SIZE_BYTES].try_into().map_err(|_| {
                    nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::Fail,
                    ))
                })?,
            )
            .map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Verify,
                ))
            })?;
            Ok((&buffer[PUBLIC_KEY_SIZE_BYTES..], key))
        })(buffer)
    }
}

/// Signature generated from a digest and a `KeyPair`.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Signature(ed25519_dalek::Signature);

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl FromStr for Signature {
    type Err = OmniSignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::from_bs58_check(s)
    }
}

impl Signature {
    /// Serialize a `Signature` using `bs58` encoding with checksum.
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.to_bytes()).with_check().into_string()
    }

    /// Return the bytes representing the signature
    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Deserialize a `Signature` from bytes
    pub fn from_bytes(data: &[u8; SIGNATURE_SIZE_BYTES]) -> Self {
        Signature(ed25519_dalek::Signature::from_bytes(data))
    }

    /// Deserialize a `Signature` using `bs58` encoding with checksum.
    pub fn from_bs58_check(data: &str) -> Result<Self, OmniSignatureError> {
        let decoded = bs58::decode(data)
            .with_check(None)
            .into_vec()
            .map_err(|err| {
                OmniSignatureError::ParsingError(format!(
                    "signature bs58_check parsing error: {}",
                    err
                ))
            })?;
        Ok(Signature::from_bytes(&decoded.as_slice().try_into().map_err(
            |err| {
                OmniSignatureError::ParsingError(format!(
                    "signature bs58_check parsing error: {}",
                    err
                ))
            },
        )?))
    }
}

/// Deserializer for `Signature`
#[derive(Default, Clone)]
pub struct SignatureDeserializer;

impl SignatureDeserializer {
    /// Creates a deserializer for `Signature`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Signature> for SignatureDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Signature, E> {
        context("Failed signature deserialization", |input: &'a [u8]| {
            if buffer.len() < SIGNATURE_SIZE_BYTES {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            let signature = Signature::from_bytes(
                buffer[..SIGNATURE_SIZE_BYTES].try_into().map_err(|_| {
                    nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::Fail,
                    ))
                })?,
            );
            Ok((&buffer[SIGNATURE_SIZE_BYTES..], signature))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_sign_verify() {
        let keypair = KeyPair::generate();
        let digest = Hash::compute_from(b"some operation digest");
        let signature = keypair.sign(&digest).unwrap();
        keypair
            .get_public_key()
            .verify_signature(&digest, &signature)
            .unwrap();
        let other_digest = Hash::compute_from(b"another digest");
        keypair
            .get_public_key()
            .verify_signature(&other_digest, &signature)
            .expect_err("signature must not verify against another digest");
    }

    #[test]
    #[serial]
    fn test_keypair_bs58_roundtrip() {
        let keypair = KeyPair::generate();
        let encoded = keypair.to_bs58_check();
        let decoded = KeyPair::from_bs58_check(&encoded).unwrap();
        assert_eq!(keypair.to_bytes(), decoded.to_bytes());
    }

    #[test]
    #[serial]
    fn test_public_key_serde_json() {
        let public_key = KeyPair::generate().get_public_key();
        let serialized = serde_json::to_string(&public_key).unwrap();
        let deserialized: PublicKey = serde_json::from_str(&serialized).unwrap();
        assert_eq!(public_key, deserialized);
    }

    #[test]
    #[serial]
    fn test_signature_bytes_roundtrip() {
        let keypair = KeyPair::generate();
        let digest = Hash::compute_from(b"roundtrip");
        let signature = keypair.sign(&digest).unwrap();
        let decoded = Signature::from_bytes(&signature.to_bytes());
        assert_eq!(signature, decoded);
    }

    #[test]
    #[serial]
    fn test_public_key_deserializer() {
        use omni_serialization::DeserializeError;
        let public_key = KeyPair::generate().get_public_key();
        let buffer = public_key.to_bytes().to_vec();
        let (rest, deserialized) = PublicKeyDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(public_key, deserialized);
    }
}
