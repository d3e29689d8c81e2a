// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Global object addressing.

use crate::darc::{DarcId, DarcIdDeserializer, DARC_ID_SIZE_BYTES};
use omni_serialization::{Deserializer, SerializeError, Serializer};
use nom::error::context;
use nom::sequence::tuple;
use nom::Parser;
use nom::{
    error::{ContextError, ParseError},
    IResult,
};
use serde::{Deserialize, Serialize};

/// Size of a nonce
pub const NONCE_SIZE_BYTES: usize = 32;
/// Size of a full object id: the governing darc id followed by the instance
/// nonce.
pub const OBJECT_ID_SIZE_BYTES: usize = DARC_ID_SIZE_BYTES + NONCE_SIZE_BYTES;

/// 32 opaque bytes distinguishing object instances under one darc.
///
/// A fresh nonce comes from the digest-derivation scheme in
/// [`Instruction::derive_id`](crate::instruction::Instruction::derive_id),
/// never from a random generator, so all honest nodes derive the same one.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub struct Nonce([u8; NONCE_SIZE_BYTES]);

impl Nonce {
    /// nonce from bytes
    pub const fn from_bytes(data: &[u8; NONCE_SIZE_BYTES]) -> Nonce {
        Nonce(*data)
    }

    /// nonce to bytes
    pub const fn to_bytes(&self) -> &[u8; NONCE_SIZE_BYTES] {
        &self.0
    }

    /// the all-zero nonce, the instance part of every darc object
    pub const fn zero() -> Nonce {
        Nonce([0u8; NONCE_SIZE_BYTES])
    }
}

impl std::fmt::Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", bs58::encode(self.0).with_check().into_string())
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// Deserializer for `Nonce`
#[derive(Default, Clone)]
pub struct NonceDeserializer;

impl NonceDeserializer {
    /// Creates a deserializer for `Nonce`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Nonce> for NonceDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Nonce, E> {
        context("Failed Nonce deserialization", |input: &'a [u8]| {
            let Some(nonce) = input.get(..NONCE_SIZE_BYTES) else {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Eof,
                )));
            };
            Ok((
                &input[NONCE_SIZE_BYTES..],
                Nonce(nonce.try_into().expect("nonce slice has the right size")),
            ))
        })(buffer)
    }
}

/// Address of one object in the global state.
///
/// The darc part names the policy governing the object, the nonce part
/// distinguishes instances. The darc object itself sits at the all-zero
/// nonce.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Debug)]
pub struct ObjectId {
    /// base id of the governing darc
    pub darc_id: DarcId,
    /// instance nonce under that darc
    pub instance_id: Nonce,
}

impl ObjectId {
    /// Creates an object id
    pub const fn new(darc_id: DarcId, instance_id: Nonce) -> Self {
        Self {
            darc_id,
            instance_id,
        }
    }

    /// Canonical bytes: darc id then nonce.
    pub fn to_bytes(&self) -> [u8; OBJECT_ID_SIZE_BYTES] {
        let mut bytes = [0u8; OBJECT_ID_SIZE_BYTES];
        bytes[..DARC_ID_SIZE_BYTES].copy_from_slice(self.darc_id.to_bytes());
        bytes[DARC_ID_SIZE_BYTES..].copy_from_slice(self.instance_id.to_bytes());
        bytes
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.darc_id, self.instance_id)
    }
}

/// Serializer for `ObjectId`
#[derive(Default, Clone)]
pub struct ObjectIdSerializer;

impl ObjectIdSerializer {
    /// Creates a serializer for `ObjectId`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<ObjectId> for ObjectIdSerializer {
    fn serialize(&self, value: &ObjectId, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `ObjectId`
#[derive(Default, Clone)]
pub struct ObjectIdDeserializer {
    darc_id_deserializer: DarcIdDeserializer,
    nonce_deserializer: NonceDeserializer,
}

impl ObjectIdDeserializer {
    /// Creates a deserializer for `ObjectId`
    pub const fn new() -> Self {
        Self {
            darc_id_deserializer: DarcIdDeserializer::new(),
            nonce_deserializer: NonceDeserializer::new(),
        }
    }
}

impl Deserializer<ObjectId> for ObjectIdDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], ObjectId, E> {
        context(
            "Failed ObjectId deserialization",
            tuple((
                context("Failed darc_id deserialization", |input| {
                    self.darc_id_deserializer.deserialize(input)
                }),
                context("Failed instance_id deserialization", |input| {
                    self.nonce_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(darc_id, instance_id)| ObjectId {
            darc_id,
            instance_id,
        })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omni_serialization::DeserializeError;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_object_id_bytes_layout() {
        let id = ObjectId::new(
            DarcId::from_bytes(&[0xAB; DARC_ID_SIZE_BYTES]),
            Nonce::from_bytes(&[0xCD; NONCE_SIZE_BYTES]),
        );
        let bytes = id.to_bytes();
        assert_eq!(&bytes[..DARC_ID_SIZE_BYTES], &[0xAB; DARC_ID_SIZE_BYTES]);
        assert_eq!(&bytes[DARC_ID_SIZE_BYTES..], &[0xCD; NONCE_SIZE_BYTES]);
    }

    #[test]
    #[serial]
    fn test_object_id_roundtrip() {
        let id = ObjectId::new(
            DarcId::from_bytes(&[1u8; DARC_ID_SIZE_BYTES]),
            Nonce::from_bytes(&[2u8; NONCE_SIZE_BYTES]),
        );
        let mut buffer = Vec::new();
        ObjectIdSerializer::new().serialize(&id, &mut buffer).unwrap();
        assert_eq!(buffer.len(), OBJECT_ID_SIZE_BYTES);
        let (rest, decoded) = ObjectIdDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(id, decoded);
    }

    #[test]
    #[serial]
    fn test_nonce_deserializer_too_short() {
        let deserializer = NonceDeserializer::new();
        deserializer
            .deserialize::<DeserializeError>(&[0u8; NONCE_SIZE_BYTES - 1])
            .expect_err("truncated nonce must fail");
    }
}
