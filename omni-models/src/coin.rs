// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Tokens as the coin contract stores them.

use crate::object_id::{ObjectId, ObjectIdDeserializer, ObjectIdSerializer};
use omni_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use nom::error::context;
use nom::sequence::tuple;
use nom::Parser;
use nom::{
    error::{ContextError, ParseError},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// A typed token balance. The name identifies the currency, so two coins
/// only mix when their names match.
#[derive(Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Coin {
    /// currency identifier
    pub name: ObjectId,
    /// number of base units
    pub value: u64,
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} x {}", self.value, self.name)
    }
}

/// Serializer for `Coin`
pub struct CoinSerializer {
    name_serializer: ObjectIdSerializer,
    value_serializer: U64VarIntSerializer,
}

impl CoinSerializer {
    /// Creates a new `CoinSerializer`
    pub const fn new() -> Self {
        Self {
            name_serializer: ObjectIdSerializer::new(),
            value_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Default for CoinSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Coin> for CoinSerializer {
    fn serialize(&self, value: &Coin, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.name_serializer.serialize(&value.name, buffer)?;
        self.value_serializer.serialize(&value.value, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Coin`
pub struct CoinDeserializer {
    name_deserializer: ObjectIdDeserializer,
    value_deserializer: U64VarIntDeserializer,
}

impl CoinDeserializer {
    /// Creates a new `CoinDeserializer`
    pub const fn new() -> Self {
        Self {
            name_deserializer: ObjectIdDeserializer::new(),
            value_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
        }
    }
}

impl Default for CoinDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Coin> for CoinDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Coin, E> {
        context(
            "Failed Coin deserialization",
            tuple((
                context("Failed name deserialization", |input| {
                    self.name_deserializer.deserialize(input)
                }),
                context("Failed value deserialization", |input| {
                    self.value_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(name, value)| Coin { name, value })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::darc::{DarcId, DARC_ID_SIZE_BYTES};
    use crate::object_id::{Nonce, NONCE_SIZE_BYTES};
    use omni_serialization::DeserializeError;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_coin_roundtrip() {
        let coin = Coin {
            name: ObjectId::new(
                DarcId::from_bytes(&[5u8; DARC_ID_SIZE_BYTES]),
                Nonce::from_bytes(&[6u8; NONCE_SIZE_BYTES]),
            ),
            value: u64::MAX,
        };
        let mut buffer = Vec::new();
        CoinSerializer::new().serialize(&coin, &mut buffer).unwrap();
        let (rest, decoded) = CoinDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(coin, decoded);
    }
}
