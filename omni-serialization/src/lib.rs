// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Canonical byte serialization shared by all omniledger crates.
//!
//! Every structured type has exactly one binary encoding, used both on the
//! wire and as digest input. Serializers append to a caller-provided buffer,
//! deserializers are `nom` parsers generic over the error type so that
//! callers can pick between a cheap opaque error and [`DeserializeError`]
//! which accumulates context strings.

#![warn(missing_docs)]

use displaydoc::Display;
use nom::error::{ContextError, ErrorKind, ParseError, VerboseErrorKind};
use nom::IResult;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

/// Serialization error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// String {0} is too big to be serialized
    StringTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Trait for serializing a value into a growing byte buffer.
pub trait Serializer<T> {
    /// Append the canonical encoding of `value` to `buffer`.
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Trait for deserializing a value from a byte buffer.
pub trait Deserializer<T> {
    /// Parse one value from the start of `buffer`, returning the remaining
    /// bytes and the value.
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Deserialization error keeping the chain of `context(..)` labels that were
/// active when the parse failed.
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], VerboseErrorKind)>,
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, VerboseErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, VerboseErrorKind::Nom(kind)));
        other
    }

    fn from_char(input: &'a [u8], c: char) -> Self {
        Self {
            errors: vec![(input, VerboseErrorKind::Char(c))],
        }
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, VerboseErrorKind::Context(ctx)));
        other
    }
}

impl<'a> std::fmt::Display for DeserializeError<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (input, error) in self.errors.iter().rev() {
            let shown = &input[..input.len().min(10)];
            match error {
                VerboseErrorKind::Context(ctx) => write!(f, "{} / ", ctx)?,
                VerboseErrorKind::Nom(kind) => write!(f, "{:?} at {:?} / ", kind, shown)?,
                VerboseErrorKind::Char(c) => write!(f, "expected '{}' at {:?} / ", c, shown)?,
            }
        }
        Ok(())
    }
}

impl<'a> std::fmt::Debug for DeserializeError<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

macro_rules! gen_varint {
    ($($int:ident, $ser:ident, $deser:ident, $buffer:ident, $ctx:literal);+ $(;)?) => {
        $(
            #[doc = concat!("Serializer for `", stringify!($int), "` using variable-length encoding")]
            #[derive(Clone, Default)]
            pub struct $ser;

            impl $ser {
                #[doc = concat!("Creates a serializer for `", stringify!($int), "`")]
                pub const fn new() -> Self {
                    Self
                }
            }

            impl Serializer<$int> for $ser {
                fn serialize(&self, value: &$int, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                    let mut varint_buffer = unsigned_varint::encode::$buffer();
                    buffer.extend_from_slice(unsigned_varint::encode::$int(*value, &mut varint_buffer));
                    Ok(())
                }
            }

            #[doc = concat!("Deserializer for `", stringify!($int), "` using variable-length encoding, with value bounds")]
            #[derive(Clone)]
            pub struct $deser {
                range: (Bound<$int>, Bound<$int>),
            }

            impl $deser {
                #[doc = concat!("Creates a deserializer for `", stringify!($int), "` accepting only values within the given bounds")]
                pub const fn new(min: Bound<$int>, max: Bound<$int>) -> Self {
                    Self { range: (min, max) }
                }
            }

            impl Deserializer<$int> for $deser {
                fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                    &self,
                    buffer: &'a [u8],
                ) -> IResult<&'a [u8], $int, E> {
                    nom::error::context($ctx, |input: &'a [u8]| {
                        let (value, rest) = unsigned_varint::decode::$int(input).map_err(|_| {
                            nom::Err::Error(ParseError::from_error_kind(
                                input,
                                ErrorKind::Digit,
                            ))
                        })?;
                        if !self.range.contains(&value) {
                            return Err(nom::Err::Error(ParseError::from_error_kind(
                                input,
                                ErrorKind::Verify,
                            )));
                        }
                        Ok((rest, value))
                    })(buffer)
                }
            }
        )+
    };
}

gen_varint! {
    u16, U16VarIntSerializer, U16VarIntDeserializer, u16_buffer, "Failed u16 varint deserialization";
    u32, U32VarIntSerializer, U32VarIntDeserializer, u32_buffer, "Failed u32 varint deserialization";
    u64, U64VarIntSerializer, U64VarIntDeserializer, u64_buffer, "Failed u64 varint deserialization";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Bound::{Excluded, Included};

    #[test]
    fn test_u32_varint_roundtrip() {
        let serializer = U32VarIntSerializer::new();
        let deserializer = U32VarIntDeserializer::new(Included(0), Included(u32::MAX));
        for value in [0u32, 1, 127, 128, 300, 16384, u32::MAX] {
            let mut buffer = Vec::new();
            serializer.serialize(&value, &mut buffer).unwrap();
            let (rest, decoded) = deserializer
                .deserialize::<DeserializeError>(&buffer)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_u64_varint_roundtrip() {
        let serializer = U64VarIntSerializer::new();
        let deserializer = U64VarIntDeserializer::new(Included(0), Included(u64::MAX));
        for value in [0u64, 1, 127, 128, 1 << 35, u64::MAX] {
            let mut buffer = Vec::new();
            serializer.serialize(&value, &mut buffer).unwrap();
            let (rest, decoded) = deserializer
                .deserialize::<DeserializeError>(&buffer)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_varint_out_of_bounds() {
        let serializer = U32VarIntSerializer::new();
        let deserializer = U32VarIntDeserializer::new(Included(0), Excluded(100));
        let mut buffer = Vec::new();
        serializer.serialize(&100, &mut buffer).unwrap();
        deserializer
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("value over the bound should be rejected");
    }

    #[test]
    fn test_varint_truncated_input() {
        let serializer = U64VarIntSerializer::new();
        let deserializer = U64VarIntDeserializer::new(Included(0), Included(u64::MAX));
        let mut buffer = Vec::new();
        serializer.serialize(&(1u64 << 40), &mut buffer).unwrap();
        buffer.truncate(buffer.len() - 1);
        deserializer
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("truncated varint should be rejected");
    }
}
