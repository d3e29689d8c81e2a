// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! State changes, the audit trail contract execution leaves behind.

use crate::error::ModelsError;
use crate::object_id::{ObjectId, ObjectIdDeserializer, ObjectIdSerializer};
use crate::serialization::{
    StringDeserializer, StringSerializer, VecU8Deserializer, VecU8Serializer,
};
use omni_hash::Hash;
use omni_serialization::{
    Deserializer, SerializeError, Serializer, U16VarIntDeserializer, U16VarIntSerializer,
    U32VarIntDeserializer, U32VarIntSerializer,
};
use nom::error::context;
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::Parser;
use nom::{
    error::{ContextError, ParseError},
    IResult,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// What a state change does to its object.
#[derive(IntoPrimitive, TryFromPrimitive, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Debug)]
#[repr(u32)]
pub enum StateAction {
    /// the object comes into existence
    Create = 1,
    /// the object's value is replaced
    Update = 2,
    /// the object is removed
    Remove = 3,
}

impl std::fmt::Display for StateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StateAction::Create => write!(f, "Create"),
            StateAction::Update => write!(f, "Update"),
            StateAction::Remove => write!(f, "Remove"),
        }
    }
}

/// One effect of executing an instruction: an action applied to one object,
/// with the resulting value and the contract kind that produced it.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct StateChange {
    /// what happened to the object
    pub state_action: StateAction,
    /// the object it happened to
    pub object_id: ObjectId,
    /// kind of contract that produced the change
    pub contract_id: String,
    /// the object's value after the change, empty for removals
    pub value: Vec<u8>,
}

impl StateChange {
    /// Creates a state change
    pub fn new(
        state_action: StateAction,
        object_id: ObjectId,
        contract_id: String,
        value: Vec<u8>,
    ) -> Self {
        Self {
            state_action,
            object_id,
            contract_id,
            value,
        }
    }
}

impl std::fmt::Display for StateChange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({}): {} bytes",
            self.state_action,
            self.object_id,
            self.contract_id,
            self.value.len()
        )
    }
}

/// The ordered effects of executing a batch. Order is part of the digest
/// because replaying in another order gives another ledger.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct StateChanges(pub Vec<StateChange>);

impl StateChanges {
    /// Digest of the canonical encoding of the whole list.
    pub fn hash(&self) -> Result<Hash, ModelsError> {
        let mut buffer = Vec::new();
        StateChangesSerializer::new().serialize(self, &mut buffer)?;
        Ok(Hash::compute_from(&buffer))
    }
}

/// Serializer for `StateChange`
pub struct StateChangeSerializer {
    u32_serializer: U32VarIntSerializer,
    object_id_serializer: ObjectIdSerializer,
    contract_serializer: StringSerializer<U16VarIntSerializer, u16>,
    value_serializer: VecU8Serializer,
}

impl StateChangeSerializer {
    /// Creates a new `StateChangeSerializer`
    pub fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
            object_id_serializer: ObjectIdSerializer::new(),
            contract_serializer: StringSerializer::new(U16VarIntSerializer::new()),
            value_serializer: VecU8Serializer::new(),
        }
    }
}

impl Default for StateChangeSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<StateChange> for StateChangeSerializer {
    fn serialize(&self, value: &StateChange, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u32_serializer
            .serialize(&value.state_action.into(), buffer)?;
        self.object_id_serializer
            .serialize(&value.object_id, buffer)?;
        self.contract_serializer
            .serialize(&value.contract_id, buffer)?;
        self.value_serializer.serialize(&value.value, buffer)?;
        Ok(())
    }
}

/// Deserializer for `StateChange`
pub struct StateChangeDeserializer {
    action_deserializer: U32VarIntDeserializer,
    object_id_deserializer: ObjectIdDeserializer,
    contract_deserializer: StringDeserializer<U16VarIntDeserializer, u16>,
    value_deserializer: VecU8Deserializer,
}

impl StateChangeDeserializer {
    /// Creates a new `StateChangeDeserializer`
    pub const fn new() -> Self {
        Self {
            action_deserializer: U32VarIntDeserializer::new(
                Included(StateAction::Create as u32),
                Included(StateAction::Remove as u32),
            ),
            object_id_deserializer: ObjectIdDeserializer::new(),
            contract_deserializer: StringDeserializer::new(U16VarIntDeserializer::new(
                Included(0),
                Included(crate::constants::MAX_CONTRACT_ID_SIZE),
            )),
            value_deserializer: VecU8Deserializer::new(
                Included(0),
                Included(crate::constants::MAX_ARGUMENT_VALUE_SIZE),
            ),
        }
    }
}

impl Default for StateChangeDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<StateChange> for StateChangeDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], StateChange, E> {
        context(
            "Failed StateChange deserialization",
            tuple((
                context("Failed action deserialization", |input: &'a [u8]| {
                    let (rest, raw) = self.action_deserializer.deserialize(input)?;
                    let action = StateAction::try_from(raw).map_err(|_| {
                        nom::Err::Error(ParseError::from_error_kind(
                            input,
                            nom::error::ErrorKind::Digit,
                        ))
                    })?;
                    Ok((rest, action))
                }),
                context("Failed object_id deserialization", |input| {
                    self.object_id_deserializer.deserialize(input)
                }),
                context("Failed contract_id deserialization", |input| {
                    self.contract_deserializer.deserialize(input)
                }),
                context("Failed value deserialization", |input| {
                    self.value_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(state_action, object_id, contract_id, value)| StateChange {
                state_action,
                object_id,
                contract_id,
                value,
            },
        )
        .parse(buffer)
    }
}

/// Serializer for `StateChanges`
pub struct StateChangesSerializer {
    u32_serializer: U32VarIntSerializer,
    change_serializer: StateChangeSerializer,
}

impl StateChangesSerializer {
    /// Creates a new `StateChangesSerializer`
    pub fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
            change_serializer: StateChangeSerializer::new(),
        }
    }
}

impl Default for StateChangesSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<StateChanges> for StateChangesSerializer {
    fn serialize(&self, value: &StateChanges, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let count: u32 = value.0.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many state changes: {}", err))
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for change in &value.0 {
            self.change_serializer.serialize(change, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `StateChanges`
pub struct StateChangesDeserializer {
    count_deserializer: U32VarIntDeserializer,
    change_deserializer: StateChangeDeserializer,
}

impl StateChangesDeserializer {
    /// Creates a new `StateChangesDeserializer`
    pub const fn new() -> Self {
        Self {
            count_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
            change_deserializer: StateChangeDeserializer::new(),
        }
    }
}

impl Default for StateChangesDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<StateChanges> for StateChangesDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], StateChanges, E> {
        context(
            "Failed StateChanges deserialization",
            length_count(
                context("Failed count deserialization", |input| {
                    self.count_deserializer.deserialize(input)
                }),
                context("Failed state change deserialization", |input| {
                    self.change_deserializer.deserialize(input)
                }),
            ),
        )
        .map(StateChanges)
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

    fn sample_change(action: StateAction) -> StateChange {
        StateChange::new(
            action,
            ObjectId::new(
                DarcId::from_bytes(&[1u8; DARC_ID_SIZE_BYTES]),
                Nonce::from_bytes(&[2u8; NONCE_SIZE_BYTES]),
            ),
            "coin".to_string(),
            vec![0, 0, 0, 42],
        )
    }

    #[test]
    #[serial]
    fn test_state_change_roundtrip() {
        for action in [StateAction::Create, StateAction::Update, StateAction::Remove] {
            let change = sample_change(action);
            let mut buffer = Vec::new();
            StateChangeSerializer::new()
                .serialize(&change, &mut buffer)
                .unwrap();
            let (rest, decoded) = StateChangeDeserializer::new()
                .deserialize::<DeserializeError>(&buffer)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(change, decoded);
        }
    }

    #[test]
    #[serial]
    fn test_state_change_rejects_unknown_action() {
        let change = sample_change(StateAction::Create);
        let mut buffer = Vec::new();
        StateChangeSerializer::new()
            .serialize(&change, &mut buffer)
            .unwrap();
        // action 0 is reserved
        buffer[0] = 0;
        StateChangeDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("unknown action must fail");
    }

    #[test]
    #[serial]
    fn test_state_changes_hash_is_order_sensitive() {
        let changes = StateChanges(vec![
            sample_change(StateAction::Create),
            sample_change(StateAction::Update),
        ]);
        let reversed = StateChanges(vec![
            sample_change(StateAction::Update),
            sample_change(StateAction::Create),
        ]);
        assert_ne!(changes.hash().unwrap(), reversed.hash().unwrap());
        assert_eq!(changes.hash().unwrap(), changes.clone().hash().unwrap());
    }

    #[test]
    #[serial]
    fn test_state_changes_roundtrip() {
        let changes = StateChanges(vec![
            sample_change(StateAction::Create),
            StateChange::new(
                StateAction::Remove,
                ObjectId::new(
                    DarcId::from_bytes(&[3u8; DARC_ID_SIZE_BYTES]),
                    Nonce::default(),
                ),
                "darc".to_string(),
                Vec::new(),
            ),
        ]);
        let mut buffer = Vec::new();
        StateChangesSerializer::new()
            .serialize(&changes, &mut buffer)
            .unwrap();
        let (rest, decoded) = StateChangesDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(changes, decoded);
    }

    #[test]
    #[serial]
    fn test_display() {
        let change = sample_change(StateAction::Update);
        assert!(change.to_string().starts_with("Update"));
        assert!(change.to_string().contains("coin"));
    }
}
