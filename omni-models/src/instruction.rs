// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Instructions, the unit clients author and the ledger authorizes.

use crate::collection::{CollectionError, CollectionView};
use crate::constants::{
    MAX_ARGUMENTS_PER_INSTRUCTION, MAX_ARGUMENT_NAME_SIZE, MAX_ARGUMENT_VALUE_SIZE,
    MAX_COMMAND_SIZE, MAX_CONTRACT_ID_SIZE, MAX_SIGNATURES_PER_INSTRUCTION,
};
use crate::darc::{
    Darc, DarcDeserializer, DarcSignature, DarcSignatureDeserializer, DarcSignatureSerializer,
    Identity, Request, Signer, DARC_EVOLVE_ACTION,
};
use crate::error::ModelsError;
use crate::object_id::{Nonce, NonceDeserializer, ObjectId, ObjectIdDeserializer, ObjectIdSerializer};
use crate::serialization::{
    StringDeserializer, StringSerializer, VecU8Deserializer, VecU8Serializer,
};
use omni_hash::Hash;
use omni_serialization::{
    DeserializeError, Deserializer, SerializeError, Serializer, U16VarIntDeserializer,
    U16VarIntSerializer, U32VarIntDeserializer, U32VarIntSerializer,
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

/// The argument name the evolution special case looks up to find the new
/// darc version.
pub const DARC_ARGUMENT_NAME: &str = "darc";

/// One named input to a contract.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Argument {
    /// argument name, unique within one instruction
    pub name: String,
    /// opaque value bytes
    pub value: Vec<u8>,
}

/// Ordered list of contract inputs. Order is part of the instruction digest
/// so it must be preserved end to end.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct Arguments(pub Vec<Argument>);

impl Arguments {
    /// Look up an argument value by name. Returns the first match.
    pub fn search(&self, name: &str) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| arg.value.as_slice())
    }
}

/// What an instruction asks the ledger to do to its target object.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub enum InstructionPayload {
    /// create a new object governed by the target's darc
    Spawn {
        /// kind of contract to instantiate
        contract_id: String,
        /// inputs to the contract
        arguments: Arguments,
    },
    /// call a method on an existing object
    Invoke {
        /// method name on the target object's contract
        command: String,
        /// inputs to the contract
        arguments: Arguments,
    },
    /// remove the target object
    Delete,
}

/// Wire tag of an instruction payload
#[derive(IntoPrimitive, TryFromPrimitive, Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u32)]
enum InstructionPayloadId {
    Spawn = 0,
    Invoke = 1,
    Delete = 2,
}

/// One authorized state-machine step against a single object.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub struct Instruction {
    /// object this instruction acts on
    pub target: ObjectId,
    /// client-chosen nonce making otherwise identical instructions distinct
    pub nonce: Nonce,
    /// zero-based position within the enclosing transaction
    pub index: u32,
    /// number of instructions in the enclosing transaction
    pub length: u32,
    /// the requested operation
    pub payload: InstructionPayload,
    /// signatures authorizing the operation, empty until signed
    pub signatures: Vec<DarcSignature>,
}

impl Instruction {
    fn arguments(&self) -> Option<&Arguments> {
        match &self.payload {
            InstructionPayload::Spawn { arguments, .. } => Some(arguments),
            InstructionPayload::Invoke { arguments, .. } => Some(arguments),
            InstructionPayload::Delete => None,
        }
    }

    /// The digest identifying this instruction, independent of signatures.
    ///
    /// Layout: target darc id, target nonce, instruction nonce, index and
    /// length as little-endian `u32`, one payload tag byte, then the
    /// payload. Spawn contributes its contract kind and arguments, Invoke
    /// contributes only its arguments (the command is authorized through
    /// the darc action string instead), Delete contributes nothing.
    pub fn hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend(self.target.darc_id.to_bytes());
        data.extend(self.target.instance_id.to_bytes());
        data.extend(self.nonce.to_bytes());
        data.extend(self.index.to_le_bytes());
        data.extend(self.length.to_le_bytes());
        match &self.payload {
            InstructionPayload::Spawn {
                contract_id,
                arguments,
            } => {
                data.push(0u8);
                data.extend(contract_id.as_bytes());
                for arg in &arguments.0 {
                    data.extend(arg.name.as_bytes());
                    data.extend(&arg.value);
                }
            }
            InstructionPayload::Invoke { arguments, .. } => {
                data.push(1u8);
                for arg in &arguments.0 {
                    data.extend(arg.name.as_bytes());
                    data.extend(&arg.value);
                }
            }
            InstructionPayload::Delete => data.push(2u8),
        }
        Hash::compute_from(&data)
    }

    /// Derive the id of an object this instruction creates.
    ///
    /// The derivation binds purpose, instruction digest and the collected
    /// signatures, so every honest node computes the same id and a spawn
    /// replayed with different signatures lands elsewhere. The darc part is
    /// inherited from the target.
    pub fn derive_id(&self, purpose: &str) -> ObjectId {
        let mut data = Vec::new();
        data.extend(purpose.as_bytes());
        data.extend(self.hash().to_bytes());
        for sig in &self.signatures {
            data.extend(&sig.signature);
        }
        let digest = Hash::compute_from(&data);
        ObjectId::new(self.target.darc_id, Nonce::from_bytes(digest.to_bytes()))
    }

    /// The darc action string this instruction needs a rule for.
    pub fn action(&self) -> String {
        match &self.payload {
            InstructionPayload::Spawn { contract_id, .. } => format!("spawn:{}", contract_id),
            InstructionPayload::Invoke { command, .. } => format!("invoke:{}", command),
            InstructionPayload::Delete => "Delete".to_string(),
        }
    }

    /// Assemble the authorization request for the policy engine.
    ///
    /// The signed message is normally the instruction digest. For the
    /// evolution action it is the id of the new darc version carried in the
    /// `darc` argument, which ties the approval to that exact version.
    pub fn to_darc_request(&self) -> Result<Request, ModelsError> {
        let action = self.action();
        let msg = if action == DARC_EVOLVE_ACTION {
            let darc_bytes = self
                .arguments()
                .and_then(|args| args.search(DARC_ARGUMENT_NAME))
                .ok_or_else(|| ModelsError::MissingArgument(DARC_ARGUMENT_NAME.to_string()))?;
            let (_, darc): (_, Darc) = DarcDeserializer::new()
                .deserialize::<DeserializeError>(darc_bytes)
                .map_err(|err| ModelsError::MalformedDarc(err.to_string()))?;
            darc.id()?.to_bytes().to_vec()
        } else {
            self.hash().to_bytes().to_vec()
        };
        let identities: Vec<Identity> = self.signatures.iter().map(|sig| sig.signer).collect();
        let signatures: Vec<Vec<u8>> = self
            .signatures
            .iter()
            .map(|sig| sig.signature.clone())
            .collect();
        Ok(Request::new(
            self.target.darc_id,
            action,
            msg,
            identities,
            signatures,
        ))
    }

    /// Sign this instruction with the given signers, replacing any existing
    /// signatures.
    ///
    /// Two passes: first all identities are recorded with empty signature
    /// bytes so the request digest covers the full signer set, then each
    /// signer signs that digest.
    pub fn sign_by(&mut self, signers: &[&dyn Signer]) -> Result<(), ModelsError> {
        self.signatures = signers
            .iter()
            .map(|signer| DarcSignature {
                signer: signer.identity(),
                signature: Vec::new(),
            })
            .collect();
        let digest = self.to_darc_request()?.hash();
        for (entry, signer) in self.signatures.iter_mut().zip(signers) {
            entry.signature = signer.sign(&digest)?;
        }
        Ok(())
    }

    /// Fetch the target object's current state and contract kind from the
    /// global state, as contract code sees them.
    ///
    /// A spawn targets an object that does not exist yet, so it gets an
    /// empty state and its own requested contract kind without a lookup.
    pub fn get_contract_state(
        &self,
        view: &dyn CollectionView,
    ) -> Result<(String, Vec<u8>), ModelsError> {
        if let InstructionPayload::Spawn { contract_id, .. } = &self.payload {
            return Ok((contract_id.clone(), Vec::new()));
        }
        let record = view.get(&self.target.to_bytes())?;
        let values = record.values();
        if values.len() != 2 {
            return Err(CollectionError::MalformedRecord(format!(
                "expected 2 values for object {}, got {}",
                self.target,
                values.len()
            ))
            .into());
        }
        let contract_id = String::from_utf8(values[1].clone()).map_err(|_| {
            CollectionError::MalformedRecord(format!(
                "contract kind of object {} is not valid UTF-8",
                self.target
            ))
        })?;
        Ok((contract_id, values[0].clone()))
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Instruction {}", self.hash())?;
        writeln!(f, "\tTarget: {}", self.target)?;
        writeln!(f, "\tNonce: {}", self.nonce)?;
        writeln!(f, "\tIndex/Length: {}/{}", self.index, self.length)?;
        writeln!(f, "\tAction: {}", self.action())?;
        writeln!(f, "\tSigners: {}", self.signatures.len())?;
        Ok(())
    }
}

/// Serializer for `Argument`
pub struct ArgumentSerializer {
    name_serializer: StringSerializer<U16VarIntSerializer, u16>,
    value_serializer: VecU8Serializer,
}

impl ArgumentSerializer {
    /// Creates a new `ArgumentSerializer`
    pub fn new() -> Self {
        Self {
            name_serializer: StringSerializer::new(U16VarIntSerializer::new()),
            value_serializer: VecU8Serializer::new(),
        }
    }
}

impl Default for ArgumentSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Argument> for ArgumentSerializer {
    fn serialize(&self, value: &Argument, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.name_serializer.serialize(&value.name, buffer)?;
        self.value_serializer.serialize(&value.value, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Argument`
pub struct ArgumentDeserializer {
    name_deserializer: StringDeserializer<U16VarIntDeserializer, u16>,
    value_deserializer: VecU8Deserializer,
}

impl ArgumentDeserializer {
    /// Creates a new `ArgumentDeserializer`
    pub const fn new() -> Self {
        Self {
            name_deserializer: StringDeserializer::new(U16VarIntDeserializer::new(
                Included(0),
                Included(MAX_ARGUMENT_NAME_SIZE),
            )),
            value_deserializer: VecU8Deserializer::new(
                Included(0),
                Included(MAX_ARGUMENT_VALUE_SIZE),
            ),
        }
    }
}

impl Default for ArgumentDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Argument> for ArgumentDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Argument, E> {
        context(
            "Failed Argument deserialization",
            tuple((
                context("Failed name deserialization", |input| {
                    self.name_deserializer.deserialize(input)
                }),
                context("Failed value deserialization", |input| {
                    self.value_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(name, value)| Argument { name, value })
        .parse(buffer)
    }
}

/// Serializer for `Instruction`
pub struct InstructionSerializer {
    object_id_serializer: ObjectIdSerializer,
    u32_serializer: U32VarIntSerializer,
    contract_serializer: StringSerializer<U16VarIntSerializer, u16>,
    argument_serializer: ArgumentSerializer,
    signature_serializer: DarcSignatureSerializer,
}

impl InstructionSerializer {
    /// Creates a new `InstructionSerializer`
    pub fn new() -> Self {
        Self {
            object_id_serializer: ObjectIdSerializer::new(),
            u32_serializer: U32VarIntSerializer::new(),
            contract_serializer: StringSerializer::new(U16VarIntSerializer::new()),
            argument_serializer: ArgumentSerializer::new(),
            signature_serializer: DarcSignatureSerializer::new(),
        }
    }

    fn serialize_arguments(
        &self,
        arguments: &Arguments,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        let count: u32 = arguments.0.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many arguments: {}", err))
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for argument in &arguments.0 {
            self.argument_serializer.serialize(argument, buffer)?;
        }
        Ok(())
    }
}

impl Default for InstructionSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Instruction> for InstructionSerializer {
    fn serialize(&self, value: &Instruction, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.object_id_serializer.serialize(&value.target, buffer)?;
        buffer.extend(value.nonce.to_bytes());
        self.u32_serializer.serialize(&value.index, buffer)?;
        self.u32_serializer.serialize(&value.length, buffer)?;
        match &value.payload {
            InstructionPayload::Spawn {
                contract_id,
                arguments,
            } => {
                self.u32_serializer
                    .serialize(&InstructionPayloadId::Spawn.into(), buffer)?;
                self.contract_serializer.serialize(contract_id, buffer)?;
                self.serialize_arguments(arguments, buffer)?;
            }
            InstructionPayload::Invoke { command, arguments } => {
                self.u32_serializer
                    .serialize(&InstructionPayloadId::Invoke.into(), buffer)?;
                self.contract_serializer.serialize(command, buffer)?;
                self.serialize_arguments(arguments, buffer)?;
            }
            InstructionPayload::Delete => {
                self.u32_serializer
                    .serialize(&InstructionPayloadId::Delete.into(), buffer)?;
            }
        }
        let sig_count: u32 = value.signatures.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many signatures: {}", err))
        })?;
        self.u32_serializer.serialize(&sig_count, buffer)?;
        for signature in &value.signatures {
            self.signature_serializer.serialize(signature, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Instruction`
pub struct InstructionDeserializer {
    object_id_deserializer: ObjectIdDeserializer,
    nonce_deserializer: NonceDeserializer,
    u32_deserializer: U32VarIntDeserializer,
    payload_id_deserializer: U32VarIntDeserializer,
    contract_deserializer: StringDeserializer<U16VarIntDeserializer, u16>,
    command_deserializer: StringDeserializer<U16VarIntDeserializer, u16>,
    argument_count_deserializer: U32VarIntDeserializer,
    argument_deserializer: ArgumentDeserializer,
    signature_count_deserializer: U32VarIntDeserializer,
    signature_deserializer: DarcSignatureDeserializer,
}

impl InstructionDeserializer {
    /// Creates a new `InstructionDeserializer`
    pub const fn new() -> Self {
        Self {
            object_id_deserializer: ObjectIdDeserializer::new(),
            nonce_deserializer: NonceDeserializer::new(),
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
            payload_id_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(InstructionPayloadId::Delete as u32),
            ),
            contract_deserializer: StringDeserializer::new(U16VarIntDeserializer::new(
                Included(0),
                Included(MAX_CONTRACT_ID_SIZE),
            )),
            command_deserializer: StringDeserializer::new(U16VarIntDeserializer::new(
                Included(0),
                Included(MAX_COMMAND_SIZE),
            )),
            argument_count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_ARGUMENTS_PER_INSTRUCTION),
            ),
            argument_deserializer: ArgumentDeserializer::new(),
            signature_count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_SIGNATURES_PER_INSTRUCTION),
            ),
            signature_deserializer: DarcSignatureDeserializer::new(),
        }
    }

    fn deserialize_arguments<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Arguments, E> {
        context(
            "Failed arguments deserialization",
            length_count(
                context("Failed argument count deserialization", |input| {
                    self.argument_count_deserializer.deserialize(input)
                }),
                context("Failed argument deserialization", |input| {
                    self.argument_deserializer.deserialize(input)
                }),
            ),
        )
        .map(Arguments)
        .parse(buffer)
    }
}

impl Default for InstructionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Instruction> for InstructionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Instruction, E> {
        context("Failed Instruction deserialization", |buffer: &'a [u8]| {
            let (input, (target, nonce, index, length)) = tuple((
                context("Failed target deserialization", |input| {
                    self.object_id_deserializer.deserialize(input)
                }),
                context("Failed nonce deserialization", |input| {
                    self.nonce_deserializer.deserialize(input)
                }),
                context("Failed index deserialization", |input| {
                    self.u32_deserializer.deserialize(input)
                }),
                context("Failed length deserialization", |input| {
                    self.u32_deserializer.deserialize(input)
                }),
            ))(buffer)?;
            let (input, raw_id) = context("Failed payload tag deserialization", |input| {
                self.payload_id_deserializer.deserialize(input)
            })(input)?;
            let payload_id = InstructionPayloadId::try_from(raw_id).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    buffer,
                    nom::error::ErrorKind::Digit,
                ))
            })?;
            let (input, payload) = match payload_id {
                InstructionPayloadId::Spawn => {
                    let (input, (contract_id, arguments)) = tuple((
                        context("Failed contract_id deserialization", |input| {
                            self.contract_deserializer.deserialize(input)
                        }),
                        |input| self.deserialize_arguments(input),
                    ))(input)?;
                    (
                        input,
                        InstructionPayload::Spawn {
                            contract_id,
                            arguments,
                        },
                    )
                }
                InstructionPayloadId::Invoke => {
                    let (input, (command, arguments)) = tuple((
                        context("Failed command deserialization", |input| {
                            self.command_deserializer.deserialize(input)
                        }),
                        |input| self.deserialize_arguments(input),
                    ))(input)?;
                    (input, InstructionPayload::Invoke { command, arguments })
                }
                InstructionPayloadId::Delete => (input, InstructionPayload::Delete),
            };
            let (input, signatures) = context(
                "Failed signatures deserialization",
                length_count(
                    context("Failed signature count deserialization", |input| {
                        self.signature_count_deserializer.deserialize(input)
                    }),
                    context("Failed signature deserialization", |input| {
                        self.signature_deserializer.deserialize(input)
                    }),
                ),
            )(input)?;
            Ok((
                input,
                Instruction {
                    target,
                    nonce,
                    index,
                    length,
                    payload,
                    signatures,
                },
            ))
        })(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Record;
    use crate::darc::{DarcId, DarcSerializer, DARC_ID_SIZE_BYTES};
    use crate::object_id::NONCE_SIZE_BYTES;
    use omni_signature::{KeyPair, Signature, SIGNATURE_SIZE_BYTES};
    use serial_test::serial;
    use std::collections::HashMap;

    fn sample_target() -> ObjectId {
        ObjectId::new(
            DarcId::from_bytes(&[0x11; DARC_ID_SIZE_BYTES]),
            Nonce::from_bytes(&[0x22; NONCE_SIZE_BYTES]),
        )
    }

    fn spawn_instruction() -> Instruction {
        Instruction {
            target: sample_target(),
            nonce: Nonce::from_bytes(&[0x33; NONCE_SIZE_BYTES]),
            index: 0,
            length: 1,
            payload: InstructionPayload::Spawn {
                contract_id: "coin".to_string(),
                arguments: Arguments(vec![Argument {
                    name: "balance".to_string(),
                    value: vec![0, 0, 0, 42],
                }]),
            },
            signatures: Vec::new(),
        }
    }

    struct TestView(HashMap<Vec<u8>, Record>);

    impl CollectionView for TestView {
        fn get(&self, key: &[u8]) -> Result<Record, CollectionError> {
            self.0
                .get(key)
                .cloned()
                .ok_or_else(|| CollectionError::KeyNotFound(format!("{:?}", key)))
        }
    }

    #[test]
    #[serial]
    fn test_hash_layout() {
        let instr = spawn_instruction();
        let mut expected = Vec::new();
        expected.extend([0x11u8; DARC_ID_SIZE_BYTES]);
        expected.extend([0x22u8; NONCE_SIZE_BYTES]);
        expected.extend([0x33u8; NONCE_SIZE_BYTES]);
        expected.extend(0u32.to_le_bytes());
        expected.extend(1u32.to_le_bytes());
        expected.push(0u8);
        expected.extend(b"coin");
        expected.extend(b"balance");
        expected.extend([0, 0, 0, 42]);
        assert_eq!(instr.hash(), Hash::compute_from(&expected));
    }

    #[test]
    #[serial]
    fn test_hash_ignores_signatures_and_invoke_command() {
        let mut instr = spawn_instruction();
        let unsigned_hash = instr.hash();
        instr
            .sign_by(&[&KeyPair::generate()])
            .expect("signing must succeed");
        assert_eq!(instr.hash(), unsigned_hash);

        let invoke = |command: &str| Instruction {
            target: sample_target(),
            nonce: Nonce::default(),
            index: 0,
            length: 1,
            payload: InstructionPayload::Invoke {
                command: command.to_string(),
                arguments: Arguments(vec![Argument {
                    name: "amount".to_string(),
                    value: vec![1],
                }]),
            },
            signatures: Vec::new(),
        };
        // the command only reaches authorization through the action string
        assert_eq!(invoke("transfer").hash(), invoke("mint").hash());
        assert_ne!(
            invoke("transfer").to_darc_request().unwrap().action,
            invoke("mint").to_darc_request().unwrap().action
        );
    }

    #[test]
    #[serial]
    fn test_derive_id_depends_on_purpose_and_signatures() {
        let mut instr = spawn_instruction();
        let unsigned = instr.derive_id("coin");
        assert_eq!(unsigned.darc_id, instr.target.darc_id);
        assert_ne!(unsigned, instr.derive_id("account"));
        instr
            .sign_by(&[&KeyPair::generate()])
            .expect("signing must succeed");
        assert_ne!(unsigned, instr.derive_id("coin"));
    }

    #[test]
    #[serial]
    fn test_action_strings() {
        let mut instr = spawn_instruction();
        assert_eq!(instr.action(), "spawn:coin");
        instr.payload = InstructionPayload::Invoke {
            command: "transfer".to_string(),
            arguments: Arguments::default(),
        };
        assert_eq!(instr.action(), "invoke:transfer");
        instr.payload = InstructionPayload::Delete;
        assert_eq!(instr.action(), "Delete");
    }

    #[test]
    #[serial]
    fn test_sign_by_produces_verifiable_signatures() {
        let keypair_a = KeyPair::generate();
        let keypair_b = KeyPair::generate();
        let mut instr = spawn_instruction();
        instr
            .sign_by(&[&keypair_a, &keypair_b])
            .expect("signing must succeed");
        assert_eq!(instr.signatures.len(), 2);

        let request = instr.to_darc_request().unwrap();
        let digest = request.hash();
        for (entry, keypair) in instr.signatures.iter().zip([&keypair_a, &keypair_b]) {
            assert_eq!(entry.signer, Signer::identity(keypair));
            let raw: [u8; SIGNATURE_SIZE_BYTES] = entry
                .signature
                .as_slice()
                .try_into()
                .expect("signature has the right size");
            entry
                .signer
                .public_key()
                .verify_signature(&digest, &Signature::from_bytes(&raw))
                .expect("signature must verify");
        }
    }

    #[test]
    #[serial]
    fn test_to_darc_request_evolution() {
        let darc = Darc {
            version: 1,
            base_id: Some(DarcId::from_bytes(&[0x11; DARC_ID_SIZE_BYTES])),
            rules: b"invoke:evolve <- ed25519:owner".to_vec(),
        };
        let mut darc_bytes = Vec::new();
        DarcSerializer::new()
            .serialize(&darc, &mut darc_bytes)
            .unwrap();

        let instr = Instruction {
            target: sample_target(),
            nonce: Nonce::default(),
            index: 0,
            length: 1,
            payload: InstructionPayload::Invoke {
                command: "evolve".to_string(),
                arguments: Arguments(vec![Argument {
                    name: DARC_ARGUMENT_NAME.to_string(),
                    value: darc_bytes,
                }]),
            },
            signatures: Vec::new(),
        };
        let request = instr.to_darc_request().unwrap();
        assert_eq!(request.action, DARC_EVOLVE_ACTION);
        assert_eq!(request.msg, darc.id().unwrap().to_bytes().to_vec());

        // without the darc argument the request cannot be built
        let mut missing = instr.clone();
        missing.payload = InstructionPayload::Invoke {
            command: "evolve".to_string(),
            arguments: Arguments::default(),
        };
        assert!(matches!(
            missing.to_darc_request(),
            Err(ModelsError::MissingArgument(_))
        ));
    }

    #[test]
    #[serial]
    fn test_to_darc_request_evolution_unparseable_darc() {
        let instr = Instruction {
            target: sample_target(),
            nonce: Nonce::default(),
            index: 0,
            length: 1,
            payload: InstructionPayload::Invoke {
                command: "evolve".to_string(),
                arguments: Arguments(vec![Argument {
                    name: DARC_ARGUMENT_NAME.to_string(),
                    // truncated varint, not a valid darc encoding
                    value: vec![0xFF],
                }]),
            },
            signatures: Vec::new(),
        };
        assert!(matches!(
            instr.to_darc_request(),
            Err(ModelsError::MalformedDarc(_))
        ));
    }

    #[test]
    #[serial]
    fn test_to_darc_request_regular_invoke() {
        let instr = Instruction {
            target: sample_target(),
            nonce: Nonce::default(),
            index: 3,
            length: 5,
            payload: InstructionPayload::Invoke {
                command: "transfer".to_string(),
                arguments: Arguments::default(),
            },
            signatures: Vec::new(),
        };
        let request = instr.to_darc_request().unwrap();
        assert_eq!(request.base_id, instr.target.darc_id);
        assert_eq!(request.msg, instr.hash().to_bytes().to_vec());
    }

    #[test]
    #[serial]
    fn test_display_names_all_fields() {
        let instr = spawn_instruction();
        let shown = instr.to_string();
        assert!(shown.contains(&instr.hash().to_string()));
        assert!(shown.contains(&instr.target.to_string()));
        assert!(shown.contains(&instr.nonce.to_string()));
        assert!(shown.contains("0/1"));
        assert!(shown.contains("spawn:coin"));
    }

    #[test]
    #[serial]
    fn test_get_contract_state() {
        let spawn = spawn_instruction();
        let empty_view = TestView(HashMap::new());
        let (kind, state) = spawn.get_contract_state(&empty_view).unwrap();
        assert_eq!(kind, "coin");
        assert!(state.is_empty());

        let mut invoke = spawn.clone();
        invoke.payload = InstructionPayload::Invoke {
            command: "transfer".to_string(),
            arguments: Arguments::default(),
        };
        assert!(matches!(
            invoke.get_contract_state(&empty_view),
            Err(ModelsError::CollectionError(CollectionError::KeyNotFound(_)))
        ));

        let mut store = HashMap::new();
        store.insert(
            invoke.target.to_bytes().to_vec(),
            Record::new(vec![vec![1, 2, 3], b"coin".to_vec()]),
        );
        let view = TestView(store);
        let (kind, state) = invoke.get_contract_state(&view).unwrap();
        assert_eq!(kind, "coin");
        assert_eq!(state, vec![1, 2, 3]);

        let mut bad_store = HashMap::new();
        bad_store.insert(
            invoke.target.to_bytes().to_vec(),
            Record::new(vec![vec![1, 2, 3]]),
        );
        assert!(matches!(
            invoke.get_contract_state(&TestView(bad_store)),
            Err(ModelsError::CollectionError(CollectionError::MalformedRecord(_)))
        ));
    }

    #[test]
    #[serial]
    fn test_instruction_roundtrip() {
        let mut instr = spawn_instruction();
        instr
            .sign_by(&[&KeyPair::generate()])
            .expect("signing must succeed");
        let mut buffer = Vec::new();
        InstructionSerializer::new()
            .serialize(&instr, &mut buffer)
            .unwrap();
        let (rest, decoded) = InstructionDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(instr, decoded);
    }

    #[test]
    #[serial]
    fn test_instruction_roundtrip_delete() {
        let instr = Instruction {
            target: sample_target(),
            nonce: Nonce::from_bytes(&[9u8; NONCE_SIZE_BYTES]),
            index: 2,
            length: 3,
            payload: InstructionPayload::Delete,
            signatures: Vec::new(),
        };
        let mut buffer = Vec::new();
        InstructionSerializer::new()
            .serialize(&instr, &mut buffer)
            .unwrap();
        let (rest, decoded) = InstructionDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(instr, decoded);
    }

    #[test]
    #[serial]
    fn test_instruction_deserializer_rejects_bad_tag() {
        let instr = spawn_instruction();
        let mut buffer = Vec::new();
        ObjectIdSerializer::new()
            .serialize(&instr.target, &mut buffer)
            .unwrap();
        buffer.extend(instr.nonce.to_bytes());
        let u32_serializer = U32VarIntSerializer::new();
        u32_serializer.serialize(&instr.index, &mut buffer).unwrap();
        u32_serializer.serialize(&instr.length, &mut buffer).unwrap();
        // tag 3 does not name a payload kind
        u32_serializer.serialize(&3u32, &mut buffer).unwrap();
        InstructionDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("unknown payload tag must fail");
    }
}
