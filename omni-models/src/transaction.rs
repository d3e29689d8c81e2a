// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Client transactions, the atomic batches instructions travel in.

use crate::constants::{MAX_INSTRUCTIONS_PER_TRANSACTION, MAX_TRANSACTIONS_PER_BATCH_SET};
use crate::instruction::{Instruction, InstructionDeserializer, InstructionSerializer};
use omni_hash::Hash;
use omni_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
};
use nom::error::context;
use nom::multi::length_count;
use nom::Parser;
use nom::{
    error::{ContextError, ParseError},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// An atomic batch of instructions. All of them take effect or none do.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct ClientTransaction {
    /// the instructions, in client order
    pub instructions: Vec<Instruction>,
}

impl ClientTransaction {
    /// The transaction digest: the digest of the concatenated instruction
    /// digests, in order.
    pub fn hash(&self) -> Hash {
        let mut data = Vec::new();
        for instruction in &self.instructions {
            data.extend(instruction.hash().to_bytes());
        }
        Hash::compute_from(&data)
    }
}

impl std::fmt::Display for ClientTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "ClientTransaction {}", self.hash())?;
        for instruction in &self.instructions {
            write!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

/// A set of client transactions, as gathered for one block proposal.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct ClientTransactions(pub Vec<ClientTransaction>);

impl ClientTransactions {
    /// A digest over the whole set, chaining the member digests in order.
    pub fn hash(&self) -> Hash {
        let mut data = Vec::new();
        for transaction in &self.0 {
            data.extend(transaction.hash().to_bytes());
        }
        Hash::compute_from(&data)
    }

    /// Whether the set holds no transactions
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Serializer for `ClientTransaction`
pub struct ClientTransactionSerializer {
    u32_serializer: U32VarIntSerializer,
    instruction_serializer: InstructionSerializer,
}

impl ClientTransactionSerializer {
    /// Creates a new `ClientTransactionSerializer`
    pub fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
            instruction_serializer: InstructionSerializer::new(),
        }
    }
}

impl Default for ClientTransactionSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<ClientTransaction> for ClientTransactionSerializer {
    fn serialize(
        &self,
        value: &ClientTransaction,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        let count: u32 = value.instructions.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many instructions: {}", err))
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for instruction in &value.instructions {
            self.instruction_serializer.serialize(instruction, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `ClientTransaction`
pub struct ClientTransactionDeserializer {
    count_deserializer: U32VarIntDeserializer,
    instruction_deserializer: InstructionDeserializer,
}

impl ClientTransactionDeserializer {
    /// Creates a new `ClientTransactionDeserializer`
    pub const fn new() -> Self {
        Self {
            count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_INSTRUCTIONS_PER_TRANSACTION),
            ),
            instruction_deserializer: InstructionDeserializer::new(),
        }
    }
}

impl Default for ClientTransactionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<ClientTransaction> for ClientTransactionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], ClientTransaction, E> {
        context(
            "Failed ClientTransaction deserialization",
            length_count(
                context("Failed instruction count deserialization", |input| {
                    self.count_deserializer.deserialize(input)
                }),
                context("Failed instruction deserialization", |input| {
                    self.instruction_deserializer.deserialize(input)
                }),
            ),
        )
        .map(|instructions| ClientTransaction { instructions })
        .parse(buffer)
    }
}

/// Serializer for `ClientTransactions`
pub struct ClientTransactionsSerializer {
    u32_serializer: U32VarIntSerializer,
    transaction_serializer: ClientTransactionSerializer,
}

impl ClientTransactionsSerializer {
    /// Creates a new `ClientTransactionsSerializer`
    pub fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
            transaction_serializer: ClientTransactionSerializer::new(),
        }
    }
}

impl Default for ClientTransactionsSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<ClientTransactions> for ClientTransactionsSerializer {
    fn serialize(
        &self,
        value: &ClientTransactions,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        let count: u32 = value.0.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many transactions: {}", err))
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for transaction in &value.0 {
            self.transaction_serializer.serialize(transaction, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `ClientTransactions`
pub struct ClientTransactionsDeserializer {
    count_deserializer: U32VarIntDeserializer,
    transaction_deserializer: ClientTransactionDeserializer,
}

impl ClientTransactionsDeserializer {
    /// Creates a new `ClientTransactionsDeserializer`
    pub const fn new() -> Self {
        Self {
            count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_TRANSACTIONS_PER_BATCH_SET),
            ),
            transaction_deserializer: ClientTransactionDeserializer::new(),
        }
    }
}

impl Default for ClientTransactionsDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<ClientTransactions> for ClientTransactionsDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], ClientTransactions, E> {
        context(
            "Failed ClientTransactions deserialization",
            length_count(
                context("Failed transaction count deserialization", |input| {
                    self.count_deserializer.deserialize(input)
                }),
                context("Failed transaction deserialization", |input| {
                    self.transaction_deserializer.deserialize(input)
                }),
            ),
        )
        .map(ClientTransactions)
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::darc::{DarcId, DARC_ID_SIZE_BYTES};
    use crate::instruction::{Argument, Arguments, InstructionPayload};
    use crate::object_id::{Nonce, ObjectId, NONCE_SIZE_BYTES};
    use omni_serialization::DeserializeError;
    use serial_test::serial;

    fn instruction(index: u32, length: u32, seed: u8) -> Instruction {
        Instruction {
            target: ObjectId::new(
                DarcId::from_bytes(&[seed; DARC_ID_SIZE_BYTES]),
                Nonce::from_bytes(&[seed; NONCE_SIZE_BYTES]),
            ),
            nonce: Nonce::default(),
            index,
            length,
            payload: InstructionPayload::Invoke {
                command: "transfer".to_string(),
                arguments: Arguments(vec![Argument {
                    name: "amount".to_string(),
                    value: vec![seed],
                }]),
            },
            signatures: Vec::new(),
        }
    }

    #[test]
    #[serial]
    fn test_transaction_hash_chains_instruction_hashes() {
        let tx = ClientTransaction {
            instructions: vec![instruction(0, 2, 1), instruction(1, 2, 2)],
        };
        let mut expected = Vec::new();
        expected.extend(tx.instructions[0].hash().to_bytes());
        expected.extend(tx.instructions[1].hash().to_bytes());
        assert_eq!(tx.hash(), Hash::compute_from(&expected));

        // order matters
        let reversed = ClientTransaction {
            instructions: vec![instruction(1, 2, 2), instruction(0, 2, 1)],
        };
        assert_ne!(tx.hash(), reversed.hash());
    }

    #[test]
    #[serial]
    fn test_transactions_set_hash() {
        let set = ClientTransactions(vec![
            ClientTransaction {
                instructions: vec![instruction(0, 1, 1)],
            },
            ClientTransaction {
                instructions: vec![instruction(0, 1, 2)],
            },
        ]);
        let mut expected = Vec::new();
        expected.extend(set.0[0].hash().to_bytes());
        expected.extend(set.0[1].hash().to_bytes());
        assert_eq!(set.hash(), Hash::compute_from(&expected));
        assert!(!set.is_empty());
        assert!(ClientTransactions::default().is_empty());
    }

    #[test]
    #[serial]
    fn test_transaction_serde_json() {
        let tx = ClientTransaction {
            instructions: vec![instruction(0, 1, 7)],
        };
        let json = serde_json::to_string(&tx).unwrap();
        let decoded: ClientTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, decoded);
    }

    #[test]
    #[serial]
    fn test_transactions_roundtrip() {
        let set = ClientTransactions(vec![
            ClientTransaction {
                instructions: vec![instruction(0, 2, 1), instruction(1, 2, 2)],
            },
            ClientTransaction {
                instructions: Vec::new(),
            },
        ]);
        let mut buffer = Vec::new();
        ClientTransactionsSerializer::new()
            .serialize(&set, &mut buffer)
            .unwrap();
        let (rest, decoded) = ClientTransactionsDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(set, decoded);
    }
}
