// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Data model of the omniledger transaction pipeline.
//!
//! Clients author [`Instruction`]s, batch them into atomic
//! [`ClientTransaction`]s and authorize them with darc signatures. Block
//! proposers gather transactions into [`ClientTransactions`] sets and put
//! them into canonical order with [`sort_transactions`]. Executing a batch
//! yields [`StateChanges`], the audit trail the ledger commits to.

#![warn(missing_docs)]

mod coin;
mod collection;
mod darc;
mod error;
mod instruction;
mod object_id;
mod ordering;
mod serialization;
mod state_change;
mod transaction;

pub mod constants;

pub use coin::{Coin, CoinDeserializer, CoinSerializer};
pub use collection::{CollectionError, CollectionView, Record};
pub use darc::{
    Darc, DarcDeserializer, DarcId, DarcIdDeserializer, DarcSerializer, DarcSignature,
    DarcSignatureDeserializer, DarcSignatureSerializer, Identity, IdentityDeserializer, Request,
    Signer, DARC_EVOLVE_ACTION, DARC_ID_SIZE_BYTES,
};
pub use error::ModelsError;
pub use instruction::{
    Argument, ArgumentDeserializer, ArgumentSerializer, Arguments, Instruction,
    InstructionDeserializer, InstructionPayload, InstructionSerializer, DARC_ARGUMENT_NAME,
};
pub use object_id::{
    Nonce, NonceDeserializer, ObjectId, ObjectIdDeserializer, ObjectIdSerializer,
    NONCE_SIZE_BYTES, OBJECT_ID_SIZE_BYTES,
};
pub use ordering::sort_transactions;
pub use serialization::{StringDeserializer, StringSerializer, VecU8Deserializer, VecU8Serializer};
pub use state_change::{
    StateAction, StateChange, StateChangeDeserializer, StateChangeSerializer, StateChanges,
    StateChangesDeserializer, StateChangesSerializer,
};
pub use transaction::{
    ClientTransaction, ClientTransactionDeserializer, ClientTransactionSerializer,
    ClientTransactions, ClientTransactionsDeserializer, ClientTransactionsSerializer,
};
