// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Bounds enforced when decoding wire data. They cap what a peer can make us
//! allocate, they are not consensus rules.

/// Maximum number of arguments in one instruction payload
pub const MAX_ARGUMENTS_PER_INSTRUCTION: u32 = 128;
/// Maximum byte length of an argument name
pub const MAX_ARGUMENT_NAME_SIZE: u16 = 1_024;
/// Maximum byte length of an argument value
pub const MAX_ARGUMENT_VALUE_SIZE: u64 = 1_048_576;
/// Maximum byte length of a contract kind identifier
pub const MAX_CONTRACT_ID_SIZE: u16 = 255;
/// Maximum byte length of an invoke command
pub const MAX_COMMAND_SIZE: u16 = 255;
/// Maximum number of signatures attached to one instruction
pub const MAX_SIGNATURES_PER_INSTRUCTION: u32 = 16;
/// Maximum byte length of one raw signature
pub const MAX_SIGNATURE_SIZE: u64 = 256;
/// Maximum number of instructions in one client transaction
pub const MAX_INSTRUCTIONS_PER_TRANSACTION: u32 = 1_024;
/// Maximum number of client transactions in one batch set
pub const MAX_TRANSACTIONS_PER_BATCH_SET: u32 = 4_096;
/// Maximum byte length of a darc rules blob
pub const MAX_DARC_RULES_SIZE: u64 = 1_048_576;
