// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

/// Hash size
pub const HASH_SIZE_BYTES: usize = 32;
