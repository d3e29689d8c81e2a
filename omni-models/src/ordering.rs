// Copyright (c) 2026 OMNILEDGER CONTRIBUTORS

//! Deterministic, proposer-neutral ordering of a transaction set.

use crate::error::ModelsError;
use crate::transaction::{
    ClientTransaction, ClientTransactionDeserializer, ClientTransactionSerializer,
    ClientTransactions,
};
use omni_hash::Hash;
use omni_serialization::{DeserializeError, Deserializer, Serializer};
use tracing::debug;

/// Sort the set into its canonical order.
///
/// Every transaction is keyed by the digest of a set-wide salt followed by
/// its canonical encoding. The salt is the XOR of all member digests, so it
/// depends on the whole set and no proposer can bias the final order by
/// picking which transactions to gather. Sorting the same set twice is a
/// no-op.
///
/// The set is either fully reordered or left untouched: any encoding error
/// aborts before the first mutation.
pub fn sort_transactions(txs: &mut ClientTransactions) -> Result<(), ModelsError> {
    let serializer = ClientTransactionSerializer::new();
    let deserializer = ClientTransactionDeserializer::new();

    let mut encodings = Vec::with_capacity(txs.0.len());
    let mut salt = Hash::zero();
    for tx in &txs.0 {
        let mut encoding = Vec::new();
        serializer.serialize(tx, &mut encoding)?;
        salt ^= Hash::compute_from(&encoding);
        encodings.push(encoding);
    }

    let mut keyed: Vec<(Hash, Vec<u8>)> = encodings
        .into_iter()
        .map(|encoding| {
            let mut salted = Vec::with_capacity(salt.to_bytes().len() + encoding.len());
            salted.extend(salt.to_bytes());
            salted.extend(&encoding);
            (Hash::compute_from(&salted), encoding)
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.to_bytes().cmp(b.to_bytes()));

    let mut sorted = Vec::with_capacity(keyed.len());
    for (_, encoding) in &keyed {
        let (rest, tx): (_, ClientTransaction) = deserializer
            .deserialize::<DeserializeError>(encoding)
            .map_err(|err| ModelsError::DeserializeError(err.to_string()))?;
        if !rest.is_empty() {
            return Err(ModelsError::DeserializeError(
                "trailing bytes after transaction".to_string(),
            ));
        }
        sorted.push(tx);
    }

    debug!("sorted {} transactions with salt {}", sorted.len(), salt);
    txs.0 = sorted;
    Ok(())
}
