//! Content-addressed preimage storage for validation inputs.

use std::collections::HashMap;

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

/// Distinguishes the hash function a preimage is addressed under.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum PreimageType {
    Keccak256,
    Sha2_256,
    EthVersionedHash,
}

/// Map of preimage-type to (hash -> bytes).
///
/// Lookup is content-addressed, so overwriting an existing hash with the same
/// content is idempotent. Merging is a deep union keyed by (type, hash) with
/// later writes overwriting earlier values.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PreimagesMap(HashMap<PreimageType, HashMap<B256, Bytes>>);

impl PreimagesMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ty: PreimageType, hash: B256, data: Bytes) {
        self.0.entry(ty).or_default().insert(hash, data);
    }

    pub fn get(&self, ty: PreimageType, hash: &B256) -> Option<&Bytes> {
        self.0.get(&ty)?.get(hash)
    }

    /// Deep-merges `source` into `self`.
    pub fn merge_from(&mut self, source: &PreimagesMap) {
        for (ty, map) in &source.0 {
            let dest = self.0.entry(*ty).or_default();
            for (hash, data) in map {
                dest.insert(*hash, data.clone());
            }
        }
    }

    /// Merges an untyped hash-to-bytes map under an explicit preimage type.
    pub fn merge_typed(&mut self, ty: PreimageType, source: HashMap<B256, Bytes>) {
        let dest = self.0.entry(ty).or_default();
        dest.extend(source);
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|m| m.is_empty())
    }

    /// Total number of preimages across all types.
    pub fn len(&self) -> usize {
        self.0.values().map(|m| m.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PreimageType, &HashMap<B256, Bytes>)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PreimagesMap {
        let mut m = PreimagesMap::new();
        m.insert(
            PreimageType::Keccak256,
            B256::repeat_byte(1),
            Bytes::from_static(b"one"),
        );
        m.insert(
            PreimageType::Sha2_256,
            B256::repeat_byte(2),
            Bytes::from_static(b"two"),
        );
        m
    }

    #[test]
    fn merge_is_idempotent() {
        let m = sample();
        let mut merged = m.clone();
        merged.merge_from(&m.clone());
        assert_eq!(merged, m);
    }

    #[test]
    fn merge_unions_across_types() {
        let mut dest = PreimagesMap::new();
        dest.insert(
            PreimageType::Keccak256,
            B256::repeat_byte(9),
            Bytes::from_static(b"kept"),
        );
        dest.merge_from(&sample());
        assert_eq!(dest.len(), 3);
        assert_eq!(
            dest.get(PreimageType::Keccak256, &B256::repeat_byte(9)),
            Some(&Bytes::from_static(b"kept"))
        );
    }

    #[test]
    fn later_writes_overwrite() {
        let mut dest = sample();
        let mut update = PreimagesMap::new();
        update.insert(
            PreimageType::Keccak256,
            B256::repeat_byte(1),
            Bytes::from_static(b"new"),
        );
        dest.merge_from(&update);
        assert_eq!(
            dest.get(PreimageType::Keccak256, &B256::repeat_byte(1)),
            Some(&Bytes::from_static(b"new"))
        );
    }

    #[test]
    fn merge_typed_tags_untyped_preimages() {
        let mut dest = PreimagesMap::new();
        let mut recorded = HashMap::new();
        recorded.insert(B256::repeat_byte(3), Bytes::from_static(b"rec"));
        dest.merge_typed(PreimageType::Keccak256, recorded);
        assert!(dest
            .get(PreimageType::Keccak256, &B256::repeat_byte(3))
            .is_some());
    }
}
