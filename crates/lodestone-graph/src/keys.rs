//! Canonical key builders for every table.
//!
//! Every key is a fixed concatenation of big-endian fields, so the
//! engine's lexicographic ordering matches numeric ordering and a scan
//! started at `(major, 0, 0, …)` visits exactly the rows of that major
//! id. Key layouts:
//!
//! | Table                         | Key                                  |
//! |-------------------------------|--------------------------------------|
//! | nodes, edgesById              | `u64 id`                             |
//! | nodeColdProps, edgeProps      | `u64 id \| u32 keyId`                |
//! | nodeVectors                   | `u64 nodeId \| u32 tagId`            |
//! | edgesBySrcType                | `u64 src \| u32 type \| u64 dst \| u64 edge` |
//! | edgesByDstType                | `u64 dst \| u32 type \| u64 src \| u64 edge` |
//! | labelIndex                    | `u32 labelId \| u64 nodeId`          |
//! | dictionary id side, vecTagMeta| `u32 id`                             |
//! | dictionary name side          | raw name bytes                       |
//! | meta                          | ASCII name                           |

use crate::error::StoreError;
use crate::model::{EdgeId, NodeId, SymbolId};

// meta table keys
pub(crate) const META_NODE_SEQ: &str = "nodeSeq";
pub(crate) const META_EDGE_SEQ: &str = "edgeSeq";
pub(crate) const META_LABEL_SEQ: &str = "labelSeq";
pub(crate) const META_REL_TYPE_SEQ: &str = "relTypeSeq";
pub(crate) const META_PROP_KEY_SEQ: &str = "propKeySeq";
pub(crate) const META_VEC_TAG_SEQ: &str = "vecTagSeq";
pub(crate) const META_TEXT_SEQ: &str = "textSeq";
pub(crate) const META_SCHEMA_VERSION: &str = "schemaVersion";

#[inline]
pub(crate) fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

#[inline]
pub(crate) fn symbol_key(id: SymbolId) -> [u8; 4] {
    id.to_be_bytes()
}

/// `u64 major | u32 minor` — nodeColdProps, nodeVectors, edgeProps.
#[inline]
pub(crate) fn sub_key(major: u64, minor: u32) -> [u8; 12] {
    let mut k = [0u8; 12];
    k[0..8].copy_from_slice(&major.to_be_bytes());
    k[8..12].copy_from_slice(&minor.to_be_bytes());
    k
}

/// Adjacency index key, identical layout for both directions:
/// `u64 major | u32 typeId | u64 other | u64 edgeId`.
#[inline]
pub(crate) fn adjacency_key(
    major: NodeId,
    type_id: SymbolId,
    other: NodeId,
    edge_id: EdgeId,
) -> [u8; 28] {
    let mut k = [0u8; 28];
    k[0..8].copy_from_slice(&major.to_be_bytes());
    k[8..12].copy_from_slice(&type_id.to_be_bytes());
    k[12..20].copy_from_slice(&other.to_be_bytes());
    k[20..28].copy_from_slice(&edge_id.to_be_bytes());
    k
}

#[inline]
pub(crate) fn label_index_key(label_id: SymbolId, node_id: NodeId) -> [u8; 12] {
    let mut k = [0u8; 12];
    k[0..4].copy_from_slice(&label_id.to_be_bytes());
    k[4..12].copy_from_slice(&node_id.to_be_bytes());
    k
}

// ─────────────────────────────────────────────
// Key decoders (scan side)
// ─────────────────────────────────────────────

/// Split a `u64 | u32` sub-row key into (major, minor).
#[inline]
pub(crate) fn split_sub_key(key: &[u8]) -> Result<(u64, u32), StoreError> {
    if key.len() != 12 {
        return Err(StoreError::Corrupt("sub-row key is not 12 bytes"));
    }
    let major = u64::from_be_bytes(key[0..8].try_into().expect("length checked"));
    let minor = u32::from_be_bytes(key[8..12].try_into().expect("length checked"));
    Ok((major, minor))
}

/// Split an adjacency key into (major, typeId, other, edgeId).
#[inline]
pub(crate) fn split_adjacency_key(key: &[u8]) -> Result<(u64, u32, u64, u64), StoreError> {
    if key.len() != 28 {
        return Err(StoreError::Corrupt("adjacency key is not 28 bytes"));
    }
    let major = u64::from_be_bytes(key[0..8].try_into().expect("length checked"));
    let type_id = u32::from_be_bytes(key[8..12].try_into().expect("length checked"));
    let other = u64::from_be_bytes(key[12..20].try_into().expect("length checked"));
    let edge_id = u64::from_be_bytes(key[20..28].try_into().expect("length checked"));
    Ok((major, type_id, other, edge_id))
}

/// Split a label-index key into (labelId, nodeId).
#[inline]
pub(crate) fn split_label_index_key(key: &[u8]) -> Result<(u32, u64), StoreError> {
    if key.len() != 12 {
        return Err(StoreError::Corrupt("label index key is not 12 bytes"));
    }
    let label_id = u32::from_be_bytes(key[0..4].try_into().expect("length checked"));
    let node_id = u64::from_be_bytes(key[4..12].try_into().expect("length checked"));
    Ok((label_id, node_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_sort_like_their_ids() {
        assert!(id_key(1) < id_key(2));
        assert!(id_key(255) < id_key(256));
        assert!(sub_key(1, u32::MAX) < sub_key(2, 0));
        assert!(adjacency_key(1, u32::MAX, u64::MAX, u64::MAX) < adjacency_key(2, 0, 0, 0));
        assert!(label_index_key(3, u64::MAX) < label_index_key(4, 0));
    }

    #[test]
    fn sub_key_roundtrips() {
        let k = sub_key(77, 5);
        assert_eq!(split_sub_key(&k).unwrap(), (77, 5));
        assert!(split_sub_key(&k[..11]).is_err());
    }

    #[test]
    fn adjacency_key_roundtrips() {
        let k = adjacency_key(10, 3, 20, 99);
        assert_eq!(split_adjacency_key(&k).unwrap(), (10, 3, 20, 99));
        assert!(split_adjacency_key(&k[..27]).is_err());
    }

    #[test]
    fn label_index_key_roundtrips() {
        let k = label_index_key(8, 1234);
        assert_eq!(split_label_index_key(&k).unwrap(), (8, 1234));
    }
}
