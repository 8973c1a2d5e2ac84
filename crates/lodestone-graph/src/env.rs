//! LMDB environment ownership and the table registry.
//!
//! [`GraphEnv`] opens (or creates) the storage environment and, inside a
//! single bootstrap write transaction, opens every named table the store
//! uses. The engine provides the transaction contract this crate builds
//! on: one writer at a time, snapshot-isolated readers, atomic durable
//! commit, and abort when an uncommitted transaction goes out of scope.

use std::fs;
use std::path::Path;

use heed::byteorder::BE;
use heed::types::{Bytes, Str, Unit, U32};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};

use crate::error::StoreError;
use crate::keys;

/// Default virtual map size: 16 GiB.
pub const DEFAULT_MAP_SIZE: usize = 16 << 30;

const MAX_DBS: u32 = 32;

/// The environment handle plus every named table.
///
/// Table inventory (key layouts in [`crate::keys`]):
/// primary records (`nodes`, `edgesById`), per-key sub-rows
/// (`nodeColdProps`, `nodeVectors`, `edgeProps`), the two adjacency
/// indexes, five bidirectional dictionaries, `vecTagMeta`, the
/// `labelIndex` secondary index, and the `meta` table holding the id
/// sequences and the schema version sentinel.
pub struct GraphEnv {
    pub(crate) env: Env,

    pub(crate) nodes: Database<Bytes, Bytes>,
    pub(crate) node_cold_props: Database<Bytes, Bytes>,
    pub(crate) node_vectors: Database<Bytes, Bytes>,

    pub(crate) edges_by_src_type: Database<Bytes, Unit>,
    pub(crate) edges_by_dst_type: Database<Bytes, Unit>,
    pub(crate) edges_by_id: Database<Bytes, Bytes>,
    pub(crate) edge_props: Database<Bytes, Bytes>,

    pub(crate) label_ids: Database<Bytes, Str>,
    pub(crate) labels_by_name: Database<Str, U32<BE>>,
    pub(crate) rel_type_ids: Database<Bytes, Str>,
    pub(crate) rel_types_by_name: Database<Str, U32<BE>>,
    pub(crate) prop_key_ids: Database<Bytes, Str>,
    pub(crate) prop_keys_by_name: Database<Str, U32<BE>>,
    pub(crate) vec_tag_ids: Database<Bytes, Str>,
    pub(crate) vec_tags_by_name: Database<Str, U32<BE>>,
    pub(crate) vec_tag_meta: Database<Bytes, U32<BE>>,
    pub(crate) text_ids: Database<Bytes, Str>,
    pub(crate) texts_by_name: Database<Str, U32<BE>>,

    pub(crate) meta: Database<Str, Bytes>,
    pub(crate) label_index: Database<Bytes, Unit>,
}

impl GraphEnv {
    /// Open (or create) the environment at `path` with the default map size.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    /// Open (or create) the environment at `path`.
    ///
    /// Creates the directory, opens every table inside one bootstrap
    /// write transaction, and seeds `schemaVersion = 1` on a fresh
    /// environment.
    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        fs::create_dir_all(path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;

        let nodes = env.create_database(&mut wtxn, Some("nodes"))?;
        let node_cold_props = env.create_database(&mut wtxn, Some("nodeColdProps"))?;
        let node_vectors = env.create_database(&mut wtxn, Some("nodeVectors"))?;

        let edges_by_src_type = env.create_database(&mut wtxn, Some("edgesBySrcType"))?;
        let edges_by_dst_type = env.create_database(&mut wtxn, Some("edgesByDstType"))?;
        let edges_by_id = env.create_database(&mut wtxn, Some("edgesById"))?;
        let edge_props = env.create_database(&mut wtxn, Some("edgeProps"))?;

        let label_ids = env.create_database(&mut wtxn, Some("labelIds"))?;
        let labels_by_name = env.create_database(&mut wtxn, Some("labelsByName"))?;
        let rel_type_ids = env.create_database(&mut wtxn, Some("relTypeIds"))?;
        let rel_types_by_name = env.create_database(&mut wtxn, Some("relTypesByName"))?;
        let prop_key_ids = env.create_database(&mut wtxn, Some("propKeyIds"))?;
        let prop_keys_by_name = env.create_database(&mut wtxn, Some("propKeysByName"))?;
        let vec_tag_ids = env.create_database(&mut wtxn, Some("vecTagIds"))?;
        let vec_tags_by_name = env.create_database(&mut wtxn, Some("vecTagsByName"))?;
        let vec_tag_meta = env.create_database(&mut wtxn, Some("vecTagMeta"))?;
        let text_ids = env.create_database(&mut wtxn, Some("textIds"))?;
        let texts_by_name = env.create_database(&mut wtxn, Some("textsByName"))?;

        let meta: Database<Str, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;
        let label_index = env.create_database(&mut wtxn, Some("labelIndex"))?;

        if meta.get(&wtxn, keys::META_SCHEMA_VERSION)?.is_none() {
            meta.put(&mut wtxn, keys::META_SCHEMA_VERSION, &1u32.to_be_bytes())?;
        }

        wtxn.commit()?;

        Ok(Self {
            env,
            nodes,
            node_cold_props,
            node_vectors,
            edges_by_src_type,
            edges_by_dst_type,
            edges_by_id,
            edge_props,
            label_ids,
            labels_by_name,
            rel_type_ids,
            rel_types_by_name,
            prop_key_ids,
            prop_keys_by_name,
            vec_tag_ids,
            vec_tags_by_name,
            vec_tag_meta,
            text_ids,
            texts_by_name,
            meta,
            label_index,
        })
    }

    /// Begin a read transaction (consistent snapshot across all tables).
    pub fn read_txn(&self) -> Result<RoTxn<'_>, StoreError> {
        Ok(self.env.read_txn()?)
    }

    /// Begin the write transaction (excludes other writers until commit
    /// or drop-abort).
    pub fn write_txn(&self) -> Result<RwTxn<'_>, StoreError> {
        Ok(self.env.write_txn()?)
    }

    /// Advance a meta sequence and return the freshly issued id.
    ///
    /// Sequences start at 1; ids are never reused after deletion.
    pub(crate) fn next_seq(&self, wtxn: &mut RwTxn, seq: &str) -> Result<u64, StoreError> {
        let current = match self.meta.get(wtxn, seq)? {
            None => 0,
            Some(raw) => u64::from_be_bytes(
                raw.try_into()
                    .map_err(|_| StoreError::Corrupt("meta sequence is not 8 bytes"))?,
            ),
        };
        let next = current + 1;
        self.meta.put(wtxn, seq, &next.to_be_bytes())?;
        Ok(next)
    }

    /// Current schema version sentinel.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.read_txn()?;
        let raw = self
            .meta
            .get(&rtxn, keys::META_SCHEMA_VERSION)?
            .ok_or(StoreError::Corrupt("schemaVersion missing"))?;
        Ok(u32::from_be_bytes(
            raw.try_into()
                .map_err(|_| StoreError::Corrupt("schemaVersion is not 4 bytes"))?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_all_tables_and_schema_version() {
        let dir = TempDir::new().unwrap();
        let env = GraphEnv::open(dir.path()).unwrap();
        assert_eq!(env.schema_version().unwrap(), 1);
    }

    #[test]
    fn schema_version_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let env = GraphEnv::open(dir.path()).unwrap();
            assert_eq!(env.schema_version().unwrap(), 1);
        }
        let env = GraphEnv::open(dir.path()).unwrap();
        assert_eq!(env.schema_version().unwrap(), 1);
    }

    #[test]
    fn sequences_are_monotone_and_independent() {
        let dir = TempDir::new().unwrap();
        let env = GraphEnv::open(dir.path()).unwrap();

        let mut wtxn = env.write_txn().unwrap();
        assert_eq!(env.next_seq(&mut wtxn, keys::META_NODE_SEQ).unwrap(), 1);
        assert_eq!(env.next_seq(&mut wtxn, keys::META_NODE_SEQ).unwrap(), 2);
        assert_eq!(env.next_seq(&mut wtxn, keys::META_EDGE_SEQ).unwrap(), 1);
        wtxn.commit().unwrap();

        // a dropped (aborted) transaction does not advance the sequence
        {
            let mut wtxn = env.write_txn().unwrap();
            assert_eq!(env.next_seq(&mut wtxn, keys::META_NODE_SEQ).unwrap(), 3);
        }
        let mut wtxn = env.write_txn().unwrap();
        assert_eq!(env.next_seq(&mut wtxn, keys::META_NODE_SEQ).unwrap(), 3);
        wtxn.commit().unwrap();
    }
}
