//! The public store API.
//!
//! Every write opens one write transaction, mutates all affected tables,
//! and commits; any error aborts the transaction by dropping it, so the
//! cross-index invariants hold after every commit:
//!
//! - an edge exists in `edgesById` iff both adjacency indexes carry its
//!   row with identical `(src, dst, type, id)`;
//! - a node's label set equals its `labelIndex` rows;
//! - sub-rows (cold props, vectors, edge props) are removed with their
//!   owner;
//! - label sets are sorted and duplicate-free;
//! - ids come from meta sequences and are never reused.
//!
//! Reads open short-lived read transactions whose snapshot is consistent
//! across all tables.

use std::collections::HashSet;
use std::path::Path;

use heed::RwTxn;
use tracing::debug;

use crate::codec;
use crate::dict::{Dictionary, Namespace};
use crate::env::GraphEnv;
use crate::error::StoreError;
use crate::keys;
use crate::model::{
    contains_all, sort_unique, Adjacency, Direction, EdgeId, EdgeRef, NewEdge, NewNode,
    NodeHeader, NodeId, Property, SymbolId, TaggedVector,
};
use crate::scan;

/// Embedded property-graph store with vector attachments.
pub struct Store {
    pub(crate) env: GraphEnv,
    pub(crate) dict: Dictionary,
}

impl Store {
    /// Open (or create) a store at `path` with the default map size.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self { env: GraphEnv::open(path)?, dict: Dictionary::new() })
    }

    /// Open (or create) a store with an explicit map size budget.
    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        Ok(Self {
            env: GraphEnv::open_with_map_size(path, map_size)?,
            dict: Dictionary::new(),
        })
    }

    /// Schema version sentinel of the open environment.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        self.env.schema_version()
    }

    // ── Dictionary ───────────────────────────────────────────────────────

    pub fn label_id(&self, name: &str, create: bool) -> Result<SymbolId, StoreError> {
        self.dict.get_or_create(&self.env, Namespace::Label, name, create)
    }

    pub fn rel_type_id(&self, name: &str, create: bool) -> Result<SymbolId, StoreError> {
        self.dict.get_or_create(&self.env, Namespace::RelType, name, create)
    }

    pub fn prop_key_id(&self, name: &str, create: bool) -> Result<SymbolId, StoreError> {
        self.dict.get_or_create(&self.env, Namespace::PropKey, name, create)
    }

    /// Vector tags may carry a dimension, persisted when the tag is new.
    pub fn vec_tag_id(
        &self,
        name: &str,
        create: bool,
        dim: Option<u32>,
    ) -> Result<SymbolId, StoreError> {
        self.dict.get_or_create_vec_tag(&self.env, name, create, dim)
    }

    pub fn text_id(&self, name: &str, create: bool) -> Result<SymbolId, StoreError> {
        self.dict.get_or_create(&self.env, Namespace::Text, name, create)
    }

    pub fn label_name(&self, id: SymbolId) -> Result<String, StoreError> {
        self.dict.name_of(&self.env, Namespace::Label, id)
    }

    pub fn rel_type_name(&self, id: SymbolId) -> Result<String, StoreError> {
        self.dict.name_of(&self.env, Namespace::RelType, id)
    }

    pub fn prop_key_name(&self, id: SymbolId) -> Result<String, StoreError> {
        self.dict.name_of(&self.env, Namespace::PropKey, id)
    }

    pub fn vec_tag_name(&self, id: SymbolId) -> Result<String, StoreError> {
        self.dict.name_of(&self.env, Namespace::VecTag, id)
    }

    pub fn text_name(&self, id: SymbolId) -> Result<String, StoreError> {
        self.dict.name_of(&self.env, Namespace::Text, id)
    }

    // ── Writes ───────────────────────────────────────────────────────────

    /// Create a node with its labels, properties and vectors in one
    /// transaction. Returns the stored header (labels sorted, deduped).
    pub fn create_node(&self, new: NewNode) -> Result<NodeHeader, StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let header = self.create_node_in(&mut wtxn, new)?;
        wtxn.commit()?;
        debug!(node = header.id, "node created");
        Ok(header)
    }

    pub(crate) fn create_node_in(
        &self,
        wtxn: &mut RwTxn,
        new: NewNode,
    ) -> Result<NodeHeader, StoreError> {
        let id = self.env.next_seq(wtxn, keys::META_NODE_SEQ)?;

        let mut labels = new.labels;
        sort_unique(&mut labels);
        let header = NodeHeader { id, labels, hot_props: new.hot_props };

        self.env
            .nodes
            .put(wtxn, &keys::id_key(id), &codec::encode_node_header(&header))?;

        for p in &new.cold_props {
            let mut value = Vec::with_capacity(16);
            codec::encode_value(&mut value, &p.value);
            self.env
                .node_cold_props
                .put(wtxn, &keys::sub_key(id, p.key_id), &value)?;
        }

        for v in &new.vectors {
            self.put_vector_in(wtxn, id, v.tag_id, v.dim, &v.bytes)?;
        }

        for label_id in &header.labels {
            self.env
                .label_index
                .put(wtxn, &keys::label_index_key(*label_id, id), &())?;
        }

        Ok(header)
    }

    /// Patch a node's properties.
    ///
    /// `unset_keys` is applied before either set list, so a key present
    /// in both a set list and `unset_keys` ends up set. Hot/cold
    /// placement is the caller's choice per key; the store never
    /// relocates a property between the header and its cold row.
    pub fn upsert_node_props(
        &self,
        id: NodeId,
        set_hot: &[Property],
        set_cold: &[Property],
        unset_keys: &[SymbolId],
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        self.upsert_node_props_in(&mut wtxn, id, set_hot, set_cold, unset_keys)?;
        wtxn.commit()?;
        Ok(())
    }

    pub(crate) fn upsert_node_props_in(
        &self,
        wtxn: &mut RwTxn,
        id: NodeId,
        set_hot: &[Property],
        set_cold: &[Property],
        unset_keys: &[SymbolId],
    ) -> Result<(), StoreError> {
        let mut header = self.load_header(wtxn, id)?;

        if !unset_keys.is_empty() {
            let mut unset = unset_keys.to_vec();
            sort_unique(&mut unset);
            header
                .hot_props
                .retain(|p| unset.binary_search(&p.key_id).is_err());
            for key_id in &unset {
                self.env
                    .node_cold_props
                    .delete(wtxn, &keys::sub_key(id, *key_id))?;
            }
        }

        for p in set_hot {
            match header.hot_props.iter_mut().find(|hp| hp.key_id == p.key_id) {
                Some(hp) => hp.value = p.value.clone(),
                None => header.hot_props.push(p.clone()),
            }
        }

        self.env
            .nodes
            .put(wtxn, &keys::id_key(id), &codec::encode_node_header(&header))?;

        for p in set_cold {
            let mut value = Vec::with_capacity(16);
            codec::encode_value(&mut value, &p.value);
            self.env
                .node_cold_props
                .put(wtxn, &keys::sub_key(id, p.key_id), &value)?;
        }

        Ok(())
    }

    /// Add and remove labels. When the same id appears in both lists the
    /// node keeps the label; the label index is updated to match the
    /// header exactly.
    pub fn set_node_labels(
        &self,
        id: NodeId,
        add: &[SymbolId],
        remove: &[SymbolId],
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        self.set_node_labels_in(&mut wtxn, id, add, remove)?;
        wtxn.commit()?;
        Ok(())
    }

    pub(crate) fn set_node_labels_in(
        &self,
        wtxn: &mut RwTxn,
        id: NodeId,
        add: &[SymbolId],
        remove: &[SymbolId],
    ) -> Result<(), StoreError> {
        let mut header = self.load_header(wtxn, id)?;

        let mut add = add.to_vec();
        sort_unique(&mut add);
        // a label both added and removed stays present, so it must keep
        // its index row as well
        let mut remove: Vec<SymbolId> = remove
            .iter()
            .copied()
            .filter(|r| add.binary_search(r).is_err())
            .collect();
        sort_unique(&mut remove);

        header.labels.retain(|l| remove.binary_search(l).is_err());
        header.labels.extend(add.iter().copied());
        sort_unique(&mut header.labels);

        self.env
            .nodes
            .put(wtxn, &keys::id_key(id), &codec::encode_node_header(&header))?;

        for label_id in &add {
            self.env
                .label_index
                .put(wtxn, &keys::label_index_key(*label_id, id), &())?;
        }
        for label_id in &remove {
            self.env
                .label_index
                .delete(wtxn, &keys::label_index_key(*label_id, id))?;
        }

        Ok(())
    }

    /// Attach (or overwrite) a vector under `tag_id`.
    ///
    /// The tag's dimension is fixed by its first vector (or by explicit
    /// tag creation with a dimension) and enforced forever after.
    /// `declared_dim` of zero means "derive from the payload".
    pub fn upsert_vector(
        &self,
        id: NodeId,
        tag_id: SymbolId,
        declared_dim: u32,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        self.put_vector_in(&mut wtxn, id, tag_id, declared_dim, bytes)?;
        wtxn.commit()?;
        Ok(())
    }

    pub(crate) fn put_vector_in(
        &self,
        wtxn: &mut RwTxn,
        id: NodeId,
        tag_id: SymbolId,
        declared_dim: u32,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        if bytes.len() % 4 != 0 {
            return Err(StoreError::InvalidArgument(format!(
                "vector payload of {} bytes is not a multiple of 4",
                bytes.len()
            )));
        }
        let dim = (bytes.len() / 4) as u32;
        if declared_dim != 0 && declared_dim != dim {
            return Err(StoreError::DimMismatch { expected: declared_dim, got: dim });
        }

        match self.env.vec_tag_meta.get(wtxn, &keys::symbol_key(tag_id))? {
            Some(stored) if stored != dim => {
                return Err(StoreError::DimMismatch { expected: stored, got: dim });
            }
            Some(_) => {}
            None => {
                self.env
                    .vec_tag_meta
                    .put(wtxn, &keys::symbol_key(tag_id), &dim)?;
            }
        }

        self.env
            .node_vectors
            .put(wtxn, &keys::sub_key(id, tag_id), bytes)?;
        Ok(())
    }

    /// Remove a vector; removing an absent vector is not an error.
    pub fn delete_vector(&self, id: NodeId, tag_id: SymbolId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        self.delete_vector_in(&mut wtxn, id, tag_id)?;
        wtxn.commit()?;
        Ok(())
    }

    pub(crate) fn delete_vector_in(
        &self,
        wtxn: &mut RwTxn,
        id: NodeId,
        tag_id: SymbolId,
    ) -> Result<(), StoreError> {
        self.env.node_vectors.delete(wtxn, &keys::sub_key(id, tag_id))?;
        Ok(())
    }

    /// Create a directed typed edge with its properties.
    pub fn add_edge(&self, new: NewEdge) -> Result<EdgeRef, StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let edge = self.add_edge_in(&mut wtxn, new)?;
        wtxn.commit()?;
        debug!(edge = edge.id, src = edge.src, dst = edge.dst, "edge added");
        Ok(edge)
    }

    pub(crate) fn add_edge_in(&self, wtxn: &mut RwTxn, new: NewEdge) -> Result<EdgeRef, StoreError> {
        let id = self.env.next_seq(wtxn, keys::META_EDGE_SEQ)?;
        let edge = EdgeRef { id, src: new.src, dst: new.dst };

        self.env
            .edges_by_id
            .put(wtxn, &keys::id_key(id), &codec::encode_edge_ref(&edge))?;
        self.env.edges_by_src_type.put(
            wtxn,
            &keys::adjacency_key(new.src, new.type_id, new.dst, id),
            &(),
        )?;
        self.env.edges_by_dst_type.put(
            wtxn,
            &keys::adjacency_key(new.dst, new.type_id, new.src, id),
            &(),
        )?;

        for p in &new.props {
            let mut value = Vec::with_capacity(16);
            codec::encode_value(&mut value, &p.value);
            self.env.edge_props.put(wtxn, &keys::sub_key(id, p.key_id), &value)?;
        }

        Ok(edge)
    }

    /// Patch edge properties. Best-effort: the edge id is not checked
    /// for existence, and unsetting an absent key is not an error.
    pub fn update_edge_props(
        &self,
        edge_id: EdgeId,
        set: &[Property],
        unset_keys: &[SymbolId],
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;
        self.update_edge_props_in(&mut wtxn, edge_id, set, unset_keys)?;
        wtxn.commit()?;
        Ok(())
    }

    pub(crate) fn update_edge_props_in(
        &self,
        wtxn: &mut RwTxn,
        edge_id: EdgeId,
        set: &[Property],
        unset_keys: &[SymbolId],
    ) -> Result<(), StoreError> {
        for p in set {
            let mut value = Vec::with_capacity(16);
            codec::encode_value(&mut value, &p.value);
            self.env
                .edge_props
                .put(wtxn, &keys::sub_key(edge_id, p.key_id), &value)?;
        }
        for key_id in unset_keys {
            self.env.edge_props.delete(wtxn, &keys::sub_key(edge_id, *key_id))?;
        }
        Ok(())
    }

    // ── Deletes ──────────────────────────────────────────────────────────

    /// Delete a node and cascade everything that hangs off it: incident
    /// edges (both index rows, canonical record, properties), cold
    /// properties, vectors, and label-index rows. Deleting an absent
    /// node is not an error.
    pub fn delete_node(&self, id: NodeId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;

        if let Some(raw) = self.env.nodes.get(&wtxn, &keys::id_key(id))? {
            let header = codec::decode_node_header(raw)?;
            for label_id in &header.labels {
                self.env
                    .label_index
                    .delete(&mut wtxn, &keys::label_index_key(*label_id, id))?;
            }
        }

        let mut edge_ids: HashSet<EdgeId> = HashSet::new();

        // outgoing: delete src rows and their dst mirrors
        let out_rows = self.collect_adjacency(&wtxn, Direction::Out, id)?;
        for (type_id, dst, edge_id) in &out_rows {
            self.env
                .edges_by_src_type
                .delete(&mut wtxn, &keys::adjacency_key(id, *type_id, *dst, *edge_id))?;
            self.env
                .edges_by_dst_type
                .delete(&mut wtxn, &keys::adjacency_key(*dst, *type_id, id, *edge_id))?;
            edge_ids.insert(*edge_id);
        }

        // incoming edges not already covered (self-loops were)
        let in_rows = self.collect_adjacency(&wtxn, Direction::In, id)?;
        for (type_id, src, edge_id) in &in_rows {
            self.env
                .edges_by_dst_type
                .delete(&mut wtxn, &keys::adjacency_key(id, *type_id, *src, *edge_id))?;
            self.env
                .edges_by_src_type
                .delete(&mut wtxn, &keys::adjacency_key(*src, *type_id, id, *edge_id))?;
            edge_ids.insert(*edge_id);
        }

        for edge_id in &edge_ids {
            self.env.edges_by_id.delete(&mut wtxn, &keys::id_key(*edge_id))?;
            self.delete_prefix(&mut wtxn, self.env.edge_props, &keys::id_key(*edge_id))?;
        }

        self.delete_prefix(&mut wtxn, self.env.node_cold_props, &keys::id_key(id))?;
        self.delete_prefix(&mut wtxn, self.env.node_vectors, &keys::id_key(id))?;

        self.env.nodes.delete(&mut wtxn, &keys::id_key(id))?;

        wtxn.commit()?;
        debug!(node = id, edges = edge_ids.len(), "node deleted");
        Ok(())
    }

    /// Delete one edge: both adjacency rows, the canonical record, and
    /// its properties. Deleting an absent edge is not an error.
    pub fn delete_edge(&self, edge_id: EdgeId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn()?;

        if let Some(raw) = self.env.edges_by_id.get(&wtxn, &keys::id_key(edge_id))? {
            let edge = codec::decode_edge_ref(raw)?;
            if let Some(type_id) = self.find_type_id(&wtxn, &edge)? {
                self.env.edges_by_src_type.delete(
                    &mut wtxn,
                    &keys::adjacency_key(edge.src, type_id, edge.dst, edge.id),
                )?;
                self.env.edges_by_dst_type.delete(
                    &mut wtxn,
                    &keys::adjacency_key(edge.dst, type_id, edge.src, edge.id),
                )?;
            }
        }

        self.env.edges_by_id.delete(&mut wtxn, &keys::id_key(edge_id))?;
        self.delete_prefix(&mut wtxn, self.env.edge_props, &keys::id_key(edge_id))?;

        wtxn.commit()?;
        debug!(edge = edge_id, "edge deleted");
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub fn get_node(&self, id: NodeId) -> Result<NodeHeader, StoreError> {
        let rtxn = self.env.read_txn()?;
        let raw = self
            .env
            .nodes
            .get(&rtxn, &keys::id_key(id))?
            .ok_or(StoreError::NodeNotFound(id))?;
        codec::decode_node_header(raw)
    }

    /// Node properties. With an empty key list, returns all hot
    /// properties (header order) followed by all cold properties in
    /// key-id order. With keys, the header is consulted first per key,
    /// then the cold row; absent keys are skipped.
    pub fn get_node_props(
        &self,
        id: NodeId,
        key_ids: &[SymbolId],
    ) -> Result<Vec<Property>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let raw = self
            .env
            .nodes
            .get(&rtxn, &keys::id_key(id))?
            .ok_or(StoreError::NodeNotFound(id))?;
        let header = codec::decode_node_header(raw)?;

        let mut props = Vec::new();
        if key_ids.is_empty() {
            props.extend(header.hot_props.iter().cloned());
            for row in scan::table_rows(self.env.node_cold_props, &rtxn, &keys::id_key(id))? {
                let (key, value) = row?;
                let (_, key_id) = keys::split_sub_key(key)?;
                props.push(Property::new(key_id, codec::decode_value_all(value)?));
            }
        } else {
            for key_id in key_ids {
                if let Some(p) = header.hot_props.iter().find(|p| p.key_id == *key_id) {
                    props.push(p.clone());
                    continue;
                }
                if let Some(value) =
                    self.env.node_cold_props.get(&rtxn, &keys::sub_key(id, *key_id))?
                {
                    props.push(Property::new(*key_id, codec::decode_value_all(value)?));
                }
            }
        }
        Ok(props)
    }

    /// Vectors attached to a node. With an empty tag list, returns all
    /// of them in tag-id order; with tags, absent attachments are
    /// skipped. `dim` is filled from the tag's registered dimension.
    pub fn get_vectors(
        &self,
        id: NodeId,
        tag_ids: &[SymbolId],
    ) -> Result<Vec<TaggedVector>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut vectors = Vec::new();

        if tag_ids.is_empty() {
            for row in scan::table_rows(self.env.node_vectors, &rtxn, &keys::id_key(id))? {
                let (key, value) = row?;
                let (_, tag_id) = keys::split_sub_key(key)?;
                let dim = self
                    .env
                    .vec_tag_meta
                    .get(&rtxn, &keys::symbol_key(tag_id))?
                    .unwrap_or(0);
                vectors.push(TaggedVector { tag_id, dim, bytes: value.to_vec() });
            }
        } else {
            for tag_id in tag_ids {
                if let Some(value) =
                    self.env.node_vectors.get(&rtxn, &keys::sub_key(id, *tag_id))?
                {
                    let dim = self
                        .env
                        .vec_tag_meta
                        .get(&rtxn, &keys::symbol_key(*tag_id))?
                        .unwrap_or(0);
                    vectors.push(TaggedVector { tag_id: *tag_id, dim, bytes: value.to_vec() });
                }
            }
        }
        Ok(vectors)
    }

    pub fn get_edge(&self, edge_id: EdgeId) -> Result<EdgeRef, StoreError> {
        let rtxn = self.env.read_txn()?;
        let raw = self
            .env
            .edges_by_id
            .get(&rtxn, &keys::id_key(edge_id))?
            .ok_or(StoreError::EdgeNotFound(edge_id))?;
        codec::decode_edge_ref(raw)
    }

    /// Resolve an edge's type id by scanning the src adjacency index
    /// for the unique row carrying this edge.
    pub fn edge_type_id(&self, edge: &EdgeRef) -> Result<SymbolId, StoreError> {
        let rtxn = self.env.read_txn()?;
        self.find_type_id(&rtxn, edge)?
            .ok_or(StoreError::EdgeNotFound(edge.id))
    }

    /// Edge properties; same key-list semantics as [`Self::get_node_props`],
    /// minus a hot tier (all edge properties live in their own rows).
    pub fn get_edge_props(
        &self,
        edge_id: EdgeId,
        key_ids: &[SymbolId],
    ) -> Result<Vec<Property>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut props = Vec::new();

        if key_ids.is_empty() {
            for row in scan::table_rows(self.env.edge_props, &rtxn, &keys::id_key(edge_id))? {
                let (key, value) = row?;
                let (_, key_id) = keys::split_sub_key(key)?;
                props.push(Property::new(key_id, codec::decode_value_all(value)?));
            }
        } else {
            for key_id in key_ids {
                if let Some(value) =
                    self.env.edge_props.get(&rtxn, &keys::sub_key(edge_id, *key_id))?
                {
                    props.push(Property::new(*key_id, codec::decode_value_all(value)?));
                }
            }
        }
        Ok(props)
    }

    // ── Traversal ────────────────────────────────────────────────────────

    /// List a node's adjacency rows.
    ///
    /// Rows come back in `(type_id, neighbor, edge_id)` order within a
    /// direction. For `Both`, Out is scanned first up to `limit`, then
    /// In with the remaining budget; rows are not deduped across
    /// directions.
    pub fn list_adjacency(
        &self,
        node: NodeId,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<Adjacency>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut items = Vec::new();

        if matches!(direction, Direction::Out | Direction::Both) {
            for key in
                scan::index_rows(self.env.edges_by_src_type, &rtxn, &keys::id_key(node))?
            {
                if items.len() >= limit {
                    break;
                }
                let (_, type_id, neighbor_id, edge_id) = keys::split_adjacency_key(key?)?;
                items.push(Adjacency {
                    neighbor_id,
                    edge_id,
                    type_id,
                    direction: Direction::Out,
                });
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            for key in
                scan::index_rows(self.env.edges_by_dst_type, &rtxn, &keys::id_key(node))?
            {
                if items.len() >= limit {
                    break;
                }
                let (_, type_id, neighbor_id, edge_id) = keys::split_adjacency_key(key?)?;
                items.push(Adjacency {
                    neighbor_id,
                    edge_id,
                    type_id,
                    direction: Direction::In,
                });
            }
        }
        Ok(items)
    }

    /// Neighbor node ids with optional relationship-type and label
    /// filters. The label filter keeps neighbors whose header carries
    /// every requested label. `Both` dedups across directions;
    /// single-direction listings do not.
    pub fn neighbors(
        &self,
        node: NodeId,
        direction: Direction,
        rel_type_in: &[SymbolId],
        neighbor_labels: &[SymbolId],
        limit: usize,
    ) -> Result<Vec<NodeId>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut need = neighbor_labels.to_vec();
        sort_unique(&mut need);

        let mut out = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();

        let mut scan_dir = |outgoing: bool, out: &mut Vec<NodeId>| -> Result<(), StoreError> {
            let db = if outgoing {
                self.env.edges_by_src_type
            } else {
                self.env.edges_by_dst_type
            };
            for key in scan::index_rows(db, &rtxn, &keys::id_key(node))? {
                if out.len() >= limit {
                    break;
                }
                let (_, type_id, other, _) = keys::split_adjacency_key(key?)?;
                if !rel_type_in.is_empty() && !rel_type_in.contains(&type_id) {
                    continue;
                }
                if !need.is_empty() {
                    // a neighbor with no header cannot match
                    let Some(raw) = self.env.nodes.get(&rtxn, &keys::id_key(other))? else {
                        continue;
                    };
                    let header = codec::decode_node_header(raw)?;
                    if !contains_all(&header.labels, &need) {
                        continue;
                    }
                }
                if direction == Direction::Both {
                    if seen.insert(other) {
                        out.push(other);
                    }
                } else {
                    out.push(other);
                }
            }
            Ok(())
        };

        if matches!(direction, Direction::Out | Direction::Both) {
            scan_dir(true, &mut out)?;
        }
        if out.len() < limit && matches!(direction, Direction::In | Direction::Both) {
            scan_dir(false, &mut out)?;
        }
        Ok(out)
    }

    /// Count adjacency rows without materializing them.
    pub fn degree(&self, node: NodeId, direction: Direction) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut count = 0u64;
        if matches!(direction, Direction::Out | Direction::Both) {
            for key in
                scan::index_rows(self.env.edges_by_src_type, &rtxn, &keys::id_key(node))?
            {
                key?;
                count += 1;
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            for key in
                scan::index_rows(self.env.edges_by_dst_type, &rtxn, &keys::id_key(node))?
            {
                key?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Node ids carrying a label, ascending, up to `limit`.
    pub fn scan_nodes_by_label(
        &self,
        label_id: SymbolId,
        limit: usize,
    ) -> Result<Vec<NodeId>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut ids = Vec::new();
        for key in scan::index_rows(self.env.label_index, &rtxn, &keys::symbol_key(label_id))? {
            if ids.len() >= limit {
                break;
            }
            let (_, node_id) = keys::split_label_index_key(key?)?;
            ids.push(node_id);
        }
        Ok(ids)
    }

    /// Total live nodes.
    pub fn node_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.env.nodes.len(&rtxn)?)
    }

    /// Total live edges.
    pub fn edge_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.env.edges_by_id.len(&rtxn)?)
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn load_header(&self, wtxn: &RwTxn, id: NodeId) -> Result<NodeHeader, StoreError> {
        let raw = self
            .env
            .nodes
            .get(wtxn, &keys::id_key(id))?
            .ok_or(StoreError::NodeNotFound(id))?;
        codec::decode_node_header(raw)
    }

    /// Collect `(type_id, other, edge_id)` adjacency rows for one
    /// direction into owned tuples, so callers can mutate afterwards.
    fn collect_adjacency(
        &self,
        txn: &RwTxn,
        direction: Direction,
        node: NodeId,
    ) -> Result<Vec<(SymbolId, NodeId, EdgeId)>, StoreError> {
        let db = match direction {
            Direction::Out => self.env.edges_by_src_type,
            Direction::In => self.env.edges_by_dst_type,
            Direction::Both => unreachable!("collect_adjacency is per-direction"),
        };
        let mut rows = Vec::new();
        for key in scan::index_rows(db, txn, &keys::id_key(node))? {
            let (_, type_id, other, edge_id) = keys::split_adjacency_key(key?)?;
            rows.push((type_id, other, edge_id));
        }
        Ok(rows)
    }

    /// Delete every row of `db` whose key starts with `prefix`.
    fn delete_prefix(
        &self,
        wtxn: &mut RwTxn,
        db: heed::Database<heed::types::Bytes, heed::types::Bytes>,
        prefix: &[u8],
    ) -> Result<(), StoreError> {
        let doomed = scan::collect_keys(db, wtxn, prefix)?;
        for key in doomed {
            db.delete(wtxn, &key)?;
        }
        Ok(())
    }

    /// Find the src-index row carrying this edge; `None` when the
    /// adjacency rows are already gone.
    fn find_type_id(
        &self,
        txn: &heed::RoTxn,
        edge: &EdgeRef,
    ) -> Result<Option<SymbolId>, StoreError> {
        for key in scan::index_rows(self.env.edges_by_src_type, txn, &keys::id_key(edge.src))? {
            let (_, type_id, dst, id) = keys::split_adjacency_key(key?)?;
            if dst == edge.dst && id == edge.id {
                return Ok(Some(type_id));
            }
        }
        Ok(None)
    }
}
