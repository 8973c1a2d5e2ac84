//! Domain types for the graph store.
//!
//! Ids are issued from persistent meta sequences and never reused:
//! nodes and edges get `u64`, interned symbols (labels, relationship
//! types, property keys, vector tags, texts) get `u32`.

/// Node identifier.
pub type NodeId = u64;

/// Edge identifier.
pub type EdgeId = u64;

/// Interned symbol identifier (label / rel-type / prop-key / vec-tag / text).
pub type SymbolId = u32;

// ─────────────────────────────────────────────
// Value
// ─────────────────────────────────────────────

/// A property value. `TextId` references the text dictionary so repeated
/// strings are stored once; `Bytes` is an opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I64(i64),
    F64(f64),
    Bool(bool),
    TextId(SymbolId),
    Bytes(Vec<u8>),
    Null,
}

/// A keyed property value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key_id: SymbolId,
    pub value: Value,
}

impl Property {
    pub fn new(key_id: SymbolId, value: Value) -> Self {
        Self { key_id, value }
    }
}

// ─────────────────────────────────────────────
// Node / edge records
// ─────────────────────────────────────────────

/// The node record stored under the `nodes` table.
///
/// `labels` is sorted and duplicate-free at all times. `hot_props` are the
/// properties the writer chose to embed in the header; the rest live in
/// per-key cold rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHeader {
    pub id: NodeId,
    pub labels: Vec<SymbolId>,
    pub hot_props: Vec<Property>,
}

/// Canonical edge record: the 24-byte value stored under `edgesById`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef {
    pub id: EdgeId,
    pub src: NodeId,
    pub dst: NodeId,
}

/// A float32 vector attached to a node under a tag.
///
/// `bytes` is the little-endian float32 payload; its length is always
/// `4 × dim` for the tag's registered dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedVector {
    pub tag_id: SymbolId,
    pub dim: u32,
    pub bytes: Vec<u8>,
}

// ─────────────────────────────────────────────
// Traversal
// ─────────────────────────────────────────────

/// Edge direction relative to the queried node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
    Both,
}

/// One row of an adjacency listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacency {
    pub neighbor_id: NodeId,
    pub edge_id: EdgeId,
    pub type_id: SymbolId,
    pub direction: Direction,
}

/// One KNN hit; `score` is cosine similarity in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnnHit {
    pub node_id: NodeId,
    pub score: f32,
}

// ─────────────────────────────────────────────
// Write parameters
// ─────────────────────────────────────────────

/// Everything needed to create a node in one transaction.
#[derive(Debug, Clone, Default)]
pub struct NewNode {
    pub labels: Vec<SymbolId>,
    pub hot_props: Vec<Property>,
    pub cold_props: Vec<Property>,
    pub vectors: Vec<TaggedVector>,
}

/// Everything needed to create an edge in one transaction.
#[derive(Debug, Clone)]
pub struct NewEdge {
    pub src: NodeId,
    pub dst: NodeId,
    pub type_id: SymbolId,
    pub props: Vec<Property>,
}

/// Sort and deduplicate a symbol id list in place.
pub(crate) fn sort_unique(ids: &mut Vec<SymbolId>) {
    ids.sort_unstable();
    ids.dedup();
}

/// True when `have` (sorted) contains every id of `need` (sorted).
pub(crate) fn contains_all(have: &[SymbolId], need: &[SymbolId]) -> bool {
    let mut it = have.iter();
    need.iter().all(|n| it.any(|h| h == n))
}
