//! # lodestone-graph
//!
//! Embedded, single-node property-graph store with per-node typed vector
//! attachments and brute-force cosine KNN, persisted in one LMDB
//! environment.
//!
//! Core pieces:
//!
//! - [`model`]            — values, headers, edge refs, adjacency rows
//! - [`codec`]            — the big-endian binary record codec
//! - [`env::GraphEnv`]    — environment handle + the named tables
//! - [`dict::Dictionary`] — name ↔ `u32` interning (5 namespaces)
//! - [`store::Store`]     — CRUD, traversals, label scans, cascade delete
//! - [`batch::BatchOp`]   — multi-op writes in one transaction
//! - KNN                  — [`store::Store::knn`], size-k min-heap scan
//!
//! All multi-step writes run inside a single write transaction; an error
//! drops the transaction, which aborts it, so readers only ever observe
//! states where every secondary index agrees with its primary table.

pub mod batch;
pub mod codec;
pub mod dict;
pub mod env;
pub mod error;
mod keys;
mod knn;
pub mod model;
mod scan;
pub mod store;

pub use batch::{BatchOp, BatchOutcome};
pub use dict::{Dictionary, Namespace};
pub use env::GraphEnv;
pub use error::StoreError;
pub use model::{
    Adjacency, Direction, EdgeId, EdgeRef, KnnHit, NewEdge, NewNode, NodeHeader, NodeId,
    Property, SymbolId, TaggedVector, Value,
};
pub use store::Store;
