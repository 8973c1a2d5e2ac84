//! # lodestone-api
//!
//! gRPC surface for the lodestone graph store, one RPC per store
//! operation:
//!
//! | RPC group | Operations |
//! |-----------|------------|
//! | Node      | CreateNode / GetNode / GetNodeProps / UpsertNodeProps / SetNodeLabels / DeleteNode |
//! | Edge      | AddEdge / GetEdge / GetEdgeProps / UpdateEdgeProps / DeleteEdge |
//! | Vector    | UpsertVector / GetVectors / DeleteVector / Knn |
//! | Traversal | ListAdjacency / Neighbors / ScanNodesByLabel / Degree |
//! | Batch     | WriteBatch |
//! | Ops       | GetStats / HealthCheck |
//!
//! The service performs no domain logic beyond argument validation and
//! name ↔ id marshalling through the store's dictionaries.

// Generated protobuf / tonic code (compiled by build.rs)
#[allow(clippy::all)]
#[allow(clippy::pedantic)]
pub mod proto {
    pub mod lodestone {
        tonic::include_proto!("lodestone");
    }
}

/// Encoded protobuf file descriptor set, for reflection and client codegen.
pub const LODESTONE_DESCRIPTOR: &[u8] =
    tonic::include_file_descriptor_set!("lodestone_descriptor");

pub mod server;
pub mod validation;

pub use proto::lodestone as pb;
pub use server::GraphService;
