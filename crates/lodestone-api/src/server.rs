//! gRPC service implementation.
//!
//! [`GraphService`] wraps an [`Arc<Store>`] and translates request
//! messages to store calls: name resolution through the dictionaries,
//! byte payloads passed through untouched, no domain logic of its own.
//!
//! Error mapping: not-found family → `NOT_FOUND`, dimension and
//! argument failures → `INVALID_ARGUMENT`, everything the engine or
//! codec reports → `INTERNAL`.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::debug;

use lodestone_graph::{self as graph, Store, StoreError};

use crate::proto::lodestone as pb;
use crate::proto::lodestone::lodestone_server::Lodestone;
use crate::validation::{
    validate_batch_len, validate_k, validate_name, validate_vector_payload,
};

/// The service handle passed to the tonic router.
pub struct GraphService {
    store: Arc<Store>,
}

impl GraphService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Wrap into the generated tonic service.
    pub fn into_service(self) -> pb::lodestone_server::LodestoneServer<Self> {
        pb::lodestone_server::LodestoneServer::new(self)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn status_of(e: StoreError) -> Status {
    match &e {
        _ if e.is_not_found() => Status::not_found(e.to_string()),
        StoreError::DimMismatch { .. } | StoreError::InvalidArgument(_) => {
            Status::invalid_argument(e.to_string())
        }
        _ => Status::internal(e.to_string()),
    }
}

fn direction_to_core(raw: i32) -> Result<graph::Direction, Status> {
    match pb::Direction::try_from(raw) {
        Ok(pb::Direction::Out) => Ok(graph::Direction::Out),
        Ok(pb::Direction::In) => Ok(graph::Direction::In),
        Ok(pb::Direction::Both) => Ok(graph::Direction::Both),
        Err(_) => Err(Status::invalid_argument(format!("unknown direction {raw}"))),
    }
}

fn direction_to_pb(d: graph::Direction) -> i32 {
    match d {
        graph::Direction::Out => pb::Direction::Out as i32,
        graph::Direction::In => pb::Direction::In as i32,
        graph::Direction::Both => pb::Direction::Both as i32,
    }
}

fn value_to_core(store: &Store, v: pb::Value) -> Result<graph::Value, Status> {
    use pb::value::Kind;
    match v.kind {
        Some(Kind::I64(x)) => Ok(graph::Value::I64(x)),
        Some(Kind::F64(x)) => Ok(graph::Value::F64(x)),
        Some(Kind::Boolean(b)) => Ok(graph::Value::Bool(b)),
        Some(Kind::Text(s)) => {
            validate_name(&s, "value.text")?;
            let id = store.text_id(&s, true).map_err(status_of)?;
            Ok(graph::Value::TextId(id))
        }
        Some(Kind::Raw(bytes)) => Ok(graph::Value::Bytes(bytes)),
        Some(Kind::Null(_)) => Ok(graph::Value::Null),
        None => Err(Status::invalid_argument("value kind missing")),
    }
}

fn value_to_pb(store: &Store, v: graph::Value) -> Result<pb::Value, Status> {
    use pb::value::Kind;
    let kind = match v {
        graph::Value::I64(x) => Kind::I64(x),
        graph::Value::F64(x) => Kind::F64(x),
        graph::Value::Bool(b) => Kind::Boolean(b),
        graph::Value::TextId(id) => Kind::Text(store.text_name(id).map_err(status_of)?),
        graph::Value::Bytes(bytes) => Kind::Raw(bytes),
        graph::Value::Null => Kind::Null(true),
    };
    Ok(pb::Value { kind: Some(kind) })
}

fn props_to_core(store: &Store, props: Vec<pb::Prop>) -> Result<Vec<graph::Property>, Status> {
    props
        .into_iter()
        .map(|p| {
            validate_name(&p.key, "prop.key")?;
            let key_id = store.prop_key_id(&p.key, true).map_err(status_of)?;
            let value = p
                .value
                .ok_or_else(|| Status::invalid_argument("prop.value missing"))?;
            Ok(graph::Property::new(key_id, value_to_core(store, value)?))
        })
        .collect()
}

fn props_to_pb(store: &Store, props: Vec<graph::Property>) -> Result<Vec<pb::Prop>, Status> {
    props
        .into_iter()
        .map(|p| {
            Ok(pb::Prop {
                key: store.prop_key_name(p.key_id).map_err(status_of)?,
                value: Some(value_to_pb(store, p.value)?),
            })
        })
        .collect()
}

/// Resolve prop-key names without creating them; names never interned
/// cannot match any stored property and are dropped.
fn known_prop_keys(store: &Store, names: &[String]) -> Result<Vec<u32>, Status> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        validate_name(name, "key")?;
        match store.prop_key_id(name, false) {
            Ok(id) => ids.push(id),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(status_of(e)),
        }
    }
    Ok(ids)
}

fn vector_to_core(store: &Store, v: pb::Vector) -> Result<graph::TaggedVector, Status> {
    validate_name(&v.tag, "vector.tag")?;
    validate_vector_payload(&v.data, "vector.data")?;
    let dim = if v.dim != 0 { Some(v.dim) } else { None };
    let tag_id = store.vec_tag_id(&v.tag, true, dim).map_err(status_of)?;
    Ok(graph::TaggedVector { tag_id, dim: v.dim, bytes: v.data })
}

fn node_reply(store: &Store, header: graph::NodeHeader) -> Result<pb::NodeReply, Status> {
    let labels = header
        .labels
        .iter()
        .map(|id| store.label_name(*id).map_err(status_of))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(pb::NodeReply {
        id: header.id,
        labels,
        hot_props: props_to_pb(store, header.hot_props)?,
    })
}

fn batch_op_to_core(store: &Store, op: pb::BatchOp) -> Result<graph::BatchOp, Status> {
    use pb::batch_op::Op;
    let op = op
        .op
        .ok_or_else(|| Status::invalid_argument("batch op missing"))?;
    Ok(match op {
        Op::CreateNode(req) => graph::BatchOp::CreateNode(new_node_to_core(store, req)?),
        Op::UpsertNodeProps(req) => graph::BatchOp::UpsertNodeProps {
            id: req.id,
            set_hot: props_to_core(store, req.set_hot)?,
            set_cold: props_to_core(store, req.set_cold)?,
            unset_keys: known_prop_keys(store, &req.unset_keys)?,
        },
        Op::SetNodeLabels(req) => {
            let add = intern_labels(store, &req.add)?;
            let remove = known_labels(store, &req.remove)?;
            graph::BatchOp::SetNodeLabels { id: req.id, add, remove }
        }
        Op::UpsertVector(req) => {
            let v = req
                .vector
                .ok_or_else(|| Status::invalid_argument("vector missing"))?;
            let v = vector_to_core(store, v)?;
            graph::BatchOp::UpsertVector {
                id: req.id,
                tag_id: v.tag_id,
                declared_dim: v.dim,
                bytes: v.bytes,
            }
        }
        Op::DeleteVector(req) => {
            validate_name(&req.tag, "tag")?;
            match store.vec_tag_id(&req.tag, false, None) {
                Ok(tag_id) => graph::BatchOp::DeleteVector { id: req.id, tag_id },
                // an unknown tag means there is nothing to delete
                Err(e) if e.is_not_found() => {
                    graph::BatchOp::DeleteVector { id: req.id, tag_id: 0 }
                }
                Err(e) => return Err(status_of(e)),
            }
        }
        Op::AddEdge(req) => {
            validate_name(&req.r#type, "type")?;
            let type_id = store.rel_type_id(&req.r#type, true).map_err(status_of)?;
            graph::BatchOp::AddEdge(graph::NewEdge {
                src: req.src,
                dst: req.dst,
                type_id,
                props: props_to_core(store, req.props)?,
            })
        }
        Op::UpdateEdgeProps(req) => graph::BatchOp::UpdateEdgeProps {
            edge_id: req.edge_id,
            set: props_to_core(store, req.set)?,
            unset_keys: known_prop_keys(store, &req.unset_keys)?,
        },
    })
}

fn new_node_to_core(store: &Store, req: pb::CreateNodeRequest) -> Result<graph::NewNode, Status> {
    Ok(graph::NewNode {
        labels: intern_labels(store, &req.labels)?,
        hot_props: props_to_core(store, req.hot_props)?,
        cold_props: props_to_core(store, req.cold_props)?,
        vectors: req
            .vectors
            .into_iter()
            .map(|v| vector_to_core(store, v))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn intern_labels(store: &Store, names: &[String]) -> Result<Vec<u32>, Status> {
    names
        .iter()
        .map(|name| {
            validate_name(name, "label")?;
            store.label_id(name, true).map_err(status_of)
        })
        .collect()
}

/// Resolve label names without creating; unknown labels are dropped
/// (nothing can carry them).
fn known_labels(store: &Store, names: &[String]) -> Result<Vec<u32>, Status> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        validate_name(name, "label")?;
        match store.label_id(name, false) {
            Ok(id) => ids.push(id),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(status_of(e)),
        }
    }
    Ok(ids)
}

// ── Service ──────────────────────────────────────────────────────────────────

#[tonic::async_trait]
impl Lodestone for GraphService {
    async fn create_node(
        &self,
        request: Request<pb::CreateNodeRequest>,
    ) -> Result<Response<pb::NodeReply>, Status> {
        let req = request.into_inner();
        let new = new_node_to_core(&self.store, req)?;
        let header = self.store.create_node(new).map_err(status_of)?;
        debug!(node = header.id, "rpc create_node");
        Ok(Response::new(node_reply(&self.store, header)?))
    }

    async fn upsert_node_props(
        &self,
        request: Request<pb::UpsertNodePropsRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        let set_hot = props_to_core(&self.store, req.set_hot)?;
        let set_cold = props_to_core(&self.store, req.set_cold)?;
        let unset = known_prop_keys(&self.store, &req.unset_keys)?;
        self.store
            .upsert_node_props(req.id, &set_hot, &set_cold, &unset)
            .map_err(status_of)?;
        Ok(Response::new(pb::Empty {}))
    }

    async fn set_node_labels(
        &self,
        request: Request<pb::SetNodeLabelsRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        let add = intern_labels(&self.store, &req.add)?;
        let remove = known_labels(&self.store, &req.remove)?;
        self.store
            .set_node_labels(req.id, &add, &remove)
            .map_err(status_of)?;
        Ok(Response::new(pb::Empty {}))
    }

    async fn upsert_vector(
        &self,
        request: Request<pb::UpsertVectorRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        let v = req
            .vector
            .ok_or_else(|| Status::invalid_argument("vector missing"))?;
        let v = vector_to_core(&self.store, v)?;
        self.store
            .upsert_vector(req.id, v.tag_id, v.dim, &v.bytes)
            .map_err(status_of)?;
        Ok(Response::new(pb::Empty {}))
    }

    async fn delete_vector(
        &self,
        request: Request<pb::DeleteVectorRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        validate_name(&req.tag, "tag")?;
        match self.store.vec_tag_id(&req.tag, false, None) {
            Ok(tag_id) => {
                self.store.delete_vector(req.id, tag_id).map_err(status_of)?;
            }
            // unknown tag: nothing to delete, and deletes are tolerant
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(status_of(e)),
        }
        Ok(Response::new(pb::Empty {}))
    }

    async fn add_edge(
        &self,
        request: Request<pb::AddEdgeRequest>,
    ) -> Result<Response<pb::EdgeReply>, Status> {
        let req = request.into_inner();
        validate_name(&req.r#type, "type")?;
        let type_id = self
            .store
            .rel_type_id(&req.r#type, true)
            .map_err(status_of)?;
        let props = props_to_core(&self.store, req.props)?;
        let edge = self
            .store
            .add_edge(graph::NewEdge { src: req.src, dst: req.dst, type_id, props })
            .map_err(status_of)?;
        debug!(edge = edge.id, "rpc add_edge");
        Ok(Response::new(pb::EdgeReply {
            id: edge.id,
            src: edge.src,
            dst: edge.dst,
            r#type: req.r#type,
        }))
    }

    async fn update_edge_props(
        &self,
        request: Request<pb::UpdateEdgePropsRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        let set = props_to_core(&self.store, req.set)?;
        let unset = known_prop_keys(&self.store, &req.unset_keys)?;
        self.store
            .update_edge_props(req.edge_id, &set, &unset)
            .map_err(status_of)?;
        Ok(Response::new(pb::Empty {}))
    }

    async fn write_batch(
        &self,
        request: Request<pb::WriteBatchRequest>,
    ) -> Result<Response<pb::WriteBatchReply>, Status> {
        let req = request.into_inner();
        validate_batch_len(req.ops.len())?;
        let ops = req
            .ops
            .into_iter()
            .map(|op| batch_op_to_core(&self.store, op))
            .collect::<Result<Vec<_>, _>>()?;
        let outcomes = self.store.write_batch(ops).map_err(status_of)?;

        let mut replies = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let reply = match outcome {
                graph::BatchOutcome::Node(header) => {
                    pb::batch_outcome::Outcome::Node(node_reply(&self.store, header)?)
                }
                graph::BatchOutcome::Edge(edge) => {
                    let type_id = self.store.edge_type_id(&edge).map_err(status_of)?;
                    pb::batch_outcome::Outcome::Edge(pb::EdgeReply {
                        id: edge.id,
                        src: edge.src,
                        dst: edge.dst,
                        r#type: self.store.rel_type_name(type_id).map_err(status_of)?,
                    })
                }
                graph::BatchOutcome::Done => pb::batch_outcome::Outcome::Done(pb::Empty {}),
            };
            replies.push(pb::BatchOutcome { outcome: Some(reply) });
        }
        Ok(Response::new(pb::WriteBatchReply { outcomes: replies }))
    }

    async fn get_node(
        &self,
        request: Request<pb::GetNodeRequest>,
    ) -> Result<Response<pb::NodeReply>, Status> {
        let req = request.into_inner();
        let header = self.store.get_node(req.id).map_err(status_of)?;
        Ok(Response::new(node_reply(&self.store, header)?))
    }

    async fn get_node_props(
        &self,
        request: Request<pb::GetNodePropsRequest>,
    ) -> Result<Response<pb::PropsReply>, Status> {
        let req = request.into_inner();
        let keys = known_prop_keys(&self.store, &req.keys)?;
        if !req.keys.is_empty() && keys.is_empty() {
            // every requested key is unknown, but the node must still exist
            self.store.get_node(req.id).map_err(status_of)?;
            return Ok(Response::new(pb::PropsReply { props: vec![] }));
        }
        let props = self
            .store
            .get_node_props(req.id, &keys)
            .map_err(status_of)?;
        Ok(Response::new(pb::PropsReply {
            props: props_to_pb(&self.store, props)?,
        }))
    }

    async fn get_vectors(
        &self,
        request: Request<pb::GetVectorsRequest>,
    ) -> Result<Response<pb::VectorsReply>, Status> {
        let req = request.into_inner();
        let mut tags = Vec::with_capacity(req.tags.len());
        for name in &req.tags {
            validate_name(name, "tag")?;
            match self.store.vec_tag_id(name, false, None) {
                Ok(id) => tags.push(id),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(status_of(e)),
            }
        }
        if !req.tags.is_empty() && tags.is_empty() {
            return Ok(Response::new(pb::VectorsReply { vectors: vec![] }));
        }
        let vectors = self.store.get_vectors(req.id, &tags).map_err(status_of)?;
        let vectors = vectors
            .into_iter()
            .map(|v| {
                Ok(pb::Vector {
                    tag: self.store.vec_tag_name(v.tag_id).map_err(status_of)?,
                    dim: v.dim,
                    data: v.bytes,
                })
            })
            .collect::<Result<Vec<_>, Status>>()?;
        Ok(Response::new(pb::VectorsReply { vectors }))
    }

    async fn get_edge(
        &self,
        request: Request<pb::GetEdgeRequest>,
    ) -> Result<Response<pb::EdgeReply>, Status> {
        let req = request.into_inner();
        let edge = self.store.get_edge(req.edge_id).map_err(status_of)?;
        let type_id = self.store.edge_type_id(&edge).map_err(status_of)?;
        Ok(Response::new(pb::EdgeReply {
            id: edge.id,
            src: edge.src,
            dst: edge.dst,
            r#type: self.store.rel_type_name(type_id).map_err(status_of)?,
        }))
    }

    async fn get_edge_props(
        &self,
        request: Request<pb::GetEdgePropsRequest>,
    ) -> Result<Response<pb::PropsReply>, Status> {
        let req = request.into_inner();
        let keys = known_prop_keys(&self.store, &req.keys)?;
        if !req.keys.is_empty() && keys.is_empty() {
            return Ok(Response::new(pb::PropsReply { props: vec![] }));
        }
        let props = self
            .store
            .get_edge_props(req.edge_id, &keys)
            .map_err(status_of)?;
        Ok(Response::new(pb::PropsReply {
            props: props_to_pb(&self.store, props)?,
        }))
    }

    async fn list_adjacency(
        &self,
        request: Request<pb::ListAdjacencyRequest>,
    ) -> Result<Response<pb::AdjacencyReply>, Status> {
        let req = request.into_inner();
        let direction = direction_to_core(req.direction)?;
        let rows = self
            .store
            .list_adjacency(req.node, direction, req.limit as usize)
            .map_err(status_of)?;
        let rows = rows
            .into_iter()
            .map(|r| {
                Ok(pb::AdjacencyRow {
                    neighbor: r.neighbor_id,
                    edge_id: r.edge_id,
                    r#type: self.store.rel_type_name(r.type_id).map_err(status_of)?,
                    direction: direction_to_pb(r.direction),
                })
            })
            .collect::<Result<Vec<_>, Status>>()?;
        Ok(Response::new(pb::AdjacencyReply { rows }))
    }

    async fn neighbors(
        &self,
        request: Request<pb::NeighborsRequest>,
    ) -> Result<Response<pb::NodeIdsReply>, Status> {
        let req = request.into_inner();
        let direction = direction_to_core(req.direction)?;

        let mut rel_types = Vec::with_capacity(req.rel_types.len());
        for name in &req.rel_types {
            validate_name(name, "rel_type")?;
            match self.store.rel_type_id(name, false) {
                Ok(id) => rel_types.push(id),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(status_of(e)),
            }
        }
        // a filter of entirely unknown types can match nothing
        if !req.rel_types.is_empty() && rel_types.is_empty() {
            return Ok(Response::new(pb::NodeIdsReply { nodes: vec![] }));
        }

        let mut labels = Vec::with_capacity(req.neighbor_labels.len());
        for name in &req.neighbor_labels {
            validate_name(name, "neighbor_label")?;
            match self.store.label_id(name, false) {
                Ok(id) => labels.push(id),
                // an unknown label is carried by no node
                Err(e) if e.is_not_found() => {
                    return Ok(Response::new(pb::NodeIdsReply { nodes: vec![] }))
                }
                Err(e) => return Err(status_of(e)),
            }
        }

        let nodes = self
            .store
            .neighbors(req.node, direction, &rel_types, &labels, req.limit as usize)
            .map_err(status_of)?;
        Ok(Response::new(pb::NodeIdsReply { nodes }))
    }

    async fn scan_nodes_by_label(
        &self,
        request: Request<pb::ScanNodesByLabelRequest>,
    ) -> Result<Response<pb::NodeIdsReply>, Status> {
        let req = request.into_inner();
        validate_name(&req.label, "label")?;
        let nodes = match self.store.label_id(&req.label, false) {
            Ok(label_id) => self
                .store
                .scan_nodes_by_label(label_id, req.limit as usize)
                .map_err(status_of)?,
            Err(e) if e.is_not_found() => vec![],
            Err(e) => return Err(status_of(e)),
        };
        Ok(Response::new(pb::NodeIdsReply { nodes }))
    }

    async fn degree(
        &self,
        request: Request<pb::DegreeRequest>,
    ) -> Result<Response<pb::DegreeReply>, Status> {
        let req = request.into_inner();
        let direction = direction_to_core(req.direction)?;
        let count = self.store.degree(req.node, direction).map_err(status_of)?;
        Ok(Response::new(pb::DegreeReply { count }))
    }

    async fn knn(
        &self,
        request: Request<pb::KnnRequest>,
    ) -> Result<Response<pb::KnnReply>, Status> {
        let req = request.into_inner();
        validate_name(&req.tag, "tag")?;
        validate_k(req.k)?;
        validate_vector_payload(&req.query, "query")?;

        let hits = match self.store.vec_tag_id(&req.tag, false, None) {
            Ok(tag_id) => self
                .store
                .knn(tag_id, &req.query, req.k as usize)
                .map_err(status_of)?,
            // a tag nobody ever wrote has no vectors
            Err(e) if e.is_not_found() => vec![],
            Err(e) => return Err(status_of(e)),
        };
        Ok(Response::new(pb::KnnReply {
            hits: hits
                .into_iter()
                .map(|h| pb::KnnHit { id: h.node_id, score: h.score })
                .collect(),
        }))
    }

    async fn delete_node(
        &self,
        request: Request<pb::DeleteNodeRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        self.store.delete_node(req.id).map_err(status_of)?;
        Ok(Response::new(pb::Empty {}))
    }

    async fn delete_edge(
        &self,
        request: Request<pb::DeleteEdgeRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        self.store.delete_edge(req.edge_id).map_err(status_of)?;
        Ok(Response::new(pb::Empty {}))
    }

    async fn get_stats(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::StatsReply>, Status> {
        Ok(Response::new(pb::StatsReply {
            nodes: self.store.node_count().map_err(status_of)?,
            edges: self.store.edge_count().map_err(status_of)?,
            schema_version: self.store.schema_version().map_err(status_of)?,
        }))
    }

    async fn health_check(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::HealthReply>, Status> {
        Ok(Response::new(pb::HealthReply { status: "ok".into() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service() -> (GraphService, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(Store::open(dir.path()).unwrap());
        (GraphService::new(store), dir)
    }

    fn text_value(s: &str) -> pb::Value {
        pb::Value { kind: Some(pb::value::Kind::Text(s.into())) }
    }

    #[tokio::test]
    async fn create_get_delete_node() {
        let (svc, _dir) = service();
        let created = svc
            .create_node(Request::new(pb::CreateNodeRequest {
                labels: vec!["Person".into()],
                hot_props: vec![pb::Prop { key: "name".into(), value: Some(text_value("ada")) }],
                cold_props: vec![],
                vectors: vec![],
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(created.labels, vec!["Person"]);

        let fetched = svc
            .get_node(Request::new(pb::GetNodeRequest { id: created.id }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.hot_props[0].key, "name");
        assert_eq!(fetched.hot_props[0].value, Some(text_value("ada")));

        svc.delete_node(Request::new(pb::DeleteNodeRequest { id: created.id }))
            .await
            .unwrap();
        let err = svc
            .get_node(Request::new(pb::GetNodeRequest { id: created.id }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn add_edge_and_traverse() {
        let (svc, _dir) = service();
        let a = svc
            .create_node(Request::new(pb::CreateNodeRequest::default()))
            .await
            .unwrap()
            .into_inner()
            .id;
        let b = svc
            .create_node(Request::new(pb::CreateNodeRequest::default()))
            .await
            .unwrap()
            .into_inner()
            .id;
        let edge = svc
            .add_edge(Request::new(pb::AddEdgeRequest {
                src: a,
                dst: b,
                r#type: "rel".into(),
                props: vec![],
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(edge.r#type, "rel");

        let rows = svc
            .list_adjacency(Request::new(pb::ListAdjacencyRequest {
                node: a,
                direction: pb::Direction::Out as i32,
                limit: 16,
            }))
            .await
            .unwrap()
            .into_inner()
            .rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].neighbor, b);
        assert_eq!(rows[0].r#type, "rel");

        let degree = svc
            .degree(Request::new(pb::DegreeRequest {
                node: b,
                direction: pb::Direction::In as i32,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(degree.count, 1);
    }

    #[tokio::test]
    async fn knn_over_grpc() {
        let (svc, _dir) = service();
        for coords in [[1.0f32, 0.0], [0.0, 1.0]] {
            let id = svc
                .create_node(Request::new(pb::CreateNodeRequest::default()))
                .await
                .unwrap()
                .into_inner()
                .id;
            svc.upsert_vector(Request::new(pb::UpsertVectorRequest {
                id,
                vector: Some(pb::Vector {
                    tag: "emb".into(),
                    dim: 0,
                    data: lodestone_graph::codec::floats_to_bytes(&coords),
                }),
            }))
            .await
            .unwrap();
        }

        let hits = svc
            .knn(Request::new(pb::KnnRequest {
                tag: "emb".into(),
                query: lodestone_graph::codec::floats_to_bytes(&[1.0, 0.0]),
                k: 5,
            }))
            .await
            .unwrap()
            .into_inner()
            .hits;
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score > hits[1].score);

        // unknown tag is an empty result, not an error
        let hits = svc
            .knn(Request::new(pb::KnnRequest {
                tag: "nope".into(),
                query: vec![],
                k: 5,
            }))
            .await
            .unwrap()
            .into_inner()
            .hits;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn bad_arguments_are_invalid() {
        let (svc, _dir) = service();
        let id = svc
            .create_node(Request::new(pb::CreateNodeRequest::default()))
            .await
            .unwrap()
            .into_inner()
            .id;

        let err = svc
            .upsert_vector(Request::new(pb::UpsertVectorRequest {
                id,
                vector: Some(pb::Vector {
                    tag: "emb".into(),
                    dim: 0,
                    data: vec![0u8; 6],
                }),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);

        let err = svc
            .add_edge(Request::new(pb::AddEdgeRequest {
                src: 1,
                dst: 2,
                r#type: "".into(),
                props: vec![],
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn batch_roundtrip() {
        let (svc, _dir) = service();
        let reply = svc
            .write_batch(Request::new(pb::WriteBatchRequest {
                ops: vec![pb::BatchOp {
                    op: Some(pb::batch_op::Op::CreateNode(pb::CreateNodeRequest {
                        labels: vec!["Doc".into()],
                        ..Default::default()
                    })),
                }],
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(reply.outcomes.len(), 1);
        let Some(pb::batch_outcome::Outcome::Node(node)) = &reply.outcomes[0].outcome else {
            panic!("expected a node outcome");
        };
        assert_eq!(node.labels, vec!["Doc"]);
    }

    #[tokio::test]
    async fn stats_and_health() {
        let (svc, _dir) = service();
        svc.create_node(Request::new(pb::CreateNodeRequest::default()))
            .await
            .unwrap();
        let stats = svc
            .get_stats(Request::new(pb::Empty {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.edges, 0);
        assert_eq!(stats.schema_version, 1);

        let health = svc
            .health_check(Request::new(pb::Empty {}))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(health.status, "ok");
    }
}
