//! HTTP surface: JSON REST mirror of the store API.
//!
//! Byte payloads (property bytes, vector data, KNN queries) travel as
//! base64 strings; everything else is plain JSON. Dictionary names are
//! resolved exactly like the gRPC surface: writes intern, reads resolve
//! without creating.
//!
//! Endpoints:
//!   GET    /api/health                    → liveness probe
//!   GET    /api/stats                     → node/edge counts + schema version
//!   POST   /api/node                      → create node
//!   GET    /api/node/:id                  → node header
//!   DELETE /api/node/:id                  → cascade delete
//!   GET    /api/nodeProps?id=&keys=a,b    → node properties
//!   POST   /api/upsertNodeProps           → patch node properties
//!   POST   /api/setNodeLabels             → add/remove labels
//!   GET    /api/vectors?id=&tags=a,b      → vectors of a node
//!   POST   /api/upsertVector              → attach/overwrite one vector
//!   POST   /api/deleteVector              → detach one vector
//!   POST   /api/edge                      → add edge
//!   GET    /api/edge/:id                  → edge ref + type
//!   DELETE /api/edge/:id                  → delete edge
//!   GET    /api/edgeProps?id=&keys=       → edge properties
//!   POST   /api/updateEdgeProps           → patch edge properties
//!   GET    /api/adjacency?node=&direction=&limit=
//!   GET    /api/neighbors?node=&direction=&types=&labels=&limit=
//!   GET    /api/labelScan?label=&limit=
//!   GET    /api/degree?node=&direction=
//!   GET    /api/knn?tag=&k=&query=<base64>
//!   POST   /api/batch                     → write batch

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use lodestone_graph::{
    BatchOp, BatchOutcome, Direction, NewEdge, NewNode, Property, Store, StoreError,
    TaggedVector, Value,
};

type AppState = Arc<Store>;

/// Serve the REST surface until the process exits.
pub async fn serve(store: Arc<Store>, addr: SocketAddr) {
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/node", post(create_node))
        .route("/api/node/:id", get(get_node).delete(delete_node))
        .route("/api/nodeProps", get(get_node_props))
        .route("/api/upsertNodeProps", post(upsert_node_props))
        .route("/api/setNodeLabels", post(set_node_labels))
        .route("/api/vectors", get(get_vectors))
        .route("/api/upsertVector", post(upsert_vector))
        .route("/api/deleteVector", post(delete_vector))
        .route("/api/edge", post(add_edge))
        .route("/api/edge/:id", get(get_edge).delete(delete_edge))
        .route("/api/edgeProps", get(get_edge_props))
        .route("/api/updateEdgeProps", post(update_edge_props))
        .route("/api/adjacency", get(adjacency))
        .route("/api/neighbors", get(neighbors))
        .route("/api/labelScan", get(label_scan))
        .route("/api/degree", get(degree))
        .route("/api/knn", get(knn))
        .route("/api/batch", post(write_batch))
        .layer(CorsLayer::permissive())
        .with_state(store);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "http listener failed to bind");
            return;
        }
    };
    info!(%addr, "http listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "http server exited");
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let code = match &e {
            _ if e.is_not_found() => StatusCode::NOT_FOUND,
            StoreError::DimMismatch { .. } | StoreError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(code, e.to_string())
    }
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    ApiError(StatusCode::BAD_REQUEST, msg.into())
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Wire types ───────────────────────────────────────────────────────────────

/// Property value over JSON. Bytes are base64.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
enum JsonValue {
    I64(i64),
    F64(f64),
    Bool(bool),
    Text(String),
    Bytes(String),
    Null,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonProp {
    key: String,
    value: JsonValue,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonVector {
    tag: String,
    #[serde(default)]
    dim: u32,
    /// base64 little-endian float32 payload
    data: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct CreateNodeBody {
    labels: Vec<String>,
    hot_props: Vec<JsonProp>,
    cold_props: Vec<JsonProp>,
    vectors: Vec<JsonVector>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeBody {
    id: u64,
    labels: Vec<String>,
    hot_props: Vec<JsonProp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertNodePropsBody {
    id: u64,
    #[serde(default)]
    set_hot: Vec<JsonProp>,
    #[serde(default)]
    set_cold: Vec<JsonProp>,
    #[serde(default)]
    unset_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetNodeLabelsBody {
    id: u64,
    #[serde(default)]
    add: Vec<String>,
    #[serde(default)]
    remove: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertVectorBody {
    id: u64,
    #[serde(flatten)]
    vector: JsonVector,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteVectorBody {
    id: u64,
    tag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddEdgeBody {
    src: u64,
    dst: u64,
    #[serde(rename = "type")]
    edge_type: String,
    #[serde(default)]
    props: Vec<JsonProp>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeBody {
    id: u64,
    src: u64,
    dst: u64,
    #[serde(rename = "type")]
    edge_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEdgePropsBody {
    edge_id: u64,
    #[serde(default)]
    set: Vec<JsonProp>,
    #[serde(default)]
    unset_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::enum_variant_names)]
enum JsonBatchOp {
    CreateNode(CreateNodeBody),
    UpsertNodeProps(UpsertNodePropsBody),
    SetNodeLabels(SetNodeLabelsBody),
    UpsertVector(UpsertVectorBody),
    DeleteVector(DeleteVectorBody),
    AddEdge(AddEdgeBody),
    UpdateEdgeProps(UpdateEdgePropsBody),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum JsonBatchOutcome {
    Node(NodeBody),
    Edge { id: u64, src: u64, dst: u64 },
    Done,
}

// ── Marshalling ──────────────────────────────────────────────────────────────

fn decode_b64(data: &str, what: &str) -> Result<Vec<u8>, ApiError> {
    BASE64
        .decode(data)
        .map_err(|e| bad_request(format!("{what} is not valid base64: {e}")))
}

fn value_to_core(store: &Store, v: JsonValue) -> Result<Value, ApiError> {
    Ok(match v {
        JsonValue::I64(x) => Value::I64(x),
        JsonValue::F64(x) => Value::F64(x),
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Text(s) => Value::TextId(store.text_id(&s, true)?),
        JsonValue::Bytes(b64) => Value::Bytes(decode_b64(&b64, "bytes value")?),
        JsonValue::Null => Value::Null,
    })
}

fn value_to_json(store: &Store, v: Value) -> Result<JsonValue, ApiError> {
    Ok(match v {
        Value::I64(x) => JsonValue::I64(x),
        Value::F64(x) => JsonValue::F64(x),
        Value::Bool(b) => JsonValue::Bool(b),
        Value::TextId(id) => JsonValue::Text(store.text_name(id)?),
        Value::Bytes(bytes) => JsonValue::Bytes(BASE64.encode(bytes)),
        Value::Null => JsonValue::Null,
    })
}

fn props_to_core(store: &Store, props: Vec<JsonProp>) -> Result<Vec<Property>, ApiError> {
    props
        .into_iter()
        .map(|p| {
            if p.key.is_empty() {
                return Err(bad_request("prop key must not be empty"));
            }
            let key_id = store.prop_key_id(&p.key, true)?;
            Ok(Property::new(key_id, value_to_core(store, p.value)?))
        })
        .collect()
}

fn props_to_json(store: &Store, props: Vec<Property>) -> Result<Vec<JsonProp>, ApiError> {
    props
        .into_iter()
        .map(|p| {
            Ok(JsonProp {
                key: store.prop_key_name(p.key_id)?,
                value: value_to_json(store, p.value)?,
            })
        })
        .collect()
}

/// Resolve names without interning; unknown names are dropped (they
/// cannot match any stored row).
fn known_ids(
    store: &Store,
    names: &[String],
    lookup: impl Fn(&str) -> Result<u32, StoreError>,
) -> Result<Vec<u32>, ApiError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        match lookup(name) {
            Ok(id) => ids.push(id),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(ids)
}

fn vector_to_core(store: &Store, v: JsonVector) -> Result<TaggedVector, ApiError> {
    if v.tag.is_empty() {
        return Err(bad_request("vector tag must not be empty"));
    }
    let bytes = decode_b64(&v.data, "vector data")?;
    let dim = if v.dim != 0 { Some(v.dim) } else { None };
    let tag_id = store.vec_tag_id(&v.tag, true, dim)?;
    Ok(TaggedVector { tag_id, dim: v.dim, bytes })
}

fn new_node_to_core(store: &Store, body: CreateNodeBody) -> Result<NewNode, ApiError> {
    let labels = body
        .labels
        .iter()
        .map(|name| store.label_id(name, true))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(NewNode {
        labels,
        hot_props: props_to_core(store, body.hot_props)?,
        cold_props: props_to_core(store, body.cold_props)?,
        vectors: body
            .vectors
            .into_iter()
            .map(|v| vector_to_core(store, v))
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn node_to_json(store: &Store, header: lodestone_graph::NodeHeader) -> Result<NodeBody, ApiError> {
    Ok(NodeBody {
        id: header.id,
        labels: header
            .labels
            .iter()
            .map(|id| store.label_name(*id))
            .collect::<Result<Vec<_>, _>>()?,
        hot_props: props_to_json(store, header.hot_props)?,
    })
}

fn parse_direction(raw: Option<&str>) -> Result<Direction, ApiError> {
    match raw.unwrap_or("out") {
        "out" | "Out" => Ok(Direction::Out),
        "in" | "In" => Ok(Direction::In),
        "both" | "Both" => Ok(Direction::Both),
        other => Err(bad_request(format!("unknown direction {other:?}"))),
    }
}

fn csv(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsBody {
    nodes: u64,
    edges: u64,
    schema_version: u32,
}

async fn stats(State(store): State<AppState>) -> ApiResult<StatsBody> {
    Ok(Json(StatsBody {
        nodes: store.node_count()?,
        edges: store.edge_count()?,
        schema_version: store.schema_version()?,
    }))
}

async fn create_node(
    State(store): State<AppState>,
    Json(body): Json<CreateNodeBody>,
) -> ApiResult<NodeBody> {
    let new = new_node_to_core(&store, body)?;
    let header = store.create_node(new)?;
    Ok(Json(node_to_json(&store, header)?))
}

async fn get_node(State(store): State<AppState>, Path(id): Path<u64>) -> ApiResult<NodeBody> {
    let header = store.get_node(id)?;
    Ok(Json(node_to_json(&store, header)?))
}

async fn delete_node(
    State(store): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<serde_json::Value> {
    store.delete_node(id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

#[derive(Deserialize)]
struct PropsQuery {
    id: u64,
    keys: Option<String>,
}

async fn get_node_props(
    State(store): State<AppState>,
    Query(q): Query<PropsQuery>,
) -> ApiResult<Vec<JsonProp>> {
    let names = csv(&q.keys);
    let keys = known_ids(&store, &names, |n| store.prop_key_id(n, false))?;
    if !names.is_empty() && keys.is_empty() {
        store.get_node(q.id)?;
        return Ok(Json(vec![]));
    }
    let props = store.get_node_props(q.id, &keys)?;
    Ok(Json(props_to_json(&store, props)?))
}

async fn upsert_node_props(
    State(store): State<AppState>,
    Json(body): Json<UpsertNodePropsBody>,
) -> ApiResult<serde_json::Value> {
    let set_hot = props_to_core(&store, body.set_hot)?;
    let set_cold = props_to_core(&store, body.set_cold)?;
    let unset = known_ids(&store, &body.unset_keys, |n| store.prop_key_id(n, false))?;
    store.upsert_node_props(body.id, &set_hot, &set_cold, &unset)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn set_node_labels(
    State(store): State<AppState>,
    Json(body): Json<SetNodeLabelsBody>,
) -> ApiResult<serde_json::Value> {
    let add = body
        .add
        .iter()
        .map(|name| store.label_id(name, true))
        .collect::<Result<Vec<_>, _>>()?;
    let remove = known_ids(&store, &body.remove, |n| store.label_id(n, false))?;
    store.set_node_labels(body.id, &add, &remove)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

#[derive(Deserialize)]
struct VectorsQuery {
    id: u64,
    tags: Option<String>,
}

async fn get_vectors(
    State(store): State<AppState>,
    Query(q): Query<VectorsQuery>,
) -> ApiResult<Vec<JsonVector>> {
    let names = csv(&q.tags);
    let tags = known_ids(&store, &names, |n| store.vec_tag_id(n, false, None))?;
    if !names.is_empty() && tags.is_empty() {
        return Ok(Json(vec![]));
    }
    let vectors = store.get_vectors(q.id, &tags)?;
    let vectors = vectors
        .into_iter()
        .map(|v| {
            Ok(JsonVector {
                tag: store.vec_tag_name(v.tag_id)?,
                dim: v.dim,
                data: BASE64.encode(v.bytes),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    Ok(Json(vectors))
}

async fn upsert_vector(
    State(store): State<AppState>,
    Json(body): Json<UpsertVectorBody>,
) -> ApiResult<serde_json::Value> {
    let v = vector_to_core(&store, body.vector)?;
    store.upsert_vector(body.id, v.tag_id, v.dim, &v.bytes)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn delete_vector(
    State(store): State<AppState>,
    Json(body): Json<DeleteVectorBody>,
) -> ApiResult<serde_json::Value> {
    match store.vec_tag_id(&body.tag, false, None) {
        Ok(tag_id) => store.delete_vector(body.id, tag_id)?,
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn add_edge(
    State(store): State<AppState>,
    Json(body): Json<AddEdgeBody>,
) -> ApiResult<EdgeBody> {
    if body.edge_type.is_empty() {
        return Err(bad_request("edge type must not be empty"));
    }
    let type_id = store.rel_type_id(&body.edge_type, true)?;
    let props = props_to_core(&store, body.props)?;
    let edge = store.add_edge(NewEdge { src: body.src, dst: body.dst, type_id, props })?;
    Ok(Json(EdgeBody {
        id: edge.id,
        src: edge.src,
        dst: edge.dst,
        edge_type: body.edge_type,
    }))
}

async fn get_edge(State(store): State<AppState>, Path(id): Path<u64>) -> ApiResult<EdgeBody> {
    let edge = store.get_edge(id)?;
    let type_id = store.edge_type_id(&edge)?;
    Ok(Json(EdgeBody {
        id: edge.id,
        src: edge.src,
        dst: edge.dst,
        edge_type: store.rel_type_name(type_id)?,
    }))
}

async fn delete_edge(
    State(store): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<serde_json::Value> {
    store.delete_edge(id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn get_edge_props(
    State(store): State<AppState>,
    Query(q): Query<PropsQuery>,
) -> ApiResult<Vec<JsonProp>> {
    let names = csv(&q.keys);
    let keys = known_ids(&store, &names, |n| store.prop_key_id(n, false))?;
    if !names.is_empty() && keys.is_empty() {
        return Ok(Json(vec![]));
    }
    let props = store.get_edge_props(q.id, &keys)?;
    Ok(Json(props_to_json(&store, props)?))
}

async fn update_edge_props(
    State(store): State<AppState>,
    Json(body): Json<UpdateEdgePropsBody>,
) -> ApiResult<serde_json::Value> {
    let set = props_to_core(&store, body.set)?;
    let unset = known_ids(&store, &body.unset_keys, |n| store.prop_key_id(n, false))?;
    store.update_edge_props(body.edge_id, &set, &unset)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

#[derive(Deserialize)]
struct AdjacencyQuery {
    node: u64,
    direction: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdjacencyRowBody {
    neighbor: u64,
    edge_id: u64,
    #[serde(rename = "type")]
    edge_type: String,
    direction: &'static str,
}

async fn adjacency(
    State(store): State<AppState>,
    Query(q): Query<AdjacencyQuery>,
) -> ApiResult<Vec<AdjacencyRowBody>> {
    let direction = parse_direction(q.direction.as_deref())?;
    let rows = store.list_adjacency(q.node, direction, q.limit.unwrap_or(usize::MAX))?;
    let rows = rows
        .into_iter()
        .map(|r| {
            Ok(AdjacencyRowBody {
                neighbor: r.neighbor_id,
                edge_id: r.edge_id,
                edge_type: store.rel_type_name(r.type_id)?,
                direction: match r.direction {
                    Direction::Out => "out",
                    Direction::In => "in",
                    Direction::Both => "both",
                },
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
struct NeighborsQuery {
    node: u64,
    direction: Option<String>,
    types: Option<String>,
    labels: Option<String>,
    limit: Option<usize>,
}

async fn neighbors(
    State(store): State<AppState>,
    Query(q): Query<NeighborsQuery>,
) -> ApiResult<Vec<u64>> {
    let direction = parse_direction(q.direction.as_deref())?;
    let type_names = csv(&q.types);
    let rel_types = known_ids(&store, &type_names, |n| store.rel_type_id(n, false))?;
    if !type_names.is_empty() && rel_types.is_empty() {
        return Ok(Json(vec![]));
    }
    let label_names = csv(&q.labels);
    let mut labels = Vec::with_capacity(label_names.len());
    for name in &label_names {
        match store.label_id(name, false) {
            Ok(id) => labels.push(id),
            Err(e) if e.is_not_found() => return Ok(Json(vec![])),
            Err(e) => return Err(e.into()),
        }
    }
    let nodes = store.neighbors(
        q.node,
        direction,
        &rel_types,
        &labels,
        q.limit.unwrap_or(usize::MAX),
    )?;
    Ok(Json(nodes))
}

#[derive(Deserialize)]
struct LabelScanQuery {
    label: String,
    limit: Option<usize>,
}

async fn label_scan(
    State(store): State<AppState>,
    Query(q): Query<LabelScanQuery>,
) -> ApiResult<Vec<u64>> {
    let nodes = match store.label_id(&q.label, false) {
        Ok(label_id) => store.scan_nodes_by_label(label_id, q.limit.unwrap_or(usize::MAX))?,
        Err(e) if e.is_not_found() => vec![],
        Err(e) => return Err(e.into()),
    };
    Ok(Json(nodes))
}

#[derive(Deserialize)]
struct DegreeQuery {
    node: u64,
    direction: Option<String>,
}

async fn degree(
    State(store): State<AppState>,
    Query(q): Query<DegreeQuery>,
) -> ApiResult<serde_json::Value> {
    let direction = parse_direction(q.direction.as_deref())?;
    let count = store.degree(q.node, direction)?;
    Ok(Json(serde_json::json!({ "count": count })))
}

#[derive(Deserialize)]
struct KnnQuery {
    tag: String,
    k: usize,
    query: String,
}

#[derive(Serialize)]
struct KnnHitBody {
    id: u64,
    score: f32,
}

async fn knn(
    State(store): State<AppState>,
    Query(q): Query<KnnQuery>,
) -> ApiResult<Vec<KnnHitBody>> {
    let query = decode_b64(&q.query, "query")?;
    let hits = match store.vec_tag_id(&q.tag, false, None) {
        Ok(tag_id) => store.knn(tag_id, &query, q.k)?,
        Err(e) if e.is_not_found() => vec![],
        Err(e) => return Err(e.into()),
    };
    Ok(Json(
        hits.into_iter()
            .map(|h| KnnHitBody { id: h.node_id, score: h.score })
            .collect(),
    ))
}

async fn write_batch(
    State(store): State<AppState>,
    Json(ops): Json<Vec<JsonBatchOp>>,
) -> ApiResult<Vec<JsonBatchOutcome>> {
    let mut core_ops = Vec::with_capacity(ops.len());
    for op in ops {
        core_ops.push(match op {
            JsonBatchOp::CreateNode(body) => BatchOp::CreateNode(new_node_to_core(&store, body)?),
            JsonBatchOp::UpsertNodeProps(body) => BatchOp::UpsertNodeProps {
                id: body.id,
                set_hot: props_to_core(&store, body.set_hot)?,
                set_cold: props_to_core(&store, body.set_cold)?,
                unset_keys: known_ids(&store, &body.unset_keys, |n| store.prop_key_id(n, false))?,
            },
            JsonBatchOp::SetNodeLabels(body) => BatchOp::SetNodeLabels {
                id: body.id,
                add: body
                    .add
                    .iter()
                    .map(|name| store.label_id(name, true))
                    .collect::<Result<Vec<_>, _>>()?,
                remove: known_ids(&store, &body.remove, |n| store.label_id(n, false))?,
            },
            JsonBatchOp::UpsertVector(body) => {
                let v = vector_to_core(&store, body.vector)?;
                BatchOp::UpsertVector {
                    id: body.id,
                    tag_id: v.tag_id,
                    declared_dim: v.dim,
                    bytes: v.bytes,
                }
            }
            JsonBatchOp::DeleteVector(body) => match store.vec_tag_id(&body.tag, false, None) {
                Ok(tag_id) => BatchOp::DeleteVector { id: body.id, tag_id },
                Err(e) if e.is_not_found() => BatchOp::DeleteVector { id: body.id, tag_id: 0 },
                Err(e) => return Err(e.into()),
            },
            JsonBatchOp::AddEdge(body) => {
                if body.edge_type.is_empty() {
                    return Err(bad_request("edge type must not be empty"));
                }
                let type_id = store.rel_type_id(&body.edge_type, true)?;
                BatchOp::AddEdge(NewEdge {
                    src: body.src,
                    dst: body.dst,
                    type_id,
                    props: props_to_core(&store, body.props)?,
                })
            }
            JsonBatchOp::UpdateEdgeProps(body) => BatchOp::UpdateEdgeProps {
                edge_id: body.edge_id,
                set: props_to_core(&store, body.set)?,
                unset_keys: known_ids(&store, &body.unset_keys, |n| store.prop_key_id(n, false))?,
            },
        });
    }

    let outcomes = store.write_batch(core_ops)?;
    let outcomes = outcomes
        .into_iter()
        .map(|o| {
            Ok(match o {
                BatchOutcome::Node(header) => JsonBatchOutcome::Node(node_to_json(&store, header)?),
                BatchOutcome::Edge(e) => {
                    JsonBatchOutcome::Edge { id: e.id, src: e.src, dst: e.dst }
                }
                BatchOutcome::Done => JsonBatchOutcome::Done,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    Ok(Json(outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_value_wire_shape() {
        let v = serde_json::to_value(JsonValue::I64(5)).unwrap();
        assert_eq!(v, serde_json::json!({ "i64": 5 }));
        let v = serde_json::to_value(JsonValue::Text("hi".into())).unwrap();
        assert_eq!(v, serde_json::json!({ "text": "hi" }));
        let v = serde_json::to_value(JsonValue::Null).unwrap();
        assert_eq!(v, serde_json::json!("null"));

        let parsed: JsonValue = serde_json::from_value(serde_json::json!({ "bool": true })).unwrap();
        assert_eq!(parsed, JsonValue::Bool(true));
    }

    #[test]
    fn csv_splits_and_trims() {
        assert_eq!(csv(&Some("a, b ,,c".into())), vec!["a", "b", "c"]);
        assert!(csv(&None).is_empty());
    }

    #[test]
    fn direction_parsing() {
        assert_eq!(parse_direction(Some("both")).unwrap(), Direction::Both);
        assert_eq!(parse_direction(None).unwrap(), Direction::Out);
        assert!(parse_direction(Some("sideways")).is_err());
    }
}
