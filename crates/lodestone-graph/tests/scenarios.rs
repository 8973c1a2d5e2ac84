//! End-to-end scenarios against the public store API, driving the
//! dictionary by name the way the transports do.

use lodestone_graph::codec::floats_to_bytes;
use lodestone_graph::{
    BatchOp, Direction, NewEdge, NewNode, Property, Store, StoreError, TaggedVector, Value,
};
use tempfile::TempDir;

fn open_store() -> (Store, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (store, dir)
}

#[test]
fn create_link_traverse() {
    let (store, _dir) = open_store();
    let tag = store.vec_tag_id("vec", true, None).unwrap();
    let rel = store.rel_type_id("rel", true).unwrap();

    let coords: Vec<f32> = (0..8).map(|i| i as f32 * 0.001).collect();
    let a = store
        .create_node(NewNode {
            vectors: vec![TaggedVector { tag_id: tag, dim: 0, bytes: floats_to_bytes(&coords) }],
            ..Default::default()
        })
        .unwrap()
        .id;
    let b = store.create_node(NewNode::default()).unwrap().id;
    store.add_edge(NewEdge { src: a, dst: b, type_id: rel, props: vec![] }).unwrap();

    let out = store.list_adjacency(a, Direction::Out, 16).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].neighbor_id, b);
    assert_eq!(out[0].type_id, rel);
    assert_eq!(out[0].direction, Direction::Out);

    let inn = store.list_adjacency(b, Direction::In, 16).unwrap();
    assert_eq!(inn.len(), 1);
    assert_eq!(inn[0].neighbor_id, a);

    assert_eq!(store.degree(a, Direction::Out).unwrap(), 1);
    assert_eq!(store.degree(b, Direction::In).unwrap(), 1);

    let stored = store.get_vectors(a, &[tag]).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].bytes, floats_to_bytes(&coords));
    assert_eq!(stored[0].dim, 8);
}

#[test]
fn upsert_and_unset_semantics() {
    let (store, _dir) = open_store();
    let k1 = store.prop_key_id("k1", true).unwrap();
    let k2 = store.prop_key_id("k2", true).unwrap();
    let k3 = store.prop_key_id("k3", true).unwrap();
    let k4 = store.prop_key_id("k4", true).unwrap();
    let cold_text = store.text_id("cold-text", true).unwrap();

    let n = store
        .create_node(NewNode {
            hot_props: vec![
                Property::new(k1, Value::I64(42)),
                Property::new(k2, Value::Bool(true)),
            ],
            cold_props: vec![Property::new(k3, Value::Bytes(b"hello".to_vec()))],
            ..Default::default()
        })
        .unwrap()
        .id;

    store
        .upsert_node_props(
            n,
            &[Property::new(k1, Value::F64(3.14))],
            &[Property::new(k4, Value::TextId(cold_text))],
            &[k2],
        )
        .unwrap();

    let header = store.get_node(n).unwrap();
    let hot_keys: Vec<u32> = header.hot_props.iter().map(|p| p.key_id).collect();
    assert_eq!(hot_keys, vec![k1]);

    let props = store.get_node_props(n, &[]).unwrap();
    let mut keys: Vec<u32> = props.iter().map(|p| p.key_id).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec![k1, k3, k4]);
    assert!(props.contains(&Property::new(k1, Value::F64(3.14))));
    assert!(props.contains(&Property::new(k4, Value::TextId(cold_text))));
    assert!(!props.iter().any(|p| p.key_id == k2));
}

#[test]
fn label_index_follows_label_changes() {
    let (store, _dir) = open_store();
    let l1 = store.label_id("L1", true).unwrap();
    let l2 = store.label_id("L2", true).unwrap();
    let l3 = store.label_id("L3", true).unwrap();

    let n = store
        .create_node(NewNode { labels: vec![l1, l2], ..Default::default() })
        .unwrap()
        .id;
    assert!(store.scan_nodes_by_label(l1, usize::MAX).unwrap().contains(&n));

    store.set_node_labels(n, &[l3], &[l1]).unwrap();
    assert!(!store.scan_nodes_by_label(l1, usize::MAX).unwrap().contains(&n));
    assert!(store.scan_nodes_by_label(l3, usize::MAX).unwrap().contains(&n));
    assert!(store.scan_nodes_by_label(l2, usize::MAX).unwrap().contains(&n));
}

#[test]
fn knn_top_k_ordering() {
    let (store, _dir) = open_store();
    let tag = store.vec_tag_id("knn", true, Some(4)).unwrap();

    let vectors: [&[f32]; 5] = [
        &[1.0, 0.0, 0.0, 0.0],
        &[0.0, 1.0, 0.0, 0.0],
        &[0.7071, 0.7071, 0.0, 0.0],
        &[0.5, 0.5, 0.5, 0.5],
        &[-1.0, 0.0, 0.0, 0.0],
    ];
    for coords in vectors {
        let id = store.create_node(NewNode::default()).unwrap().id;
        store.upsert_vector(id, tag, 0, &floats_to_bytes(coords)).unwrap();
    }

    let hits = store
        .knn(tag, &floats_to_bytes(&[1.0, 0.0, 0.0, 0.0]), 5)
        .unwrap();
    let scores: Vec<f32> = hits.iter().map(|h| h.score).collect();
    let expected = [1.0f32, 0.7071, 0.5, 0.0, -1.0];
    assert_eq!(scores.len(), 5);
    for (got, want) in scores.iter().zip(expected) {
        assert!((got - want).abs() < 1e-4, "got {got}, want {want}");
    }

    let zero_hits = store.knn(tag, &floats_to_bytes(&[0.0; 4]), 3).unwrap();
    assert_eq!(zero_hits.len(), 3);
    assert!(zero_hits.iter().all(|h| h.score == 0.0));
}

#[test]
fn cascade_delete_removes_incident_edges() {
    let (store, _dir) = open_store();
    let rel = store.rel_type_id("rel", true).unwrap();
    let a = store.create_node(NewNode::default()).unwrap().id;
    let b = store.create_node(NewNode::default()).unwrap().id;
    let c = store.create_node(NewNode::default()).unwrap().id;
    let ab = store.add_edge(NewEdge { src: a, dst: b, type_id: rel, props: vec![] }).unwrap();
    let bc = store.add_edge(NewEdge { src: b, dst: c, type_id: rel, props: vec![] }).unwrap();
    let ac = store.add_edge(NewEdge { src: a, dst: c, type_id: rel, props: vec![] }).unwrap();

    store.delete_node(b).unwrap();

    assert!(matches!(store.get_node(b), Err(StoreError::NodeNotFound(_))));
    let a_neighbors: Vec<u64> = store
        .list_adjacency(a, Direction::Out, 16)
        .unwrap()
        .iter()
        .map(|r| r.neighbor_id)
        .collect();
    assert_eq!(a_neighbors, vec![c]);
    assert_eq!(store.degree(c, Direction::In).unwrap(), 1);

    assert!(store.get_edge(ab.id).is_err());
    assert!(store.get_edge(bc.id).is_err());
    assert!(store.get_edge(ac.id).is_ok());
    assert!(store.get_edge_props(ab.id, &[]).unwrap().is_empty());
    assert!(store.get_edge_props(bc.id, &[]).unwrap().is_empty());
    assert_eq!(store.degree(b, Direction::Both).unwrap(), 0);
}

#[test]
fn dim_enforcement_end_to_end() {
    let (store, _dir) = open_store();
    let tag = store.vec_tag_id("tag", true, None).unwrap();
    let n = store.create_node(NewNode::default()).unwrap().id;
    let m = store.create_node(NewNode::default()).unwrap().id;

    // 32 bytes fixes dim(tag) = 8
    store.upsert_vector(n, tag, 0, &[0u8; 32]).unwrap();

    let err = store.upsert_vector(m, tag, 0, &[0u8; 16]).unwrap_err();
    assert!(matches!(err, StoreError::DimMismatch { expected: 8, got: 4 }));

    let err = store.knn(tag, &[0u8; 20], 5).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[test]
fn batch_is_atomic_across_mixed_ops() {
    let (store, _dir) = open_store();
    let rel = store.rel_type_id("rel", true).unwrap();
    let a = store.create_node(NewNode::default()).unwrap().id;
    let b = store.create_node(NewNode::default()).unwrap().id;

    let outcomes = store
        .write_batch(vec![
            BatchOp::AddEdge(NewEdge { src: a, dst: b, type_id: rel, props: vec![] }),
            BatchOp::CreateNode(NewNode { labels: vec![], ..Default::default() }),
        ])
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(store.degree(a, Direction::Out).unwrap(), 1);
    assert_eq!(store.node_count().unwrap(), 3);
}

#[test]
fn dictionary_roundtrip_by_name() {
    let (store, _dir) = open_store();
    let id = store.label_id("Person", true).unwrap();
    assert_eq!(store.label_name(id).unwrap(), "Person");
    assert_eq!(store.label_id("Person", false).unwrap(), id);
    assert!(store.label_id("Ghost", false).is_err());
}

#[test]
fn state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (n, tag, bytes) = {
        let store = Store::open(dir.path()).unwrap();
        let tag = store.vec_tag_id("emb", true, None).unwrap();
        let bytes = floats_to_bytes(&[0.25, -0.5]);
        let n = store
            .create_node(NewNode {
                labels: vec![store.label_id("Doc", true).unwrap()],
                hot_props: vec![Property::new(
                    store.prop_key_id("title", true).unwrap(),
                    Value::Bytes(b"t".to_vec()),
                )],
                vectors: vec![TaggedVector { tag_id: tag, dim: 0, bytes: bytes.clone() }],
                ..Default::default()
            })
            .unwrap()
            .id;
        (n, tag, bytes)
    };

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.schema_version().unwrap(), 1);
    let header = store.get_node(n).unwrap();
    assert_eq!(header.id, n);
    assert_eq!(store.get_vectors(n, &[tag]).unwrap()[0].bytes, bytes);
    assert_eq!(store.label_name(header.labels[0]).unwrap(), "Doc");
}
