//! Write batches: a typed list of mutations applied in one transaction.
//!
//! Ops run sequentially against the same write transaction, so later
//! ops observe earlier ones; the first failure aborts the whole batch.
//! Node ids created inside the batch are returned to the caller but are
//! NOT substituted into later ops; callers reference ids they already
//! know.

use tracing::debug;

use crate::error::StoreError;
use crate::model::{EdgeId, EdgeRef, NewEdge, NewNode, NodeHeader, NodeId, Property, SymbolId};
use crate::store::Store;

/// One mutation inside a [`Store::write_batch`] call.
#[derive(Debug, Clone)]
pub enum BatchOp {
    CreateNode(NewNode),
    UpsertNodeProps {
        id: NodeId,
        set_hot: Vec<Property>,
        set_cold: Vec<Property>,
        unset_keys: Vec<SymbolId>,
    },
    SetNodeLabels {
        id: NodeId,
        add: Vec<SymbolId>,
        remove: Vec<SymbolId>,
    },
    UpsertVector {
        id: NodeId,
        tag_id: SymbolId,
        declared_dim: u32,
        bytes: Vec<u8>,
    },
    DeleteVector {
        id: NodeId,
        tag_id: SymbolId,
    },
    AddEdge(NewEdge),
    UpdateEdgeProps {
        edge_id: EdgeId,
        set: Vec<Property>,
        unset_keys: Vec<SymbolId>,
    },
}

/// What one batch op produced.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// Header of a node created by `CreateNode`.
    Node(NodeHeader),
    /// Ref of an edge created by `AddEdge`.
    Edge(EdgeRef),
    /// The op mutated existing rows.
    Done,
}

impl Store {
    /// Apply `ops` in order inside a single write transaction.
    ///
    /// Returns one outcome per op. Any op's failure aborts every
    /// mutation in the batch.
    pub fn write_batch(&self, ops: Vec<BatchOp>) -> Result<Vec<BatchOutcome>, StoreError> {
        let mut wtxn = self.env.write_txn()?;
        let mut outcomes = Vec::with_capacity(ops.len());

        for op in ops {
            let outcome = match op {
                BatchOp::CreateNode(new) => {
                    BatchOutcome::Node(self.create_node_in(&mut wtxn, new)?)
                }
                BatchOp::UpsertNodeProps { id, set_hot, set_cold, unset_keys } => {
                    self.upsert_node_props_in(&mut wtxn, id, &set_hot, &set_cold, &unset_keys)?;
                    BatchOutcome::Done
                }
                BatchOp::SetNodeLabels { id, add, remove } => {
                    self.set_node_labels_in(&mut wtxn, id, &add, &remove)?;
                    BatchOutcome::Done
                }
                BatchOp::UpsertVector { id, tag_id, declared_dim, bytes } => {
                    self.put_vector_in(&mut wtxn, id, tag_id, declared_dim, &bytes)?;
                    BatchOutcome::Done
                }
                BatchOp::DeleteVector { id, tag_id } => {
                    self.delete_vector_in(&mut wtxn, id, tag_id)?;
                    BatchOutcome::Done
                }
                BatchOp::AddEdge(new) => BatchOutcome::Edge(self.add_edge_in(&mut wtxn, new)?),
                BatchOp::UpdateEdgeProps { edge_id, set, unset_keys } => {
                    self.update_edge_props_in(&mut wtxn, edge_id, &set, &unset_keys)?;
                    BatchOutcome::Done
                }
            };
            outcomes.push(outcome);
        }

        wtxn.commit()?;
        debug!(ops = outcomes.len(), "batch committed");
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::error::StoreError;
    use crate::model::{Direction, Value};
    use tempfile::TempDir;

    fn open_store() -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn batch_applies_ops_in_order() {
        let (store, _dir) = open_store();
        let a = store.create_node(NewNode::default()).unwrap().id;
        let b = store.create_node(NewNode::default()).unwrap().id;

        let outcomes = store
            .write_batch(vec![
                BatchOp::SetNodeLabels { id: a, add: vec![1], remove: vec![] },
                BatchOp::AddEdge(NewEdge { src: a, dst: b, type_id: 2, props: vec![] }),
                BatchOp::UpsertVector {
                    id: a,
                    tag_id: 1,
                    declared_dim: 0,
                    bytes: codec::floats_to_bytes(&[1.0, 0.0]),
                },
                BatchOp::UpsertNodeProps {
                    id: a,
                    set_hot: vec![Property::new(1, Value::I64(5))],
                    set_cold: vec![],
                    unset_keys: vec![],
                },
            ])
            .unwrap();

        assert_eq!(outcomes.len(), 4);
        assert!(matches!(outcomes[1], BatchOutcome::Edge(_)));
        assert_eq!(store.get_node(a).unwrap().labels, vec![1]);
        assert_eq!(store.degree(a, Direction::Out).unwrap(), 1);
        assert_eq!(store.get_vectors(a, &[1]).unwrap().len(), 1);
    }

    #[test]
    fn created_node_header_is_returned() {
        let (store, _dir) = open_store();
        let outcomes = store
            .write_batch(vec![BatchOp::CreateNode(NewNode {
                labels: vec![2, 1],
                ..Default::default()
            })])
            .unwrap();
        let BatchOutcome::Node(header) = &outcomes[0] else {
            panic!("expected a node outcome");
        };
        assert_eq!(header.labels, vec![1, 2]);
        assert!(store.get_node(header.id).is_ok());
    }

    #[test]
    fn failing_op_aborts_the_whole_batch() {
        let (store, _dir) = open_store();
        let a = store.create_node(NewNode::default()).unwrap().id;
        // fix tag 1 at dim 2 so the third op fails
        store
            .upsert_vector(a, 1, 0, &codec::floats_to_bytes(&[0.0, 0.0]))
            .unwrap();

        let err = store
            .write_batch(vec![
                BatchOp::SetNodeLabels { id: a, add: vec![9], remove: vec![] },
                BatchOp::CreateNode(NewNode::default()),
                BatchOp::UpsertVector {
                    id: a,
                    tag_id: 1,
                    declared_dim: 0,
                    bytes: codec::floats_to_bytes(&[0.0; 3]),
                },
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::DimMismatch { .. }));

        // nothing from the batch survived, not even the earlier ops
        assert!(store.get_node(a).unwrap().labels.is_empty());
        assert_eq!(store.node_count().unwrap(), 1);
    }

    #[test]
    fn later_ops_see_earlier_writes() {
        let (store, _dir) = open_store();
        let a = store.create_node(NewNode::default()).unwrap().id;
        store
            .write_batch(vec![
                BatchOp::UpsertNodeProps {
                    id: a,
                    set_hot: vec![Property::new(1, Value::I64(1))],
                    set_cold: vec![],
                    unset_keys: vec![],
                },
                BatchOp::UpsertNodeProps {
                    id: a,
                    set_hot: vec![Property::new(1, Value::I64(2))],
                    set_cold: vec![],
                    unset_keys: vec![],
                },
            ])
            .unwrap();
        let props = store.get_node_props(a, &[1]).unwrap();
        assert_eq!(props, vec![Property::new(1, Value::I64(2))]);
    }
}
