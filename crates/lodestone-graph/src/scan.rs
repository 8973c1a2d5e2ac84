//! Prefix-bounded cursor scans.
//!
//! Every secondary lookup in the store is the same movement: position a
//! cursor at `(major, 0, 0, …)` and walk forward while the key still
//! starts with the major id. These adaptors wrap the engine's prefix
//! iterators so call sites decode rows with the key splitters in
//! [`crate::keys`] and never touch cursor state directly.

use heed::types::{Bytes, Unit};
use heed::{Database, RoPrefix, RoTxn};

use crate::error::StoreError;

/// Keys of an index table (empty values) under a prefix.
pub(crate) struct IndexRows<'t> {
    inner: RoPrefix<'t, Bytes, Unit>,
}

impl<'t> Iterator for IndexRows<'t> {
    type Item = Result<&'t [u8], StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok((key, ())) => Some(Ok(key)),
            Err(e) => Some(Err(StoreError::Engine(e))),
        }
    }
}

/// (key, value) rows of a data table under a prefix.
pub(crate) struct TableRows<'t> {
    inner: RoPrefix<'t, Bytes, Bytes>,
}

impl<'t> Iterator for TableRows<'t> {
    type Item = Result<(&'t [u8], &'t [u8]), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(pair) => Some(Ok(pair)),
            Err(e) => Some(Err(StoreError::Engine(e))),
        }
    }
}

pub(crate) fn index_rows<'t>(
    db: Database<Bytes, Unit>,
    txn: &'t RoTxn,
    prefix: &[u8],
) -> Result<IndexRows<'t>, StoreError> {
    Ok(IndexRows { inner: db.prefix_iter(txn, prefix)? })
}

pub(crate) fn table_rows<'t>(
    db: Database<Bytes, Bytes>,
    txn: &'t RoTxn,
    prefix: &[u8],
) -> Result<TableRows<'t>, StoreError> {
    Ok(TableRows { inner: db.prefix_iter(txn, prefix)? })
}

/// Collect the keys under a prefix into owned buffers.
///
/// Deletion paths use this: the engine forbids mutating a table while a
/// cursor is open on it, so cascades collect first and delete after.
pub(crate) fn collect_keys(
    db: Database<Bytes, Bytes>,
    txn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>, StoreError> {
    let mut keys = Vec::new();
    for row in table_rows(db, txn, prefix)? {
        let (key, _) = row?;
        keys.push(key.to_vec());
    }
    Ok(keys)
}
