//! String interning: five bidirectional name ↔ `u32` dictionaries.
//!
//! Labels, relationship types, property keys, vector tags and free-text
//! values each get their own namespace with a persistent meta sequence.
//! Ids are issued monotonically and never removed, which licenses the
//! process-local cache: an entry observed once is valid for the life of
//! the environment, and the cache only grows on `get_or_create` of a new
//! name or first read of an id.

use std::collections::HashMap;
use std::sync::RwLock;

use heed::byteorder::BE;
use heed::types::{Bytes, Str, U32};
use heed::Database;

use crate::env::GraphEnv;
use crate::error::StoreError;
use crate::keys;
use crate::model::SymbolId;

/// One interning namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Label,
    RelType,
    PropKey,
    VecTag,
    Text,
}

impl Namespace {
    fn index(self) -> usize {
        match self {
            Self::Label => 0,
            Self::RelType => 1,
            Self::PropKey => 2,
            Self::VecTag => 3,
            Self::Text => 4,
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::RelType => "relationship type",
            Self::PropKey => "property key",
            Self::VecTag => "vector tag",
            Self::Text => "text",
        }
    }

    fn seq_key(self) -> &'static str {
        match self {
            Self::Label => keys::META_LABEL_SEQ,
            Self::RelType => keys::META_REL_TYPE_SEQ,
            Self::PropKey => keys::META_PROP_KEY_SEQ,
            Self::VecTag => keys::META_VEC_TAG_SEQ,
            Self::Text => keys::META_TEXT_SEQ,
        }
    }

    fn tables(self, env: &GraphEnv) -> (Database<Bytes, Str>, Database<Str, U32<BE>>) {
        match self {
            Self::Label => (env.label_ids, env.labels_by_name),
            Self::RelType => (env.rel_type_ids, env.rel_types_by_name),
            Self::PropKey => (env.prop_key_ids, env.prop_keys_by_name),
            Self::VecTag => (env.vec_tag_ids, env.vec_tags_by_name),
            Self::Text => (env.text_ids, env.texts_by_name),
        }
    }
}

#[derive(Default)]
struct NamespaceCache {
    by_name: HashMap<String, SymbolId>,
    by_id: HashMap<SymbolId, String>,
}

/// The interning layer over all five namespaces.
pub struct Dictionary {
    caches: [RwLock<NamespaceCache>; 5],
}

impl Dictionary {
    pub fn new() -> Self {
        Self { caches: Default::default() }
    }

    /// Resolve `name` to its id, optionally interning it.
    ///
    /// Fails with the namespace's not-found error when the name is
    /// unknown and `create` is false.
    pub fn get_or_create(
        &self,
        env: &GraphEnv,
        ns: Namespace,
        name: &str,
        create: bool,
    ) -> Result<SymbolId, StoreError> {
        self.get_or_create_inner(env, ns, name, create, None)
    }

    /// Vector-tag variant: a caller-declared dimension is persisted to
    /// `vecTagMeta` in the same transaction iff the tag is new.
    pub fn get_or_create_vec_tag(
        &self,
        env: &GraphEnv,
        name: &str,
        create: bool,
        dim: Option<u32>,
    ) -> Result<SymbolId, StoreError> {
        self.get_or_create_inner(env, Namespace::VecTag, name, create, dim)
    }

    fn get_or_create_inner(
        &self,
        env: &GraphEnv,
        ns: Namespace,
        name: &str,
        create: bool,
        vec_dim: Option<u32>,
    ) -> Result<SymbolId, StoreError> {
        let cache = &self.caches[ns.index()];
        if let Some(&id) = cache.read().expect("dictionary cache poisoned").by_name.get(name) {
            return Ok(id);
        }

        let (_, by_name) = ns.tables(env);
        {
            let rtxn = env.read_txn()?;
            if let Some(id) = by_name.get(&rtxn, name)? {
                self.remember(ns, id, name);
                return Ok(id);
            }
        }

        if !create {
            return Err(StoreError::NameNotFound {
                namespace: ns.display(),
                name: name.to_string(),
            });
        }

        let mut wtxn = env.write_txn()?;
        // another thread may have interned the name while we held no lock
        let (ids, by_name) = ns.tables(env);
        if let Some(id) = by_name.get(&wtxn, name)? {
            self.remember(ns, id, name);
            return Ok(id);
        }

        let seq = env.next_seq(&mut wtxn, ns.seq_key())?;
        let id = u32::try_from(seq)
            .map_err(|_| StoreError::InvalidArgument(format!("{} id space exhausted", ns.display())))?;
        ids.put(&mut wtxn, &keys::symbol_key(id), name)?;
        by_name.put(&mut wtxn, name, &id)?;
        if let Some(dim) = vec_dim {
            env.vec_tag_meta.put(&mut wtxn, &keys::symbol_key(id), &dim)?;
        }
        wtxn.commit()?;

        self.remember(ns, id, name);
        Ok(id)
    }

    /// Resolve an id back to its interned name.
    pub fn name_of(&self, env: &GraphEnv, ns: Namespace, id: SymbolId) -> Result<String, StoreError> {
        let cache = &self.caches[ns.index()];
        if let Some(name) = cache.read().expect("dictionary cache poisoned").by_id.get(&id) {
            return Ok(name.clone());
        }

        let (ids, _) = ns.tables(env);
        let rtxn = env.read_txn()?;
        match ids.get(&rtxn, &keys::symbol_key(id))? {
            Some(name) => {
                let name = name.to_string();
                self.remember(ns, id, &name);
                Ok(name)
            }
            None => Err(StoreError::IdNotFound { namespace: ns.display(), id }),
        }
    }

    fn remember(&self, ns: Namespace, id: SymbolId, name: &str) {
        let mut cache = self.caches[ns.index()].write().expect("dictionary cache poisoned");
        cache.by_name.insert(name.to_string(), id);
        cache.by_id.insert(id, name.to_string());
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}
