use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node not found: {0}")]
    NodeNotFound(u64),

    #[error("edge not found: {0}")]
    EdgeNotFound(u64),

    #[error("{namespace} name not interned: {name:?}")]
    NameNotFound { namespace: &'static str, name: String },

    #[error("{namespace} id not interned: {id}")]
    IdNotFound { namespace: &'static str, id: u32 },

    #[error("corrupt record: {0}")]
    Corrupt(&'static str),

    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimMismatch { expected: u32, got: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage engine error: {0}")]
    Engine(#[from] heed::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True for the "a specifically requested row is absent" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_)
                | Self::EdgeNotFound(_)
                | Self::NameNotFound { .. }
                | Self::IdNotFound { .. }
        )
    }
}
