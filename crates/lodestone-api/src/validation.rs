//! Input validation for the gRPC request handlers.
//!
//! Every `validate_*` function returns `Ok(())` on success or a
//! `tonic::Status::invalid_argument` describing the violated constraint.
//! The store re-checks the structural rules (payload lengths, tag
//! dimensions); this layer exists to fail malformed requests before any
//! transaction is opened and to keep abuse-sized payloads out.

use tonic::Status;

/// Maximum length of any dictionary name (labels, rel types, prop keys,
/// vector tags, interned texts), in bytes.
pub const MAX_NAME_LEN: usize = 4_096;

/// Maximum vector dimensionality accepted over the wire.
pub const MAX_VECTOR_DIM: usize = 16_384;

/// Maximum allowed k in a KNN request.
pub const MAX_KNN_K: u32 = 10_000;

/// Maximum ops in one write batch.
pub const MAX_BATCH_OPS: usize = 10_000;

/// Dictionary names must be non-empty and bounded.
pub fn validate_name(name: &str, field: &str) -> Result<(), Status> {
    if name.is_empty() {
        return Err(Status::invalid_argument(format!("{field} must not be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Status::invalid_argument(format!(
            "{field} is {} bytes, maximum is {MAX_NAME_LEN}",
            name.len()
        )));
    }
    Ok(())
}

/// Vector payloads must be whole float32 arrays of bounded size.
pub fn validate_vector_payload(data: &[u8], field: &str) -> Result<(), Status> {
    if data.len() % 4 != 0 {
        return Err(Status::invalid_argument(format!(
            "{field} is {} bytes, not a multiple of 4",
            data.len()
        )));
    }
    if data.len() / 4 > MAX_VECTOR_DIM {
        return Err(Status::invalid_argument(format!(
            "{field} has dimension {}, maximum is {MAX_VECTOR_DIM}",
            data.len() / 4
        )));
    }
    Ok(())
}

/// k may be zero (an empty result) but is capped.
pub fn validate_k(k: u32) -> Result<(), Status> {
    if k > MAX_KNN_K {
        return Err(Status::invalid_argument(format!(
            "k is {k}, maximum is {MAX_KNN_K}"
        )));
    }
    Ok(())
}

pub fn validate_batch_len(len: usize) -> Result<(), Status> {
    if len > MAX_BATCH_OPS {
        return Err(Status::invalid_argument(format!(
            "batch has {len} ops, maximum is {MAX_BATCH_OPS}"
        )));
    }
    Ok(())
}
