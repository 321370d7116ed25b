//! Data shapes exchanged with the open-data API.

/// One contracting process as returned by the SECOP dataset.
///
/// The shape depends on the `$select` that produced it; nothing beyond JSON
/// well-formedness is checked.
pub type ContractRecord = serde_json::Map<String, serde_json::Value>;
