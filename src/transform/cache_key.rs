// Transform cache key derivation
//
// The pipeline keeps no cache itself. The key identifies a variant for an
// external cache layer and only depends on the bucket, the path and the
// non-null transform parameters in sorted order.

use sha2::{Digest, Sha256};

use super::params::TransformRequest;

/// Canonical string the key is hashed from
///
/// # Format
/// `{bucket}/{path}?{k1}={v1}&{k2}={v2}...` with keys sorted by name
pub fn canonical_request(bucket: &str, path: &str, request: &TransformRequest) -> String {
    let query = request
        .cache_params()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}/{}?{}", bucket, path, query)
}

/// Hex SHA256 digest of the canonical request
pub fn cache_key(bucket: &str, path: &str, request: &TransformRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_request(bucket, path, request).as_bytes());
    hex::encode(hasher.finalize())
}
