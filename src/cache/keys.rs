//! Cache key derivation from the request line.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Identifies one cacheable response: the request path plus a hash of its
/// query string, so `/?page=1` and `/?page=2` cache separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: String,
    pub query_hash: u64,
}

impl CacheKey {
    pub fn for_request(path: &str, query: &str) -> Self {
        Self {
            path: path.to_string(),
            query_hash: hash_query(query),
        }
    }
}

pub fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}
