//! Cache key schema
//!
//! Key format: catalyst:v{VERSION}:{entity}:{identifier}

use uuid::Uuid;

/// Bump when the shape of cached values changes
pub const CACHE_VERSION: u32 = 1;

pub struct CacheKey;

impl CacheKey {
    /// Timeline source record for a user
    /// Format: catalyst:v1:timeline:sources:{user_id}
    pub fn timeline_sources(user_id: Uuid) -> String {
        format!("catalyst:v{}:timeline:sources:{}", CACHE_VERSION, user_id)
    }

    /// Followed-user ids for a viewer
    /// Format: catalyst:v1:graph:following:{user_id}
    pub fn following(user_id: Uuid) -> String {
        format!("catalyst:v{}:graph:following:{}", CACHE_VERSION, user_id)
    }
}
