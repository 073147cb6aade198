use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Entrada persistida: `{data, expires}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Expiración absoluta en milisegundos desde epoch
    pub expires: i64,
}

impl CacheEntry {
    pub fn new(data: Value, now_millis: i64, ttl: Duration) -> Self {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            data,
            expires: now_millis.saturating_add(ttl_millis),
        }
    }

    /// Una entrada deja de existir lógicamente en cuanto `now >= expires`
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis >= self.expires
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expiry_boundary_is_inclusive() {
        let entry = CacheEntry::new(json!(1), 1_000, Duration::from_millis(500));
        assert_eq!(entry.expires, 1_500);
        assert!(!entry.is_expired(1_499));
        assert!(entry.is_expired(1_500));
    }

    #[test]
    fn wire_shape_is_data_and_expires() {
        let entry = CacheEntry::new(json!({"a": 1}), 0, Duration::from_secs(1));
        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded, json!({"data": {"a": 1}, "expires": 1000}));
    }
}
