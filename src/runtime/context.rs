use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

/// Project-scoped execution context, shared by every run of the same
/// compiled flow until the flow is rebuilt.
#[derive(Debug)]
pub struct ExecContext {
    pub context_id: String,
    pub created_at: DateTime<Utc>,
    values: RwLock<HashMap<String, Value>>,
}

impl ExecContext {
    pub fn new() -> Self {
        Self {
            context_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            values: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new()
    }
}
