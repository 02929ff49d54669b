//! Mutable traversal record owned by a single walk.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkStatus {
    Running,
    Done,
    Error,
}

impl std::fmt::Display for WalkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkStatus::Running => write!(f, "running"),
            WalkStatus::Done => write!(f, "done"),
            WalkStatus::Error => write!(f, "error"),
        }
    }
}

/// One completed step of a walk: the node that ran and the edge that fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub node: String,
    /// The id of the edge that fired out of `node`.
    pub outcome: String,
    pub edge_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub explanation: String,
    /// RFC 3339 UTC.
    pub timestamp: String,
}

/// State carried by a walker across a traversal.
///
/// History is append-only. Loop counters are keyed by an arbitrary counter
/// name chosen by the edge that owns the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerState {
    pub id: String,
    pub current_node: String,
    pub status: WalkStatus,
    #[serde(default)]
    pub history: Vec<StepRecord>,
    /// Occurrences per loop edge id. Edges may use another key when several
    /// edges share one budget.
    #[serde(default)]
    pub loop_counts: HashMap<String, u32>,
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

impl WalkerState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current_node: String::new(),
            status: WalkStatus::Running,
            history: Vec::new(),
            loop_counts: HashMap::new(),
            context: HashMap::new(),
        }
    }

    pub fn with_random_id() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Appends a step and moves `current_node` to the node that just ran.
    pub fn record_step(&mut self, node: &str, edge_id: &str, explanation: &str) {
        self.history.push(StepRecord {
            node: node.to_string(),
            outcome: edge_id.to_string(),
            edge_id: edge_id.to_string(),
            explanation: explanation.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        self.current_node = node.to_string();
    }

    /// Bumps the named counter and returns its new value.
    pub fn increment_loop(&mut self, key: &str) -> u32 {
        let count = self.loop_counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn loop_count(&self, key: &str) -> u32 {
        self.loop_counts.get(key).copied().unwrap_or(0)
    }

    /// Merges entries into the shared context. Later values overwrite earlier ones.
    pub fn merge_context(&mut self, additions: &HashMap<String, serde_json::Value>) {
        for (k, v) in additions {
            self.context.insert(k.clone(), v.clone());
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != WalkStatus::Running
    }
}
