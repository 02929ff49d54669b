//! Artifact and node contracts, plus the family-keyed node registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use switchyard_dsl::NodeDef;
use switchyard_types::{Element, Result, WalkerState};

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// The typed result of one node invocation.
///
/// Edges inspect the type tag and confidence, then downcast through
/// [`Artifact::as_any`] to reach the concrete payload.
pub trait Artifact: Send + Sync + fmt::Debug {
    fn kind(&self) -> &str;

    /// 0.0 to 1.0.
    fn confidence(&self) -> f64;

    fn as_any(&self) -> &dyn Any;
}

impl<'a> dyn Artifact + 'a {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

// ---------------------------------------------------------------------------
// NodeContext
// ---------------------------------------------------------------------------

/// Everything a node sees when it runs.
#[derive(Debug, Clone)]
pub struct NodeContext<'a> {
    pub state: &'a WalkerState,
    /// The artifact produced by the previous node, if any.
    pub prior_artifact: Option<&'a dyn Artifact>,
    /// Walker-supplied extras. Empty when the engine builds the context.
    pub meta: HashMap<String, serde_json::Value>,
}

impl<'a> NodeContext<'a> {
    pub fn new(state: &'a WalkerState, prior_artifact: Option<&'a dyn Artifact>) -> Self {
        Self {
            state,
            prior_artifact,
            meta: HashMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    fn element(&self) -> Option<Element> {
        None
    }

    async fn process(&self, nc: &NodeContext<'_>) -> Result<Box<dyn Artifact>>;
}

// ---------------------------------------------------------------------------
// NodeRegistry
// ---------------------------------------------------------------------------

pub type NodeFactory = Arc<dyn Fn(&NodeDef) -> Box<dyn Node> + Send + Sync>;

/// Maps node families (or bare node names) to constructors.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&NodeDef) -> Box<dyn Node> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Arc::new(factory));
    }

    pub fn get(&self, key: &str) -> Option<&NodeFactory> {
        self.factories.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Looks up by family first, then by node name.
    pub fn resolve(&self, def: &NodeDef) -> Option<&NodeFactory> {
        self.get(&def.family).or_else(|| self.get(&def.name))
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("NodeRegistry").field("keys", &keys).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
