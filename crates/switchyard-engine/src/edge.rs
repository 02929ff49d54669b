//! Edge contract, transitions, and the id-keyed edge factory.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use switchyard_dsl::EdgeDef;
use switchyard_types::WalkerState;

use crate::node::Artifact;

/// The result of an edge firing. Built fresh for every evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub next_node: String,
    pub explanation: String,
    pub context_additions: HashMap<String, serde_json::Value>,
}

impl Transition {
    pub fn to(next_node: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            next_node: next_node.into(),
            explanation: explanation.into(),
            context_additions: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context_additions.insert(key.into(), value);
        self
    }
}

/// A conditional transition between two nodes.
///
/// `evaluate` returns `None` when the edge does not apply. It may mutate
/// walker state, which is how loop edges count their own iterations.
pub trait Edge: Send + Sync {
    fn id(&self) -> &str;
    fn source(&self) -> &str;
    fn target(&self) -> &str;

    fn is_shortcut(&self) -> bool {
        false
    }

    fn is_loop(&self) -> bool {
        false
    }

    fn evaluate(&self, artifact: &dyn Artifact, state: &mut WalkerState) -> Option<Transition>;
}

// ---------------------------------------------------------------------------
// PassThroughEdge
// ---------------------------------------------------------------------------

/// Default edge for ids with no registered factory. Always fires toward the
/// declared target, using the condition text as the explanation.
#[derive(Debug, Clone)]
pub struct PassThroughEdge {
    def: EdgeDef,
}

impl PassThroughEdge {
    pub fn new(def: EdgeDef) -> Self {
        Self { def }
    }
}

impl Edge for PassThroughEdge {
    fn id(&self) -> &str {
        &self.def.id
    }
    fn source(&self) -> &str {
        &self.def.from
    }
    fn target(&self) -> &str {
        &self.def.to
    }
    fn is_shortcut(&self) -> bool {
        self.def.shortcut
    }
    fn is_loop(&self) -> bool {
        self.def.is_loop
    }
    fn evaluate(&self, _artifact: &dyn Artifact, _state: &mut WalkerState) -> Option<Transition> {
        Some(Transition::to(&self.def.to, &self.def.condition))
    }
}

// ---------------------------------------------------------------------------
// EdgeFactory
// ---------------------------------------------------------------------------

pub type EdgeConstructor = Arc<dyn Fn(&EdgeDef) -> Box<dyn Edge> + Send + Sync>;

/// Maps edge ids to constructors. Unregistered ids become [`PassThroughEdge`]s.
#[derive(Clone, Default)]
pub struct EdgeFactory {
    constructors: HashMap<String, EdgeConstructor>,
}

impl EdgeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, id: impl Into<String>, constructor: F)
    where
        F: Fn(&EdgeDef) -> Box<dyn Edge> + Send + Sync + 'static,
    {
        self.constructors.insert(id.into(), Arc::new(constructor));
    }

    pub fn get(&self, id: &str) -> Option<&EdgeConstructor> {
        self.constructors.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Builds the edge for `def`, falling back to a pass-through.
    pub fn build(&self, def: &EdgeDef) -> Box<dyn Edge> {
        match self.get(&def.id) {
            Some(ctor) => ctor(def),
            None => Box::new(PassThroughEdge::new(def.clone())),
        }
    }
}

impl fmt::Debug for EdgeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.constructors.keys().collect();
        ids.sort();
        f.debug_struct("EdgeFactory").field("ids", &ids).finish()
    }
}
