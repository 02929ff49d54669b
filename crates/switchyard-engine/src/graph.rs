//! The immutable pipeline graph and its traversal loop.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchyard_types::{Element, Result, SwitchyardError, WalkStatus};

use crate::edge::Edge;
use crate::events::{EventEmitter, WalkEvent};
use crate::node::{Artifact, Node, NodeContext};
use crate::walker::Walker;

pub const DEFAULT_DONE_NODE: &str = "_done";
pub const DEFAULT_MAX_STEPS: usize = 1000;

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// A named group of nodes sharing an element affinity.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub node_names: Vec<String>,
    pub element: Option<Element>,
    /// 0 to 3.
    pub stickiness: u8,
}

// ---------------------------------------------------------------------------
// GraphOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GraphOptions {
    done_node: String,
    max_steps: Option<usize>,
    events: Option<EventEmitter>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            done_node: DEFAULT_DONE_NODE.to_string(),
            max_steps: Some(DEFAULT_MAX_STEPS),
            events: None,
        }
    }
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the terminal pseudo-node.
    pub fn done_node(mut self, name: impl Into<String>) -> Self {
        self.done_node = name.into();
        self
    }

    /// Ceiling on recorded steps per walk. `None` disables it.
    pub fn max_steps(mut self, limit: Option<usize>) -> Self {
        self.max_steps = limit;
        self
    }

    pub fn events(mut self, emitter: EventEmitter) -> Self {
        self.events = Some(emitter);
        self
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Nodes, edges and zones with lookup indices. Read-only once built, so one
/// graph can serve any number of concurrent walks.
pub struct Graph {
    name: String,
    nodes: Vec<Box<dyn Node>>,
    node_index: HashMap<String, usize>,
    edges: Vec<Box<dyn Edge>>,
    /// Source node name to edge positions, in declaration order.
    edge_index: HashMap<String, Vec<usize>>,
    zones: Vec<Zone>,
    done_node: String,
    max_steps: Option<usize>,
    events: Option<EventEmitter>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("nodes", &self.nodes.iter().map(|n| n.name()).collect::<Vec<_>>())
            .field("edges", &self.edges.iter().map(|e| e.id()).collect::<Vec<_>>())
            .field("done_node", &self.done_node)
            .finish()
    }
}

impl Graph {
    /// Indexes the graph. Fails when a node name repeats, or when an edge's
    /// source or non-terminal target is absent.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<Box<dyn Node>>,
        edges: Vec<Box<dyn Edge>>,
        zones: Vec<Zone>,
        options: GraphOptions,
    ) -> Result<Self> {
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if node_index.insert(node.name().to_string(), i).is_some() {
                return Err(SwitchyardError::ValidationError(format!(
                    "duplicate node name {:?}",
                    node.name()
                )));
            }
        }

        let mut edge_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            if !node_index.contains_key(edge.source()) {
                return Err(SwitchyardError::NodeNotFound {
                    node: edge.source().to_string(),
                    detail: format!("source of edge {}", edge.id()),
                });
            }
            if edge.target() != options.done_node && !node_index.contains_key(edge.target()) {
                return Err(SwitchyardError::NodeNotFound {
                    node: edge.target().to_string(),
                    detail: format!("target of edge {}", edge.id()),
                });
            }
            edge_index
                .entry(edge.source().to_string())
                .or_default()
                .push(i);
        }

        Ok(Self {
            name: name.into(),
            nodes,
            node_index,
            edges,
            edge_index,
            zones,
            done_node: options.done_node,
            max_steps: options.max_steps,
            events: options.events,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn done_node(&self) -> &str {
        &self.done_node
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    pub fn nodes(&self) -> impl Iterator<Item = &dyn Node> {
        self.nodes.iter().map(|n| n.as_ref())
    }

    pub fn edges(&self) -> impl Iterator<Item = &dyn Edge> {
        self.edges.iter().map(|e| e.as_ref())
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn node(&self, name: &str) -> Option<&dyn Node> {
        self.node_index.get(name).map(|&i| self.nodes[i].as_ref())
    }

    /// Outgoing edges of `name`, in declaration order.
    pub fn edges_from(&self, name: &str) -> Vec<&dyn Edge> {
        self.edge_index
            .get(name)
            .map(|idx| idx.iter().map(|&i| self.edges[i].as_ref()).collect())
            .unwrap_or_default()
    }

    pub fn zone_of(&self, node: &str) -> Option<&Zone> {
        self.zones
            .iter()
            .find(|z| z.node_names.iter().any(|n| n == node))
    }

    fn emit(&self, event: WalkEvent) {
        if let Some(ref events) = self.events {
            events.emit(event);
        }
    }

    fn fail<W: Walker + ?Sized>(
        &self,
        walker: &mut W,
        node: &str,
        err: SwitchyardError,
    ) -> Result<()> {
        let state = walker.state_mut();
        state.status = WalkStatus::Error;
        warn!(graph = %self.name, walker = %state.id, node, error = %err, "Walk failed");
        self.emit(WalkEvent::WalkFailed {
            walker_id: state.id.clone(),
            node: node.to_string(),
            error: err.to_string(),
        });
        Err(err)
    }

    fn finish<W: Walker + ?Sized>(&self, walker: &mut W, steps: usize) -> Result<()> {
        let state = walker.state_mut();
        state.status = WalkStatus::Done;
        info!(graph = %self.name, walker = %state.id, steps, "Walk completed");
        self.emit(WalkEvent::WalkCompleted {
            walker_id: state.id.clone(),
            steps,
        });
        Ok(())
    }

    /// Drives `walker` from `start` until the terminal node, a node with no
    /// outgoing edges, or a failure.
    ///
    /// Edges are tried in declaration order and the first that returns a
    /// transition wins. Every failure leaves the walker's status at `error`
    /// with the history recorded so far intact.
    pub async fn walk<W: Walker + ?Sized>(
        &self,
        cancel: &CancellationToken,
        walker: &mut W,
        start: &str,
    ) -> Result<()> {
        let walker_id = walker.state().id.clone();

        let Some(&start_idx) = self.node_index.get(start) else {
            return self.fail(
                walker,
                start,
                SwitchyardError::NodeNotFound {
                    node: start.to_string(),
                    detail: "start node".into(),
                },
            );
        };

        info!(graph = %self.name, walker = %walker_id, start, "Walk started");
        self.emit(WalkEvent::WalkStarted {
            graph: self.name.clone(),
            walker_id: walker_id.clone(),
            start: start.to_string(),
        });

        walker.state_mut().status = WalkStatus::Running;
        walker.state_mut().current_node = start.to_string();

        let mut current = start_idx;
        let mut prior: Option<Box<dyn Artifact>> = None;
        let mut steps = 0usize;

        loop {
            let node = self.nodes[current].as_ref();
            let node_name = node.name();

            if cancel.is_cancelled() {
                return self.fail(
                    walker,
                    node_name,
                    SwitchyardError::Cancelled {
                        node: node_name.to_string(),
                    },
                );
            }

            self.emit(WalkEvent::NodeEntered {
                walker_id: walker_id.clone(),
                node: node_name.to_string(),
            });
            debug!(walker = %walker_id, node = node_name, "Entering node");
            let node_start = Instant::now();

            let handled = {
                let nc = NodeContext::new(walker.state(), prior.as_deref());
                walker.handle(cancel, node, &nc).await
            };

            let artifact = match handled {
                Ok(artifact) => artifact,
                Err(source) => {
                    return self.fail(
                        walker,
                        node_name,
                        SwitchyardError::NodeFailed {
                            node: node_name.to_string(),
                            source: Box::new(source),
                        },
                    );
                }
            };

            self.emit(WalkEvent::NodeExited {
                walker_id: walker_id.clone(),
                node: node_name.to_string(),
                artifact_type: artifact.kind().to_string(),
                confidence: artifact.confidence(),
                elapsed_ms: node_start.elapsed().as_millis() as u64,
            });

            let outgoing = self.edges_from(node_name);
            if outgoing.is_empty() {
                debug!(node = node_name, "No outgoing edges, walk complete");
                return self.finish(walker, steps);
            }

            let mut matched = None;
            for edge in outgoing {
                if let Some(transition) = edge.evaluate(artifact.as_ref(), walker.state_mut()) {
                    matched = Some((edge, transition));
                    break;
                }
            }

            let Some((edge, transition)) = matched else {
                return self.fail(
                    walker,
                    node_name,
                    SwitchyardError::NoMatchingEdge {
                        node: node_name.to_string(),
                        artifact_type: artifact.kind().to_string(),
                    },
                );
            };

            debug!(
                walker = %walker_id,
                edge = edge.id(),
                from = node_name,
                to = %transition.next_node,
                "Edge matched"
            );
            self.emit(WalkEvent::EdgeMatched {
                walker_id: walker_id.clone(),
                edge_id: edge.id().to_string(),
                from: node_name.to_string(),
                to: transition.next_node.clone(),
                explanation: transition.explanation.clone(),
            });

            let state = walker.state_mut();
            state.record_step(node_name, edge.id(), &transition.explanation);
            state.merge_context(&transition.context_additions);
            steps += 1;

            if transition.next_node == self.done_node {
                return self.finish(walker, steps);
            }

            let Some(&next) = self.node_index.get(&transition.next_node) else {
                return self.fail(
                    walker,
                    node_name,
                    SwitchyardError::NodeNotFound {
                        node: transition.next_node.clone(),
                        detail: format!("target of edge {}", edge.id()),
                    },
                );
            };

            if let Some(limit) = self.max_steps {
                if steps >= limit {
                    return self.fail(
                        walker,
                        &transition.next_node,
                        SwitchyardError::StepLimitExceeded {
                            limit,
                            node: transition.next_node.clone(),
                        },
                    );
                }
            }

            walker.state_mut().current_node = transition.next_node;
            prior = Some(artifact);
            current = next;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::PassThroughEdge;
    use async_trait::async_trait;
    use std::any::Any;
    use switchyard_dsl::EdgeDef;

    #[derive(Debug)]
    struct Tag(String);

    impl Artifact for Tag {
        fn kind(&self) -> &str {
            &self.0
        }
        fn confidence(&self) -> f64 {
            1.0
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Stub(&'static str);

    #[async_trait]
    impl Node for Stub {
        fn name(&self) -> &str {
            self.0
        }
        async fn process(&self, _nc: &NodeContext<'_>) -> Result<Box<dyn Artifact>> {
            Ok(Box::new(Tag(format!("{}-out", self.0))))
        }
    }

    fn pass(id: &str, from: &str, to: &str) -> Box<dyn Edge> {
        Box::new(PassThroughEdge::new(EdgeDef {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }))
    }

    fn nodes(names: &[&'static str]) -> Vec<Box<dyn Node>> {
        names
            .iter()
            .map(|n| Box::new(Stub(*n)) as Box<dyn Node>)
            .collect()
    }

    #[test]
    fn construction_rejects_unknown_source() {
        let err = Graph::new(
            "g",
            nodes(&["a"]),
            vec![pass("E1", "ghost", "a")],
            vec![],
            GraphOptions::default(),
        )
        .unwrap_err();
        match err {
            SwitchyardError::NodeNotFound { node, .. } => assert_eq!(node, "ghost"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn construction_rejects_unknown_target_but_allows_done() {
        assert!(Graph::new(
            "g",
            nodes(&["a"]),
            vec![pass("E1", "a", "_done")],
            vec![],
            GraphOptions::default(),
        )
        .is_ok());

        let err = Graph::new(
            "g",
            nodes(&["a"]),
            vec![pass("E1", "a", "_done")],
            vec![],
            GraphOptions::new().done_node("finish"),
        )
        .unwrap_err();
        assert!(matches!(err, SwitchyardError::NodeNotFound { .. }));
    }

    #[test]
    fn construction_rejects_duplicate_nodes() {
        let err = Graph::new("g", nodes(&["a", "a"]), vec![], vec![], GraphOptions::default())
            .unwrap_err();
        assert!(matches!(err, SwitchyardError::ValidationError(_)));
    }

    #[test]
    fn edges_from_preserves_declaration_order() {
        let graph = Graph::new(
            "g",
            nodes(&["a", "b"]),
            vec![
                pass("E2", "a", "b"),
                pass("E1", "a", "_done"),
                pass("E3", "b", "a"),
                pass("E0", "a", "a"),
            ],
            vec![],
            GraphOptions::default(),
        )
        .unwrap();
        let ids: Vec<&str> = graph.edges_from("a").iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["E2", "E1", "E0"]);
        assert!(graph.edges_from("nowhere").is_empty());
        assert_eq!(graph.node("b").unwrap().name(), "b");
    }

    #[test]
    fn zone_lookup() {
        let graph = Graph::new(
            "g",
            nodes(&["a", "b"]),
            vec![pass("E1", "a", "b")],
            vec![Zone {
                name: "intake".into(),
                node_names: vec!["a".into()],
                element: Some(Element::Fire),
                stickiness: 1,
            }],
            GraphOptions::default(),
        )
        .unwrap();
        assert_eq!(graph.zone_of("a").unwrap().name, "intake");
        assert!(graph.zone_of("b").is_none());
    }

    #[test]
    fn graph_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Graph>();
    }
}
