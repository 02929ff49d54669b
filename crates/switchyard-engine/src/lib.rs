//! Graph traversal engine for agent pipelines.
//!
//! A [`Graph`] holds nodes and conditional edges; [`Graph::walk`] drives a
//! [`Walker`] through it, first-match edge by edge, until the terminal node.
//! Pipelines are usually loaded from YAML and turned into graphs with
//! [`build_graph`], which resolves nodes through a [`NodeRegistry`] and edges
//! through an [`EdgeFactory`]. Nodes can be wrapped in [`Mask`] middleware
//! before they are handed to the graph.
//!
//! The [`court`] module builds the adversarial review state machine on the
//! same contracts.

pub mod build;
pub mod checkpoint;
pub mod court;
pub mod edge;
pub mod events;
pub mod graph;
pub mod mask;
pub mod node;
pub mod walker;

pub use build::{build_graph, build_graph_with};
pub use checkpoint::{clear_state, load_state, save_state, STATE_FILE};
pub use edge::{Edge, EdgeConstructor, EdgeFactory, PassThroughEdge, Transition};
pub use events::{EventEmitter, WalkEvent};
pub use graph::{Graph, GraphOptions, Zone, DEFAULT_DONE_NODE, DEFAULT_MAX_STEPS};
pub use mask::{
    default_light_masks, equip_mask, equip_masks, FlagMask, Mask, MaskRegistry, MaskedNode, Next,
};
pub use node::{Artifact, Node, NodeContext, NodeFactory, NodeRegistry};
pub use walker::{DirectWalker, Walker};
