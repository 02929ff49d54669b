//! Turning a [`PipelineDef`] into a runnable [`Graph`].

use switchyard_dsl::PipelineDef;
use switchyard_types::{Result, SwitchyardError};

use crate::edge::EdgeFactory;
use crate::graph::{Graph, GraphOptions, Zone};
use crate::node::NodeRegistry;

/// Validates `def` and builds a graph with default options.
pub fn build_graph(def: &PipelineDef, nodes: &NodeRegistry, edges: &EdgeFactory) -> Result<Graph> {
    build_graph_with(def, nodes, edges, GraphOptions::default())
}

/// Like [`build_graph`], with caller options. The document's `done` always
/// overrides the terminal node name in `options`.
pub fn build_graph_with(
    def: &PipelineDef,
    nodes: &NodeRegistry,
    edges: &EdgeFactory,
    options: GraphOptions,
) -> Result<Graph> {
    def.validate()?;

    let mut built_nodes = Vec::with_capacity(def.nodes.len());
    for nd in &def.nodes {
        let factory = nodes
            .resolve(nd)
            .ok_or_else(|| SwitchyardError::MissingNodeFactory {
                family: nd.family.clone(),
                node: nd.name.clone(),
            })?;
        built_nodes.push(factory(nd));
    }

    let built_edges = def.edges.iter().map(|ed| edges.build(ed)).collect();

    let zones = def
        .zones
        .iter()
        .map(|(name, zd)| {
            let element = zd.element();
            if element.is_none() && !zd.element.trim().is_empty() {
                tracing::warn!(zone = %name, element = %zd.element, "Unknown zone element, ignoring");
            }
            Zone {
                name: name.clone(),
                node_names: zd.nodes.clone(),
                element,
                stickiness: zd.stickiness,
            }
        })
        .collect();

    tracing::debug!(
        pipeline = %def.pipeline,
        nodes = def.nodes.len(),
        edges = def.edges.len(),
        "Building graph"
    );

    Graph::new(
        def.pipeline.clone(),
        built_nodes,
        built_edges,
        zones,
        options.done_node(def.done.clone()),
    )
}
