//! Referential integrity checks for a [`PipelineDef`].

use std::collections::HashSet;

use switchyard_types::{Result, SwitchyardError};

use crate::def::PipelineDef;

const MAX_STICKINESS: u8 = 3;

fn fail<T>(msg: String) -> Result<T> {
    Err(SwitchyardError::ValidationError(msg))
}

impl PipelineDef {
    /// Checks the document, stopping at the first problem.
    ///
    /// A document passes iff the pipeline is named, it has at least one node
    /// and one edge, start and done are set, node names are non-empty and
    /// unique, start names a node, edge ids are non-empty and unique, every
    /// edge source names a node, every edge target names a node or `done`,
    /// every zone member names a node, and zone stickiness is at most 3.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.is_empty() {
            return fail("pipeline name is required".into());
        }
        if self.nodes.is_empty() {
            return fail("at least one node is required".into());
        }
        if self.edges.is_empty() {
            return fail("at least one edge is required".into());
        }
        if self.start.is_empty() {
            return fail("start node is required".into());
        }
        if self.done.is_empty() {
            return fail("done node is required".into());
        }

        let mut names: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if node.name.is_empty() {
                return fail("node name is required".into());
            }
            if !names.insert(node.name.as_str()) {
                return fail(format!("duplicate node name {:?}", node.name));
            }
        }

        if !names.contains(self.start.as_str()) {
            return fail(format!("start node {:?} not found in node list", self.start));
        }

        let mut edge_ids: HashSet<&str> = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            if edge.id.is_empty() {
                return fail("edge id is required".into());
            }
            if !edge_ids.insert(edge.id.as_str()) {
                return fail(format!("duplicate edge id {:?}", edge.id));
            }
            if !names.contains(edge.from.as_str()) {
                return fail(format!(
                    "edge {} references unknown source node {:?}",
                    edge.id, edge.from
                ));
            }
            if edge.to != self.done && !names.contains(edge.to.as_str()) {
                return fail(format!(
                    "edge {} references unknown target node {:?}",
                    edge.id, edge.to
                ));
            }
        }

        for (zone, def) in &self.zones {
            if def.stickiness > MAX_STICKINESS {
                return fail(format!(
                    "zone {zone:?} stickiness {} exceeds {MAX_STICKINESS}",
                    def.stickiness
                ));
            }
            for member in &def.nodes {
                if !names.contains(member.as_str()) {
                    return fail(format!("zone {zone:?} references unknown node {member:?}"));
                }
            }
        }

        Ok(())
    }
}
