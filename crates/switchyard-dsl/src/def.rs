use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use switchyard_types::{Element, Result};

/// Top-level pipeline document.
///
/// Field order follows how the document reads: name, zones, nodes, edges,
/// then the entry and exit points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineDef {
    #[serde(default)]
    pub pipeline: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zones: BTreeMap<String, ZoneDef>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub done: String,
}

/// A named group of nodes sharing an element affinity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneDef {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub element: String,
    /// 0 to 3.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub stickiness: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub element: String,
    /// Factory lookup key. Falls back to `name` when unregistered.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub family: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shortcut: bool,
    #[serde(default, rename = "loop", skip_serializing_if = "is_false")]
    pub is_loop: bool,
    /// Human-readable guard text; not interpreted by the engine.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
}

fn is_zero(v: &u8) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Parses `element` case-insensitively. Empty or unknown yields `None`.
pub(crate) fn parse_element(raw: &str) -> Option<Element> {
    if raw.trim().is_empty() {
        return None;
    }
    raw.parse().ok()
}

impl ZoneDef {
    pub fn element(&self) -> Option<Element> {
        parse_element(&self.element)
    }
}

impl NodeDef {
    pub fn element(&self) -> Option<Element> {
        parse_element(&self.element)
    }
}

/// Parses a YAML pipeline document. Does not validate.
pub fn load_pipeline(data: &[u8]) -> Result<PipelineDef> {
    let def: PipelineDef = serde_yaml::from_slice(data)?;
    tracing::debug!(
        pipeline = %def.pipeline,
        nodes = def.nodes.len(),
        edges = def.edges.len(),
        "Pipeline loaded"
    );
    Ok(def)
}

impl PipelineDef {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn node(&self, name: &str) -> Option<&NodeDef> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Edges leaving `from`, in declaration order.
    pub fn edges_from<'a>(&'a self, from: &'a str) -> impl Iterator<Item = &'a EdgeDef> + 'a {
        self.edges.iter().filter(move |e| e.from == from)
    }

    /// The zone that lists `node`, if any.
    pub fn zone_of(&self, node: &str) -> Option<&str> {
        self.zones
            .iter()
            .find(|(_, z)| z.nodes.iter().any(|n| n == node))
            .map(|(name, _)| name.as_str())
    }
}
