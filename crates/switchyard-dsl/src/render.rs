//! Mermaid flowchart rendering.

use std::collections::HashSet;
use std::fmt::Write;
use std::sync::OnceLock;

use regex::Regex;

use crate::def::PipelineDef;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("static regex"))
}

/// Mermaid identifiers may not contain dashes or punctuation.
fn sanitize_id(s: &str) -> String {
    unsafe_chars().replace_all(s, "_").into_owned()
}

/// Double quotes would end a Mermaid label early.
fn escape_label(s: &str) -> String {
    s.replace('"', "#quot;")
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Renders a `graph LR` flowchart.
///
/// Zones become subgraphs in name order, followed by any unzoned nodes.
/// Every edge is labelled `"<id>: <name>"`, using the id when the name is empty.
pub fn render(def: &PipelineDef) -> String {
    let mut out = String::from("graph LR\n");

    if !def.zones.is_empty() {
        let mut zoned: HashSet<&str> = HashSet::new();
        for (name, zone) in &def.zones {
            let _ = writeln!(
                out,
                "    subgraph {} [{}]",
                sanitize_id(name),
                capitalize_first(name)
            );
            for node in &zone.nodes {
                let _ = writeln!(out, "        {}", sanitize_id(node));
                zoned.insert(node.as_str());
            }
            out.push_str("    end\n");
        }
        for node in &def.nodes {
            if !zoned.contains(node.name.as_str()) {
                let _ = writeln!(out, "    {}", sanitize_id(&node.name));
            }
        }
    }

    for edge in &def.edges {
        let label = if edge.name.is_empty() {
            &edge.id
        } else {
            &edge.name
        };
        let _ = writeln!(
            out,
            "    {} -->|\"{}: {}\"| {}",
            sanitize_id(&edge.from),
            escape_label(&edge.id),
            escape_label(label),
            sanitize_id(&edge.to)
        );
    }

    out
}
