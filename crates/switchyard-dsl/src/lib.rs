//! Declarative pipeline documents for Switchyard.
//!
//! A pipeline is written as YAML with zones, nodes, edges, a start node and a
//! terminal pseudo-node. This crate loads and re-emits those documents, checks
//! their referential integrity, and renders them as Mermaid flowcharts.
//! Turning a document into a runnable graph happens in `switchyard-engine`.
//!
//! # Example
//! ```
//! let yaml = br#"
//! pipeline: hello
//! nodes: [{name: greet}]
//! edges: [{id: E1, name: bye, from: greet, to: _done}]
//! start: greet
//! done: _done
//! "#;
//! let def = switchyard_dsl::load_pipeline(yaml).unwrap();
//! def.validate().unwrap();
//! assert!(switchyard_dsl::render(&def).starts_with("graph LR"));
//! ```

pub mod def;
mod render;
mod validate;

pub use def::{load_pipeline, EdgeDef, NodeDef, PipelineDef, ZoneDef};
pub use render::render;
