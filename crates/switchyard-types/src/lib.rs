//! Shared types, errors, walker state, and identity data for the Switchyard
//! pipeline engine.
//!
//! This crate provides the foundational types used across all other Switchyard crates:
//! - `SwitchyardError`: unified error taxonomy
//! - `WalkerState`: mutable traversal record owned by each walk
//! - `Element`, `AgentIdentity`, `Persona`: scheduling metadata for walkers and zones
//! - `generative_cycle` / `destructive_cycle`: how elements hand off and challenge

pub mod cycle;
pub mod element;
pub mod identity;
pub mod persona;
pub mod state;

pub use cycle::{
    challenged_by, challenges, destructive_cycle, generative_cycle, next_generative, CycleRule,
    CycleType,
};
pub use element::{iron_from_earth, Element, ElementTraits, SpeedClass};
pub use identity::{AgentIdentity, Alignment, Color, MetaPhase, Position};
pub use persona::{all_personas, light_personas, persona_by_name, shadow_personas, Persona};
pub use state::{StepRecord, WalkStatus, WalkerState};

/// Unified error type for all Switchyard subsystems.
#[derive(Debug, thiserror::Error)]
pub enum SwitchyardError {
    // === Definition Errors ===
    #[error("Node '{node}' not found: {detail}")]
    NodeNotFound { node: String, detail: String },

    #[error("Pipeline validation failed: {0}")]
    ValidationError(String),

    #[error("No node factory for family '{family}' (node '{node}')")]
    MissingNodeFactory { family: String, node: String },

    #[error("Pipeline parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Traversal Errors ===
    #[error("No matching edge from node '{node}' for artifact type '{artifact_type}'")]
    NoMatchingEdge { node: String, artifact_type: String },

    #[error("Node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        source: Box<SwitchyardError>,
    },

    #[error("Walk cancelled before node '{node}'")]
    Cancelled { node: String },

    #[error("Step limit of {limit} reached at node '{node}'")]
    StepLimitExceeded { limit: usize, node: String },

    #[error("Handler failed on node '{node}': {message}")]
    HandlerError { node: String, message: String },

    // === Adversarial Content Errors ===
    #[error("Mistrial at stage '{stage}': {reason}")]
    Mistrial { stage: String, reason: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification of a [`SwitchyardError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Structural defects in a pipeline definition or graph.
    Definition,
    /// Failures that terminate a single walk.
    Traversal,
    /// Malformed adversarial content, absorbed into a mistrial by the court runner.
    Content,
    /// Filesystem and serialization failures.
    Io,
}

impl SwitchyardError {
    /// Strips any `NodeFailed` wrappers and returns the innermost error.
    pub fn root(&self) -> &SwitchyardError {
        let mut current = self;
        while let SwitchyardError::NodeFailed { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            SwitchyardError::NodeNotFound { .. }
            | SwitchyardError::ValidationError(_)
            | SwitchyardError::MissingNodeFactory { .. }
            | SwitchyardError::Yaml(_) => ErrorCategory::Definition,
            SwitchyardError::Mistrial { .. } => ErrorCategory::Content,
            SwitchyardError::Io(_) | SwitchyardError::Json(_) => ErrorCategory::Io,
            _ => ErrorCategory::Traversal,
        }
    }

    /// Returns `true` if the error (or the error it wraps) is a mistrial.
    pub fn is_mistrial(&self) -> bool {
        matches!(self.root(), SwitchyardError::Mistrial { .. })
    }
}

/// A convenience alias for `Result<T, SwitchyardError>`.
pub type Result<T> = std::result::Result<T, SwitchyardError>;
