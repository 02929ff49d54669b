//! Masks: detachable capabilities layered around a node's processing.
//!
//! A mask is middleware. It sees the [`NodeContext`] on the way in, may add
//! meta entries, calls [`Next::run`], and may inspect the artifact on the way
//! out. A mask can only be equipped at the nodes it lists as valid.
//!
//! The first mask equipped is the outermost layer:
//!
//! ```text
//! A.pre -> B.pre -> node -> B.post -> A.post
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use switchyard_types::{Element, Result, SwitchyardError};

use crate::node::{Artifact, Node, NodeContext};

#[async_trait]
pub trait Mask: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Node names this mask may be equipped at.
    fn valid_nodes(&self) -> &[String];

    async fn wrap(&self, nc: NodeContext<'_>, next: Next<'_>) -> Result<Box<dyn Artifact>>;
}

/// The rest of the chain below a mask.
pub struct Next<'a> {
    masks: &'a [Arc<dyn Mask>],
    inner: &'a dyn Node,
}

impl Next<'_> {
    pub async fn run(self, nc: NodeContext<'_>) -> Result<Box<dyn Artifact>> {
        match self.masks.split_first() {
            Some((mask, rest)) => {
                let next = Next {
                    masks: rest,
                    inner: self.inner,
                };
                mask.wrap(nc, next).await
            }
            None => self.inner.process(&nc).await,
        }
    }
}

// ---------------------------------------------------------------------------
// MaskedNode
// ---------------------------------------------------------------------------

/// A node with zero or more masks applied. Name and element are the inner
/// node's.
pub struct MaskedNode {
    inner: Box<dyn Node>,
    masks: Vec<Arc<dyn Mask>>,
}

impl MaskedNode {
    pub fn new(inner: Box<dyn Node>) -> Self {
        Self {
            inner,
            masks: Vec::new(),
        }
    }

    /// Appends `mask` as the innermost layer so far.
    pub fn equip(mut self, mask: Arc<dyn Mask>) -> Result<Self> {
        let node = self.inner.name();
        if !mask.valid_nodes().iter().any(|n| n == node) {
            return Err(SwitchyardError::ValidationError(format!(
                "mask {:?} cannot be equipped at node {:?} (valid: {:?})",
                mask.name(),
                node,
                mask.valid_nodes()
            )));
        }
        debug!(node = %node, mask = %mask.name(), "Mask equipped");
        self.masks.push(mask);
        Ok(self)
    }

    /// Equipped mask names, outermost first.
    pub fn mask_names(&self) -> Vec<&str> {
        self.masks.iter().map(|m| m.name()).collect()
    }
}

impl fmt::Debug for MaskedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskedNode")
            .field("node", &self.inner.name())
            .field("masks", &self.mask_names())
            .finish()
    }
}

#[async_trait]
impl Node for MaskedNode {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn element(&self) -> Option<Element> {
        self.inner.element()
    }

    async fn process(&self, nc: &NodeContext<'_>) -> Result<Box<dyn Artifact>> {
        let next = Next {
            masks: &self.masks,
            inner: self.inner.as_ref(),
        };
        next.run(nc.clone()).await
    }
}

pub fn equip_mask(node: Box<dyn Node>, mask: Arc<dyn Mask>) -> Result<MaskedNode> {
    MaskedNode::new(node).equip(mask)
}

/// Equips `masks` in order; the first becomes the outermost layer. Fails on
/// the first mask that is not valid for the node.
pub fn equip_masks<I>(node: Box<dyn Node>, masks: I) -> Result<MaskedNode>
where
    I: IntoIterator<Item = Arc<dyn Mask>>,
{
    masks
        .into_iter()
        .try_fold(MaskedNode::new(node), |masked, mask| masked.equip(mask))
}

// ---------------------------------------------------------------------------
// Built-in masks
// ---------------------------------------------------------------------------

/// Sets one boolean meta flag before the node runs.
#[derive(Debug, Clone)]
pub struct FlagMask {
    name: String,
    description: String,
    valid_nodes: Vec<String>,
    flag: String,
}

impl FlagMask {
    pub fn new(name: &str, description: &str, valid_node: &str, flag: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            valid_nodes: vec![valid_node.to_string()],
            flag: flag.to_string(),
        }
    }

    pub fn flag(&self) -> &str {
        &self.flag
    }
}

#[async_trait]
impl Mask for FlagMask {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn valid_nodes(&self) -> &[String] {
        &self.valid_nodes
    }

    async fn wrap(&self, nc: NodeContext<'_>, next: Next<'_>) -> Result<Box<dyn Artifact>> {
        next.run(nc.with_meta(self.flag.clone(), json!(true))).await
    }
}

pub fn recall_mask() -> FlagMask {
    FlagMask::new(
        "mask-of-recall",
        "Injects prior RCA database context",
        "recall",
        "prior_rca_available",
    )
}

pub fn forge_mask() -> FlagMask {
    FlagMask::new(
        "mask-of-the-forge",
        "Injects workspace repo context",
        "investigate",
        "workspace_repos_available",
    )
}

pub fn correlation_mask() -> FlagMask {
    FlagMask::new(
        "mask-of-correlation",
        "Enables cross-case pattern matching",
        "correlate",
        "cross_case_matching",
    )
}

pub fn judgment_mask() -> FlagMask {
    FlagMask::new(
        "mask-of-judgment",
        "Grants authority to approve/reject/reassess",
        "review",
        "review_authority",
    )
}

// ---------------------------------------------------------------------------
// MaskRegistry
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MaskRegistry {
    masks: HashMap<String, Arc<dyn Mask>>,
}

impl MaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mask: Arc<dyn Mask>) {
        self.masks.insert(mask.name().to_string(), mask);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Mask>> {
        self.masks.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.masks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

impl fmt::Debug for MaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.masks.keys().collect();
        names.sort();
        f.debug_struct("MaskRegistry").field("masks", &names).finish()
    }
}

/// The four masks of the light investigation pipeline.
pub fn default_light_masks() -> MaskRegistry {
    let mut registry = MaskRegistry::new();
    for mask in [recall_mask(), forge_mask(), correlation_mask(), judgment_mask()] {
        registry.register(Arc::new(mask));
    }
    registry
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
