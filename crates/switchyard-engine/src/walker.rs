//! The walker contract and a direct-dispatch walker.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use switchyard_types::{AgentIdentity, Result, WalkerState};

use crate::node::{Artifact, Node, NodeContext};

/// Drives a walk: owns the state and decides how each node is processed.
///
/// `handle` takes `&self` so the engine can lend the walker's state to the
/// node context during the call. Walkers that keep per-walk bookkeeping use
/// interior mutability for it.
#[async_trait]
pub trait Walker: Send + Sync {
    fn identity(&self) -> &AgentIdentity;
    fn state(&self) -> &WalkerState;
    fn state_mut(&mut self) -> &mut WalkerState;

    async fn handle(
        &self,
        cancel: &CancellationToken,
        node: &dyn Node,
        nc: &NodeContext<'_>,
    ) -> Result<Box<dyn Artifact>>;
}

/// Calls `node.process` directly and does nothing else.
#[derive(Debug, Clone)]
pub struct DirectWalker {
    identity: AgentIdentity,
    state: WalkerState,
}

impl DirectWalker {
    pub fn new(identity: AgentIdentity, state: WalkerState) -> Self {
        Self { identity, state }
    }

    pub fn into_state(self) -> WalkerState {
        self.state
    }
}

#[async_trait]
impl Walker for DirectWalker {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    fn state(&self) -> &WalkerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WalkerState {
        &mut self.state
    }

    async fn handle(
        &self,
        _cancel: &CancellationToken,
        node: &dyn Node,
        nc: &NodeContext<'_>,
    ) -> Result<Box<dyn Artifact>> {
        node.process(nc).await
    }
}
