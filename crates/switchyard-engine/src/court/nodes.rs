//! Stage nodes. Each turns the raw response its walker fetched into the
//! stage's artifact.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use switchyard_dsl::NodeDef;
use switchyard_types::{Element, Result, SwitchyardError};

use crate::court::artifacts::{DefenseBrief, Discovery, HearingRecord, Indictment, Verdict};
use crate::court::CourtStage;
use crate::node::{Artifact, Node, NodeContext, NodeRegistry};

/// Key under which a walker hands a node its raw response.
pub const RESPONSE_KEY: &str = "response";

pub struct StageNode {
    name: String,
    stage: CourtStage,
    element: Option<Element>,
}

impl StageNode {
    pub fn new(def: &NodeDef, stage: CourtStage) -> Self {
        Self {
            name: def.name.clone(),
            stage,
            element: def.element(),
        }
    }

    pub fn stage(&self) -> CourtStage {
        self.stage
    }

    fn parse<T: DeserializeOwned>(&self, raw: &Value) -> Result<T> {
        serde_json::from_value(raw.clone()).map_err(|e| SwitchyardError::Mistrial {
            stage: self.stage.to_string(),
            reason: format!("malformed {} response: {e}", self.stage),
        })
    }
}

#[async_trait]
impl Node for StageNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn element(&self) -> Option<Element> {
        self.element
    }

    async fn process(&self, nc: &NodeContext<'_>) -> Result<Box<dyn Artifact>> {
        let raw = nc
            .meta
            .get(RESPONSE_KEY)
            .ok_or_else(|| SwitchyardError::Mistrial {
                stage: self.stage.to_string(),
                reason: "no response to process".into(),
            })?;

        let artifact: Box<dyn Artifact> = match self.stage {
            CourtStage::Indict => Box::new(self.parse::<Indictment>(raw)?),
            CourtStage::Discover => Box::new(Discovery { raw: raw.clone() }),
            CourtStage::Defend => Box::new(self.parse::<DefenseBrief>(raw)?),
            CourtStage::Hearing => Box::new(self.parse::<HearingRecord>(raw)?),
            CourtStage::Verdict => Box::new(self.parse::<Verdict>(raw)?),
        };
        Ok(artifact)
    }
}

/// A registry with one factory per stage family.
pub fn court_node_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    for stage in CourtStage::ALL {
        registry.register(stage.family(), move |def: &NodeDef| {
            Box::new(StageNode::new(def, stage)) as Box<dyn Node>
        });
    }
    registry
}
