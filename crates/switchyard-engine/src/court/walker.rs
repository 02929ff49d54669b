//! The walker that conducts a proceeding.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use switchyard_dsl::PipelineDef;
use switchyard_types::{AgentIdentity, Result, SwitchyardError, WalkerState};

use crate::court::artifacts::{DefenseBrief, Indictment, Verdict, VerdictDecision};
use crate::court::config::CourtConfig;
use crate::court::hearing::hearing_loop;
use crate::court::nodes::RESPONSE_KEY;
use crate::court::remand::{inject_remand_context, RemandInjection};
use crate::court::responder::{Responder, ResponderRequest};
use crate::court::runner::CaseFile;
use crate::court::{CourtStage, Proceeding};
use crate::node::{Artifact, Node, NodeContext};
use crate::walker::Walker;

/// What the proceeding has produced so far.
#[derive(Debug, Clone, Default)]
pub struct Docket {
    pub last_stage: Option<CourtStage>,
    pub last_response: Option<Value>,
    pub indictment: Option<Indictment>,
    pub defense: Option<DefenseBrief>,
    pub verdict: Option<Verdict>,
    /// Feedback waiting for the next indictment after a remand.
    pub pending_remand: Option<RemandInjection>,
}

/// Prompts a [`Responder`] for each stage and hands the raw answer to the
/// stage node through `meta["response"]`.
///
/// Every `handle` call is one handoff. The call that would exceed
/// `max_handoffs` fails with a mistrial before anything is sent.
pub struct CourtWalker {
    identity: AgentIdentity,
    state: WalkerState,
    proceeding: Proceeding,
    config: CourtConfig,
    case: CaseFile,
    responder: Arc<dyn Responder>,
    /// Node name to stage, from the node families in the pipeline.
    stages: HashMap<String, CourtStage>,
    handoffs: AtomicUsize,
    docket: Mutex<Docket>,
}

impl CourtWalker {
    pub fn new(
        identity: AgentIdentity,
        proceeding: Proceeding,
        def: &PipelineDef,
        config: CourtConfig,
        case: CaseFile,
        responder: Arc<dyn Responder>,
    ) -> Result<Self> {
        let mut stages = HashMap::with_capacity(def.nodes.len());
        for nd in &def.nodes {
            let stage = nd.family.parse::<CourtStage>().map_err(|e| {
                SwitchyardError::ValidationError(format!("node {:?}: {e}", nd.name))
            })?;
            stages.insert(nd.name.clone(), stage);
        }

        Ok(Self {
            identity,
            state: WalkerState::new(format!("{}-{}", case.case_id, proceeding)),
            proceeding,
            config,
            case,
            responder,
            stages,
            handoffs: AtomicUsize::new(0),
            docket: Mutex::new(Docket::default()),
        })
    }

    pub fn proceeding(&self) -> Proceeding {
        self.proceeding
    }

    pub fn handoffs(&self) -> usize {
        self.handoffs.load(Ordering::SeqCst)
    }

    pub fn docket(&self) -> Docket {
        self.lock_docket().clone()
    }

    pub fn into_parts(self) -> (WalkerState, Docket) {
        let docket = self
            .docket
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (self.state, docket)
    }

    fn lock_docket(&self) -> MutexGuard<'_, Docket> {
        self.docket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stage_of(&self, node: &str) -> Result<CourtStage> {
        self.stages
            .get(node)
            .copied()
            .ok_or_else(|| SwitchyardError::HandlerError {
                node: node.to_string(),
                message: "node is not a court stage".into(),
            })
    }

    /// Races `fut` against cancellation. Responder failures other than a
    /// mistrial are turned into one.
    async fn guarded<T, F>(
        &self,
        cancel: &CancellationToken,
        node: &str,
        stage: CourtStage,
        fut: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SwitchyardError::Cancelled { node: node.to_string() }),
            res = fut => res.map_err(|e| {
                if e.is_mistrial() {
                    e
                } else {
                    SwitchyardError::Mistrial {
                        stage: stage.to_string(),
                        reason: format!("responder failed: {e}"),
                    }
                }
            }),
        }
    }

    fn file(&self, stage: CourtStage, artifact: &dyn Artifact, response: Value) {
        let mut docket = self.lock_docket();
        docket.last_stage = Some(stage);
        docket.last_response = Some(response);

        if let Some(ind) = artifact.downcast_ref::<Indictment>() {
            docket.indictment = Some(ind.clone());
        } else if let Some(brief) = artifact.downcast_ref::<DefenseBrief>() {
            docket.defense = Some(brief.clone());
        } else if let Some(verdict) = artifact.downcast_ref::<Verdict>() {
            if verdict.decision == VerdictDecision::Remand {
                let injection = RemandInjection::from_verdict(
                    &self.case.case_id,
                    verdict,
                    docket.defense.as_ref(),
                    &self.case.classification,
                );
                docket.pending_remand = injection;
            }
            docket.verdict = Some(verdict.clone());
        }
    }
}

#[async_trait]
impl Walker for CourtWalker {
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
        cancel: &CancellationToken,
        node: &dyn Node,
        nc: &NodeContext<'_>,
    ) -> Result<Box<dyn Artifact>> {
        let stage = self.stage_of(node.name())?;

        let handoff = self.handoffs.load(Ordering::SeqCst) + 1;
        if handoff > self.config.max_handoffs {
            warn!(
                case_id = %self.case.case_id,
                stage = %stage,
                max_handoffs = self.config.max_handoffs,
                "Handoff budget exhausted"
            );
            return Err(SwitchyardError::Mistrial {
                stage: stage.to_string(),
                reason: format!("handoff budget of {} exhausted", self.config.max_handoffs),
            });
        }
        self.handoffs.store(handoff, Ordering::SeqCst);

        let vocabulary = self.proceeding.vocabulary();
        let (prior, indictment, defense, remand) = {
            let mut docket = self.lock_docket();
            let remand = if stage == CourtStage::Indict {
                docket.pending_remand.take()
            } else {
                None
            };
            (
                docket.last_response.clone(),
                docket.indictment.clone(),
                docket.defense.clone(),
                remand,
            )
        };

        debug!(case_id = %self.case.case_id, stage = %stage, handoff, "Prompting responder");

        let response = match stage {
            CourtStage::Hearing => {
                let record = self
                    .guarded(
                        cancel,
                        node.name(),
                        stage,
                        hearing_loop(
                            self.responder.as_ref(),
                            vocabulary,
                            &self.case.case_id,
                            indictment.as_ref(),
                            defense.as_ref(),
                            self.config.max_hearing_rounds,
                        ),
                    )
                    .await?;
                serde_json::to_value(&record)?
            }
            _ => {
                let prompt = vocabulary.stage_prompt(
                    stage,
                    &self.case.case_id,
                    &self.case.classification,
                    self.case.confidence,
                    prior.as_ref(),
                );
                let request = ResponderRequest {
                    case_id: self.case.case_id.clone(),
                    stage,
                    prompt: inject_remand_context(&prompt, remand.as_ref(), vocabulary),
                };
                self.guarded(cancel, node.name(), stage, self.responder.respond(&request))
                    .await?
            }
        };

        let nc = nc.clone().with_meta(RESPONSE_KEY, response.clone());
        let artifact = node.process(&nc).await?;
        self.file(stage, artifact.as_ref(), response);
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::court::responder::ScriptedResponder;
    use serde_json::json;
    use switchyard_types::persona_by_name;

    fn walker(responder: Arc<ScriptedResponder>, config: CourtConfig) -> CourtWalker {
        let def = Proceeding::Court.pipeline().unwrap();
        CourtWalker::new(
            persona_by_name("specter").unwrap().identity,
            Proceeding::Court,
            &def,
            config,
            CaseFile::new("C1", "product_bug", 0.7),
            responder,
        )
        .unwrap()
    }

    #[test]
    fn state_id_names_case_and_proceeding() {
        let w = walker(Arc::new(ScriptedResponder::new()), CourtConfig::default());
        assert_eq!(w.state().id, "C1-court");
        assert_eq!(w.identity().persona_name, "Specter");
        assert_eq!(w.handoffs(), 0);
    }

    #[test]
    fn rejects_pipelines_with_unknown_families() {
        let mut def = Proceeding::Court.pipeline().unwrap();
        def.nodes[0].family = "appeal".into();
        let res = CourtWalker::new(
            persona_by_name("bulwark").unwrap().identity,
            Proceeding::Court,
            &def,
            CourtConfig::default(),
            CaseFile::new("C1", "x", 0.6),
            Arc::new(ScriptedResponder::new()),
        );
        assert!(matches!(res, Err(SwitchyardError::ValidationError(_))));
    }

    #[tokio::test]
    async fn handoff_bound_trips_before_prompting() {
        let responder = Arc::new(ScriptedResponder::new().with(
            CourtStage::Indict,
            [json!({"charged_classification": "product_bug", "confidence": 0.6})],
        ));
        let config = CourtConfig {
            max_handoffs: 1,
            ..Default::default()
        };
        let w = walker(responder.clone(), config);
        let def = Proceeding::Court.pipeline().unwrap();
        let node = crate::court::nodes::StageNode::new(def.node("indict").unwrap(), CourtStage::Indict);
        let cancel = CancellationToken::new();

        let nc = NodeContext::new(w.state(), None);
        let first = w.handle(&cancel, &node, &nc).await.unwrap();
        assert_eq!(first.kind(), "indictment");
        assert!(w.docket().indictment.is_some());

        let err = w.handle(&cancel, &node, &nc).await.unwrap_err();
        assert!(err.is_mistrial());
        assert_eq!(responder.calls(), 1);
    }

    #[tokio::test]
    async fn responder_failure_becomes_a_mistrial() {
        let w = walker(Arc::new(ScriptedResponder::new()), CourtConfig::default());
        let def = Proceeding::Court.pipeline().unwrap();
        let node = crate::court::nodes::StageNode::new(def.node("indict").unwrap(), CourtStage::Indict);
        let nc = NodeContext::new(w.state(), None);
        let err = w
            .handle(&CancellationToken::new(), &node, &nc)
            .await
            .unwrap_err();
        assert!(err.is_mistrial());
        assert!(err.to_string().contains("responder failed"));
    }

    #[tokio::test]
    async fn cancellation_is_not_a_mistrial() {
        let w = walker(Arc::new(ScriptedResponder::new()), CourtConfig::default());
        let def = Proceeding::Court.pipeline().unwrap();
        let node = crate::court::nodes::StageNode::new(def.node("defend").unwrap(), CourtStage::Defend);
        let nc = NodeContext::new(w.state(), None);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = w.handle(&cancel, &node, &nc).await.unwrap_err();
        assert!(matches!(err, SwitchyardError::Cancelled { .. }));
    }
}
