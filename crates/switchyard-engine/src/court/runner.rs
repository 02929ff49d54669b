//! Running a whole proceeding for one case.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchyard_types::{
    persona_by_name, shadow_personas, AgentIdentity, Result, SwitchyardError, WalkStatus,
    WalkerState,
};

use crate::build::build_graph;
use crate::court::artifacts::VerdictDecision;
use crate::court::config::CourtConfig;
use crate::court::edges::build_court_edge_factory;
use crate::court::gaps::{EvidenceGap, EvidenceGapBrief, GapBriefThreshold};
use crate::court::nodes::court_node_registry;
use crate::court::responder::Responder;
use crate::court::walker::CourtWalker;
use crate::court::{CourtStage, Proceeding};

const PRESIDING_PERSONA: &str = "Specter";

/// The upstream conclusion under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    pub case_id: String,
    pub classification: String,
    pub confidence: f64,
}

impl CaseFile {
    pub fn new(case_id: impl Into<String>, classification: impl Into<String>, confidence: f64) -> Self {
        Self {
            case_id: case_id.into(),
            classification: classification.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourtResult {
    pub activated: bool,
    pub proceeding: Proceeding,
    pub original_classification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<VerdictDecision>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub final_classification: String,
    /// Verdict confidence, 0.0 when no verdict was reached.
    pub confidence: f64,
    pub flipped: bool,
    pub remand_count: u32,
    pub handoffs: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reasoning: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<EvidenceGap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<WalkerState>,
}

impl CourtResult {
    fn inactive(proceeding: Proceeding, case: &CaseFile) -> Self {
        Self {
            activated: false,
            proceeding,
            original_classification: case.classification.clone(),
            decision: None,
            final_classification: String::new(),
            confidence: 0.0,
            flipped: false,
            remand_count: 0,
            handoffs: 0,
            reasoning: String::new(),
            gaps: Vec::new(),
            state: None,
        }
    }

    pub fn is_mistrial(&self) -> bool {
        self.decision == Some(VerdictDecision::Mistrial)
    }

    /// A gap brief when the proceeding ended below `threshold`.
    pub fn gap_brief(&self, case_id: &str, threshold: &GapBriefThreshold) -> Option<EvidenceGapBrief> {
        if !self.activated || !threshold.should_produce(self.confidence) {
            return None;
        }
        Some(EvidenceGapBrief::from_gaps(
            case_id,
            self.confidence,
            self.gaps.clone(),
            threshold,
        ))
    }
}

fn presiding_identity() -> Result<AgentIdentity> {
    persona_by_name(PRESIDING_PERSONA)
        .or_else(|| shadow_personas().into_iter().next())
        .map(|p| p.identity)
        .ok_or_else(|| SwitchyardError::Other("no shadow persona available".into()))
}

/// Runs `proceeding` for `case` if its confidence falls in the activation
/// band.
///
/// Malformed responses, responder failures, an exhausted handoff budget and
/// TTL expiry all end in a `mistrial` disposition with `Ok`. Cancellation and
/// structural graph errors are returned as errors.
pub async fn run_proceeding(
    proceeding: Proceeding,
    config: &CourtConfig,
    case: &CaseFile,
    responder: Arc<dyn Responder>,
    cancel: &CancellationToken,
) -> Result<CourtResult> {
    if !config.should_activate(case.confidence) {
        debug!(
            case_id = %case.case_id,
            confidence = case.confidence,
            enabled = config.enabled,
            "Proceeding not activated"
        );
        return Ok(CourtResult::inactive(proceeding, case));
    }

    info!(
        case_id = %case.case_id,
        proceeding = %proceeding,
        classification = %case.classification,
        confidence = case.confidence,
        "Proceeding activated"
    );

    let def = proceeding.pipeline()?;
    let graph = build_graph(
        &def,
        &court_node_registry(),
        &build_court_edge_factory(config),
    )?;
    let verdict_node = def
        .nodes
        .iter()
        .find(|n| n.family == CourtStage::Verdict.family())
        .map(|n| n.name.clone())
        .unwrap_or_default();

    let mut walker = CourtWalker::new(
        presiding_identity()?,
        proceeding,
        &def,
        config.clone(),
        case.clone(),
        responder,
    )?;

    let outcome = tokio::select! {
        res = graph.walk(cancel, &mut walker, &def.start) => Some(res),
        _ = tokio::time::sleep(config.ttl) => None,
    };

    let mistrial = match outcome {
        Some(Ok(())) => None,
        Some(Err(e)) if e.is_mistrial() => Some(e.root().to_string()),
        Some(Err(e)) => return Err(e),
        None => Some(format!("ttl of {:?} expired", config.ttl)),
    };

    let handoffs = walker.handoffs();
    let (mut state, docket) = walker.into_parts();

    if let Some(reason) = &mistrial {
        warn!(case_id = %case.case_id, node = %state.current_node, reason = %reason, "Mistrial declared");
        state.status = WalkStatus::Done;
        state.context.insert("decision".into(), json!(VerdictDecision::Mistrial.as_str()));
        state.context.insert("disposition".into(), json!("mistrial"));
        state.context.insert("mistrial_reason".into(), json!(reason));
    }

    let disposed_as_mistrial = state.context.get("disposition").and_then(|v| v.as_str()) == Some("mistrial");
    let decision = if disposed_as_mistrial {
        Some(VerdictDecision::Mistrial)
    } else {
        state
            .context
            .get("decision")
            .and_then(|v| serde_json::from_value::<VerdictDecision>(v.clone()).ok())
    };

    let verdict = docket.verdict.as_ref();
    let final_classification = match (decision, verdict) {
        (Some(d), Some(v)) if d != VerdictDecision::Mistrial && !v.final_classification.is_empty() => {
            v.final_classification.clone()
        }
        _ => case.classification.clone(),
    };
    let flipped = matches!(
        decision,
        Some(VerdictDecision::Affirm | VerdictDecision::Amend | VerdictDecision::Acquit)
    ) && final_classification != case.classification;

    let reasoning = match (&mistrial, verdict) {
        (Some(reason), _) => reason.clone(),
        (None, Some(v)) => v.reasoning.clone(),
        (None, None) => String::new(),
    };

    let result = CourtResult {
        activated: true,
        proceeding,
        original_classification: case.classification.clone(),
        decision,
        final_classification,
        confidence: verdict.map(|v| v.confidence).unwrap_or(0.0),
        flipped,
        remand_count: state.loop_count(&verdict_node),
        handoffs,
        reasoning,
        gaps: verdict.map(|v| v.gaps.clone()).unwrap_or_default(),
        state: Some(state),
    };

    info!(
        case_id = %case.case_id,
        decision = ?result.decision,
        flipped = result.flipped,
        remands = result.remand_count,
        handoffs = result.handoffs,
        "Proceeding complete"
    );
    Ok(result)
}

pub async fn run_court(
    config: &CourtConfig,
    case: &CaseFile,
    responder: Arc<dyn Responder>,
    cancel: &CancellationToken,
) -> Result<CourtResult> {
    run_proceeding(Proceeding::Court, config, case, responder, cancel).await
}

pub async fn run_dialectic(
    config: &CourtConfig,
    case: &CaseFile,
    responder: Arc<dyn Responder>,
    cancel: &CancellationToken,
) -> Result<CourtResult> {
    run_proceeding(Proceeding::Dialectic, config, case, responder, cancel).await
}
