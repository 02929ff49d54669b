//! Heuristic routing edges HD1 through HD12.
//!
//! Each edge reads its endpoints from the pipeline document, so the same
//! factory serves the court and dialectic graphs. An edge handed an artifact
//! of the wrong type simply does not fire.

use serde_json::json;
use switchyard_dsl::EdgeDef;
use switchyard_types::WalkerState;

use crate::court::artifacts::{DefenseBrief, HearingRecord, Indictment, Verdict, VerdictDecision};
use crate::court::config::CourtConfig;
use crate::edge::{Edge, EdgeFactory, Transition};
use crate::node::Artifact;

/// Indictment confidence at or above which discovery is skipped.
pub const FAST_TRACK_CONFIDENCE: f64 = 0.95;

pub const FAST_TRACK_EDGE: &str = "HD1";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Rule {
    FastTrack,
    PleaDeal,
    Challenged,
    Alternative,
    HearingClosed,
    Decision(VerdictDecision),
    /// Remand with no handoff left for the next stage. This does not reserve
    /// a whole remand cycle; a cycle that runs short mid-way ends at the
    /// walker's handoff bound instead.
    HandoffsExhausted { max_handoffs: usize },
    Remand { max_remands: u32 },
    RemandsExhausted,
}

#[derive(Debug, Clone)]
struct CourtEdge {
    def: EdgeDef,
    rule: Rule,
}

/// True when the walk reached this stage through the HD1 fast track.
fn fast_tracked(state: &WalkerState) -> bool {
    state
        .history
        .last()
        .is_some_and(|step| step.edge_id == FAST_TRACK_EDGE)
}

impl CourtEdge {
    fn go(&self, explanation: String) -> Option<Transition> {
        Some(Transition::to(&self.def.to, explanation))
    }

    fn on_indictment(&self, ind: &Indictment) -> Option<Transition> {
        match self.rule {
            Rule::FastTrack if ind.confidence >= FAST_TRACK_CONFIDENCE => self.go(format!(
                "indictment confidence {:.2} >= {FAST_TRACK_CONFIDENCE}",
                ind.confidence
            )),
            _ => None,
        }
    }

    fn on_defense(&self, brief: &DefenseBrief, state: &WalkerState) -> Option<Transition> {
        match self.rule {
            Rule::PleaDeal if brief.plea_deal => self.go("defense accepted the charge".into()),
            Rule::Challenged if !brief.challenges.is_empty() && !fast_tracked(state) => self.go(
                format!("defense challenged {} evidence item(s)", brief.challenges.len()),
            ),
            Rule::Alternative if !fast_tracked(state) => brief
                .alternative()
                .and_then(|alt| self.go(format!("defense proposed: {alt}"))),
            _ => None,
        }
    }

    fn on_hearing(&self, record: &HearingRecord) -> Option<Transition> {
        match self.rule {
            Rule::HearingClosed if record.is_closed() => self.go(if record.converged {
                format!("hearing converged after {} round(s)", record.rounds.len())
            } else {
                format!("hearing reached its cap of {} round(s)", record.max_rounds)
            }),
            _ => None,
        }
    }

    fn on_verdict(&self, verdict: &Verdict, state: &mut WalkerState) -> Option<Transition> {
        let decided = |t: Transition| {
            Some(
                t.with_context("decision", json!(verdict.decision.as_str()))
                    .with_context("final_classification", json!(verdict.final_classification)),
            )
        };
        let mistrial = |t: Transition, reason: &str| {
            Some(
                t.with_context("decision", json!(verdict.decision.as_str()))
                    .with_context("disposition", json!("mistrial"))
                    .with_context("mistrial_reason", json!(reason)),
            )
        };

        match self.rule {
            Rule::Decision(d) if verdict.decision == d => {
                decided(Transition::to(&self.def.to, format!("verdict: {d}")))
            }
            Rule::HandoffsExhausted { max_handoffs }
                if verdict.decision == VerdictDecision::Remand
                    && state.history.len() + 1 >= max_handoffs =>
            {
                let reason = format!("remand with the handoff budget of {max_handoffs} spent");
                mistrial(Transition::to(&self.def.to, reason.clone()), &reason)
            }
            Rule::Remand { max_remands } if verdict.decision == VerdictDecision::Remand => {
                // Counted per source node so the dialectic graph's "synthesis"
                // node gets its own counter.
                if state.loop_count(&self.def.from) >= max_remands {
                    return None;
                }
                let n = state.increment_loop(&self.def.from);
                Some(
                    Transition::to(&self.def.to, format!("remand {n} of {max_remands}"))
                        .with_context("decision", json!("remand"))
                        .with_context("remand_count", json!(n)),
                )
            }
            Rule::RemandsExhausted if verdict.decision == VerdictDecision::Remand => {
                let reason = "remand with the remand budget spent";
                mistrial(Transition::to(&self.def.to, reason), reason)
            }
            _ => None,
        }
    }
}

impl Edge for CourtEdge {
    fn id(&self) -> &str {
        &self.def.id
    }
    fn source(&self) -> &str {
        &self.def.from
    }
    fn target(&self) -> &str {
        &self.def.to
    }
    fn is_shortcut(&self) -> bool {
        self.def.shortcut
    }
    fn is_loop(&self) -> bool {
        self.def.is_loop
    }

    fn evaluate(&self, artifact: &dyn Artifact, state: &mut WalkerState) -> Option<Transition> {
        if let Some(ind) = artifact.downcast_ref::<Indictment>() {
            return self.on_indictment(ind);
        }
        if let Some(brief) = artifact.downcast_ref::<DefenseBrief>() {
            return self.on_defense(brief, state);
        }
        if let Some(record) = artifact.downcast_ref::<HearingRecord>() {
            return self.on_hearing(record);
        }
        if let Some(verdict) = artifact.downcast_ref::<Verdict>() {
            return self.on_verdict(verdict, state);
        }
        None
    }
}

/// Registers HD1 through HD12. Ids not listed here (stage-to-stage links)
/// fall back to pass-through edges.
pub fn build_court_edge_factory(config: &CourtConfig) -> EdgeFactory {
    let rules = [
        ("HD1", Rule::FastTrack),
        ("HD2", Rule::PleaDeal),
        ("HD3", Rule::Challenged),
        ("HD4", Rule::Alternative),
        ("HD5", Rule::HearingClosed),
        ("HD6", Rule::Decision(VerdictDecision::Affirm)),
        ("HD7", Rule::Decision(VerdictDecision::Amend)),
        (
            "HD8",
            Rule::Remand {
                max_remands: config.max_remands,
            },
        ),
        ("HD9", Rule::Decision(VerdictDecision::Acquit)),
        (
            "HD10",
            Rule::HandoffsExhausted {
                max_handoffs: config.max_handoffs,
            },
        ),
        ("HD11", Rule::RemandsExhausted),
        ("HD12", Rule::Decision(VerdictDecision::Mistrial)),
    ];

    let mut factory = EdgeFactory::new();
    for (id, rule) in rules {
        factory.register(id, move |def: &EdgeDef| {
            Box::new(CourtEdge {
                def: def.clone(),
                rule,
            }) as Box<dyn Edge>
        });
    }
    factory
}
