//! Adversarial review: a five-stage court (or dialectic) run on the generic
//! graph engine.
//!
//! ```text
//! indict -> discover -> defend -> hearing -> verdict -> _done
//!    ^                                          |
//!    +------------------ remand ----------------+
//! ```
//!
//! Routing lives in the HD1..HD12 edges ([`build_court_edge_factory`]). The
//! [`CourtWalker`] prompts a [`Responder`] for each stage and enforces the
//! handoff bound; [`run_proceeding`] gates activation, applies the TTL and
//! folds content failures into a `mistrial` disposition.

pub mod artifacts;
pub mod config;
pub mod edges;
pub mod gaps;
pub mod hearing;
pub mod nodes;
pub mod prompts;
pub mod remand;
pub mod responder;
pub mod runner;
pub mod walker;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use switchyard_dsl::{load_pipeline, PipelineDef};
use switchyard_types::Result;

pub use artifacts::{
    DefenseBrief, Discovery, EvidenceChallenge, EvidenceItem, HearingRecord, HearingRound,
    Indictment, RemandFeedback, Verdict, VerdictDecision,
};
pub use config::CourtConfig;
pub use edges::build_court_edge_factory;
pub use gaps::{EvidenceGap, EvidenceGapBrief, GapBriefThreshold, GapSeverity};
pub use hearing::hearing_loop;
pub use nodes::court_node_registry;
pub use prompts::Vocabulary;
pub use remand::{inject_remand_context, RemandInjection};
pub use responder::{Responder, ResponderRequest, ScriptedResponder};
pub use runner::{run_court, run_dialectic, run_proceeding, CaseFile, CourtResult};
pub use walker::CourtWalker;

const COURT_PIPELINE: &str = include_str!("../../pipelines/defect-court.yaml");
const DIALECTIC_PIPELINE: &str = include_str!("../../pipelines/defect-dialectic.yaml");

// ---------------------------------------------------------------------------
// CourtStage
// ---------------------------------------------------------------------------

/// A stage of the proceeding. Its string form is the node family used in
/// both pipeline documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourtStage {
    Indict,
    Discover,
    Defend,
    Hearing,
    Verdict,
}

impl CourtStage {
    pub const ALL: [CourtStage; 5] = [
        CourtStage::Indict,
        CourtStage::Discover,
        CourtStage::Defend,
        CourtStage::Hearing,
        CourtStage::Verdict,
    ];

    pub fn family(&self) -> &'static str {
        match self {
            CourtStage::Indict => "indict",
            CourtStage::Discover => "discover",
            CourtStage::Defend => "defend",
            CourtStage::Hearing => "hearing",
            CourtStage::Verdict => "verdict",
        }
    }
}

impl fmt::Display for CourtStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family())
    }
}

impl FromStr for CourtStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CourtStage::ALL
            .into_iter()
            .find(|stage| stage.family() == s)
            .ok_or_else(|| format!("unknown court stage: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Proceeding
// ---------------------------------------------------------------------------

/// Which flavour of adversarial review to run. Both share artifacts, edges
/// and bounds; they differ in node names and role wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proceeding {
    Court,
    Dialectic,
}

impl Proceeding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Proceeding::Court => "court",
            Proceeding::Dialectic => "dialectic",
        }
    }

    /// The bundled pipeline document.
    pub fn pipeline_yaml(&self) -> &'static str {
        match self {
            Proceeding::Court => COURT_PIPELINE,
            Proceeding::Dialectic => DIALECTIC_PIPELINE,
        }
    }

    pub fn pipeline(&self) -> Result<PipelineDef> {
        load_pipeline(self.pipeline_yaml().as_bytes())
    }

    pub fn vocabulary(&self) -> &'static Vocabulary {
        match self {
            Proceeding::Court => &prompts::COURT,
            Proceeding::Dialectic => &prompts::DIALECTIC,
        }
    }
}

impl fmt::Display for Proceeding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Proceeding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "court" => Ok(Proceeding::Court),
            "dialectic" => Ok(Proceeding::Dialectic),
            other => Err(format!("unknown proceeding: {other}")),
        }
    }
}
