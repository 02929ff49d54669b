//! Stage payloads for adversarial review.
//!
//! Field names follow the court vocabulary. The dialectic vocabulary
//! (thesis, antithesis, synthesis, concession, negation) is accepted on input
//! through serde aliases, so one set of types serves both proceedings.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::court::gaps::EvidenceGap;
use crate::node::Artifact;

// ---------------------------------------------------------------------------
// VerdictDecision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictDecision {
    Affirm,
    Amend,
    Acquit,
    Remand,
    #[serde(alias = "unresolved")]
    Mistrial,
}

impl VerdictDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictDecision::Affirm => "affirm",
            VerdictDecision::Amend => "amend",
            VerdictDecision::Acquit => "acquit",
            VerdictDecision::Remand => "remand",
            VerdictDecision::Mistrial => "mistrial",
        }
    }

    /// Every decision except remand ends the proceeding.
    pub fn is_final(&self) -> bool {
        !matches!(self, VerdictDecision::Remand)
    }
}

impl fmt::Display for VerdictDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Indictment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indictment {
    #[serde(alias = "charged_defect_type")]
    pub charged_classification: String,
    #[serde(default, alias = "prosecution_narrative", alias = "thesis_narrative")]
    pub narrative: String,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    #[serde(default)]
    pub confidence: f64,
}

impl Artifact for Indictment {
    fn kind(&self) -> &str {
        "indictment"
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Untyped discovery output, kept verbatim for later stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub raw: serde_json::Value,
}

impl Artifact for Discovery {
    fn kind(&self) -> &str {
        "discovery"
    }
    fn confidence(&self) -> f64 {
        0.0
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// DefenseBrief
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChallenge {
    pub evidence_index: usize,
    pub challenge: String,
    #[serde(default)]
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DefenseBrief {
    #[serde(default)]
    pub challenges: Vec<EvidenceChallenge>,
    #[serde(
        default,
        alias = "counter_hypothesis",
        skip_serializing_if = "Option::is_none"
    )]
    pub alternative_hypothesis: Option<String>,
    #[serde(default, alias = "concession")]
    pub plea_deal: bool,
    #[serde(default)]
    pub confidence: f64,
}

impl DefenseBrief {
    /// The alternative hypothesis, if it carries any text.
    pub fn alternative(&self) -> Option<&str> {
        self.alternative_hypothesis
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Artifact for DefenseBrief {
    fn kind(&self) -> &str {
        "defense_brief"
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// HearingRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HearingRound {
    pub round: u32,
    #[serde(alias = "prosecution_argument", alias = "thesis_argument")]
    pub argument: String,
    #[serde(alias = "defense_rebuttal", alias = "antithesis_rebuttal")]
    pub rebuttal: String,
    #[serde(alias = "judge_notes", alias = "arbiter_notes")]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HearingRecord {
    #[serde(default)]
    pub rounds: Vec<HearingRound>,
    pub max_rounds: u32,
    #[serde(default)]
    pub converged: bool,
}

impl HearingRecord {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            rounds: Vec::new(),
            max_rounds,
            converged: false,
        }
    }

    /// Converged, or the round cap has been reached.
    pub fn is_closed(&self) -> bool {
        self.converged || self.rounds.len() as u32 >= self.max_rounds
    }
}

impl Artifact for HearingRecord {
    fn kind(&self) -> &str {
        "hearing_record"
    }
    fn confidence(&self) -> f64 {
        0.0
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// What the court wants looked at again after a remand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemandFeedback {
    #[serde(default)]
    pub challenged_evidence: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_hypothesis: Option<String>,
    #[serde(default)]
    pub specific_questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(alias = "synthesis")]
    pub decision: VerdictDecision,
    #[serde(default)]
    pub final_classification: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(
        default,
        alias = "negation_feedback",
        skip_serializing_if = "Option::is_none"
    )]
    pub remand_feedback: Option<RemandFeedback>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<EvidenceGap>,
}

impl Artifact for Verdict {
    fn kind(&self) -> &str {
        "verdict"
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}
