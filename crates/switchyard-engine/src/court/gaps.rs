//! Evidence gaps: "I don't know because X."
//!
//! A verdict can list the gaps that kept it from a confident outcome, and a
//! low-confidence run can emit an [`EvidenceGapBrief`] instead of a
//! classification.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::node::Artifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceGap {
    pub description: String,
    #[serde(default)]
    pub source: String,
    pub severity: GapSeverity,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suggested_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceGapBrief {
    pub case_id: String,
    pub final_confidence: f64,
    pub gaps: Vec<EvidenceGap>,
    #[serde(default)]
    pub summary: String,
}

impl EvidenceGapBrief {
    /// Builds a brief, keeping the most severe gaps up to `threshold.max_gaps`.
    pub fn from_gaps(
        case_id: impl Into<String>,
        final_confidence: f64,
        mut gaps: Vec<EvidenceGap>,
        threshold: &GapBriefThreshold,
    ) -> Self {
        gaps.sort_by_key(|g| g.severity);
        gaps.truncate(threshold.max_gaps);
        let summary = match gaps.first() {
            Some(top) => format!(
                "{} gap(s); most severe: {} ({:?})",
                gaps.len(),
                top.description,
                top.severity
            ),
            None => "no gaps recorded".to_string(),
        };
        Self {
            case_id: case_id.into(),
            final_confidence,
            gaps,
            summary,
        }
    }
}

impl Artifact for EvidenceGapBrief {
    fn kind(&self) -> &str {
        "evidence_gap_brief"
    }
    fn confidence(&self) -> f64 {
        self.final_confidence
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// When to emit a gap brief instead of a confident classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapBriefThreshold {
    pub min_confidence: f64,
    pub max_gaps: usize,
}

impl Default for GapBriefThreshold {
    fn default() -> Self {
        Self {
            min_confidence: 0.50,
            max_gaps: 10,
        }
    }
}

impl GapBriefThreshold {
    pub fn should_produce(&self, confidence: f64) -> bool {
        confidence < self.min_confidence
    }
}
