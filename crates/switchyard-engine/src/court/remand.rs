//! Feedback carried from a remand verdict into the next indictment.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::court::artifacts::{DefenseBrief, Verdict, VerdictDecision};
use crate::court::gaps::EvidenceGap;
use crate::court::prompts::Vocabulary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemandInjection {
    pub case_id: String,
    pub challenged_evidence: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_hypothesis: Option<String>,
    pub specific_questions: Vec<String>,
    pub original_classification: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<EvidenceGap>,
}

impl RemandInjection {
    /// `None` unless `verdict` is a remand carrying feedback. The defense's
    /// alternative hypothesis, when it has one, takes precedence over the
    /// verdict's.
    pub fn from_verdict(
        case_id: &str,
        verdict: &Verdict,
        defense: Option<&DefenseBrief>,
        original_classification: &str,
    ) -> Option<Self> {
        if verdict.decision != VerdictDecision::Remand {
            return None;
        }
        let feedback = verdict.remand_feedback.as_ref()?;
        let alternative = defense
            .and_then(DefenseBrief::alternative)
            .map(str::to_string)
            .or_else(|| feedback.alternative_hypothesis.clone());

        Some(Self {
            case_id: case_id.to_string(),
            challenged_evidence: feedback.challenged_evidence.clone(),
            alternative_hypothesis: alternative,
            specific_questions: feedback.specific_questions.clone(),
            original_classification: original_classification.to_string(),
            gaps: verdict.gaps.clone(),
        })
    }
}

/// Appends a remand feedback block to `prompt`. Returns `prompt` unchanged
/// when there is nothing to inject.
pub fn inject_remand_context(
    prompt: &str,
    injection: Option<&RemandInjection>,
    vocabulary: &Vocabulary,
) -> String {
    let Some(inj) = injection else {
        return prompt.to_string();
    };
    let banner = vocabulary.name.to_uppercase();

    let mut out = String::from(prompt);
    let _ = write!(
        out,
        "\n\n--- {banner} REMAND FEEDBACK ---\n\
         {} has remanded case {} for reinvestigation.\n\
         Original classification: {}\n",
        vocabulary.tribunal, inj.case_id, inj.original_classification
    );
    if let Some(alt) = &inj.alternative_hypothesis {
        let _ = writeln!(
            out,
            "Alternative hypothesis from {}: {alt}",
            vocabulary.defense.to_lowercase()
        );
    }
    if !inj.challenged_evidence.is_empty() {
        out.push_str("Challenged evidence indices (address these gaps):\n");
        for idx in &inj.challenged_evidence {
            let _ = writeln!(out, "  - Evidence item #{idx}");
        }
    }
    if !inj.specific_questions.is_empty() {
        let _ = writeln!(out, "Specific questions from the {}:", vocabulary.name.to_lowercase());
        for (i, q) in inj.specific_questions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {q}", i + 1);
        }
    }
    let _ = writeln!(out, "--- END {banner} FEEDBACK ---");
    out
}
