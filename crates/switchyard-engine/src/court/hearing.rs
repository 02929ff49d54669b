//! Hearing rounds between prosecution and defense.

use serde::Deserialize;
use tracing::debug;

use switchyard_types::{Result, SwitchyardError};

use crate::court::artifacts::{DefenseBrief, HearingRecord, HearingRound, Indictment};
use crate::court::prompts::Vocabulary;
use crate::court::responder::{Responder, ResponderRequest};
use crate::court::CourtStage;

#[derive(Debug, Deserialize)]
struct RoundResponse {
    #[serde(default, alias = "prosecution_argument", alias = "thesis_argument")]
    argument: String,
    #[serde(default, alias = "defense_rebuttal", alias = "antithesis_rebuttal")]
    rebuttal: String,
    #[serde(default, alias = "judge_notes", alias = "arbiter_notes")]
    notes: String,
    #[serde(default)]
    converged: bool,
}

/// Runs up to `max_rounds` argument/rebuttal rounds, stopping after the
/// first round that reports convergence.
///
/// Reaching the cap without convergence is a normal outcome. A responder
/// failure is returned as-is; an unparseable round is a mistrial.
pub async fn hearing_loop(
    responder: &dyn Responder,
    vocabulary: &Vocabulary,
    case_id: &str,
    indictment: Option<&Indictment>,
    defense: Option<&DefenseBrief>,
    max_rounds: u32,
) -> Result<HearingRecord> {
    let mut record = HearingRecord::new(max_rounds);

    for round in 1..=max_rounds {
        let request = ResponderRequest {
            case_id: case_id.to_string(),
            stage: CourtStage::Hearing,
            prompt: vocabulary.round_prompt(round, case_id, indictment, defense, &record),
        };
        let raw = responder.respond(&request).await?;
        let parsed: RoundResponse =
            serde_json::from_value(raw).map_err(|e| SwitchyardError::Mistrial {
                stage: CourtStage::Hearing.to_string(),
                reason: format!("round {round}: {e}"),
            })?;

        record.rounds.push(HearingRound {
            round,
            argument: parsed.argument,
            rebuttal: parsed.rebuttal,
            notes: parsed.notes,
        });
        debug!(case_id, round, converged = parsed.converged, "Hearing round complete");

        if parsed.converged {
            record.converged = true;
            break;
        }
    }

    Ok(record)
}
