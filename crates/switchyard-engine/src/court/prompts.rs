//! Role prompts for each stage, in court or dialectic wording.

use std::fmt::Write as _;

use crate::court::artifacts::{DefenseBrief, HearingRecord, Indictment};
use crate::court::CourtStage;

/// The words a proceeding uses for its roles and banners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// "Court" or "Dialectic", as used in prompt headers.
    pub name: &'static str,
    /// Header word for one convergence round.
    pub round: &'static str,
    pub prosecution: &'static str,
    pub defense: &'static str,
    pub judge_notes: &'static str,
    pub concession: &'static str,
    /// Who issues a remand, e.g. "The Defect Court".
    pub tribunal: &'static str,
    indict: &'static str,
    discover: &'static str,
    defend: &'static str,
    hearing: &'static str,
    verdict: &'static str,
}

pub static COURT: Vocabulary = Vocabulary {
    name: "Court",
    round: "Hearing",
    prosecution: "Prosecution",
    defense: "Defense",
    judge_notes: "Judge notes",
    concession: "plea_deal",
    tribunal: "The Defect Court",
    indict: "Role: Prosecution (Challenger). Examine the upstream evidence and produce an \
             Indictment with charged classification, prosecution narrative, and itemized \
             evidence with weights.",
    discover: "Role: Discovery. Identify additional evidence sources not examined by prosecution.",
    defend: "Role: Defense (Abyss). Challenge the prosecution's evidence, propose alternative \
             hypotheses, or offer a plea deal if the evidence is overwhelming.",
    hearing: "Role: Judge (Bulwark). Evaluate prosecution and defense arguments. Produce \
              hearing notes and determine if the hearing has converged.",
    verdict: "Role: Judge (Specter). Render final verdict: affirm, amend, acquit, remand, or \
              mistrial. Include reasoning and confidence.",
};

pub static DIALECTIC: Vocabulary = Vocabulary {
    name: "Dialectic",
    round: "Dialectic",
    prosecution: "Thesis",
    defense: "Antithesis",
    judge_notes: "Arbiter notes",
    concession: "concession",
    tribunal: "The dialectic",
    indict: "Role: Thesis-holder (Challenger). Examine the upstream evidence and produce a \
             thesis with charged classification, thesis narrative, and itemized evidence \
             with weights.",
    discover: "Role: Discovery. Identify additional evidence sources not examined by the \
               thesis-holder.",
    defend: "Role: Antithesis-holder (Abyss). Challenge the thesis-holder's evidence, propose \
             alternative hypotheses, or concede if the evidence is overwhelming.",
    hearing: "Role: Arbiter (Bulwark). Evaluate thesis and antithesis arguments. Produce \
              dialectic notes and determine if the dialectic has converged.",
    verdict: "Role: Arbiter (Specter). Render final synthesis: affirm, amend, acquit, remand, \
              or unresolved. Include reasoning and confidence.",
};

impl Vocabulary {
    pub fn role(&self, stage: CourtStage) -> &'static str {
        match stage {
            CourtStage::Indict => self.indict,
            CourtStage::Discover => self.discover,
            CourtStage::Defend => self.defend,
            CourtStage::Hearing => self.hearing,
            CourtStage::Verdict => self.verdict,
        }
    }

    /// The prompt for a single-shot stage. `prior` is the previous stage's
    /// raw response, echoed so each role sees what it answers.
    pub fn stage_prompt(
        &self,
        stage: CourtStage,
        case_id: &str,
        classification: &str,
        confidence: f64,
        prior: Option<&serde_json::Value>,
    ) -> String {
        let mut prompt = format!(
            "Case: {case_id}\nUpstream classification: {classification} (confidence: {confidence:.2})\n{} step: {stage}\n",
            self.name
        );
        if let Some(prior) = prior {
            let _ = write!(
                prompt,
                "\nPrior {} artifact:\n{prior}\n",
                self.name.to_lowercase()
            );
        }
        prompt.push('\n');
        prompt.push_str(self.role(stage));
        prompt
    }

    /// The prompt for one convergence round.
    pub fn round_prompt(
        &self,
        round: u32,
        case_id: &str,
        indictment: Option<&Indictment>,
        defense: Option<&DefenseBrief>,
        record: &HearingRecord,
    ) -> String {
        let mut prompt = format!(
            "{} round {round} of {} for case {case_id}.\n",
            self.round, record.max_rounds
        );

        if let Some(ind) = indictment {
            let _ = write!(
                prompt,
                "\n{} charge: {} (confidence: {:.2})\nNarrative: {}\n",
                self.prosecution, ind.charged_classification, ind.confidence, ind.narrative
            );
        }
        if let Some(brief) = defense {
            let _ = write!(
                prompt,
                "\n{} position: {}={}, alternative={}\n",
                self.defense,
                self.concession,
                brief.plea_deal,
                brief.alternative().unwrap_or("")
            );
        }
        if let Some(last) = record.rounds.last() {
            let _ = write!(
                prompt,
                "\nPrior round {}:\n  {}: {}\n  {}: {}\n  {}: {}\n",
                last.round,
                self.prosecution,
                last.argument,
                self.defense,
                last.rebuttal,
                self.judge_notes,
                last.notes
            );
        }

        prompt.push_str(
            "\nProduce a round: argument, rebuttal, notes, and whether the debate has \
             converged. Output JSON with fields: argument, rebuttal, notes, converged (bool).",
        );
        prompt
    }
}
