//! Named identity templates.
//!
//! Light personas drive the primary pipeline. Shadow personas staff the
//! adversarial review roles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::identity::{AgentIdentity, Alignment, Color, MetaPhase, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub identity: AgentIdentity,
    pub description: String,
}

struct Template {
    name: &'static str,
    color: (&'static str, &'static str, &'static str),
    element: Element,
    position: Position,
    home_zone: MetaPhase,
    stickiness: u8,
    affinity: &'static [(&'static str, f64)],
    tags: [&'static str; 3],
    preamble: &'static str,
    description: &'static str,
}

impl Template {
    fn build(&self, alignment: Alignment) -> Persona {
        let (color, hex, family) = self.color;
        Persona {
            identity: AgentIdentity {
                persona_name: self.name.to_string(),
                color: Color::new(color, hex, family),
                element: self.element,
                position: self.position,
                alignment,
                home_zone: self.home_zone,
                stickiness_level: self.stickiness,
                step_affinity: self
                    .affinity
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect::<HashMap<_, _>>(),
                personality_tags: self.tags.iter().map(|t| t.to_string()).collect(),
                prompt_preamble: self.preamble.to_string(),
            },
            description: self.description.to_string(),
        }
    }
}

const LIGHT: [Template; 4] = [
    Template {
        name: "Herald",
        color: ("Crimson", "#DC143C", "Reds"),
        element: Element::Fire,
        position: Position::PointGuard,
        home_zone: MetaPhase::Backcourt,
        stickiness: 0,
        affinity: &[
            ("recall", 0.9),
            ("triage", 0.8),
            ("resolve", 0.3),
            ("investigate", 0.2),
            ("correlate", 0.3),
            ("review", 0.4),
            ("report", 0.5),
        ],
        tags: ["fast", "decisive", "optimistic"],
        preamble: "You are the Herald: a fast, optimistic classifier. Prioritize speed and clear categorization.",
        description: "Fast intake, optimistic classification",
    },
    Template {
        name: "Seeker",
        color: ("Cerulean", "#007BA7", "Blues"),
        element: Element::Water,
        position: Position::Center,
        home_zone: MetaPhase::Frontcourt,
        stickiness: 3,
        affinity: &[
            ("recall", 0.2),
            ("triage", 0.3),
            ("resolve", 0.6),
            ("investigate", 0.9),
            ("correlate", 0.7),
            ("review", 0.5),
            ("report", 0.3),
        ],
        tags: ["analytical", "thorough", "evidence-first"],
        preamble: "You are the Seeker: a deep investigator. Build evidence chains methodically. Cite every source.",
        description: "Deep investigator, builds evidence chains",
    },
    Template {
        name: "Sentinel",
        color: ("Cobalt", "#0047AB", "Blues"),
        element: Element::Earth,
        position: Position::PowerForward,
        home_zone: MetaPhase::Frontcourt,
        stickiness: 2,
        affinity: &[
            ("recall", 0.3),
            ("triage", 0.4),
            ("resolve", 0.9),
            ("investigate", 0.6),
            ("correlate", 0.5),
            ("review", 0.7),
            ("report", 0.4),
        ],
        tags: ["methodical", "steady", "convergence-first"],
        preamble: "You are the Sentinel: a steady resolver. Follow proven paths and drive toward convergence.",
        description: "Steady resolver, follows proven paths",
    },
    Template {
        name: "Weaver",
        color: ("Amber", "#FFBF00", "Yellows"),
        element: Element::Air,
        position: Position::ShootingGuard,
        home_zone: MetaPhase::Paint,
        stickiness: 1,
        affinity: &[
            ("recall", 0.3),
            ("triage", 0.4),
            ("resolve", 0.4),
            ("investigate", 0.5),
            ("correlate", 0.8),
            ("review", 0.9),
            ("report", 0.9),
        ],
        tags: ["balanced", "holistic", "synthesizing"],
        preamble: "You are the Weaver: a holistic closer. Synthesize all findings into a coherent narrative.",
        description: "Holistic closer, synthesizes findings",
    },
];

const SHADOW: [Template; 4] = [
    Template {
        name: "Challenger",
        color: ("Scarlet", "#FF2400", "Reds"),
        element: Element::Fire,
        position: Position::PointGuard,
        home_zone: MetaPhase::Backcourt,
        stickiness: 0,
        affinity: &[
            ("challenge", 0.9),
            ("cross-examine", 0.7),
            ("counter-investigate", 0.3),
            ("rebut", 0.4),
            ("verdict", 0.3),
        ],
        tags: ["aggressive", "skeptical", "challenging"],
        preamble: "You are the Challenger: an aggressive skeptic. Reject weak evidence and force deeper investigation.",
        description: "Aggressive skeptic, rejects weak triage",
    },
    Template {
        name: "Abyss",
        color: ("Sapphire", "#0F52BA", "Blues"),
        element: Element::Water,
        position: Position::Center,
        home_zone: MetaPhase::Frontcourt,
        stickiness: 3,
        affinity: &[
            ("challenge", 0.3),
            ("cross-examine", 0.5),
            ("counter-investigate", 0.9),
            ("rebut", 0.7),
            ("verdict", 0.4),
        ],
        tags: ["deep", "adversarial", "counter-evidence"],
        preamble: "You are the Abyss: a deep adversary. Find counter-evidence that undermines the prosecution's case.",
        description: "Deep adversary, finds counter-evidence",
    },
    Template {
        name: "Bulwark",
        color: ("Iron", "#48494B", "Neutrals"),
        element: Element::Diamond,
        position: Position::PowerForward,
        home_zone: MetaPhase::Frontcourt,
        stickiness: 2,
        affinity: &[
            ("challenge", 0.4),
            ("cross-examine", 0.8),
            ("counter-investigate", 0.6),
            ("rebut", 0.5),
            ("verdict", 0.9),
        ],
        tags: ["precise", "uncompromising", "tempered"],
        preamble: "You are the Bulwark: a precision verifier. Shatter ambiguity with forensic detail.",
        description: "Precision verifier, shatters ambiguity",
    },
    Template {
        name: "Specter",
        color: ("Obsidian", "#3C3C3C", "Neutrals"),
        element: Element::Lightning,
        position: Position::ShootingGuard,
        home_zone: MetaPhase::Paint,
        stickiness: 0,
        affinity: &[
            ("challenge", 0.5),
            ("cross-examine", 0.4),
            ("counter-investigate", 0.3),
            ("rebut", 0.9),
            ("verdict", 0.8),
        ],
        tags: ["fast", "disruptive", "contradiction-seeking"],
        preamble: "You are the Specter: fastest path to contradiction. Find the fatal flaw in the argument.",
        description: "Fastest path to contradiction",
    },
];

pub fn light_personas() -> Vec<Persona> {
    LIGHT.iter().map(|t| t.build(Alignment::Light)).collect()
}

pub fn shadow_personas() -> Vec<Persona> {
    SHADOW.iter().map(|t| t.build(Alignment::Shadow)).collect()
}

/// All eight personas, Light first.
pub fn all_personas() -> Vec<Persona> {
    let mut all = light_personas();
    all.extend(shadow_personas());
    all
}

/// Case-insensitive lookup by persona name.
pub fn persona_by_name(name: &str) -> Option<Persona> {
    LIGHT
        .iter()
        .map(|t| (t, Alignment::Light))
        .chain(SHADOW.iter().map(|t| (t, Alignment::Shadow)))
        .find(|(t, _)| t.name.eq_ignore_ascii_case(name.trim()))
        .map(|(t, alignment)| t.build(alignment))
}
