//! Generative and destructive interactions between elements.
//!
//! The generative cycle is the natural hand-off order for a light pipeline
//! (fire, earth, water, air, back to fire). The destructive cycle pairs each
//! core element with the one it challenges, which is how shadow agents are
//! matched against light ones.

use serde::{Deserialize, Serialize};

use crate::element::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleType {
    Generative,
    Destructive,
}

/// A directed interaction from one element to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRule {
    pub cycle: CycleType,
    pub from: Element,
    pub to: Element,
    pub interaction: String,
}

impl CycleRule {
    fn new(cycle: CycleType, from: Element, to: Element, interaction: &str) -> Self {
        Self {
            cycle,
            from,
            to,
            interaction: interaction.to_string(),
        }
    }
}

/// Four main transitions plus the Lightning and Diamond self-rules, which
/// modify any generative step rather than joining the sequence.
pub fn generative_cycle() -> Vec<CycleRule> {
    use Element::*;
    let g = CycleType::Generative;
    vec![
        CycleRule::new(g, Fire, Earth, "classification provides structure for steady investigation"),
        CycleRule::new(g, Earth, Water, "stable repo selection enables deep code investigation"),
        CycleRule::new(g, Water, Air, "deep evidence enables holistic synthesis"),
        CycleRule::new(g, Air, Fire, "synthesis reveals patterns for re-classification"),
        CycleRule::new(g, Lightning, Lightning, "lightning shortcuts any generative step"),
        CycleRule::new(g, Diamond, Diamond, "diamond validates any generative step"),
    ]
}

pub fn destructive_cycle() -> Vec<CycleRule> {
    use Element::*;
    let d = CycleType::Destructive;
    vec![
        CycleRule::new(d, Fire, Water, "aggressive challenge forces deeper evidence"),
        CycleRule::new(d, Water, Earth, "depth destabilizes stable conclusions"),
        CycleRule::new(d, Earth, Fire, "methodical evidence extinguishes hasty challenges"),
        CycleRule::new(d, Lightning, Diamond, "speed exposes brittleness to ambiguity"),
        CycleRule::new(d, Diamond, Air, "precision grounds vague synthesis"),
        CycleRule::new(d, Air, Lightning, "breadth covers narrow shortcut mistakes"),
    ]
}

/// The element that follows `from` in the main generative sequence.
///
/// `None` for Lightning and Diamond (modifiers) and for Iron.
pub fn next_generative(from: Element) -> Option<Element> {
    match from {
        Element::Fire => Some(Element::Earth),
        Element::Earth => Some(Element::Water),
        Element::Water => Some(Element::Air),
        Element::Air => Some(Element::Fire),
        Element::Lightning | Element::Diamond | Element::Iron => None,
    }
}

/// The element `from` challenges in the destructive cycle.
pub fn challenges(from: Element) -> Option<Element> {
    destructive_cycle()
        .into_iter()
        .find(|r| r.from == from)
        .map(|r| r.to)
}

/// The element that challenges `target` in the destructive cycle.
pub fn challenged_by(target: Element) -> Option<Element> {
    destructive_cycle()
        .into_iter()
        .find(|r| r.to == target)
        .map(|r| r.from)
}
