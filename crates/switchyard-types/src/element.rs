//! Behavioral archetypes that govern how a walker moves through a graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Lightning,
    Earth,
    Diamond,
    Water,
    Air,
    /// Derived from Earth through calibration; see [`iron_from_earth`].
    Iron,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Fastest,
    Fast,
    Steady,
    Precise,
    Deep,
    Holistic,
}

/// Quantified behavior for an element, consumed by schedulers and loop control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTraits {
    pub element: Element,
    pub speed: SpeedClass,
    pub max_loops: u32,
    pub convergence_threshold: f64,
    /// 0.0 to 1.0.
    pub shortcut_affinity: f64,
    pub evidence_depth: u32,
    pub failure_mode: String,
}

const CORE: [Element; 6] = [
    Element::Fire,
    Element::Lightning,
    Element::Earth,
    Element::Diamond,
    Element::Water,
    Element::Air,
];

impl Element {
    /// The six core elements. Iron is derived and excluded.
    pub fn all() -> Vec<Element> {
        CORE.to_vec()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Lightning => "lightning",
            Element::Earth => "earth",
            Element::Diamond => "diamond",
            Element::Water => "water",
            Element::Air => "air",
            Element::Iron => "iron",
        }
    }

    /// Canonical trait set. Iron reports its zero-accuracy derivation.
    pub fn traits(&self) -> ElementTraits {
        let (speed, max_loops, convergence_threshold, shortcut_affinity, evidence_depth, failure) =
            match self {
                Element::Fire => (SpeedClass::Fast, 0, 0.50, 0.9, 2, "burns out (token waste)"),
                Element::Lightning => (
                    SpeedClass::Fastest,
                    0,
                    0.40,
                    1.0,
                    1,
                    "brittle (wrong path, no recovery)",
                ),
                Element::Earth => (SpeedClass::Steady, 1, 0.70, 0.1, 5, "bloat (too many steps)"),
                Element::Diamond => (
                    SpeedClass::Precise,
                    0,
                    0.95,
                    0.5,
                    10,
                    "shatters (ambiguity kills it)",
                ),
                Element::Water => (SpeedClass::Deep, 3, 0.85, 0.1, 8, "slow (analysis paralysis)"),
                Element::Air => (
                    SpeedClass::Holistic,
                    1,
                    0.60,
                    0.6,
                    3,
                    "floaty (vague, no evidence)",
                ),
                Element::Iron => return iron_from_earth(0.0),
            };
        ElementTraits {
            element: *self,
            speed,
            max_loops,
            convergence_threshold,
            shortcut_affinity,
            evidence_depth,
            failure_mode: failure.to_string(),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Element {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fire" => Ok(Element::Fire),
            "lightning" => Ok(Element::Lightning),
            "earth" => Ok(Element::Earth),
            "diamond" => Ok(Element::Diamond),
            "water" => Ok(Element::Water),
            "air" => Ok(Element::Air),
            "iron" => Ok(Element::Iron),
            other => Err(format!("unknown element: {other}")),
        }
    }
}

/// Derives Iron traits from Earth, tightened by historical accuracy (0.0 to 1.0).
///
/// `max_loops = max(0, earth.max_loops - floor(accuracy * 2))` and
/// `convergence_threshold = earth.convergence_threshold + (1 - accuracy) * 0.1`.
pub fn iron_from_earth(accuracy: f64) -> ElementTraits {
    let earth = Element::Earth.traits();
    let reduction = (accuracy * 2.0).floor().max(0.0) as u32;
    ElementTraits {
        element: Element::Iron,
        speed: earth.speed,
        max_loops: earth.max_loops.saturating_sub(reduction),
        convergence_threshold: earth.convergence_threshold + (1.0 - accuracy) * 0.1,
        shortcut_affinity: earth.shortcut_affinity,
        evidence_depth: earth.evidence_depth,
        failure_mode: "rigid (over-calibrated to past data)".to_string(),
    }
}
