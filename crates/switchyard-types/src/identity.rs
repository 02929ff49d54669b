//! Identity axes for agents that walk a graph.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::Element;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub name: String,
    pub display_name: String,
    pub hex: String,
    pub family: String,
}

impl Color {
    pub fn new(name: &str, hex: &str, family: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            hex: hex.to_string(),
            family: family.to_string(),
        }
    }
}

/// Court position, borrowed from basketball roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "PG")]
    PointGuard,
    #[serde(rename = "SG")]
    ShootingGuard,
    #[serde(rename = "PF")]
    PowerForward,
    #[serde(rename = "C")]
    Center,
}

impl Position {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Light,
    Shadow,
}

/// Coarse region of a pipeline an agent calls home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaPhase {
    Backcourt,
    Frontcourt,
    Paint,
}

impl fmt::Display for MetaPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetaPhase::Backcourt => "backcourt",
            MetaPhase::Frontcourt => "frontcourt",
            MetaPhase::Paint => "paint",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub persona_name: String,
    pub color: Color,
    pub element: Element,
    pub position: Position,
    pub alignment: Alignment,
    pub home_zone: MetaPhase,
    /// 0 (roams freely) to 3 (never leaves its home zone).
    pub stickiness_level: u8,
    /// Node family to preference weight, 0.0 to 1.0.
    #[serde(default)]
    pub step_affinity: HashMap<String, f64>,
    #[serde(default)]
    pub personality_tags: Vec<String>,
    #[serde(default)]
    pub prompt_preamble: String,
}

impl AgentIdentity {
    /// Affinity for a node family; unlisted families score zero.
    pub fn affinity_for(&self, family: &str) -> f64 {
        self.step_affinity.get(family).copied().unwrap_or(0.0)
    }

    /// The family this identity prefers most. Ties break alphabetically.
    pub fn preferred_step(&self) -> Option<&str> {
        let mut entries: Vec<(&String, &f64)> = self.step_affinity.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries.first().map(|(k, _)| k.as_str())
    }
}
