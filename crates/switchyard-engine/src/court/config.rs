//! Court configuration: activation band, budgets and the wall-clock ttl.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Activation band and safety bounds for an adversarial proceeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    pub enabled: bool,
    /// Wall-clock budget for one proceeding, e.g. `"10m"` or `"90s"`.
    #[serde(with = "ttl_serde")]
    pub ttl: Duration,
    /// Stage invocations allowed per proceeding.
    pub max_handoffs: usize,
    /// Remand cycles allowed before a remand becomes a mistrial.
    pub max_remands: u32,
    pub max_hearing_rounds: u32,
    pub activation_floor: f64,
    pub activation_threshold: f64,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: Duration::from_secs(10 * 60),
            max_handoffs: 6,
            max_remands: 2,
            max_hearing_rounds: 3,
            activation_floor: 0.50,
            activation_threshold: 0.85,
        }
    }
}

impl CourtConfig {
    /// True when enabled and `floor <= confidence < threshold`.
    pub fn should_activate(&self, confidence: f64) -> bool {
        self.enabled
            && confidence >= self.activation_floor
            && confidence < self.activation_threshold
    }
}

mod ttl_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let secs = ttl.as_secs();
        let text = if ttl.subsec_millis() != 0 {
            format!("{}ms", ttl.as_millis())
        } else if secs != 0 && secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs != 0 && secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{secs}s")
        };
        serializer.serialize_str(&text)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(n) => Ok(Duration::from_secs(n)),
            Raw::Text(s) => parse(&s).map_err(serde::de::Error::custom),
        }
    }

    pub(super) fn parse(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let n: u64 = digits
            .parse()
            .map_err(|_| format!("invalid ttl: {s:?}"))?;
        let secs = match unit {
            "ms" => return Ok(Duration::from_millis(n)),
            "" | "s" => Some(n),
            "m" => n.checked_mul(60),
            "h" => n.checked_mul(3600),
            other => return Err(format!("unknown ttl unit {other:?} in {s:?}")),
        };
        secs.map(Duration::from_secs)
            .ok_or_else(|| format!("ttl out of range: {s:?}"))
    }
}
