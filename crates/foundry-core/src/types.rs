use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Strictness
// ---------------------------------------------------------------------------

/// How hard pre-generation validation is on the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Missing library entries are warnings.
    Lenient,
    #[default]
    Standard,
    /// Every warning is an error.
    Strict,
}

impl Strictness {
    pub fn as_str(self) -> &'static str {
        match self {
            Strictness::Lenient => "lenient",
            Strictness::Standard => "standard",
            Strictness::Strict => "strict",
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(Strictness::Lenient),
            "standard" => Ok(Strictness::Standard),
            "strict" => Ok(Strictness::Strict),
            _ => Err(format!(
                "unknown strictness '{s}'; expected lenient, standard or strict"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// SafetyPosture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyPosture {
    Permissive,
    #[default]
    Balanced,
    Strict,
}

impl SafetyPosture {
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyPosture::Permissive => "permissive",
            SafetyPosture::Balanced => "balanced",
            SafetyPosture::Strict => "strict",
        }
    }

    /// One-line guidance compiled into every persona prompt.
    pub fn guidance(self) -> &'static str {
        match self {
            SafetyPosture::Permissive => {
                "Act autonomously; ask before destructive or irreversible operations."
            }
            SafetyPosture::Balanced => {
                "Propose changes before applying them outside your own output folder."
            }
            SafetyPosture::Strict => {
                "Never modify files outside your output folder without explicit approval."
            }
        }
    }
}

impl fmt::Display for SafetyPosture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HookMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookMode {
    #[default]
    Enforcing,
    Advisory,
}

impl HookMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HookMode::Enforcing => "enforcing",
            HookMode::Advisory => "advisory",
        }
    }
}

impl fmt::Display for HookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConflictResolution
// ---------------------------------------------------------------------------

/// What the overlay does with a file that differs from the fresh output but
/// was never written by a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Leave the target untouched and write the new content next to it.
    #[default]
    Sidecar,
    Overwrite,
}

impl ConflictResolution {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictResolution::Sidecar => "sidecar",
            ConflictResolution::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictness_parse_and_display() {
        for s in ["lenient", "standard", "strict"] {
            let parsed: Strictness = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
        assert!("loose".parse::<Strictness>().is_err());
    }

    #[test]
    fn posture_serializes_snake_case() {
        let yaml = serde_yaml::to_string(&SafetyPosture::Permissive).unwrap();
        assert_eq!(yaml.trim(), "permissive");
    }

    #[test]
    fn defaults() {
        assert_eq!(Strictness::default(), Strictness::Standard);
        assert_eq!(SafetyPosture::default(), SafetyPosture::Balanced);
        assert_eq!(HookMode::default(), HookMode::Enforcing);
        assert_eq!(ConflictResolution::default(), ConflictResolution::Sidecar);
    }
}
