//! The user's declarative project configuration.
//!
//! A [`CompositionSpec`] is built once (from a file or by the CLI's
//! `composition new`) and never mutated by the pipeline. It is echoed into
//! every manifest so a generation can be traced back to its input.

use crate::error::{FoundryError, Result};
use crate::types::{HookMode, SafetyPosture};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectIdentity {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSelection {
    pub id: String,
    /// Display title override; defaults to the id in title case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PersonaSelection {
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| title_case(&self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSelection {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookSelection {
    pub id: String,
    #[serde(default)]
    pub mode: HookMode,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SafetyPolicy {
    #[serde(default)]
    pub posture: SafetyPosture,
    #[serde(default)]
    pub allow_network: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protected_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_root: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub seed_tasks: bool,
    #[serde(default = "default_true")]
    pub diff_report: bool,
    #[serde(default)]
    pub init_git: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            output_root: None,
            seed_tasks: true,
            diff_report: true,
            init_git: false,
        }
    }
}

// ---------------------------------------------------------------------------
// CompositionSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionSpec {
    pub project: ProjectIdentity,
    #[serde(default)]
    pub personas: Vec<PersonaSelection>,
    #[serde(default)]
    pub stacks: Vec<StackSelection>,
    #[serde(default)]
    pub hooks: Vec<HookSelection>,
    #[serde(default)]
    pub safety: SafetyPolicy,
    #[serde(default)]
    pub generation: GenerationOptions,
}

impl CompositionSpec {
    /// A skeleton composition for `slug` with the given library selections.
    pub fn template(
        slug: &str,
        personas: &[String],
        stacks: &[String],
        hooks: &[String],
    ) -> Self {
        Self {
            project: ProjectIdentity {
                name: title_case(slug),
                slug: slug.to_string(),
                description: None,
            },
            personas: personas
                .iter()
                .map(|id| PersonaSelection {
                    id: id.clone(),
                    title: None,
                })
                .collect(),
            stacks: stacks
                .iter()
                .map(|id| StackSelection { id: id.clone() })
                .collect(),
            hooks: hooks
                .iter()
                .map(|id| HookSelection {
                    id: id.clone(),
                    mode: HookMode::default(),
                })
                .collect(),
            safety: SafetyPolicy::default(),
            generation: GenerationOptions::default(),
        }
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    /// Load from `.yaml`/`.yml` or `.json`, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FoundryError::CompositionNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        match extension(path).as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&data),
            "json" => Ok(serde_json::from_str(&data)?),
            other => Err(FoundryError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = match extension(path).as_str() {
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            other => return Err(FoundryError::UnsupportedFormat(other.to_string())),
        };
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn persona_ids(&self) -> Vec<&str> {
        self.personas.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn stack_ids(&self) -> Vec<&str> {
        self.stacks.iter().map(|s| s.id.as_str()).collect()
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// `backend-engineer` → `Backend Engineer`.
pub fn title_case(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = "project:\n  name: Acme\n  slug: acme\npersonas:\n  - id: backend-engineer\n";

    #[test]
    fn minimal_yaml_gets_defaults() {
        let spec = CompositionSpec::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(spec.project.slug, "acme");
        assert!(spec.stacks.is_empty());
        assert_eq!(spec.safety.posture, SafetyPosture::Balanced);
        assert!(spec.generation.seed_tasks);
        assert!(spec.generation.diff_report);
        assert!(!spec.generation.init_git);
    }

    #[test]
    fn hook_mode_defaults_to_enforcing() {
        let yaml = format!("{MINIMAL}hooks:\n  - id: lint\n  - id: fmt\n    mode: advisory\n");
        let spec = CompositionSpec::from_yaml_str(&yaml).unwrap();
        assert_eq!(spec.hooks[0].mode, HookMode::Enforcing);
        assert_eq!(spec.hooks[1].mode, HookMode::Advisory);
    }

    #[test]
    fn save_and_load_yaml_and_json() {
        let dir = TempDir::new().unwrap();
        let spec = CompositionSpec::template(
            "acme",
            &["qa".to_string()],
            &["rust".to_string()],
            &[],
        );
        for name in ["c.yaml", "c.json"] {
            let path = dir.path().join(name);
            spec.save(&path).unwrap();
            assert_eq!(CompositionSpec::load(&path).unwrap(), spec);
        }
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.toml");
        std::fs::write(&path, "x").unwrap();
        assert!(matches!(
            CompositionSpec::load(&path),
            Err(FoundryError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            CompositionSpec::load(&dir.path().join("absent.yaml")),
            Err(FoundryError::CompositionNotFound(_))
        ));
    }

    #[test]
    fn persona_display_title() {
        let p = PersonaSelection {
            id: "backend-engineer".to_string(),
            title: None,
        };
        assert_eq!(p.display_title(), "Backend Engineer");
        let p = PersonaSelection {
            id: "qa".to_string(),
            title: Some("Quality Lead".to_string()),
        };
        assert_eq!(p.display_title(), "Quality Lead");
    }
}
