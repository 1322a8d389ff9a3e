//! Record of one pipeline run, persisted as `ai/generated/manifest.json`.

use crate::composition::CompositionSpec;
use crate::error::{FoundryError, Result};
use crate::paths;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Files written and warnings raised by one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    #[serde(default)]
    pub wrote: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl StageResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a project-relative path. Rejects absolute paths and traversal.
    pub fn record_write(&mut self, rel: impl Into<String>) -> Result<()> {
        let rel = rel.into();
        paths::validate_relative_path(&rel)?;
        self.wrote.push(rel);
        Ok(())
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn validate(&self) -> Result<()> {
        for rel in &self.wrote {
            paths::validate_relative_path(rel)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OverlaySummary
// ---------------------------------------------------------------------------

/// Outcome of an overlay apply, kept so the next run knows which paths
/// Foundry did not take ownership of.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlaySummary {
    /// Paths whose new content went to a sidecar instead of the file itself.
    #[serde(default)]
    pub sidecars: Vec<String>,
    #[serde(default)]
    pub orphans: Vec<String>,
}

// ---------------------------------------------------------------------------
// GenerationManifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationManifest {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub library_version: String,
    #[serde(default)]
    pub composition_snapshot: serde_json::Value,
    #[serde(default)]
    pub stages: IndexMap<String, StageResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlaySummary>,
}

impl GenerationManifest {
    pub fn new(spec: &CompositionSpec, library_version: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: now.format("%Y%m%dT%H%M%S%3fZ").to_string(),
            generated_at: now,
            library_version: library_version.into(),
            composition_snapshot: serde_json::to_value(spec).unwrap_or_default(),
            stages: IndexMap::new(),
            overlay: None,
        }
    }

    /// Manifest returned when validation rejects a composition.
    pub fn empty(spec: &CompositionSpec) -> Self {
        Self::new(spec, "")
    }

    pub fn push_stage(&mut self, name: impl Into<String>, result: StageResult) {
        self.stages.insert(name.into(), result);
    }

    pub fn total_files_written(&self) -> usize {
        self.stages.values().map(|s| s.wrote.len()).sum()
    }

    /// Every warning, prefixed with the stage that raised it.
    pub fn all_warnings(&self) -> Vec<String> {
        self.stages
            .iter()
            .flat_map(|(name, s)| s.warnings.iter().map(move |w| format!("{name}: {w}")))
            .collect()
    }

    pub fn all_files(&self) -> BTreeSet<String> {
        self.stages
            .values()
            .flat_map(|s| s.wrote.iter().cloned())
            .collect()
    }

    /// Files this run actually owns: everything written except paths that
    /// were deferred to a sidecar.
    pub fn managed_files(&self) -> BTreeSet<String> {
        let mut files = self.all_files();
        if let Some(overlay) = &self.overlay {
            for sidecar in &overlay.sidecars {
                files.remove(sidecar);
            }
        }
        files
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and check that every recorded path is relative and traversal-free.
    pub fn from_json(data: &str) -> Result<Self> {
        let manifest: GenerationManifest = serde_json::from_str(data)?;
        for stage in manifest.stages.values() {
            stage.validate()?;
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::io::atomic_write(path, self.to_json()?.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// PreviousManifest
// ---------------------------------------------------------------------------

/// The manifest left behind by the preceding run, as found on disk.
#[derive(Debug, Clone)]
pub enum PreviousManifest {
    Absent,
    Corrupt(String),
    Loaded(Box<GenerationManifest>),
}

impl PreviousManifest {
    pub fn from_bytes(bytes: Option<&[u8]>) -> Self {
        let Some(bytes) = bytes else {
            return PreviousManifest::Absent;
        };
        let parsed = std::str::from_utf8(bytes)
            .map_err(|e| FoundryError::CorruptManifest(e.to_string()))
            .and_then(GenerationManifest::from_json);
        match parsed {
            Ok(m) => PreviousManifest::Loaded(Box::new(m)),
            Err(e) => PreviousManifest::Corrupt(e.to_string()),
        }
    }

    pub fn read(path: &Path) -> Self {
        match crate::io::read_if_exists(path) {
            Ok(bytes) => Self::from_bytes(bytes.as_deref()),
            Err(e) => PreviousManifest::Corrupt(e.to_string()),
        }
    }

    /// Corrupt manifests are treated as absent.
    pub fn manifest(&self) -> Option<&GenerationManifest> {
        match self {
            PreviousManifest::Loaded(m) => Some(m.as_ref()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn spec() -> CompositionSpec {
        CompositionSpec::template("acme", &["qa-lead".to_string()], &[], &[])
    }

    pub(crate) fn stage(wrote: &[&str], warnings: &[&str]) -> StageResult {
        let mut r = StageResult::new();
        for w in wrote {
            r.record_write(*w).unwrap();
        }
        for w in warnings {
            r.warn(*w);
        }
        r
    }

    pub(crate) fn manifest_with(stages: Vec<(&str, StageResult)>) -> GenerationManifest {
        let mut m = GenerationManifest::new(&spec(), "abc1234");
        for (name, result) in stages {
            m.push_stage(name, result);
        }
        m
    }

    #[test]
    fn record_write_rejects_traversal() {
        let mut r = StageResult::new();
        assert!(r.record_write("../outside.md").is_err());
        assert!(r.record_write("/abs.md").is_err());
        assert!(r.wrote.is_empty());
        r.record_write("ai/team/TEAM.md").unwrap();
        assert_eq!(r.wrote, vec!["ai/team/TEAM.md"]);
    }

    #[test]
    fn totals_and_warnings() {
        let m = manifest_with(vec![
            ("scaffold", stage(&["README.md", "ai/outputs/qa/.gitkeep"], &[])),
            ("compile", stage(&["ai/team/TEAM.md"], &["missing outputs.md"])),
        ]);
        assert_eq!(m.total_files_written(), 3);
        assert_eq!(m.all_warnings(), vec!["compile: missing outputs.md"]);
        assert_eq!(m.all_files().len(), 3);
    }

    #[test]
    fn json_round_trip_preserves_totals_and_warnings() {
        let m = manifest_with(vec![
            ("scaffold", stage(&["README.md"], &["a"])),
            ("seed", stage(&["ai/tasks/seed-tasks.md"], &["b", "c"])),
        ]);
        let reloaded = GenerationManifest::from_json(&m.to_json().unwrap()).unwrap();
        assert_eq!(reloaded.total_files_written(), m.total_files_written());
        assert_eq!(reloaded.all_warnings(), m.all_warnings());
        let names: Vec<&String> = reloaded.stages.keys().collect();
        assert_eq!(names, vec!["scaffold", "seed"]);
    }

    #[test]
    fn json_layout_has_expected_keys() {
        let m = manifest_with(vec![("scaffold", stage(&["README.md"], &[]))]);
        let value: serde_json::Value = serde_json::from_str(&m.to_json().unwrap()).unwrap();
        for key in ["run_id", "generated_at", "library_version", "composition_snapshot", "stages"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["stages"]["scaffold"]["wrote"][0], "README.md");
        assert!(value.get("overlay").is_none());
    }

    #[test]
    fn from_json_rejects_traversal_paths() {
        let data = r#"{"run_id":"x","generated_at":"2026-01-01T00:00:00Z",
            "stages":{"scaffold":{"wrote":["../../etc/passwd"],"warnings":[]}}}"#;
        assert!(GenerationManifest::from_json(data).is_err());
    }

    #[test]
    fn managed_files_exclude_sidecars() {
        let mut m = manifest_with(vec![("compile", stage(&["README.md", "ai/team/TEAM.md"], &[]))]);
        m.overlay = Some(OverlaySummary {
            sidecars: vec!["README.md".to_string()],
            orphans: vec![],
        });
        let managed = m.managed_files();
        assert!(!managed.contains("README.md"));
        assert!(managed.contains("ai/team/TEAM.md"));
    }

    #[test]
    fn previous_manifest_states() {
        assert!(matches!(PreviousManifest::from_bytes(None), PreviousManifest::Absent));
        assert!(matches!(
            PreviousManifest::from_bytes(Some(b"{not json")),
            PreviousManifest::Corrupt(_)
        ));
        let m = manifest_with(vec![("scaffold", stage(&["README.md"], &[]))]);
        let json = m.to_json().unwrap();
        let prev = PreviousManifest::from_bytes(Some(json.as_bytes()));
        assert_eq!(prev.manifest().unwrap().run_id, m.run_id);
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = paths::manifest_path(dir.path());
        let m = manifest_with(vec![("scaffold", stage(&["README.md"], &[]))]);
        m.save(&path).unwrap();
        assert_eq!(GenerationManifest::load(&path).unwrap(), m);
    }
}
