use crate::error::{FoundryError, Result};
use crate::types::{ConflictResolution, Strictness};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "FOUNDRY_CONFIG";
pub const CONFIG_DIR: &str = ".foundry";
pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// OverlayConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Applied to unmanaged conflicting files when `--force` is given.
    #[serde(default)]
    pub conflict_policy: ConflictResolution,
    #[serde(default = "default_sidecar_suffix")]
    pub sidecar_suffix: String,
}

fn default_sidecar_suffix() -> String {
    ".foundry-new".to_string()
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictResolution::default(),
            sidecar_suffix: default_sidecar_suffix(),
        }
    }
}

// ---------------------------------------------------------------------------
// GitConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_version_timeout")]
    pub version_timeout_secs: u64,
    #[serde(default = "default_init_timeout")]
    pub init_timeout_secs: u64,
}

fn default_version_timeout() -> u64 {
    5
}

fn default_init_timeout() -> u64 {
    30
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            version_timeout_secs: default_version_timeout(),
            init_timeout_secs: default_init_timeout(),
        }
    }
}

impl GitConfig {
    pub fn version_timeout(&self) -> Duration {
        Duration::from_secs(self.version_timeout_secs)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// FoundryConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_root: Option<PathBuf>,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default)]
    pub default_strictness: Strictness,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub git: GitConfig,
}

fn default_output_root() -> PathBuf {
    PathBuf::from("~/foundry-projects")
}

impl Default for FoundryConfig {
    fn default() -> Self {
        Self {
            library_root: None,
            output_root: default_output_root(),
            default_strictness: Strictness::default(),
            overlay: OverlayConfig::default(),
            git: GitConfig::default(),
        }
    }
}

impl FoundryConfig {
    /// `$FOUNDRY_CONFIG`, else `~/.foundry/config.yaml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(p) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(p));
        }
        let home = home::home_dir().ok_or(FoundryError::HomeNotFound)?;
        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let suffix = &self.overlay.sidecar_suffix;
        if suffix.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "overlay.sidecar_suffix is empty; sidecars would overwrite the original"
                    .to_string(),
            });
        } else if suffix.contains('/') || suffix.contains('\\') || suffix.contains("..") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "overlay.sidecar_suffix '{suffix}' must not contain path separators or '..'"
                ),
            });
        }

        for (key, secs) in [
            ("git.version_timeout_secs", self.git.version_timeout_secs),
            ("git.init_timeout_secs", self.git.init_timeout_secs),
        ] {
            if secs == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{key} is 0; git lookups will always time out"),
                });
            } else if secs > 600 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("{key}={secs} (>600 is unusual)"),
                });
            }
        }

        if let Some(lib) = &self.library_root {
            if !lib.starts_with("~") && !lib.exists() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("library_root '{}' does not exist", lib.display()),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = FoundryConfig::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: FoundryConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.output_root, PathBuf::from("~/foundry-projects"));
        assert_eq!(parsed.overlay.sidecar_suffix, ".foundry-new");
        assert_eq!(parsed.git.version_timeout_secs, 5);
        assert_eq!(parsed.git.init_timeout_secs, 30);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "overlay:\n  conflict_policy: overwrite\n";
        let cfg: FoundryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.overlay.conflict_policy, ConflictResolution::Overwrite);
        assert_eq!(cfg.overlay.sidecar_suffix, ".foundry-new");
        assert_eq!(cfg.default_strictness, Strictness::Standard);
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let cfg = FoundryConfig::load(&dir.path().join("config.yaml")).unwrap();
        assert!(cfg.library_root.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.yaml");
        let mut cfg = FoundryConfig::default();
        cfg.default_strictness = Strictness::Strict;
        cfg.save(&path).unwrap();
        let loaded = FoundryConfig::load(&path).unwrap();
        assert_eq!(loaded.default_strictness, Strictness::Strict);
    }

    #[test]
    fn validate_default_has_no_warnings() {
        assert!(FoundryConfig::default().validate().is_empty());
    }

    #[test]
    fn validate_bad_suffix_is_error() {
        let mut cfg = FoundryConfig::default();
        cfg.overlay.sidecar_suffix = "/../x".to_string();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("sidecar_suffix")));
    }

    #[test]
    fn validate_timeouts() {
        let mut cfg = FoundryConfig::default();
        cfg.git.version_timeout_secs = 0;
        cfg.git.init_timeout_secs = 900;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("always time out")));
        assert!(warnings.iter().any(|w| w.message.contains("init_timeout_secs=900")));
    }
}
