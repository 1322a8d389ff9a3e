use foundry_core::config::FoundryConfig;
use foundry_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the template library root.
///
/// Priority:
/// 1. `--library` flag / `FOUNDRY_LIBRARY` env var (passed in as `explicit`)
/// 2. `library_root` from the config file
/// 3. Walk upward from `cwd` looking for a directory containing `personas/`
/// 4. Fall back to `cwd`
pub fn resolve_library(explicit: Option<&Path>, config: &FoundryConfig) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(paths::expand_home(p)?);
    }
    if let Some(p) = &config.library_root {
        return Ok(paths::expand_home(p)?);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Ok(find_library_upward(&cwd).unwrap_or(cwd))
}

fn find_library_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(paths::LIB_PERSONAS_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_library_wins() {
        let dir = TempDir::new().unwrap();
        let config = FoundryConfig {
            library_root: Some(PathBuf::from("/elsewhere")),
            ..FoundryConfig::default()
        };
        let result = resolve_library(Some(dir.path()), &config).unwrap();
        assert_eq!(result, dir.path());
    }

    #[test]
    fn config_library_beats_detection() {
        let config = FoundryConfig {
            library_root: Some(PathBuf::from("/srv/library")),
            ..FoundryConfig::default()
        };
        let result = resolve_library(None, &config).unwrap();
        assert_eq!(result, PathBuf::from("/srv/library"));
    }

    #[test]
    fn finds_personas_dir_upward() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("personas")).unwrap();
        let subdir = dir.path().join("stacks/rust/snippets");
        std::fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_library_upward(&subdir).unwrap(), dir.path());
    }

    #[test]
    fn no_library_upward() {
        let dir = TempDir::new().unwrap();
        assert!(find_library_upward(dir.path()).is_none());
    }
}
