//! Read-only access to a persona / stack / hook template library.
//!
//! ```text
//! <library>/
//!   personas/<id>/persona.md | outputs.md | prompts.md
//!   stacks/<id>/conventions.md (+ any extra files)
//!   hooks/<id>.md
//! ```

use crate::error::{FoundryError, Result};
use crate::paths;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(FoundryError::LibraryNotFound(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    pub fn persona_dir(&self, id: &str) -> PathBuf {
        self.root.join(paths::LIB_PERSONAS_DIR).join(id)
    }

    pub fn persona_file(&self, id: &str, file: &str) -> PathBuf {
        self.persona_dir(id).join(file)
    }

    pub fn stack_dir(&self, id: &str) -> PathBuf {
        self.root.join(paths::LIB_STACKS_DIR).join(id)
    }

    pub fn stack_conventions(&self, id: &str) -> PathBuf {
        self.stack_dir(id).join(paths::CONVENTIONS_MD)
    }

    pub fn hook_file(&self, id: &str) -> PathBuf {
        self.root
            .join(paths::LIB_HOOKS_DIR)
            .join(format!("{id}.md"))
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn has_persona(&self, id: &str) -> bool {
        self.persona_file(id, paths::PERSONA_MD).is_file()
    }

    pub fn has_stack(&self, id: &str) -> bool {
        self.stack_conventions(id).is_file()
    }

    pub fn has_hook(&self, id: &str) -> bool {
        self.hook_file(id).is_file()
    }

    pub fn persona_ids(&self) -> Result<Vec<String>> {
        list_subdirs_with(&self.root.join(paths::LIB_PERSONAS_DIR), paths::PERSONA_MD)
    }

    pub fn stack_ids(&self) -> Result<Vec<String>> {
        list_subdirs_with(&self.root.join(paths::LIB_STACKS_DIR), paths::CONVENTIONS_MD)
    }

    pub fn hook_ids(&self) -> Result<Vec<String>> {
        let dir = self.root.join(paths::LIB_HOOKS_DIR);
        let mut ids = Vec::new();
        if !dir.is_dir() {
            return Ok(ids);
        }
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "md") {
                if let Some(stem) = path.file_stem() {
                    ids.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Git hash of the library checkout; empty when unavailable.
    pub fn version(&self, timeout: Duration) -> String {
        crate::git::library_version(&self.root, timeout)
    }
}

fn list_subdirs_with(dir: &Path, marker: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    if !dir.is_dir() {
        return Ok(ids);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && path.join(marker).is_file() {
            if let Some(name) = path.file_name() {
                ids.push(name.to_string_lossy().into_owned());
            }
        }
    }
    ids.sort();
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A small library used across the crate's tests.
    pub(crate) fn sample_library() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let write = |rel: &str, body: &str| {
            let p = paths::join_rel(root, rel);
            std::fs::create_dir_all(p.parent().unwrap()).unwrap();
            std::fs::write(p, body).unwrap();
        };
        write(
            "personas/backend-engineer/persona.md",
            "# {{ persona_title }}\n\nYou build {{project_name}} services.\n",
        );
        write(
            "personas/backend-engineer/outputs.md",
            "Write outputs to ai/outputs/{{ persona_id }}/.\n",
        );
        write(
            "personas/backend-engineer/prompts.md",
            "Stacks in play: {{ stacks }}.\n",
        );
        write("personas/qa-lead/persona.md", "# QA for {{ project_slug }}\n");
        write("stacks/rust/conventions.md", "Use cargo fmt.\n");
        write("stacks/rust/snippets/error.md", "Prefer thiserror.\n");
        write("stacks/react/conventions.md", "Function components only.\n");
        write("hooks/pre-commit-lint.md", "Run the linter before committing.\n");
        write("hooks/telemetry.md", "Stamp task tables.\n");
        dir
    }

    #[test]
    fn open_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Library::open(&dir.path().join("nope")),
            Err(FoundryError::LibraryNotFound(_))
        ));
    }

    #[test]
    fn lists_ids_sorted() {
        let dir = sample_library();
        let lib = Library::open(dir.path()).unwrap();
        assert_eq!(lib.persona_ids().unwrap(), vec!["backend-engineer", "qa-lead"]);
        assert_eq!(lib.stack_ids().unwrap(), vec!["react", "rust"]);
        assert_eq!(lib.hook_ids().unwrap(), vec!["pre-commit-lint", "telemetry"]);
    }

    #[test]
    fn presence_checks() {
        let dir = sample_library();
        let lib = Library::open(dir.path()).unwrap();
        assert!(lib.has_persona("qa-lead"));
        assert!(!lib.has_persona("designer"));
        assert!(lib.has_stack("rust"));
        assert!(!lib.has_stack("go"));
        assert!(lib.has_hook("telemetry"));
        assert!(!lib.has_hook("deploy"));
    }

    #[test]
    fn persona_dir_without_marker_is_ignored() {
        let dir = sample_library();
        std::fs::create_dir_all(dir.path().join("personas/draft")).unwrap();
        let lib = Library::open(dir.path()).unwrap();
        assert!(!lib.persona_ids().unwrap().contains(&"draft".to_string()));
    }
}
