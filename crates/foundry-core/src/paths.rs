use crate::error::{FoundryError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Project layout (relative to the generated project root)
// ---------------------------------------------------------------------------

pub const AI_DIR: &str = "ai";
pub const TEAM_DIR: &str = "ai/team";
pub const MEMBERS_DIR: &str = "ai/team/members";
pub const OUTPUTS_DIR: &str = "ai/outputs";
pub const TASKS_DIR: &str = "ai/tasks";
pub const STACKS_OUT_DIR: &str = "ai/stacks";
pub const HOOKS_OUT_DIR: &str = "ai/hooks";
pub const CONFIG_OUT_DIR: &str = "ai/config";
pub const GENERATED_DIR: &str = "ai/generated";

pub const README_MD: &str = "README.md";
pub const TEAM_MD: &str = "ai/team/TEAM.md";
pub const SEED_TASKS_MD: &str = "ai/tasks/seed-tasks.md";
pub const COMPOSITION_YAML: &str = "ai/config/composition.yaml";
pub const SAFETY_YAML: &str = "ai/config/safety.yaml";

pub const MANIFEST_JSON: &str = "ai/generated/manifest.json";
pub const PREVIOUS_MANIFEST_JSON: &str = "ai/generated/previous-manifest.json";
pub const DIFF_REPORT_MD: &str = "ai/generated/diff-report.md";

/// Files rewritten on every run by the bookkeeping stages. They never take
/// part in overlay planning or orphan detection.
pub const BOOKKEEPING_FILES: &[&str] = &[MANIFEST_JSON, PREVIOUS_MANIFEST_JSON, DIFF_REPORT_MD];

// ---------------------------------------------------------------------------
// Library layout (relative to the library root)
// ---------------------------------------------------------------------------

pub const LIB_PERSONAS_DIR: &str = "personas";
pub const LIB_STACKS_DIR: &str = "stacks";
pub const LIB_HOOKS_DIR: &str = "hooks";

pub const PERSONA_MD: &str = "persona.md";
pub const OUTPUTS_MD: &str = "outputs.md";
pub const PROMPTS_MD: &str = "prompts.md";
pub const CONVENTIONS_MD: &str = "conventions.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn manifest_path(project: &Path) -> PathBuf {
    project.join(MANIFEST_JSON)
}

pub fn previous_manifest_path(project: &Path) -> PathBuf {
    project.join(PREVIOUS_MANIFEST_JSON)
}

pub fn diff_report_path(project: &Path) -> PathBuf {
    project.join(DIFF_REPORT_MD)
}

pub fn member_rel(persona_id: &str) -> String {
    format!("{MEMBERS_DIR}/{persona_id}.md")
}

pub fn outputs_keep_rel(persona_id: &str) -> String {
    format!("{OUTPUTS_DIR}/{persona_id}/.gitkeep")
}

pub fn hook_out_rel(hook_id: &str) -> String {
    format!("{HOOKS_OUT_DIR}/{hook_id}.md")
}

pub fn is_bookkeeping(rel: &str) -> bool {
    BOOKKEEPING_FILES.contains(&rel)
}

/// Join a validated `/`-separated relative path onto `root`.
pub fn join_rel(root: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Expand a leading `~` against the user's home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = home::home_dir().ok_or(FoundryError::HomeNotFound)?;
    Ok(home.join(rest))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Project slugs and persona/stack/hook ids end up as path segments, so they
/// are restricted to lowercase alphanumerics and hyphens.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(FoundryError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Every path recorded in a stage result or overlay action must be relative
/// to the project root and free of `..` components.
pub fn validate_relative_path(rel: &str) -> Result<()> {
    let invalid = || FoundryError::InvalidRelativePath(rel.to_string());
    if rel.is_empty() || rel.contains('\0') || rel.contains('\\') || rel.starts_with('/') {
        return Err(invalid());
    }
    if rel
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid());
    }
    if Path::new(rel).is_absolute() {
        return Err(invalid());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        for slug in ["backend-engineer", "a", "rust", "x1"] {
            validate_slug(slug).unwrap_or_else(|_| panic!("expected valid: {slug}"));
        }
    }

    #[test]
    fn invalid_slugs() {
        for slug in ["", "-lead", "lead-", "has spaces", "UPPER", "a_b", "../etc"] {
            assert!(validate_slug(slug).is_err(), "expected invalid: {slug}");
        }
    }

    #[test]
    fn relative_paths() {
        for ok in ["README.md", "ai/team/members/qa.md", "ai/outputs/dev/.gitkeep"] {
            validate_relative_path(ok).unwrap_or_else(|_| panic!("expected valid: {ok}"));
        }
        for bad in ["", "/etc/passwd", "../x", "ai/../../x", "ai/./x", "ai//x", "a\\b"] {
            assert!(validate_relative_path(bad).is_err(), "expected invalid: {bad}");
        }
    }

    #[test]
    fn bookkeeping_files_are_recognised() {
        assert!(is_bookkeeping(MANIFEST_JSON));
        assert!(is_bookkeeping(DIFF_REPORT_MD));
        assert!(!is_bookkeeping(TEAM_MD));
    }

    #[test]
    fn join_rel_splits_segments() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            join_rel(root, "ai/team/TEAM.md"),
            PathBuf::from("/tmp/proj/ai/team/TEAM.md")
        );
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        let p = Path::new("/srv/projects");
        assert_eq!(expand_home(p).unwrap(), PathBuf::from("/srv/projects"));
    }
}
