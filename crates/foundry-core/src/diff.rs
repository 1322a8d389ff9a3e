//! Human-readable comparison between this run's manifest and the previous
//! one, written to `ai/generated/diff-report.md`.

use crate::error::Result;
use crate::manifest::{GenerationManifest, PreviousManifest, StageResult};
use crate::paths;
use crate::stages::BOOKKEEPING_STAGES;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct DiffReport {
    pub markdown: String,
    pub warnings: Vec<String>,
}

/// Build the report for `current` against whatever was found on disk.
/// A corrupt previous manifest falls back to the first-generation report
/// with a single warning.
pub fn build_diff_report(current: &GenerationManifest, previous: &PreviousManifest) -> DiffReport {
    match previous {
        PreviousManifest::Absent => DiffReport {
            markdown: render_diff_report(current, None),
            warnings: Vec::new(),
        },
        PreviousManifest::Corrupt(reason) => {
            tracing::warn!(%reason, "previous manifest unreadable");
            DiffReport {
                markdown: render_diff_report(current, None),
                warnings: vec![format!(
                    "previous manifest unreadable ({reason}); reported as first generation"
                )],
            }
        }
        PreviousManifest::Loaded(prev) => DiffReport {
            markdown: render_diff_report(current, Some(prev.as_ref())),
            warnings: Vec::new(),
        },
    }
}

/// Read `previous-manifest.json` from `project_dir`, write the report and
/// return the `diff` stage result.
pub fn write_diff_report(project_dir: &Path, current: &GenerationManifest) -> Result<StageResult> {
    let previous = PreviousManifest::read(&paths::previous_manifest_path(project_dir));
    let report = build_diff_report(current, &previous);
    crate::io::atomic_write(&paths::diff_report_path(project_dir), report.markdown.as_bytes())?;

    let mut result = StageResult::new();
    result.record_write(paths::DIFF_REPORT_MD)?;
    for w in report.warnings {
        result.warn(w);
    }
    Ok(result)
}

pub fn render_diff_report(current: &GenerationManifest, previous: Option<&GenerationManifest>) -> String {
    let mut out = format!("# Generation diff report\n\nRun: `{}`\n", current.run_id);
    if !current.library_version.is_empty() {
        out.push_str(&format!("Library version: `{}`\n", current.library_version));
    }

    let Some(previous) = previous else {
        out.push_str(&format!(
            "\nFirst generation: no previous manifest to compare against.\n\n{} files written.\n",
            content_files(current).len()
        ));
        return out;
    };

    out.push_str(&format!("Previous run: `{}`\n", previous.run_id));

    // Files
    let now = content_files(current);
    let before = content_files(previous);
    let added: Vec<&String> = now.difference(&before).collect();
    let removed: Vec<&String> = before.difference(&now).collect();
    out.push_str("\n## Files\n\n");
    if added.is_empty() && removed.is_empty() {
        out.push_str("No files added or removed.\n");
    }
    if !added.is_empty() {
        out.push_str(&format!("### New ({})\n\n", added.len()));
        for f in &added {
            out.push_str(&format!("- `{f}`\n"));
        }
        out.push('\n');
    }
    if !removed.is_empty() {
        out.push_str(&format!("### Removed ({})\n\n", removed.len()));
        for f in &removed {
            out.push_str(&format!("- `{f}`\n"));
        }
        out.push('\n');
    }

    // Stages
    let now_stages = content_stages(current);
    let before_stages = content_stages(previous);
    out.push_str("\n## Stages\n\n");
    for (label, names) in [
        ("Added", now_stages.difference(&before_stages).collect::<Vec<_>>()),
        ("Removed", before_stages.difference(&now_stages).collect::<Vec<_>>()),
    ] {
        if !names.is_empty() {
            let list: Vec<String> = names.iter().map(|n| format!("`{n}`")).collect();
            out.push_str(&format!("{label}: {}\n\n", list.join(", ")));
        }
    }
    let common: Vec<&&str> = now_stages.intersection(&before_stages).collect();
    if !common.is_empty() {
        out.push_str("| Stage | Previous files | Current files | Delta |\n|---|---|---|---|\n");
        for name in common {
            let prev = previous.stages.get(*name).map_or(0, |s| s.wrote.len());
            let cur = current.stages.get(*name).map_or(0, |s| s.wrote.len());
            out.push_str(&format!("| {name} | {prev} | {cur} | {} |\n", signed(prev, cur)));
        }
    }

    // Warnings
    out.push_str("\n## Warnings\n\n| Stage | Previous | Current |\n|---|---|---|\n");
    let all: BTreeSet<&str> = now_stages.union(&before_stages).copied().collect();
    let (mut prev_total, mut cur_total) = (0, 0);
    for name in all {
        let prev = previous.stages.get(name).map_or(0, |s| s.warnings.len());
        let cur = current.stages.get(name).map_or(0, |s| s.warnings.len());
        prev_total += prev;
        cur_total += cur;
        out.push_str(&format!("| {name} | {prev} | {cur} |\n"));
    }
    out.push_str(&format!("| **total** | {prev_total} | {cur_total} |\n"));
    out
}

fn content_files(m: &GenerationManifest) -> BTreeSet<String> {
    m.all_files()
        .into_iter()
        .filter(|f| !paths::is_bookkeeping(f))
        .collect()
}

fn content_stages(m: &GenerationManifest) -> BTreeSet<&str> {
    m.stages
        .keys()
        .map(String::as_str)
        .filter(|name| !BOOKKEEPING_STAGES.contains(name))
        .collect()
}

fn signed(prev: usize, cur: usize) -> String {
    match cur.cmp(&prev) {
        std::cmp::Ordering::Greater => format!("+{}", cur - prev),
        std::cmp::Ordering::Less => format!("-{}", prev - cur),
        std::cmp::Ordering::Equal => "0".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::tests::{manifest_with, stage};
    use tempfile::TempDir;

    #[test]
    fn first_generation_when_absent() {
        let current = manifest_with(vec![("scaffold", stage(&["README.md"], &[]))]);
        let report = build_diff_report(&current, &PreviousManifest::Absent);
        assert!(report.markdown.contains("First generation"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn corrupt_previous_falls_back_with_one_warning() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(paths::GENERATED_DIR)).unwrap();
        std::fs::write(paths::previous_manifest_path(dir.path()), "{ definitely not json").unwrap();

        let current = manifest_with(vec![("scaffold", stage(&["README.md"], &[]))]);
        let result = write_diff_report(dir.path(), &current).unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.wrote, vec![paths::DIFF_REPORT_MD]);
        let text = std::fs::read_to_string(paths::diff_report_path(dir.path())).unwrap();
        assert!(text.contains("First generation"));
    }

    #[test]
    fn compares_files_stages_and_warnings() {
        let previous = manifest_with(vec![
            ("scaffold", stage(&["README.md", "ai/outputs/dev/.gitkeep"], &[])),
            ("seed", stage(&["ai/tasks/seed-tasks.md"], &[])),
            ("compile", stage(&["ai/team/TEAM.md"], &["w1"])),
            ("manifest", stage(&[paths::MANIFEST_JSON], &[])),
        ]);
        let current = manifest_with(vec![
            ("scaffold", stage(&["README.md"], &[])),
            ("compile", stage(&["ai/team/TEAM.md", "ai/team/members/qa.md"], &["w1", "w2"])),
            ("copy-assets", stage(&["ai/config/composition.yaml"], &[])),
        ]);
        let md = render_diff_report(&current, Some(&previous));

        assert!(md.contains("### New (2)"));
        assert!(md.contains("- `ai/team/members/qa.md`"));
        assert!(md.contains("### Removed (2)"));
        assert!(md.contains("- `ai/tasks/seed-tasks.md`"));
        assert!(!md.contains("manifest.json"));
        assert!(md.contains("Added: `copy-assets`"));
        assert!(md.contains("Removed: `seed`"));
        assert!(md.contains("| scaffold | 2 | 1 | -1 |"));
        assert!(md.contains("| compile | 1 | 2 | +1 |"));
        assert!(md.contains("| compile | 1 | 2 |\n"));
        assert!(md.contains("| **total** | 1 | 2 |"));
    }

    #[test]
    fn identical_runs_report_no_file_changes() {
        let m = manifest_with(vec![("scaffold", stage(&["README.md"], &[]))]);
        let md = render_diff_report(&m, Some(&m));
        assert!(md.contains("No files added or removed."));
        assert!(md.contains("| scaffold | 1 | 1 | 0 |"));
    }
}
