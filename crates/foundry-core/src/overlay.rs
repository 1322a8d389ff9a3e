//! Overlay planning: reconcile a freshly generated staging tree with an
//! existing project.
//!
//! Three file sets take part: the previous manifest's write-set, the staging
//! tree produced by this run, and whatever currently exists in the target.
//! Files are compared byte-for-byte. Nothing the user authored is ever
//! overwritten without `force`, and files Foundry stopped producing are only
//! reported, unless pruning was asked for explicitly.

use crate::error::{FoundryError, Result};
use crate::manifest::{GenerationManifest, OverlaySummary};
use crate::paths;
use crate::types::ConflictResolution;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// FileAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileActionType {
    Create,
    Update,
    Skip,
    Delete,
    /// The target differs and Foundry never wrote it.
    Conflict { resolution: ConflictResolution },
}

impl fmt::Display for FileActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileActionType::Create => f.write_str("create"),
            FileActionType::Update => f.write_str("update"),
            FileActionType::Skip => f.write_str("skip"),
            FileActionType::Delete => f.write_str("delete"),
            FileActionType::Conflict { resolution } => write!(f, "conflict ({resolution})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAction {
    pub path: String,
    pub action: FileActionType,
    pub reason: String,
}

impl FileAction {
    pub fn new(path: impl Into<String>, action: FileActionType, reason: impl Into<String>) -> Result<Self> {
        let path = path.into();
        paths::validate_relative_path(&path)?;
        Ok(Self {
            path,
            action,
            reason: reason.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// OverlayPlan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlan {
    pub actions: Vec<FileAction>,
    /// Previously generated paths this run no longer produces.
    pub orphans: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCounts {
    pub create: usize,
    pub update: usize,
    pub skip: usize,
    pub delete: usize,
    pub conflict: usize,
}

impl OverlayPlan {
    pub fn counts(&self) -> PlanCounts {
        let mut c = PlanCounts::default();
        for a in &self.actions {
            match a.action {
                FileActionType::Create => c.create += 1,
                FileActionType::Update => c.update += 1,
                FileActionType::Skip => c.skip += 1,
                FileActionType::Delete => c.delete += 1,
                FileActionType::Conflict { .. } => c.conflict += 1,
            }
        }
        c
    }

    /// True when applying the plan would not change the target.
    pub fn is_noop(&self) -> bool {
        self.actions
            .iter()
            .all(|a| a.action == FileActionType::Skip)
    }

    /// Paths whose new content is diverted to a sidecar.
    pub fn sidecar_paths(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter(|a| {
                a.action
                    == FileActionType::Conflict {
                        resolution: ConflictResolution::Sidecar,
                    }
            })
            .map(|a| a.path.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OverlayOptions {
    pub force: bool,
    pub prune_orphans: bool,
    /// Resolution for unmanaged conflicts under `force`.
    pub conflict_policy: ConflictResolution,
    pub sidecar_suffix: String,
}

pub fn build_overlay_plan(
    fresh_root: &Path,
    target_root: &Path,
    previous: Option<&GenerationManifest>,
    opts: &OverlayOptions,
) -> Result<OverlayPlan> {
    let managed = previous.map(|m| m.managed_files()).unwrap_or_default();
    let fresh: Vec<String> = crate::io::collect_relative_files(fresh_root)?
        .into_iter()
        .filter(|rel| !paths::is_bookkeeping(rel))
        .collect();

    let mut plan = OverlayPlan::default();
    for rel in &fresh {
        let new_bytes = std::fs::read(paths::join_rel(fresh_root, rel))?;
        let target = paths::join_rel(target_root, rel);
        let action = match crate::io::read_if_exists(&target)? {
            None => FileAction::new(rel.as_str(), FileActionType::Create, "new file")?,
            Some(existing) if existing == new_bytes => {
                FileAction::new(rel.as_str(), FileActionType::Skip, "unchanged")?
            }
            Some(_) if managed.contains(rel) => FileAction::new(
                rel.as_str(),
                FileActionType::Update,
                "changed since the previous generation",
            )?,
            Some(_) => {
                let (resolution, reason) = if opts.force {
                    (opts.conflict_policy, "not written by foundry; forced")
                } else {
                    (
                        ConflictResolution::Sidecar,
                        "not written by foundry; new content goes to a sidecar",
                    )
                };
                FileAction::new(rel.as_str(), FileActionType::Conflict { resolution }, reason)?
            }
        };
        tracing::debug!(path = %action.path, action = %action.action, "planned");
        plan.actions.push(action);
    }

    if let Some(previous) = previous {
        let fresh_set: BTreeSet<&str> = fresh.iter().map(String::as_str).collect();
        // Unpruned orphans from earlier runs stay tracked while they exist.
        let mut candidates = previous.all_files();
        if let Some(overlay) = &previous.overlay {
            candidates.extend(
                overlay
                    .orphans
                    .iter()
                    .filter(|rel| paths::validate_relative_path(rel).is_ok())
                    .filter(|rel| paths::join_rel(target_root, rel).is_file())
                    .cloned(),
            );
        }
        for rel in candidates {
            if paths::is_bookkeeping(&rel) || fresh_set.contains(rel.as_str()) {
                continue;
            }
            if opts.prune_orphans && paths::join_rel(target_root, &rel).is_file() {
                plan.actions.push(FileAction::new(
                    rel.as_str(),
                    FileActionType::Delete,
                    "no longer generated; pruning requested",
                )?);
            }
            plan.orphans.push(rel);
        }
    }

    Ok(plan)
}

// ---------------------------------------------------------------------------
// Applying
// ---------------------------------------------------------------------------

/// Apply `plan` from the staging tree onto the target.
pub fn apply_overlay_plan(
    plan: &OverlayPlan,
    fresh_root: &Path,
    target_root: &Path,
    sidecar_suffix: &str,
) -> Result<OverlaySummary> {
    for path in plan.sidecar_paths() {
        let sidecar = format!("{path}{sidecar_suffix}");
        if sidecar == path {
            return Err(FoundryError::SidecarCollision(path));
        }
        paths::validate_relative_path(&sidecar)?;
    }

    let mut summary = OverlaySummary {
        sidecars: Vec::new(),
        orphans: plan.orphans.clone(),
    };
    for action in &plan.actions {
        let target = paths::join_rel(target_root, &action.path);
        match action.action {
            FileActionType::Skip => {}
            FileActionType::Create
            | FileActionType::Update
            | FileActionType::Conflict {
                resolution: ConflictResolution::Overwrite,
            } => {
                let data = std::fs::read(paths::join_rel(fresh_root, &action.path))?;
                crate::io::atomic_write(&target, &data)?;
            }
            FileActionType::Conflict {
                resolution: ConflictResolution::Sidecar,
            } => {
                let sidecar = format!("{}{sidecar_suffix}", action.path);
                paths::validate_relative_path(&sidecar)?;
                let data = std::fs::read(paths::join_rel(fresh_root, &action.path))?;
                crate::io::atomic_write(&paths::join_rel(target_root, &sidecar), &data)?;
                summary.sidecars.push(action.path.clone());
            }
            FileActionType::Delete => {
                if target.is_file() {
                    std::fs::remove_file(&target)?;
                }
            }
        }
        tracing::debug!(path = %action.path, action = %action.action, "applied");
    }
    let counts = plan.counts();
    tracing::info!(
        create = counts.create,
        update = counts.update,
        skip = counts.skip,
        delete = counts.delete,
        conflict = counts.conflict,
        orphans = plan.orphans.len(),
        "applied overlay plan"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
