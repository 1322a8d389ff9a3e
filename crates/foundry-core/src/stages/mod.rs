//! Pipeline stages.
//!
//! Each stage reads the composition and the library and writes into
//! `StageContext::out_dir`, which is either the real project directory or
//! an overlay staging directory. Stages never look at what already exists
//! in the target; reconciliation is the overlay planner's job.

mod assets;
mod compile;
mod git_init;
mod scaffold;
mod seed;

use crate::composition::CompositionSpec;
use crate::config::FoundryConfig;
use crate::error::Result;
use crate::library::Library;
use crate::manifest::StageResult;
use crate::paths;
use std::path::Path;

pub use assets::CopyAssetsStage;
pub use compile::CompileStage;
pub use git_init::GitInitStage;
pub use scaffold::ScaffoldStage;
pub use seed::SeedStage;

pub const SCAFFOLD: &str = "scaffold";
pub const COMPILE: &str = "compile";
pub const COPY_ASSETS: &str = "copy-assets";
pub const SEED: &str = "seed";
pub const GIT_INIT: &str = "git-init";
pub const DIFF: &str = "diff";
pub const MANIFEST: &str = "manifest";

/// Stages that record pipeline metadata rather than project content.
pub const BOOKKEEPING_STAGES: &[&str] = &[DIFF, MANIFEST];

pub struct StageContext<'a> {
    pub spec: &'a CompositionSpec,
    pub library: &'a Library,
    pub out_dir: &'a Path,
    pub config: &'a FoundryConfig,
    /// True when writing into an overlay staging directory.
    pub staged: bool,
}

impl StageContext<'_> {
    /// Validate `rel`, write it under `out_dir` and record it.
    pub fn write(&self, result: &mut StageResult, rel: &str, data: &[u8]) -> Result<()> {
        paths::validate_relative_path(rel)?;
        crate::io::atomic_write(&paths::join_rel(self.out_dir, rel), data)?;
        result.record_write(rel)
    }
}

pub trait Stage {
    fn name(&self) -> &'static str;

    fn enabled(&self, _ctx: &StageContext<'_>) -> bool {
        true
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageResult>;
}

/// Content stages in execution order.
pub fn content_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(ScaffoldStage),
        Box::new(CompileStage),
        Box::new(CopyAssetsStage),
        Box::new(SeedStage),
        Box::new(GitInitStage),
    ]
}
