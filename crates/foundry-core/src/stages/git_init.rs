use super::{Stage, StageContext, GIT_INIT};
use crate::error::Result;
use crate::manifest::StageResult;

/// Optional `git init` of a freshly generated project. Never fatal.
pub struct GitInitStage;

impl Stage for GitInitStage {
    fn name(&self) -> &'static str {
        GIT_INIT
    }

    fn enabled(&self, ctx: &StageContext<'_>) -> bool {
        ctx.spec.generation.init_git && !ctx.staged && !ctx.out_dir.join(".git").exists()
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<StageResult> {
        let mut result = StageResult::new();
        if !crate::git::init_repo(ctx.out_dir, ctx.config.git.init_timeout()) {
            tracing::warn!(dir = %ctx.out_dir.display(), "git init unavailable");
            result.warn("git init failed or git is unavailable; repository not initialised");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use super::*;
    use crate::library::Library;

    #[test]
    fn disabled_by_default_and_when_staged() {
        let fx = Fixture::new();
        let library = Library::open(fx.lib_dir.path()).unwrap();
        let mut ctx = super::super::StageContext {
            spec: &fx.spec,
            library: &library,
            out_dir: fx.out.path(),
            config: &fx.config,
            staged: false,
        };
        assert!(!GitInitStage.enabled(&ctx));

        let mut spec = fx.spec.clone();
        spec.generation.init_git = true;
        ctx.spec = &spec;
        assert!(GitInitStage.enabled(&ctx));
        ctx.staged = true;
        assert!(!GitInitStage.enabled(&ctx));
    }

    #[test]
    fn run_never_fails() {
        let fx = Fixture::new();
        let result = fx.run(&GitInitStage);
        assert!(result.wrote.is_empty());
        assert!(result.warnings.len() <= 1);
    }
}
