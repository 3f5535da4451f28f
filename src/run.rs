//! Top-level orchestration: gate, fetch, tag index, branch
//! classification, planning and the plugin pipeline, in that order.

use crate::branches::{self, TagIndex};
use crate::ci::CiEnvironment;
use crate::config::Options;
use crate::domain::branch::Branch;
use crate::error::{Result, SemrelError};
use crate::gate::{GateController, GateDecision, SkipReason};
use crate::git::GitFacade;
use crate::pipeline::{PipelineDriver, PipelineOutcome, PluginSet};

/// Result of one invocation.
#[derive(Debug)]
pub enum RunOutcome {
    /// The gate admitted the run; this is what the pipeline produced.
    Pipeline(PipelineOutcome),
    /// The gate skipped the run.
    Skipped(SkipReason),
}

impl RunOutcome {
    /// Whether a release was published (dry-run and skips are falsy).
    pub fn released(&self) -> bool {
        matches!(
            self,
            RunOutcome::Pipeline(PipelineOutcome::Released { .. })
        )
    }
}

/// Run one release invocation against the repository.
pub fn run(
    git: &dyn GitFacade,
    options: &Options,
    ci: &CiEnvironment,
    plugins: &PluginSet,
) -> Result<RunOutcome> {
    let gate = GateController::new(git);
    let (branch_name, repository_url, dry_run) = match gate.admit(options, ci)? {
        GateDecision::Proceed {
            branch,
            repository_url,
            dry_run,
        } => (branch, repository_url, dry_run),
        GateDecision::Skip(reason) => return Ok(RunOutcome::Skipped(reason)),
    };
    gate.setup_environment(ci);

    git.fetch()?;

    let index = TagIndex::new(&options.tag_format, git)?;
    let branches = branches::classify(&options.branches, git, &index)?;
    let branch = branches
        .iter()
        .find(|b| b.name == branch_name)
        .cloned()
        .ok_or_else(|| {
            SemrelError::config(format!("active branch '{branch_name}' was not classified"))
        })?;

    let mut effective = options.clone();
    effective.dry_run = dry_run;

    let driver = PipelineDriver::new(git, plugins, repository_url, dry_run);
    let outcome = driver.run(&effective, &branches, &branch, index.format())?;
    Ok(RunOutcome::Pipeline(outcome))
}

/// Classify the configured branches without running anything, for the
/// `--list` command.
pub fn classified_branches(git: &dyn GitFacade, options: &Options) -> Result<Vec<Branch>> {
    let index = TagIndex::new(&options.tag_format, git)?;
    branches::classify(&options.branches, git, &index)
}
