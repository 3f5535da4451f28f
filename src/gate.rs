//! The top-level gate deciding whether an invocation runs, previews, or
//! is skipped.
//!
//! A run outside CI degrades to dry-run; pull request builds and builds
//! on unconfigured branches are skipped; the repository URL is resolved
//! and push authorisation verified before any plugin executes.

use crate::ci::CiEnvironment;
use crate::config::Options;
use crate::error::{Result, SemrelError};
use crate::git::GitFacade;
use crate::remote_url;
use std::collections::HashMap;

/// Commit identity used when the surrounding environment sets none.
const GIT_AUTHOR_NAME: &str = "semrel-bot";
const GIT_AUTHOR_EMAIL: &str = "semrel-bot@users.noreply.github.com";

/// What the gate decided for this invocation.
#[derive(Debug)]
pub enum GateDecision {
    /// Run the pipeline on this branch, possibly in dry-run mode.
    Proceed {
        branch: String,
        repository_url: String,
        dry_run: bool,
    },
    /// Do nothing; the reason has been logged.
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    PullRequest,
    NotOnReleaseBranch {
        current: Option<String>,
        allowed: Vec<String>,
    },
    LocalBranchBehind {
        branch: String,
    },
}

pub struct GateController<'a> {
    git: &'a dyn GitFacade,
    env: HashMap<String, String>,
}

impl<'a> GateController<'a> {
    pub fn new(git: &'a dyn GitFacade) -> Self {
        Self::with_env(git, std::env::vars().collect())
    }

    /// Gate with an explicit environment, for tests.
    pub fn with_env(git: &'a dyn GitFacade, env: HashMap<String, String>) -> Self {
        GateController { git, env }
    }

    /// Decide whether this invocation runs.
    pub fn admit(&self, options: &Options, ci: &CiEnvironment) -> Result<GateDecision> {
        if !self.git.is_repo() {
            return Err(SemrelError::NoGitRepo);
        }

        let mut dry_run = options.dry_run;
        if !ci.is_ci && !dry_run && !options.no_ci {
            log::warn!(
                "this run was not triggered in a known CI environment, falling back to dry-run"
            );
            dry_run = true;
        }

        if ci.is_ci && ci.is_pr && !options.no_ci {
            log::info!("this run was triggered by a pull request and will be skipped");
            return Ok(GateDecision::Skip(SkipReason::PullRequest));
        }

        let allowed: Vec<String> = options.branches.iter().map(|b| b.name.clone()).collect();
        let current = match &ci.branch {
            Some(branch) => Some(branch.clone()),
            None => self.git.current_branch()?,
        };
        let Some(branch) = current.clone().filter(|name| allowed.contains(name)) else {
            log::info!(
                "branch {} is not one of the configured release branches ({}), skipping",
                current.as_deref().unwrap_or("(detached)"),
                allowed.join(", ")
            );
            return Ok(GateDecision::Skip(SkipReason::NotOnReleaseBranch {
                current,
                allowed,
            }));
        };

        let raw_url = match &options.repository_url {
            Some(url) => url.clone(),
            None => self.git.remote_url()?.ok_or(SemrelError::NoRepoUrl)?,
        };
        let normalized = remote_url::normalize(&raw_url);

        let repository_url = match self.git.verify_auth(&normalized, &branch) {
            Ok(()) => normalized,
            Err(_) => {
                let with_credentials = remote_url::with_credentials(&normalized, &self.env);
                match self.git.verify_auth(&with_credentials, &branch) {
                    Ok(()) => with_credentials,
                    Err(_) => {
                        if !self.git.is_branch_up_to_date(&branch)? {
                            log::info!(
                                "the local branch '{branch}' is behind the remote one, \
                                 a new version will not be published"
                            );
                            return Ok(GateDecision::Skip(SkipReason::LocalBranchBehind {
                                branch,
                            }));
                        }
                        return Err(SemrelError::GitNoPermission {
                            url: with_credentials,
                            branch,
                        });
                    }
                }
            }
        };

        Ok(GateDecision::Proceed {
            branch,
            repository_url,
            dry_run,
        })
    }

    /// Export the git environment for plugin and git child processes.
    /// Identity variables already present in the environment win; the
    /// prompt-suppression variables are always set.
    pub fn setup_environment(&self, ci: &CiEnvironment) {
        if !ci.is_ci {
            return;
        }

        let identity = [
            ("GIT_AUTHOR_NAME", GIT_AUTHOR_NAME),
            ("GIT_AUTHOR_EMAIL", GIT_AUTHOR_EMAIL),
            ("GIT_COMMITTER_NAME", GIT_AUTHOR_NAME),
            ("GIT_COMMITTER_EMAIL", GIT_AUTHOR_EMAIL),
        ];
        for (key, value) in identity {
            if std::env::var(key).map(|v| v.is_empty()).unwrap_or(true) {
                std::env::set_var(key, value);
            }
        }

        std::env::set_var("GIT_ASKPASS", "echo");
        std::env::set_var("GIT_TERMINAL_PROMPT", "0");
    }
}
