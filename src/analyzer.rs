//! Built-in commit analyzer plugin.
//!
//! Determines the release type from conventional commit messages:
//! breaking changes call for a major release, features for a minor one,
//! fixes and performance work for a patch. Commits carrying the
//! `[skip release]` / `[release skip]` marker are ignored. When nothing
//! relevant happened the analyzer abstains and no release is made.

use crate::domain::commit::{is_skip_release, ParsedCommit};
use crate::domain::version::ReleaseType;
use crate::error::Result;
use crate::pipeline::plugin::{Context, Plugin};

pub struct CommitAnalyzer;

impl CommitAnalyzer {
    pub fn new() -> Self {
        CommitAnalyzer
    }

    /// Analyze commit messages and determine the release type.
    pub fn analyze_messages(&self, messages: &[&str]) -> Option<ReleaseType> {
        let mut release_type = None;

        for message in messages {
            if is_skip_release(message) {
                continue;
            }
            let parsed = ParsedCommit::parse(message);

            // Breaking changes dominate, no need to look further
            if parsed.is_breaking_change {
                return Some(ReleaseType::Major);
            }

            let candidate = match parsed.r#type.as_str() {
                "feat" | "feature" => Some(ReleaseType::Minor),
                "fix" | "perf" => Some(ReleaseType::Patch),
                _ => None,
            };
            if candidate > release_type {
                release_type = candidate;
            }
        }

        release_type
    }
}

impl Default for CommitAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for CommitAnalyzer {
    fn name(&self) -> &str {
        "commit-analyzer"
    }

    fn analyze_commits(&self, ctx: &Context) -> Result<Option<ReleaseType>> {
        let messages: Vec<&str> = ctx.commits.iter().map(|c| c.message.as_str()).collect();
        let release_type = self.analyze_messages(&messages);
        match &release_type {
            Some(rt) => log::info!("commit analysis calls for a {rt} release"),
            None => log::info!("commit analysis calls for no release"),
        }
        Ok(release_type)
    }
}
