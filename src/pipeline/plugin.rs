use crate::config::Options;
use crate::domain::branch::Branch;
use crate::domain::release::Release;
use crate::domain::version::ReleaseType;
use crate::error::{Result, SemrelError};
use crate::git::CommitInfo;

/// Context passed to every plugin invocation.
///
/// `options`, `branch` and `branches` are always populated; the release
/// fields are filled in by the driver as the pipeline progresses and are
/// only meaningful for the steps documented in the step table.
#[derive(Debug, Clone)]
pub struct Context {
    pub options: Options,
    pub branch: Branch,
    pub branches: Vec<Branch>,
    pub last_release: Option<Release>,
    pub current_release: Option<Release>,
    pub next_release: Option<Release>,
    pub commits: Vec<CommitInfo>,
    pub releases: Vec<PluginRelease>,
}

impl Context {
    pub fn new(options: Options, branch: Branch, branches: Vec<Branch>) -> Self {
        Context {
            options,
            branch,
            branches,
            last_release: None,
            current_release: None,
            next_release: None,
            commits: Vec::new(),
            releases: Vec::new(),
        }
    }
}

/// A release descriptor returned by an `add_channel` or `publish` plugin,
/// collected into `Context::releases` for the `success` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRelease {
    /// Plugin that produced the release.
    pub plugin_name: String,
    /// Human name of the published artefact (defaults to the git tag).
    pub name: String,
    pub url: Option<String>,
    pub channel: Option<String>,
    pub version: String,
}

/// One release plugin.
///
/// Every step has a no-op default so a plugin only implements the steps
/// it participates in. Steps are invoked strictly sequentially in
/// configured order; see the step table in [crate::pipeline::steps] for
/// the aggregation and failure semantics of each step.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Verify configuration and credentials before anything else runs.
    fn verify_conditions(&self, _ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// Determine the release type implied by the commits, or `None` for
    /// no release.
    fn analyze_commits(&self, _ctx: &Context) -> Result<Option<ReleaseType>> {
        Ok(None)
    }

    /// Verify the computed release before it is prepared.
    fn verify_release(&self, _ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// Produce release notes for the commits in context.
    fn generate_notes(&self, _ctx: &Context) -> Result<Option<String>> {
        Ok(None)
    }

    /// Prepare the release, possibly committing to the working copy.
    fn prepare(&self, _ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// Add an existing release to the branch's channel.
    fn add_channel(&self, _ctx: &Context) -> Result<Option<PluginRelease>> {
        Ok(None)
    }

    /// Publish the release.
    fn publish(&self, _ctx: &Context) -> Result<Option<PluginRelease>> {
        Ok(None)
    }

    /// Notify about a published release.
    fn success(&self, _ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// Notify about a failed run. Receives the user-facing errors.
    fn fail(&self, _ctx: &Context, _errors: &[SemrelError]) -> Result<()> {
        Ok(())
    }
}

/// The configured plugin list, in invocation order.
pub struct PluginSet {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginSet {
    pub fn new() -> Self {
        PluginSet {
            plugins: Vec::new(),
        }
    }

    /// The built-in pipeline: conventional-commit analysis plus the
    /// default notes generator.
    pub fn with_defaults() -> Self {
        let mut set = PluginSet::new();
        set.add(Box::new(crate::analyzer::CommitAnalyzer::new()));
        set.add(Box::new(crate::notes::NotesGenerator));
        set
    }

    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Default for PluginSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::branch::BranchType;
    use crate::domain::range::ReleaseRange;
    use semver::Version;

    struct Named(&'static str);

    impl Plugin for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn context() -> Context {
        let branch = Branch {
            name: "master".to_string(),
            branch_type: BranchType::Release,
            channel: None,
            range: ReleaseRange::from(Version::new(1, 0, 0)),
            tags: vec![],
            prerelease: None,
            merge_range: None,
        };
        Context::new(Options::default(), branch.clone(), vec![branch])
    }

    #[test]
    fn test_default_steps_are_noops() {
        let plugin = Named("noop");
        let ctx = context();

        assert!(plugin.verify_conditions(&ctx).is_ok());
        assert_eq!(plugin.analyze_commits(&ctx).unwrap(), None);
        assert_eq!(plugin.generate_notes(&ctx).unwrap(), None);
        assert_eq!(plugin.publish(&ctx).unwrap(), None);
        assert!(plugin.fail(&ctx, &[]).is_ok());
    }

    #[test]
    fn test_plugin_set_preserves_order() {
        let mut set = PluginSet::new();
        set.add(Box::new(Named("first")));
        set.add(Box::new(Named("second")));

        let names: Vec<&str> = set.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_default_set_contains_builtins() {
        let set = PluginSet::with_defaults();
        let names: Vec<&str> = set.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["commit-analyzer", "release-notes"]);
    }
}
