//! The plugin pipeline driver.
//!
//! Runs the fixed, ordered sequence of plugin steps for one invocation:
//! verification, back-ported channel additions, commit analysis, note
//! generation, preparation, tagging and pushing, publication and the
//! success / fail callbacks. Ordering is guaranteed: a tag exists locally
//! and remotely before the first `publish` plugin runs, and `success`
//! runs after `publish`.

pub mod exec;
pub mod plugin;
pub mod steps;

pub use plugin::{Context, Plugin, PluginRelease, PluginSet};

use crate::config::Options;
use crate::domain::branch::Branch;
use crate::domain::release::Release;
use crate::domain::tag::TagFormat;
use crate::error::{Result, SemrelError};
use crate::git::GitFacade;
use crate::planner;
use crate::scrub::Scrubber;

/// What an invocation of the pipeline produced.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// A release was published.
    Released {
        next_release: Release,
        releases: Vec<PluginRelease>,
    },
    /// Dry-run: the release that would have been published.
    DryRun { next_release: Release },
    /// The commits since the last release call for no release.
    NoRelease,
}

impl PipelineOutcome {
    pub fn is_release(&self) -> bool {
        !matches!(self, PipelineOutcome::NoRelease)
    }
}

/// Drives the plugin steps for one admitted invocation.
pub struct PipelineDriver<'a> {
    git: &'a dyn GitFacade,
    plugins: &'a PluginSet,
    repository_url: String,
    dry_run: bool,
    scrubber: Scrubber,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(
        git: &'a dyn GitFacade,
        plugins: &'a PluginSet,
        repository_url: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        PipelineDriver {
            git,
            plugins,
            repository_url: repository_url.into(),
            dry_run,
            scrubber: Scrubber::from_env(),
        }
    }

    /// Run the pipeline on the active branch.
    ///
    /// On an error path, user-facing errors are routed to the `fail`
    /// plugins (never during dry-run) and internal errors are logged;
    /// the error is then re-surfaced to the caller.
    pub fn run(
        &self,
        options: &Options,
        branches: &[Branch],
        branch: &Branch,
        format: &TagFormat,
    ) -> Result<PipelineOutcome> {
        let base = Context::new(options.clone(), branch.clone(), branches.to_vec());
        match self.run_inner(&base, branch, branches, format) {
            Ok(outcome) => Ok(outcome),
            Err(error) => Err(self.handle_failure(&base, error)),
        }
    }

    fn run_inner(
        &self,
        base: &Context,
        branch: &Branch,
        branches: &[Branch],
        format: &TagFormat,
    ) -> Result<PipelineOutcome> {
        steps::run_collect_errors("verifyConditions", self.plugins, base, |p, c| {
            p.verify_conditions(c)
        })?;

        let plan = planner::plan_releases_to_add(branch, branches, format);
        let mut releases: Vec<PluginRelease> = Vec::new();

        for entry in &plan.releases_to_add {
            let from = entry.last_release.as_ref().map(|r| r.git_head);
            let commits = self.git.commits_between(from, entry.next_release.git_head)?;

            let mut ctx = base.clone();
            ctx.last_release = entry.last_release.clone();
            ctx.current_release = Some(entry.current_release.clone());
            ctx.next_release = Some(entry.next_release.clone());
            ctx.commits = commits;

            let notes = steps::run_concat("generateNotes", self.plugins, &ctx, |p, c| {
                p.generate_notes(c)
            })?;
            let mut next_release = entry.next_release.clone();
            next_release.notes = notes;
            ctx.next_release = Some(next_release.clone());

            if self.dry_run {
                log::warn!(
                    "dry-run: version {} would be added to channel '{}' as {}",
                    next_release.version,
                    branch.channel.as_deref().unwrap_or("default"),
                    next_release.git_tag
                );
                continue;
            }

            log::info!(
                "adding version {} released on channel '{}' to channel '{}'",
                next_release.version,
                entry.current_release.channel.as_deref().unwrap_or("default"),
                branch.channel.as_deref().unwrap_or("default")
            );
            self.git.tag(&next_release.git_tag, next_release.git_head)?;
            self.git.push(&self.repository_url, &branch.name)?;

            let mut added =
                steps::run_sequential("addChannel", self.plugins, &ctx, |p, c| p.add_channel(c))?;
            releases.append(&mut added);

            ctx.releases = releases.clone();
            let errors =
                steps::run_always_all("success", self.plugins, &ctx, |p, c| p.success(c));
            surface(errors)?;
        }

        // Entries rejected by the maintenance merge range abort the run,
        // but only after every valid entry was processed.
        if !plan.errors.is_empty() {
            let mut errors = plan.errors;
            return Err(match errors.len() {
                1 => errors.remove(0),
                _ => SemrelError::Aggregate(errors),
            });
        }

        let last_release = planner::last_release(branch);
        let head = self.git.head()?;
        let commits = self
            .git
            .commits_between(last_release.as_ref().map(|r| r.git_head), head)?;
        log::info!(
            "found {} commits since last release on branch '{}'",
            commits.len(),
            branch.name
        );

        let mut ctx = base.clone();
        ctx.last_release = last_release.clone();
        ctx.commits = commits;

        let release_type = steps::run_first_result("analyzeCommits", self.plugins, &ctx, |p, c| {
            p.analyze_commits(c)
        })?;
        let Some(release_type) = release_type else {
            log::info!("no release required on branch '{}'", branch.name);
            return Ok(PipelineOutcome::NoRelease);
        };

        let mut next_release =
            planner::next_release(branch, release_type, last_release.as_ref(), head, format)?;
        ctx.next_release = Some(next_release.clone());

        steps::run_collect_errors("verifyRelease", self.plugins, &ctx, |p, c| {
            p.verify_release(c)
        })?;

        if self.dry_run {
            let notes = steps::run_concat("generateNotes", self.plugins, &ctx, |p, c| {
                p.generate_notes(c)
            })?;
            log::warn!(
                "dry-run: version {} would be released as {}",
                next_release.version,
                next_release.git_tag
            );
            if let Some(notes) = &notes {
                println!("{}", self.scrubber.scrub(notes));
            }
            next_release.notes = notes;
            return Ok(PipelineOutcome::DryRun { next_release });
        }

        let notes = steps::run_concat("generateNotes", self.plugins, &ctx, |p, c| {
            p.generate_notes(c)
        })?;
        next_release.notes = notes;
        ctx.next_release = Some(next_release.clone());

        // Prepare plugins may commit to the working copy: after each one,
        // re-read HEAD and regenerate the notes so the next plugin (and
        // ultimately publish) sees the tag that will actually be pushed.
        for prepare_plugin in self.plugins.iter() {
            log::debug!("running prepare for plugin '{}'", prepare_plugin.name());
            prepare_plugin.prepare(&ctx)?;

            let new_head = self.git.head()?;
            next_release.git_head = new_head;
            ctx.commits = self
                .git
                .commits_between(last_release.as_ref().map(|r| r.git_head), new_head)?;
            ctx.next_release = Some(next_release.clone());
            next_release.notes = steps::run_concat("generateNotes", self.plugins, &ctx, |p, c| {
                p.generate_notes(c)
            })?;
            ctx.next_release = Some(next_release.clone());
        }

        self.git.tag(&next_release.git_tag, next_release.git_head)?;
        self.git.push(&self.repository_url, &branch.name)?;
        log::info!(
            "created tag {} at {}",
            next_release.git_tag,
            next_release.git_head
        );

        let mut published =
            steps::run_sequential("publish", self.plugins, &ctx, |p, c| p.publish(c))?;
        releases.append(&mut published);

        ctx.releases = releases.clone();
        let errors = steps::run_always_all("success", self.plugins, &ctx, |p, c| p.success(c));
        surface(errors)?;

        log::info!(
            "published version {} on channel '{}'",
            next_release.version,
            branch.channel.as_deref().unwrap_or("default")
        );
        Ok(PipelineOutcome::Released {
            next_release,
            releases,
        })
    }

    /// Split an error path into user-facing and internal errors, route the
    /// user-facing ones to the `fail` plugins, log the rest.
    fn handle_failure(&self, ctx: &Context, error: SemrelError) -> SemrelError {
        let (user, internal): (Vec<SemrelError>, Vec<SemrelError>) = error
            .into_errors()
            .into_iter()
            .partition(|e| e.is_user_facing());

        for error in &internal {
            log::error!("internal error: {error}");
        }
        for error in &user {
            match (error.code(), error.details()) {
                (Some(code), Some(details)) => log::error!("{code} {error}\n\n{details}"),
                _ => log::error!("{error}"),
            }
        }

        if !user.is_empty() && !self.dry_run {
            // Errors raised by fail plugins themselves are only logged.
            let _ = steps::run_always_all("fail", self.plugins, ctx, |p, c| p.fail(c, &user));
        }

        let mut all = user;
        all.extend(internal);
        match all.len() {
            1 => all.remove(0),
            _ => SemrelError::Aggregate(all),
        }
    }
}

fn surface(mut errors: Vec<SemrelError>) -> Result<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(SemrelError::Aggregate(errors)),
    }
}
