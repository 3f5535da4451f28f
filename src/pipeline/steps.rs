//! The plugin step table and the generic runners that implement each
//! aggregation mode.
//!
//! | Step             | Aggregation   | On error            |
//! |------------------|---------------|---------------------|
//! | verifyConditions | CollectErrors | aggregate and abort |
//! | analyzeCommits   | FirstResult   | abort               |
//! | verifyRelease    | CollectErrors | aggregate and abort |
//! | generateNotes    | Concat        | abort               |
//! | prepare          | Sequential    | abort               |
//! | addChannel       | Sequential    | abort               |
//! | publish          | Sequential    | abort               |
//! | success          | AlwaysAll     | accumulate, surface |
//! | fail             | AlwaysAll     | log only            |

use crate::error::{Result, SemrelError};
use crate::pipeline::plugin::{Context, Plugin, PluginSet};

/// How a step combines the results of its plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Run all plugins, collect every error, surface them as one
    /// aggregate.
    CollectErrors,
    /// Run in order; the first plugin returning a value wins, later
    /// plugins only matter when every earlier one abstained.
    FirstResult,
    /// Concatenate all produced values with a blank-line separator.
    Concat,
    /// Run in order, abort on the first error, collect produced values.
    Sequential,
    /// Run every plugin even when one fails; accumulate the errors.
    AlwaysAll,
}

/// One row of the step table.
pub struct StepSpec {
    pub name: &'static str,
    pub aggregation: Aggregation,
}

/// The fixed plugin surface, in pipeline order.
pub const STEPS: &[StepSpec] = &[
    StepSpec { name: "verifyConditions", aggregation: Aggregation::CollectErrors },
    StepSpec { name: "analyzeCommits", aggregation: Aggregation::FirstResult },
    StepSpec { name: "verifyRelease", aggregation: Aggregation::CollectErrors },
    StepSpec { name: "generateNotes", aggregation: Aggregation::Concat },
    StepSpec { name: "prepare", aggregation: Aggregation::Sequential },
    StepSpec { name: "addChannel", aggregation: Aggregation::Sequential },
    StepSpec { name: "publish", aggregation: Aggregation::Sequential },
    StepSpec { name: "success", aggregation: Aggregation::AlwaysAll },
    StepSpec { name: "fail", aggregation: Aggregation::AlwaysAll },
];

fn aggregation_of(step: &str) -> Aggregation {
    STEPS
        .iter()
        .find(|s| s.name == step)
        .map(|s| s.aggregation)
        .unwrap_or(Aggregation::Sequential)
}

/// Run a `CollectErrors` step: all plugins run, every failure is kept.
pub fn run_collect_errors<F>(step: &'static str, plugins: &PluginSet, ctx: &Context, call: F) -> Result<()>
where
    F: Fn(&dyn Plugin, &Context) -> Result<()>,
{
    debug_assert_eq!(aggregation_of(step), Aggregation::CollectErrors);

    let mut errors = Vec::new();
    for plugin in plugins.iter() {
        log::debug!("running {step} for plugin '{}'", plugin.name());
        if let Err(error) = call(plugin, ctx) {
            errors.push(error);
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(SemrelError::Aggregate(errors)),
    }
}

/// Run a `FirstResult` step: the first non-absent result wins.
pub fn run_first_result<T, F>(
    step: &'static str,
    plugins: &PluginSet,
    ctx: &Context,
    call: F,
) -> Result<Option<T>>
where
    F: Fn(&dyn Plugin, &Context) -> Result<Option<T>>,
{
    debug_assert_eq!(aggregation_of(step), Aggregation::FirstResult);

    let mut result = None;
    for plugin in plugins.iter() {
        log::debug!("running {step} for plugin '{}'", plugin.name());
        let value = call(plugin, ctx)?;
        if result.is_none() {
            result = value;
        }
    }
    Ok(result)
}

/// Run a `Concat` step: join produced values with a blank line, skipping
/// plugins that produced nothing.
pub fn run_concat<F>(
    step: &'static str,
    plugins: &PluginSet,
    ctx: &Context,
    call: F,
) -> Result<Option<String>>
where
    F: Fn(&dyn Plugin, &Context) -> Result<Option<String>>,
{
    debug_assert_eq!(aggregation_of(step), Aggregation::Concat);

    let mut parts = Vec::new();
    for plugin in plugins.iter() {
        log::debug!("running {step} for plugin '{}'", plugin.name());
        if let Some(part) = call(plugin, ctx)? {
            parts.push(part);
        }
    }

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("\n\n")))
    }
}

/// Run a `Sequential` step: abort on the first error, keep every value
/// produced so far.
pub fn run_sequential<T, F>(
    step: &'static str,
    plugins: &PluginSet,
    ctx: &Context,
    call: F,
) -> Result<Vec<T>>
where
    F: Fn(&dyn Plugin, &Context) -> Result<Option<T>>,
{
    debug_assert_eq!(aggregation_of(step), Aggregation::Sequential);

    let mut values = Vec::new();
    for plugin in plugins.iter() {
        log::debug!("running {step} for plugin '{}'", plugin.name());
        if let Some(value) = call(plugin, ctx)? {
            values.push(value);
        }
    }
    Ok(values)
}

/// Run an `AlwaysAll` step: every plugin is called regardless of earlier
/// failures; the accumulated errors are returned to the caller, which
/// decides whether to surface or merely log them.
pub fn run_always_all<F>(
    step: &'static str,
    plugins: &PluginSet,
    ctx: &Context,
    call: F,
) -> Vec<SemrelError>
where
    F: Fn(&dyn Plugin, &Context) -> Result<()>,
{
    debug_assert_eq!(aggregation_of(step), Aggregation::AlwaysAll);

    let mut errors = Vec::new();
    for plugin in plugins.iter() {
        log::debug!("running {step} for plugin '{}'", plugin.name());
        if let Err(error) = call(plugin, ctx) {
            log::error!("plugin '{}' failed during {step}: {error}", plugin.name());
            errors.push(error);
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::domain::branch::{Branch, BranchType};
    use crate::domain::range::ReleaseRange;
    use crate::domain::version::ReleaseType;
    use semver::Version;

    struct Scripted {
        name: &'static str,
        analyze: Option<ReleaseType>,
        notes: Option<&'static str>,
        fail_verify: bool,
    }

    impl Scripted {
        fn new(name: &'static str) -> Self {
            Scripted {
                name,
                analyze: None,
                notes: None,
                fail_verify: false,
            }
        }
    }

    impl Plugin for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn verify_conditions(&self, _ctx: &Context) -> Result<()> {
            if self.fail_verify {
                Err(SemrelError::plugin(self.name, "verifyConditions", "boom"))
            } else {
                Ok(())
            }
        }

        fn analyze_commits(&self, _ctx: &Context) -> Result<Option<ReleaseType>> {
            Ok(self.analyze)
        }

        fn generate_notes(&self, _ctx: &Context) -> Result<Option<String>> {
            Ok(self.notes.map(|n| n.to_string()))
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

    fn set(plugins: Vec<Scripted>) -> PluginSet {
        let mut s = PluginSet::new();
        for p in plugins {
            s.add(Box::new(p));
        }
        s
    }

    #[test]
    fn test_step_table_covers_the_full_surface() {
        let names: Vec<&str> = STEPS.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "verifyConditions",
                "analyzeCommits",
                "verifyRelease",
                "generateNotes",
                "prepare",
                "addChannel",
                "publish",
                "success",
                "fail"
            ]
        );
    }

    #[test]
    fn test_collect_errors_keeps_all_failures() {
        let mut a = Scripted::new("a");
        a.fail_verify = true;
        let mut b = Scripted::new("b");
        b.fail_verify = true;
        let plugins = set(vec![a, b, Scripted::new("c")]);

        let err = run_collect_errors("verifyConditions", &plugins, &context(), |p, c| {
            p.verify_conditions(c)
        })
        .unwrap_err();
        assert_eq!(err.into_errors().len(), 2);
    }

    #[test]
    fn test_collect_errors_single_failure_not_wrapped() {
        let mut a = Scripted::new("a");
        a.fail_verify = true;
        let plugins = set(vec![a]);

        let err = run_collect_errors("verifyConditions", &plugins, &context(), |p, c| {
            p.verify_conditions(c)
        })
        .unwrap_err();
        assert!(matches!(err, SemrelError::Plugin { .. }));
    }

    #[test]
    fn test_first_result_wins() {
        let mut a = Scripted::new("a");
        a.analyze = Some(ReleaseType::Minor);
        let mut b = Scripted::new("b");
        b.analyze = Some(ReleaseType::Major);
        let plugins = set(vec![Scripted::new("abstains"), a, b]);

        let result = run_first_result("analyzeCommits", &plugins, &context(), |p, c| {
            p.analyze_commits(c)
        })
        .unwrap();
        assert_eq!(result, Some(ReleaseType::Minor));
    }

    #[test]
    fn test_first_result_none_when_all_abstain() {
        let plugins = set(vec![Scripted::new("a"), Scripted::new("b")]);
        let result = run_first_result("analyzeCommits", &plugins, &context(), |p, c| {
            p.analyze_commits(c)
        })
        .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_concat_joins_with_blank_line() {
        let mut a = Scripted::new("a");
        a.notes = Some("## Features");
        let mut b = Scripted::new("b");
        b.notes = Some("## Fixes");
        let plugins = set(vec![a, Scripted::new("abstains"), b]);

        let notes = run_concat("generateNotes", &plugins, &context(), |p, c| {
            p.generate_notes(c)
        })
        .unwrap();
        assert_eq!(notes.as_deref(), Some("## Features\n\n## Fixes"));
    }

    #[test]
    fn test_always_all_runs_everything() {
        let mut a = Scripted::new("a");
        a.fail_verify = true;
        let plugins = set(vec![a, Scripted::new("b")]);

        let errors = run_always_all("success", &plugins, &context(), |p, c| {
            p.verify_conditions(c)
        });
        assert_eq!(errors.len(), 1);
    }
}
