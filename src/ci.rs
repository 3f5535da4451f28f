//! CI environment detection.
//!
//! The release gate only needs three facts: are we in CI, which branch is
//! being built, and is this a pull request build. Recognises GitHub
//! Actions, GitLab CI and CircleCI explicitly, plus the generic `CI`
//! variable.

use std::collections::HashMap;

/// The CI facts consumed by the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    pub is_ci: bool,
    /// Branch the CI job is building, when the service exposes it.
    pub branch: Option<String>,
    pub is_pr: bool,
}

impl CiEnvironment {
    /// Detect from the process environment.
    pub fn detect() -> Self {
        Self::from_vars(std::env::vars().collect())
    }

    /// Detect from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        let get = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();
        let set = |key: &str| get(key).is_some();

        if get("GITHUB_ACTIONS").as_deref() == Some("true") {
            let is_pr = matches!(
                get("GITHUB_EVENT_NAME").as_deref(),
                Some("pull_request") | Some("pull_request_target")
            );
            // On PR builds GITHUB_REF_NAME is the merge ref; the source
            // branch is in GITHUB_HEAD_REF.
            let branch = if is_pr {
                get("GITHUB_HEAD_REF")
            } else {
                get("GITHUB_REF_NAME")
            };
            return CiEnvironment {
                is_ci: true,
                branch,
                is_pr,
            };
        }

        if get("GITLAB_CI").as_deref() == Some("true") {
            return CiEnvironment {
                is_ci: true,
                branch: get("CI_COMMIT_REF_NAME"),
                is_pr: set("CI_MERGE_REQUEST_ID"),
            };
        }

        if get("CIRCLECI").as_deref() == Some("true") {
            return CiEnvironment {
                is_ci: true,
                branch: get("CIRCLE_BRANCH"),
                is_pr: set("CIRCLE_PULL_REQUEST"),
            };
        }

        CiEnvironment {
            is_ci: get("CI").as_deref() == Some("true"),
            branch: None,
            is_pr: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_not_ci() {
        let env = CiEnvironment::from_vars(vars(&[]));
        assert!(!env.is_ci);
        assert!(!env.is_pr);
        assert_eq!(env.branch, None);
    }

    #[test]
    fn test_github_actions_branch_build() {
        let env = CiEnvironment::from_vars(vars(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_EVENT_NAME", "push"),
            ("GITHUB_REF_NAME", "master"),
        ]));
        assert!(env.is_ci);
        assert!(!env.is_pr);
        assert_eq!(env.branch.as_deref(), Some("master"));
    }

    #[test]
    fn test_github_actions_pull_request() {
        let env = CiEnvironment::from_vars(vars(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_EVENT_NAME", "pull_request"),
            ("GITHUB_REF_NAME", "42/merge"),
            ("GITHUB_HEAD_REF", "feature/x"),
        ]));
        assert!(env.is_ci);
        assert!(env.is_pr);
        assert_eq!(env.branch.as_deref(), Some("feature/x"));
    }

    #[test]
    fn test_gitlab_ci() {
        let env = CiEnvironment::from_vars(vars(&[
            ("GITLAB_CI", "true"),
            ("CI_COMMIT_REF_NAME", "main"),
        ]));
        assert!(env.is_ci);
        assert!(!env.is_pr);
        assert_eq!(env.branch.as_deref(), Some("main"));

        let env = CiEnvironment::from_vars(vars(&[
            ("GITLAB_CI", "true"),
            ("CI_COMMIT_REF_NAME", "feature"),
            ("CI_MERGE_REQUEST_ID", "7"),
        ]));
        assert!(env.is_pr);
    }

    #[test]
    fn test_circleci() {
        let env = CiEnvironment::from_vars(vars(&[
            ("CIRCLECI", "true"),
            ("CIRCLE_BRANCH", "develop"),
            ("CIRCLE_PULL_REQUEST", "https://github.com/o/r/pull/3"),
        ]));
        assert!(env.is_ci);
        assert!(env.is_pr);
        assert_eq!(env.branch.as_deref(), Some("develop"));
    }

    #[test]
    fn test_generic_ci_variable() {
        let env = CiEnvironment::from_vars(vars(&[("CI", "true")]));
        assert!(env.is_ci);
        assert_eq!(env.branch, None);
    }
}
