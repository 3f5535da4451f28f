//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations
//! the release orchestrator needs, with two implementations:
//!
//! - [repository::Git2Facade]: a real implementation using the `git2` crate
//! - [mock::MockGit]: an in-memory implementation for testing
//!
//! Most code should depend on the [GitFacade] trait rather than concrete
//! implementations.

pub mod mock;
pub mod repository;

pub use mock::MockGit;
pub use repository::Git2Facade;

use crate::error::Result;
use git2::Oid;

/// Commit information forwarded to the analyze and notes plugins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
    /// The commit author
    pub author: String,
}

/// The reference namespace used by [GitFacade::check_ref_format].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Heads,
    Tags,
}

impl RefKind {
    fn prefix(&self) -> &'static str {
        match self {
            RefKind::Heads => "heads",
            RefKind::Tags => "tags",
        }
    }
}

/// Contract over a git repository.
///
/// Lookup operations (`tag_head`, `branch_head`, `remote_head`,
/// `ref_exists`, `is_branch_up_to_date`) report a missing ref as an
/// absent value rather than an error; mutating operations (`fetch`,
/// `tag`, `push`, `verify_auth`) propagate failures.
///
/// Implementors must be `Send + Sync`.
pub trait GitFacade: Send + Sync {
    /// Whether the working directory is inside a git repository.
    fn is_repo(&self) -> bool;

    /// Fetch all branches and tags from the remote, unshallowing the
    /// clone if needed. Succeeds when the repository is already complete.
    fn fetch(&self) -> Result<()>;

    /// The commit at HEAD.
    fn head(&self) -> Result<Oid>;

    /// Short name of the currently checked-out branch, if HEAD is on one.
    fn current_branch(&self) -> Result<Option<String>>;

    /// All tag names in the repository.
    fn tags(&self) -> Result<Vec<String>>;

    /// The commit a tag points to, peeled through annotated tags.
    /// `None` when the tag does not exist.
    fn tag_head(&self, name: &str) -> Result<Option<Oid>>;

    /// Whether a revspec resolves to an object in the local repository.
    fn ref_exists(&self, name: &str) -> bool;

    /// The commit at the tip of a local branch, `None` when the branch
    /// does not exist.
    fn branch_head(&self, branch: &str) -> Result<Option<Oid>>;

    /// Whether `oid` is an ancestor of (or equal to) the tip of `branch`.
    fn is_ancestor(&self, oid: Oid, branch: &str) -> Result<bool>;

    /// Commits in `(from .. to]`, oldest first. With no `from`, every
    /// commit reachable from `to`.
    fn commits_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<CommitInfo>>;

    /// URL of the `origin` remote, if configured.
    fn remote_url(&self) -> Result<Option<String>>;

    /// Verify push authorisation against `url` with a connection
    /// handshake, without pushing anything.
    fn verify_auth(&self, url: &str, branch: &str) -> Result<()>;

    /// Create a lightweight tag at the given commit.
    fn tag(&self, name: &str, target: Oid) -> Result<()>;

    /// Push the branch and all tags to `url`.
    fn push(&self, url: &str, branch: &str) -> Result<()>;

    /// Whether `name` is a well-formed ref name in the given namespace,
    /// per `git check-ref-format`.
    fn check_ref_format(&self, kind: RefKind, name: &str) -> bool {
        git2::Reference::is_valid_name(&format!("refs/{}/{}", kind.prefix(), name))
    }

    /// Tip of the branch on the remote (`ls-remote`), `None` when the
    /// remote does not advertise the branch.
    fn remote_head(&self, branch: &str) -> Result<Option<Oid>>;

    /// Whether the remote head of `branch` is an ancestor of the local
    /// branch. A branch the remote does not know about is up to date.
    fn is_branch_up_to_date(&self, branch: &str) -> Result<bool> {
        match self.remote_head(branch)? {
            Some(remote) => self.is_ancestor(remote, branch),
            None => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RefFormatOnly;

    impl GitFacade for RefFormatOnly {
        fn is_repo(&self) -> bool {
            false
        }
        fn fetch(&self) -> Result<()> {
            Ok(())
        }
        fn head(&self) -> Result<Oid> {
            unimplemented!()
        }
        fn current_branch(&self) -> Result<Option<String>> {
            Ok(None)
        }
        fn tags(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
        fn tag_head(&self, _name: &str) -> Result<Option<Oid>> {
            Ok(None)
        }
        fn ref_exists(&self, _name: &str) -> bool {
            false
        }
        fn branch_head(&self, _branch: &str) -> Result<Option<Oid>> {
            Ok(None)
        }
        fn is_ancestor(&self, _oid: Oid, _branch: &str) -> Result<bool> {
            Ok(false)
        }
        fn commits_between(&self, _from: Option<Oid>, _to: Oid) -> Result<Vec<CommitInfo>> {
            Ok(vec![])
        }
        fn remote_url(&self) -> Result<Option<String>> {
            Ok(None)
        }
        fn verify_auth(&self, _url: &str, _branch: &str) -> Result<()> {
            Ok(())
        }
        fn tag(&self, _name: &str, _target: Oid) -> Result<()> {
            Ok(())
        }
        fn push(&self, _url: &str, _branch: &str) -> Result<()> {
            Ok(())
        }
        fn remote_head(&self, _branch: &str) -> Result<Option<Oid>> {
            Ok(None)
        }
    }

    #[test]
    fn test_check_ref_format_accepts_common_names() {
        let git = RefFormatOnly;
        assert!(git.check_ref_format(RefKind::Heads, "master"));
        assert!(git.check_ref_format(RefKind::Heads, "1.x"));
        assert!(git.check_ref_format(RefKind::Heads, "release/2.x"));
        assert!(git.check_ref_format(RefKind::Tags, "v1.0.0"));
        assert!(git.check_ref_format(RefKind::Tags, "v1.0.0@next"));
    }

    #[test]
    fn test_check_ref_format_rejects_invalid_names() {
        let git = RefFormatOnly;
        assert!(!git.check_ref_format(RefKind::Heads, ""));
        assert!(!git.check_ref_format(RefKind::Heads, "double..dot"));
        assert!(!git.check_ref_format(RefKind::Heads, "trailing.lock"));
        assert!(!git.check_ref_format(RefKind::Tags, "with space"));
        assert!(!git.check_ref_format(RefKind::Tags, "v1.0.0@{bad}"));
    }
}
