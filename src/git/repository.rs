use crate::error::{Result, SemrelError};
use crate::git::{CommitInfo, GitFacade};
use git2::{Direction, Oid, Repository as Git2Repo};
use std::path::Path;

/// Concrete implementation of the [GitFacade] trait using the git2 library.
///
/// All methods convert `git2::Error` to [SemrelError] variants; lookups
/// that merely miss (unknown tag, unknown branch) are reported as `None`.
pub struct Git2Facade {
    repo: Git2Repo,
}

impl std::fmt::Debug for Git2Facade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git2Facade")
            .field("path", &self.repo.path())
            .finish()
    }
}

// `git2::Repository` holds a raw libgit2 pointer and is therefore not
// `Sync` by default, even though all `GitFacade` methods only take `&self`
// and never mutate shared state concurrently. The trait requires `Sync` for
// implementors; this crate never shares a `Git2Facade` across threads
// without external synchronization, so upholding that bound here is sound.
unsafe impl Sync for Git2Facade {}

impl Git2Facade {
    /// Discover and open the repository containing `path`.
    ///
    /// Searches for a `.git` directory from `path` upwards; a miss is the
    /// user-facing `ENOGITREPO` error.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path).map_err(|_| SemrelError::NoGitRepo)?;
        Ok(Git2Facade { repo })
    }

    /// Wrap an existing git2::Repository.
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Facade { repo }
    }

    /// Remote callbacks with the default credential chain: ssh key lookup
    /// for ssh remotes, the credential helper / URL userinfo otherwise.
    fn callbacks<'cb>() -> git2::RemoteCallbacks<'cb> {
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                if let Some(username) = username_from_url {
                    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                    return git2::Cred::ssh_key(
                        username,
                        None,
                        Path::new(&format!("{home}/.ssh/id_rsa")),
                        None,
                    );
                }
            }
            git2::Cred::default()
        });
        callbacks
    }
}

impl GitFacade for Git2Facade {
    fn is_repo(&self) -> bool {
        true
    }

    fn fetch(&self) -> Result<()> {
        let mut remote = self.repo.find_remote("origin")?;

        let mut options = git2::FetchOptions::new();
        options.download_tags(git2::AutotagOption::All);
        options.remote_callbacks(Self::callbacks());
        if self.repo.is_shallow() {
            // Unshallow: libgit2 treats INT32_MAX depth as "everything".
            options.depth(i32::MAX);
        }

        let refspecs: &[&str] = &["+refs/heads/*:refs/remotes/origin/*"];
        remote.fetch(refspecs, Some(&mut options), None)?;
        Ok(())
    }

    fn head(&self) -> Result<Oid> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(|s| s.to_string()))
    }

    fn tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;
        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn tag_head(&self, name: &str) -> Result<Option<Oid>> {
        match self.repo.find_reference(&format!("refs/tags/{name}")) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn ref_exists(&self, name: &str) -> bool {
        self.repo.revparse_single(name).is_ok()
    }

    fn branch_head(&self, branch: &str) -> Result<Option<Oid>> {
        match self.repo.find_branch(branch, git2::BranchType::Local) {
            Ok(b) => Ok(b.get().target()),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn is_ancestor(&self, oid: Oid, branch: &str) -> Result<bool> {
        let Some(head) = self.branch_head(branch)? else {
            return Ok(false);
        };
        if head == oid {
            return Ok(true);
        }
        Ok(self.repo.graph_descendant_of(head, oid)?)
    }

    fn commits_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(to)?;
        if let Some(from) = from {
            revwalk.hide(from)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            commits.push(CommitInfo {
                hash: oid.to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
            });
        }

        // Revwalk yields newest first
        commits.reverse();
        Ok(commits)
    }

    fn remote_url(&self) -> Result<Option<String>> {
        match self.repo.find_remote("origin") {
            Ok(remote) => Ok(remote.url().map(|s| s.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn verify_auth(&self, url: &str, _branch: &str) -> Result<()> {
        let mut remote = self.repo.remote_anonymous(url)?;
        // Connecting in push direction performs the auth handshake without
        // sending any ref updates.
        let connection = remote.connect_auth(Direction::Push, Some(Self::callbacks()), None)?;
        drop(connection);
        Ok(())
    }

    fn tag(&self, name: &str, target: Oid) -> Result<()> {
        let object = self.repo.find_object(target, None)?;
        self.repo.tag_lightweight(name, &object, false)?;
        Ok(())
    }

    fn push(&self, url: &str, branch: &str) -> Result<()> {
        let mut remote = self.repo.remote_anonymous(url)?;

        let mut callbacks = Self::callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "push rejected for {refname}: {status}"
            ))),
            None => Ok(()),
        });

        let mut options = git2::PushOptions::new();
        options.remote_callbacks(callbacks);

        let branch_refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let refspecs = [branch_refspec.as_str(), "refs/tags/*:refs/tags/*"];
        remote.push(&refspecs, Some(&mut options))?;
        Ok(())
    }

    fn remote_head(&self, branch: &str) -> Result<Option<Oid>> {
        let Ok(mut remote) = self.repo.find_remote("origin") else {
            return Ok(None);
        };
        let Ok(connection) = remote.connect_auth(Direction::Fetch, Some(Self::callbacks()), None)
        else {
            return Ok(None);
        };

        let wanted = format!("refs/heads/{branch}");
        let head = connection
            .list()?
            .iter()
            .find(|head| head.name() == wanted)
            .map(|head| head.oid());
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_outside_repository_is_coded() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Git2Facade::discover(tmp.path()).unwrap_err();
        assert_eq!(err.code(), Some("ENOGITREPO"));
    }

    #[test]
    fn test_discover_inside_repository() {
        let tmp = tempfile::tempdir().unwrap();
        Git2Repo::init(tmp.path()).unwrap();
        let facade = Git2Facade::discover(tmp.path()).unwrap();
        assert!(facade.is_repo());
        assert!(facade.tags().unwrap().is_empty());
        assert!(!facade.ref_exists("v1.0.0"));
    }
}
