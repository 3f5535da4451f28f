use crate::error::{Result, SemrelError};
use crate::git::{CommitInfo, GitFacade};
use git2::Oid;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// In-memory implementation of [GitFacade] for testing.
///
/// Stores a commit graph (commits plus parent edges), tags, branch heads
/// and remote state, and records every tag and push performed through the
/// trait so tests can assert on side effects and their order.
///
/// ```rust
/// # use semrel::git::{GitFacade, MockGit};
/// # use git2::Oid;
/// let mut git = MockGit::new();
/// let c1 = MockGit::oid(1);
/// let c2 = MockGit::oid(2);
/// git.add_commit(c1, &[], "feat: one");
/// git.add_commit(c2, &[c1], "fix: two");
/// git.set_branch_head("master", c2);
///
/// assert!(git.is_ancestor(c1, "master").unwrap());
/// assert_eq!(git.commits_between(Some(c1), c2).unwrap().len(), 1);
/// ```
pub struct MockGit {
    commits: HashMap<Oid, CommitInfo>,
    parents: HashMap<Oid, Vec<Oid>>,
    branch_heads: HashMap<String, Oid>,
    remote_heads: HashMap<String, Oid>,
    remote_url: Option<String>,
    head: Option<Oid>,
    current_branch: Option<String>,
    auth_ok: bool,
    tags: Mutex<HashMap<String, Oid>>,
    created_tags: Mutex<Vec<(String, Oid)>>,
    pushes: Mutex<Vec<(String, String)>>,
    fetched: Mutex<bool>,
}

impl MockGit {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockGit {
            commits: HashMap::new(),
            parents: HashMap::new(),
            branch_heads: HashMap::new(),
            remote_heads: HashMap::new(),
            remote_url: Some("https://github.com/owner/repo.git".to_string()),
            head: None,
            current_branch: None,
            auth_ok: true,
            tags: Mutex::new(HashMap::new()),
            created_tags: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            fetched: Mutex::new(false),
        }
    }

    /// Deterministic OID for tests: twenty copies of `n`.
    pub fn oid(n: u8) -> Oid {
        Oid::from_bytes(&[n; 20]).unwrap()
    }

    /// Add a commit with its parent edges and message.
    pub fn add_commit(&mut self, oid: Oid, parents: &[Oid], message: &str) {
        self.commits.insert(
            oid,
            CommitInfo {
                hash: oid.to_string(),
                message: message.to_string(),
                author: "Test Author".to_string(),
            },
        );
        self.parents.insert(oid, parents.to_vec());
    }

    /// Point a branch at a commit. The first branch set also becomes HEAD
    /// and the checked-out branch unless overridden later.
    pub fn set_branch_head(&mut self, branch: impl Into<String>, oid: Oid) {
        let branch = branch.into();
        if self.head.is_none() {
            self.head = Some(oid);
            self.current_branch = Some(branch.clone());
        }
        self.branch_heads.insert(branch, oid);
    }

    /// Pre-populate a tag, as if it had been fetched.
    pub fn add_tag(&mut self, name: impl Into<String>, oid: Oid) {
        self.tags.lock().unwrap().insert(name.into(), oid);
    }

    pub fn set_head(&mut self, oid: Oid) {
        self.head = Some(oid);
    }

    pub fn set_current_branch(&mut self, branch: impl Into<String>) {
        self.current_branch = Some(branch.into());
    }

    pub fn set_remote_url(&mut self, url: Option<&str>) {
        self.remote_url = url.map(|s| s.to_string());
    }

    /// Advertise a remote branch head, as `ls-remote` would.
    pub fn set_remote_head(&mut self, branch: impl Into<String>, oid: Oid) {
        self.remote_heads.insert(branch.into(), oid);
    }

    /// Make `verify_auth` and `push` fail.
    pub fn deny_auth(&mut self) {
        self.auth_ok = false;
    }

    /// Tags created through the facade, in creation order.
    pub fn created_tags(&self) -> Vec<(String, Oid)> {
        self.created_tags.lock().unwrap().clone()
    }

    /// Pushes performed through the facade, in order, as `(url, branch)`.
    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn was_fetched(&self) -> bool {
        *self.fetched.lock().unwrap()
    }

    /// All commits reachable from `oid`, including `oid` itself, in
    /// breadth-first visit order (newest first for linear histories).
    fn ancestors(&self, oid: Oid) -> Vec<Oid> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([oid]);
        let mut order = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            order.push(current);
            if let Some(parents) = self.parents.get(&current) {
                queue.extend(parents.iter().copied());
            }
        }
        order
    }
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitFacade for MockGit {
    fn is_repo(&self) -> bool {
        true
    }

    fn fetch(&self) -> Result<()> {
        *self.fetched.lock().unwrap() = true;
        Ok(())
    }

    fn head(&self) -> Result<Oid> {
        self.head
            .ok_or_else(|| SemrelError::Git(git2::Error::from_str("HEAD is unborn")))
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.current_branch.clone())
    }

    fn tags(&self) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self.tags.lock().unwrap().keys().cloned().collect();
        tags.sort();
        Ok(tags)
    }

    fn tag_head(&self, name: &str) -> Result<Option<Oid>> {
        Ok(self.tags.lock().unwrap().get(name).copied())
    }

    fn ref_exists(&self, name: &str) -> bool {
        self.tags.lock().unwrap().contains_key(name) || self.branch_heads.contains_key(name)
    }

    fn branch_head(&self, branch: &str) -> Result<Option<Oid>> {
        Ok(self.branch_heads.get(branch).copied())
    }

    fn is_ancestor(&self, oid: Oid, branch: &str) -> Result<bool> {
        let Some(head) = self.branch_heads.get(branch) else {
            return Ok(false);
        };
        Ok(self.ancestors(*head).contains(&oid))
    }

    fn commits_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<CommitInfo>> {
        let excluded: HashSet<Oid> = match from {
            Some(from) => self.ancestors(from).into_iter().collect(),
            None => HashSet::new(),
        };

        let mut commits: Vec<CommitInfo> = self
            .ancestors(to)
            .into_iter()
            .filter(|oid| !excluded.contains(oid))
            .filter_map(|oid| self.commits.get(&oid).cloned())
            .collect();

        commits.reverse();
        Ok(commits)
    }

    fn remote_url(&self) -> Result<Option<String>> {
        Ok(self.remote_url.clone())
    }

    fn verify_auth(&self, url: &str, _branch: &str) -> Result<()> {
        if self.auth_ok {
            Ok(())
        } else {
            Err(SemrelError::Git(git2::Error::from_str(&format!(
                "authentication required for {url}"
            ))))
        }
    }

    fn tag(&self, name: &str, target: Oid) -> Result<()> {
        self.tags.lock().unwrap().insert(name.to_string(), target);
        self.created_tags
            .lock()
            .unwrap()
            .push((name.to_string(), target));
        Ok(())
    }

    fn push(&self, url: &str, branch: &str) -> Result<()> {
        if !self.auth_ok {
            return Err(SemrelError::Git(git2::Error::from_str(&format!(
                "push rejected for {url}"
            ))));
        }
        self.pushes
            .lock()
            .unwrap()
            .push((url.to_string(), branch.to_string()));
        Ok(())
    }

    fn remote_head(&self, branch: &str) -> Result<Option<Oid>> {
        Ok(self.remote_heads.get(branch).copied())
    }
}
