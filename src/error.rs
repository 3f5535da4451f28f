use thiserror::Error;

/// Unified error type for release orchestration.
///
/// Variants with a stable code (see [SemrelError::code]) are user-facing:
/// they describe a configuration or repository state the user can fix and
/// are routed to the `fail` plugins. Variants without a code are internal
/// failures and are only logged.
#[derive(Error, Debug)]
pub enum SemrelError {
    #[error("The current directory is not a git repository")]
    NoGitRepo,

    #[error("No repository URL is configured and none could be read from the git remote")]
    NoRepoUrl,

    #[error("Cannot push to the git repository {url} from branch '{branch}'")]
    GitNoPermission { url: String, branch: String },

    #[error("The tag format '{format}' does not render to a valid git tag name")]
    InvalidTagFormat { format: String },

    #[error("The tag format '{format}' must contain the ${{version}} placeholder exactly once")]
    TagNoVersion { format: String },

    #[error("Branch entry must have a non-empty name: {entry}")]
    InvalidBranch { entry: String },

    #[error("Branch names must be unique, found duplicates: {}", duplicates.join(", "))]
    DuplicateBranches { duplicates: Vec<String> },

    #[error("'{name}' is not a valid git branch name")]
    InvalidBranchName { name: String },

    #[error("Maintenance branch '{name}' declares range '{range}' which conflicts with its name")]
    MaintenanceBranch { name: String, range: String },

    #[error("Maintenance branch ranges must not overlap: {}", branches.join(", "))]
    MaintenanceBranches { branches: Vec<String> },

    #[error("Expected between 1 and 7 release branches, found {count}")]
    ReleaseBranches { count: usize },

    #[error("Branch '{name}' has an invalid prerelease identifier '{prerelease}'")]
    PrereleaseBranch { name: String, prerelease: String },

    #[error("Next version {version} is outside the range {range} of branch '{branch}'")]
    InvalidNextVersion {
        version: String,
        range: String,
        branch: String,
    },

    #[error(
        "Version {version} from channel '{channel}' cannot be added to maintenance branch \
         '{branch}' (merge range {merge_range})"
    )]
    InvalidLtsMerge {
        version: String,
        channel: String,
        branch: String,
        merge_range: String,
    },

    /// Multiple independent failures collected from one validation phase.
    #[error("{} errors occurred", .0.len())]
    Aggregate(Vec<SemrelError>),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plugin '{plugin}' failed during {step}: {message}")]
    Plugin {
        plugin: String,
        step: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results in semrel
pub type Result<T> = std::result::Result<T, SemrelError>;

impl SemrelError {
    /// Stable error code surfaced to users, or `None` for internal errors.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            SemrelError::NoGitRepo => Some("ENOGITREPO"),
            SemrelError::NoRepoUrl => Some("ENOREPOURL"),
            SemrelError::GitNoPermission { .. } => Some("EGITNOPERMISSION"),
            SemrelError::InvalidTagFormat { .. } => Some("EINVALIDTAGFORMAT"),
            SemrelError::TagNoVersion { .. } => Some("ETAGNOVERSION"),
            SemrelError::InvalidBranch { .. } => Some("EINVALIDBRANCH"),
            SemrelError::DuplicateBranches { .. } => Some("EDUPLICATEBRANCHES"),
            SemrelError::InvalidBranchName { .. } => Some("EINVALIDBRANCHNAME"),
            SemrelError::MaintenanceBranch { .. } => Some("EMAINTENANCEBRANCH"),
            SemrelError::MaintenanceBranches { .. } => Some("EMAINTENANCEBRANCHES"),
            SemrelError::ReleaseBranches { .. } => Some("ERELEASEBRANCHES"),
            SemrelError::PrereleaseBranch { .. } => Some("EPRERELEASEBRANCH"),
            SemrelError::InvalidNextVersion { .. } => Some("EINVALIDNEXTVERSION"),
            SemrelError::InvalidLtsMerge { .. } => Some("EINVALIDLTSMERGE"),
            _ => None,
        }
    }

    /// Whether this error (or, for aggregates, any member) is user-facing.
    pub fn is_user_facing(&self) -> bool {
        match self {
            SemrelError::Aggregate(errors) => errors.iter().any(|e| e.is_user_facing()),
            other => other.code().is_some(),
        }
    }

    /// Markdown details block for user-facing errors.
    pub fn details(&self) -> Option<String> {
        let details = match self {
            SemrelError::NoGitRepo => {
                "Releases can only be published from inside a git repository.\n\n\
                 Make sure the release job runs in a checkout of the project and that the \
                 `.git` directory is available."
                    .to_string()
            }
            SemrelError::NoRepoUrl => {
                "The repository URL is read from the `repository_url` configuration option or, \
                 if not set, from the `origin` remote of the local repository.\n\n\
                 Set `repository_url` in `semrel.toml` or configure an `origin` remote."
                    .to_string()
            }
            SemrelError::GitNoPermission { url, branch } => format!(
                "Pushing to `{url}` was rejected while the local branch `{branch}` is up to \
                 date with the remote.\n\n\
                 Verify that the credentials available to the CI job grant push access to the \
                 repository (see `GIT_CREDENTIALS`, `GH_TOKEN`, `GL_TOKEN`, `BB_TOKEN`)."
            ),
            SemrelError::InvalidTagFormat { format } => format!(
                "The `tag_format` option must render to a valid git reference.\n\n\
                 `{format}` rendered with a sample version produces a name rejected by \
                 `git check-ref-format`."
            ),
            SemrelError::TagNoVersion { format } => format!(
                "The `tag_format` option must contain the `${{version}}` placeholder exactly \
                 once so tag names can be both rendered and parsed back.\n\n\
                 Got `{format}`."
            ),
            SemrelError::InvalidBranch { entry } => format!(
                "Each entry of the `branches` option must be a record with a non-empty `name`.\n\n\
                 Got `{entry}`."
            ),
            SemrelError::DuplicateBranches { duplicates } => format!(
                "Each branch may appear at most once in the `branches` option.\n\n\
                 Duplicated: `{}`.",
                duplicates.join("`, `")
            ),
            SemrelError::InvalidBranchName { name } => format!(
                "Branch names must be valid git references (see `git check-ref-format`).\n\n\
                 Got `{name}`."
            ),
            SemrelError::MaintenanceBranch { name, range } => format!(
                "A maintenance branch named `{name}` is locked to the range implied by its \
                 name; an explicit `range` must agree with it.\n\n\
                 Got `{range}`."
            ),
            SemrelError::MaintenanceBranches { branches } => format!(
                "Maintenance branches must cover pairwise disjoint version ranges.\n\n\
                 Overlapping: `{}`.",
                branches.join("`, `")
            ),
            SemrelError::ReleaseBranches { count } => format!(
                "The `branches` option must define at least one and at most seven release \
                 branches (branches that are neither maintenance nor prerelease).\n\n\
                 Found {count}."
            ),
            SemrelError::PrereleaseBranch { name, prerelease } => format!(
                "The `prerelease` identifier of branch `{name}` must be a unique, non-empty \
                 string of alphanumeric characters and hyphens, valid as a semver prerelease \
                 identifier.\n\n\
                 Got `{prerelease}`."
            ),
            SemrelError::InvalidNextVersion {
                version,
                range,
                branch,
            } => format!(
                "Branch `{branch}` may only publish versions within `{range}`; the commits \
                 since the last release call for `{version}`.\n\n\
                 Merge the commits into a branch whose range admits this version."
            ),
            SemrelError::InvalidLtsMerge {
                version,
                channel,
                branch,
                merge_range,
            } => format!(
                "Version `{version}` was released on channel `{channel}` but branch \
                 `{branch}` only accepts merged releases within `{merge_range}`."
            ),
            _ => return None,
        };
        Some(details)
    }

    /// Flatten this error into its independent members.
    pub fn into_errors(self) -> Vec<SemrelError> {
        match self {
            SemrelError::Aggregate(errors) => errors,
            other => vec![other],
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        SemrelError::Config(msg.into())
    }

    /// Create a plugin error with context
    pub fn plugin(
        plugin: impl Into<String>,
        step: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        SemrelError::Plugin {
            plugin: plugin.into(),
            step: step.into(),
            message: msg.into(),
        }
    }
}
