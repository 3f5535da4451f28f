use crate::domain::range::ReleaseRange;
use crate::domain::tag::Tag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A branch entry as written in the configuration.
///
/// Everything except `name` is optional; the classifier fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<PrereleaseSpec>,

    #[serde(default, rename = "merge_range", skip_serializing_if = "Option::is_none")]
    pub merge_range: Option<String>,
}

impl BranchSpec {
    pub fn new(name: impl Into<String>) -> Self {
        BranchSpec {
            name: name.into(),
            channel: None,
            range: None,
            prerelease: None,
            merge_range: None,
        }
    }

    /// The effective prerelease identifier: `prerelease = true` substitutes
    /// the branch name.
    pub fn prerelease_id(&self) -> Option<String> {
        match &self.prerelease {
            Some(PrereleaseSpec::Id(id)) => Some(id.clone()),
            Some(PrereleaseSpec::Enabled(true)) => Some(self.name.clone()),
            Some(PrereleaseSpec::Enabled(false)) | None => None,
        }
    }
}

/// Configured prerelease marker: an identifier string, or `true` to use
/// the branch name as the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrereleaseSpec {
    Enabled(bool),
    Id(String),
}

/// The three kinds of configured branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchType {
    Release,
    Maintenance,
    Prerelease,
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BranchType::Release => "release",
            BranchType::Maintenance => "maintenance",
            BranchType::Prerelease => "prerelease",
        };
        write!(f, "{name}")
    }
}

/// A fully classified branch: type, channel, publishable range and the
/// tags whose commits are part of its history (sorted by version
/// ascending).
#[derive(Debug, Clone)]
pub struct Branch {
    pub name: String,
    pub branch_type: BranchType,
    /// `None` is the default (unlabelled) channel of the primary release
    /// branch.
    pub channel: Option<String>,
    pub range: ReleaseRange,
    pub tags: Vec<Tag>,
    /// Prerelease identifier, set for prerelease branches only.
    pub prerelease: Option<String>,
    /// Accepted back-port range, set on maintenance branches only.
    pub merge_range: Option<ReleaseRange>,
}

impl Branch {
    pub fn is_prerelease(&self) -> bool {
        self.branch_type == BranchType::Prerelease
    }

    pub fn is_maintenance(&self) -> bool {
        self.branch_type == BranchType::Maintenance
    }
}
