use crate::error::{Result, SemrelError};
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;

/// The kind of release a set of changes calls for.
///
/// `Major`, `Minor` and `Patch` are the possible outcomes of commit
/// analysis; `Prerelease` marks a bump of the prerelease iteration on a
/// prerelease branch (`1.0.0-beta.1` to `1.0.0-beta.2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleaseType {
    Patch,
    Minor,
    Major,
    Prerelease,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Major => "major",
            ReleaseType::Minor => "minor",
            ReleaseType::Patch => "patch",
            ReleaseType::Prerelease => "prerelease",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// First version published on a branch with no previous release.
pub fn initial() -> Version {
    Version::new(1, 0, 0)
}

/// Bump a version by release type, clearing prerelease and build parts.
pub fn bump(version: &Version, release_type: ReleaseType) -> Version {
    match release_type {
        ReleaseType::Major => Version::new(version.major + 1, 0, 0),
        ReleaseType::Minor => Version::new(version.major, version.minor + 1, 0),
        // A prerelease bump without a matching prerelease tag degrades to a
        // patch bump; the caller re-attaches the prerelease identifier.
        ReleaseType::Patch | ReleaseType::Prerelease => {
            Version::new(version.major, version.minor, version.patch + 1)
        }
    }
}

/// Semver-diff between two versions, the release type that separates them.
pub fn diff(from: &Version, to: &Version) -> ReleaseType {
    if from.major != to.major {
        ReleaseType::Major
    } else if from.minor != to.minor {
        ReleaseType::Minor
    } else if from.patch != to.patch {
        ReleaseType::Patch
    } else {
        ReleaseType::Prerelease
    }
}

/// Leading identifier of the prerelease part, if any
pub fn prerelease_id(version: &Version) -> Option<&str> {
    if version.pre.is_empty() {
        return None;
    }
    Some(version.pre.as_str().split('.').next().unwrap_or(""))
}

/// Attach the first iteration of a prerelease identifier (`1.1.0` with
/// `beta` becomes `1.1.0-beta.0`).
pub fn with_initial_prerelease(version: &Version, id: &str) -> Result<Version> {
    let mut next = Version::new(version.major, version.minor, version.patch);
    next.pre = Prerelease::new(&format!("{id}.0"))
        .map_err(|e| SemrelError::config(format!("invalid prerelease identifier '{id}': {e}")))?;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}

/// Bump the prerelease iteration of a version that already carries the
/// given identifier (`1.0.0-beta.1` becomes `1.0.0-beta.2`; a bare
/// `1.0.0-beta` becomes `1.0.0-beta.0`).
pub fn bump_prerelease(version: &Version, id: &str) -> Result<Version> {
    let pre = match version.pre.as_str().rsplit_once('.') {
        Some((head, tail)) => match tail.parse::<u64>() {
            Ok(n) => format!("{head}.{}", n + 1),
            Err(_) => format!("{}.0", version.pre.as_str()),
        },
        None => format!("{}.0", version.pre.as_str()),
    };

    let mut next = Version::new(version.major, version.minor, version.patch);
    next.pre = Prerelease::new(&pre)
        .map_err(|e| SemrelError::config(format!("invalid prerelease identifier '{id}': {e}")))?;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}
