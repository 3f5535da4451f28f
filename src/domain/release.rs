use crate::domain::version::ReleaseType;
use git2::Oid;
use semver::Version;

/// A published (or about-to-be-published) release.
///
/// `release_type` is `None` on last-release snapshots reconstructed from
/// tags, where the originating change set is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub release_type: Option<ReleaseType>,
    pub version: Version,
    pub channel: Option<String>,
    pub git_head: Oid,
    pub git_tag: String,
    pub name: String,
    pub notes: Option<String>,
}

impl Release {
    /// Snapshot of an existing release reconstructed from a tag.
    pub fn from_tag(
        version: Version,
        channel: Option<String>,
        git_head: Oid,
        git_tag: String,
    ) -> Self {
        Release {
            release_type: None,
            name: git_tag.clone(),
            version,
            channel,
            git_head,
            git_tag,
            notes: None,
        }
    }
}

/// A version already released on a higher channel that must be re-tagged
/// on the active branch's channel.
///
/// `current_release` carries the source channel, `next_release` the
/// active branch's channel; both carry the same version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseToAdd {
    pub last_release: Option<Release>,
    pub current_release: Release,
    pub next_release: Release,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_snapshot() {
        let head = Oid::from_bytes(&[7; 20]).unwrap();
        let release = Release::from_tag(
            Version::parse("1.2.0").unwrap(),
            Some("next".to_string()),
            head,
            "v1.2.0@next".to_string(),
        );

        assert_eq!(release.release_type, None);
        assert_eq!(release.name, "v1.2.0@next");
        assert_eq!(release.git_tag, "v1.2.0@next");
        assert_eq!(release.channel.as_deref(), Some("next"));
        assert_eq!(release.notes, None);
    }
}
