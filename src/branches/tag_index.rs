use crate::domain::tag::{Tag, TagFormat};
use crate::error::{Result, SemrelError};
use crate::git::{GitFacade, RefKind};
use semver::Version;
use std::collections::HashMap;

/// Parses the repository's tags against the configured tag format and
/// assigns each of them to every branch whose history contains the
/// tagged commit.
///
/// Tags that do not match the format, carry an invalid semver, or point
/// at a commit missing from local history are silently ignored; the
/// preceding fetch is expected to have made all needed history available.
#[derive(Debug)]
pub struct TagIndex {
    format: TagFormat,
}

impl TagIndex {
    /// Compile and validate the tag format.
    ///
    /// Beyond the placeholder check performed by [TagFormat::compile], the
    /// format rendered with a sentinel version must be a well-formed git
    /// tag name.
    pub fn new(template: &str, git: &dyn GitFacade) -> Result<Self> {
        let format = TagFormat::compile(template)?;

        let sentinel = format.render(&Version::new(0, 0, 0), None);
        if !git.check_ref_format(RefKind::Tags, &sentinel) {
            return Err(SemrelError::InvalidTagFormat {
                format: template.to_string(),
            });
        }

        Ok(TagIndex { format })
    }

    pub fn format(&self) -> &TagFormat {
        &self.format
    }

    /// Build the per-branch tag lists, sorted by version ascending.
    pub fn assign(
        &self,
        git: &dyn GitFacade,
        branches: &[String],
    ) -> Result<HashMap<String, Vec<Tag>>> {
        let mut parsed = Vec::new();
        for raw_name in git.tags()? {
            let Some((version, channel)) = self.format.parse(&raw_name) else {
                continue;
            };
            let Some(git_head) = git.tag_head(&raw_name)? else {
                continue;
            };
            parsed.push(Tag {
                raw_name,
                version,
                channel,
                git_head,
            });
        }

        let mut by_branch: HashMap<String, Vec<Tag>> = HashMap::new();
        for branch in branches {
            let mut tags: Vec<Tag> = Vec::new();
            for tag in &parsed {
                if git.is_ancestor(tag.git_head, branch)? {
                    tags.push(tag.clone());
                }
            }
            tags.sort_by(|a, b| a.version.cmp(&b.version));
            by_branch.insert(branch.clone(), tags);
        }

        Ok(by_branch)
    }
}
