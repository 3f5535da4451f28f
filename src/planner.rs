//! Release planning for the active branch: which versions released on
//! higher channels must be back-ported here, and what the next release
//! derived from new commits is.
//!
//! Planning is pure: it reads the classified branch set and tag lists and
//! never touches git or plugins, so the same repository state always
//! yields the same plan.

use crate::domain::branch::Branch;
use crate::domain::release::{Release, ReleaseToAdd};
use crate::domain::tag::TagFormat;
use crate::domain::version::{self, ReleaseType};
use crate::error::{Result, SemrelError};
use semver::Version;
use std::collections::HashSet;

/// Back-port list for the active branch, plus the entries rejected by the
/// maintenance merge range. Rejected entries are collected so the valid
/// ones can still be processed.
#[derive(Debug, Default)]
pub struct BackportPlan {
    pub releases_to_add: Vec<ReleaseToAdd>,
    pub errors: Vec<SemrelError>,
}

/// Enumerate the versions tagged on a higher-ranked, non-prerelease
/// channel that are part of this branch's history but not yet tagged on
/// its own channel, in ascending version order.
pub fn plan_releases_to_add(
    branch: &Branch,
    branches: &[Branch],
    format: &TagFormat,
) -> BackportPlan {
    let Some(rank) = branches.iter().position(|b| b.name == branch.name) else {
        return BackportPlan::default();
    };

    let mut plan = BackportPlan::default();
    let mut planned: HashSet<Version> = HashSet::new();

    for higher in &branches[rank + 1..] {
        if higher.is_prerelease() {
            continue;
        }

        let mut candidates: Vec<_> = branch
            .tags
            .iter()
            .filter(|tag| tag.channel == higher.channel)
            .collect();
        candidates.sort_by(|a, b| a.version.cmp(&b.version));

        for tag in candidates {
            if planned.contains(&tag.version) {
                continue;
            }
            let already_on_channel = branch
                .tags
                .iter()
                .any(|t| t.version == tag.version && t.channel == branch.channel);
            if already_on_channel {
                continue;
            }
            planned.insert(tag.version.clone());

            let last_release = last_release_before(branch, &tag.version);
            let release_type = last_release
                .as_ref()
                .map(|last| version::diff(&last.version, &tag.version))
                .unwrap_or(ReleaseType::Major);

            if let (Some(merge_range), true) = (&branch.merge_range, branch.is_maintenance()) {
                if !merge_range.contains(&tag.version) {
                    plan.errors.push(SemrelError::InvalidLtsMerge {
                        version: tag.version.to_string(),
                        channel: higher.channel.clone().unwrap_or_default(),
                        branch: branch.name.clone(),
                        merge_range: merge_range.to_string(),
                    });
                    continue;
                }
            }

            let mut current_release = Release::from_tag(
                tag.version.clone(),
                higher.channel.clone(),
                tag.git_head,
                tag.raw_name.clone(),
            );
            current_release.release_type = Some(release_type);

            let next_tag = format.render(&tag.version, branch.channel.as_deref());
            let mut next_release = Release::from_tag(
                tag.version.clone(),
                branch.channel.clone(),
                tag.git_head,
                next_tag,
            );
            next_release.release_type = Some(release_type);

            plan.releases_to_add.push(ReleaseToAdd {
                last_release,
                current_release,
                next_release,
            });
        }
    }

    plan.releases_to_add
        .sort_by(|a, b| a.next_release.version.cmp(&b.next_release.version));
    plan
}

/// The most recent release on the branch: its highest-versioned tag.
/// Prerelease versions only count on prerelease branches.
pub fn last_release(branch: &Branch) -> Option<Release> {
    branch
        .tags
        .iter()
        .filter(|tag| branch.is_prerelease() || tag.version.pre.is_empty())
        .max_by(|a, b| a.version.cmp(&b.version))
        .map(|tag| {
            Release::from_tag(
                tag.version.clone(),
                tag.channel.clone(),
                tag.git_head,
                tag.raw_name.clone(),
            )
        })
}

/// The most recent release strictly below `before`, used to compute the
/// semver-diff type of a back-ported release.
fn last_release_before(branch: &Branch, before: &Version) -> Option<Release> {
    branch
        .tags
        .iter()
        .filter(|tag| branch.is_prerelease() || tag.version.pre.is_empty())
        .filter(|tag| tag.version < *before)
        .max_by(|a, b| a.version.cmp(&b.version))
        .map(|tag| {
            Release::from_tag(
                tag.version.clone(),
                tag.channel.clone(),
                tag.git_head,
                tag.raw_name.clone(),
            )
        })
}

/// Compute the version of the next release on the branch.
///
/// Prerelease branches iterate their prerelease segment when the last
/// release already carries their identifier, and otherwise start a new
/// `-<id>.0` series on top of the bumped version. Release and maintenance
/// branches must stay within their computed range.
pub fn next_version(
    branch: &Branch,
    release_type: ReleaseType,
    last: Option<&Release>,
) -> Result<Version> {
    let next = match (&branch.prerelease, last) {
        (Some(id), Some(last)) if version::prerelease_id(&last.version) == Some(id.as_str()) => {
            version::bump_prerelease(&last.version, id)?
        }
        (Some(id), Some(last)) => {
            version::with_initial_prerelease(&version::bump(&last.version, release_type), id)?
        }
        (Some(id), None) => version::with_initial_prerelease(&version::initial(), id)?,
        (None, Some(last)) => version::bump(&last.version, release_type),
        (None, None) => version::initial(),
    };

    // Prerelease branches own their series end-to-end; the range guard
    // applies to release and maintenance branches.
    if !branch.is_prerelease() && !branch.range.contains(&next) {
        return Err(SemrelError::InvalidNextVersion {
            version: next.to_string(),
            range: branch.range.to_string(),
            branch: branch.name.clone(),
        });
    }

    Ok(next)
}

/// Assemble the next-release record for the branch head.
pub fn next_release(
    branch: &Branch,
    release_type: ReleaseType,
    last: Option<&Release>,
    head: git2::Oid,
    format: &TagFormat,
) -> Result<Release> {
    let version = next_version(branch, release_type, last)?;

    let effective_type = match (&branch.prerelease, last) {
        (Some(id), Some(last)) if version::prerelease_id(&last.version) == Some(id.as_str()) => {
            ReleaseType::Prerelease
        }
        _ => release_type,
    };

    let git_tag = format.render(&version, branch.channel.as_deref());
    Ok(Release {
        release_type: Some(effective_type),
        name: git_tag.clone(),
        version,
        channel: branch.channel.clone(),
        git_head: head,
        git_tag,
        notes: None,
    })
}
