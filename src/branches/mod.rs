//! Branch model: classification, validation, ranges and channels.
//!
//! The configured branch list is partitioned into release, maintenance and
//! prerelease branches (see [definitions]), validated as a whole with all
//! independent failures collected, and normalised into [Branch] records
//! carrying the semver range each branch may publish and the distribution
//! channel it publishes to.

pub mod definitions;
pub mod tag_index;

pub use tag_index::TagIndex;

use crate::domain::branch::{Branch, BranchSpec, BranchType};
use crate::domain::range::{parse_maintenance_range, ReleaseRange};
use crate::domain::version;
use crate::error::{Result, SemrelError};
use crate::git::{GitFacade, RefKind};
use definitions::DEFINITIONS;
use semver::Version;
use std::collections::HashSet;

/// The branch kind a spec is classified as: the first definition whose
/// filter accepts it.
pub fn branch_type_of(spec: &BranchSpec) -> BranchType {
    DEFINITIONS
        .iter()
        .find(|def| (def.filter)(spec))
        .map(|def| def.branch_type)
        // The release definition accepts everything
        .unwrap_or(BranchType::Release)
}

/// Validate and normalise the configured branch list.
///
/// Returns the branches ordered by rank: maintenance (ascending by
/// version bucket), then release (configured order), then prerelease.
/// Every validation failure is collected before surfacing so users see
/// all configuration problems at once.
pub fn classify(
    specs: &[BranchSpec],
    git: &dyn GitFacade,
    index: &TagIndex,
) -> Result<Vec<Branch>> {
    validate(specs, git)?;

    let ordered = order_specs(specs);
    let names: Vec<String> = ordered.iter().map(|s| s.name.clone()).collect();
    let mut tags_by_branch = index.assign(git, &names)?;

    // Lower bound per branch: the highest version tagged on the branch
    // itself or any lower-ranked branch, defaulting to 1.0.0.
    let mut running_max: Option<Version> = None;
    let mut lower_bounds = Vec::with_capacity(ordered.len());
    for spec in &ordered {
        if let Some(tags) = tags_by_branch.get(&spec.name) {
            for tag in tags {
                if running_max.as_ref().map_or(true, |max| tag.version > *max) {
                    running_max = Some(tag.version.clone());
                }
            }
        }
        lower_bounds.push(running_max.clone().unwrap_or_else(version::initial));
    }

    let first_release_name = ordered
        .iter()
        .find(|&s| branch_type_of(s) == BranchType::Release)
        .map(|s| s.name.clone());

    let mut branches = Vec::with_capacity(ordered.len());
    for (i, spec) in ordered.iter().enumerate() {
        let branch_type = branch_type_of(spec);
        let upper = lower_bounds.get(i + 1).cloned();
        let mut range = ReleaseRange::new(lower_bounds[i].clone(), upper);
        if branch_type == BranchType::Maintenance {
            if let Some(bucket) = parse_maintenance_range(&spec.name) {
                range = range.intersect(&bucket);
            }
        }

        let channel = match (&spec.channel, &first_release_name) {
            (Some(channel), _) => Some(channel.clone()),
            (None, Some(first)) if *first == spec.name => None,
            _ => Some(spec.name.clone()),
        };

        let merge_range = match (&spec.merge_range, branch_type) {
            (Some(expr), BranchType::Maintenance) => {
                Some(parse_maintenance_range(expr).ok_or_else(|| {
                    SemrelError::config(format!(
                        "invalid merge_range '{expr}' on branch '{}'",
                        spec.name
                    ))
                })?)
            }
            _ => None,
        };

        branches.push(Branch {
            name: spec.name.clone(),
            branch_type,
            channel,
            range,
            tags: tags_by_branch.remove(&spec.name).unwrap_or_default(),
            prerelease: spec.prerelease_id(),
            merge_range,
        });
    }

    Ok(branches)
}

/// Maintenance first (ascending by bucket), then release, then
/// prerelease, preserving configured order within each kind.
fn order_specs(specs: &[BranchSpec]) -> Vec<BranchSpec> {
    let mut maintenance = Vec::new();
    let mut release = Vec::new();
    let mut prerelease = Vec::new();
    for spec in specs {
        match branch_type_of(spec) {
            BranchType::Maintenance => maintenance.push(spec.clone()),
            BranchType::Release => release.push(spec.clone()),
            BranchType::Prerelease => prerelease.push(spec.clone()),
        }
    }

    maintenance.sort_by_key(|s| {
        parse_maintenance_range(&s.name)
            .map(|r| (r.min.major, r.min.minor))
            .unwrap_or((u64::MAX, u64::MAX))
    });

    maintenance
        .into_iter()
        .chain(release)
        .chain(prerelease)
        .collect()
}

fn validate(specs: &[BranchSpec], git: &dyn GitFacade) -> Result<()> {
    let mut errors = Vec::new();

    for spec in specs {
        if spec.name.trim().is_empty() {
            errors.push(SemrelError::InvalidBranch {
                entry: format!("{spec:?}"),
            });
        } else if !git.check_ref_format(RefKind::Heads, &spec.name) {
            errors.push(SemrelError::InvalidBranchName {
                name: spec.name.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for spec in specs {
        if !seen.insert(spec.name.as_str()) && !duplicates.contains(&spec.name) {
            duplicates.push(spec.name.clone());
        }
    }
    if !duplicates.is_empty() {
        errors.push(SemrelError::DuplicateBranches { duplicates });
    }

    for def in DEFINITIONS {
        let mut members: Vec<&BranchSpec> = Vec::new();
        for spec in specs {
            if branch_type_of(spec) == def.branch_type {
                members.push(spec);
            }
        }
        for member in members.iter().copied() {
            if let Some(error) = (def.validate_one)(member) {
                errors.push(error);
            }
        }
        errors.extend((def.validate_set)(&members));
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(SemrelError::Aggregate(errors)),
    }
}
