use crate::domain::branch::{BranchSpec, BranchType};
use crate::domain::range::parse_maintenance_range;
use crate::error::SemrelError;
use semver::Prerelease;

/// One of the three branch kinds, as a filter plus its validators.
///
/// The classifier walks [DEFINITIONS] in order and assigns each branch
/// spec to the first definition whose filter accepts it, then runs the
/// per-branch and per-set validators, collecting every failure.
pub struct BranchDefinition {
    pub branch_type: BranchType,
    /// Does this spec belong to this kind?
    pub filter: fn(&BranchSpec) -> bool,
    /// Per-branch invariant.
    pub validate_one: fn(&BranchSpec) -> Option<SemrelError>,
    /// Whole-partition invariant.
    pub validate_set: fn(&[&BranchSpec]) -> Vec<SemrelError>,
}

/// The closed set of branch kinds, in classification order: maintenance
/// first (by name shape), then prerelease (by marker), then release for
/// everything left.
pub const DEFINITIONS: &[BranchDefinition] = &[
    BranchDefinition {
        branch_type: BranchType::Maintenance,
        filter: is_maintenance,
        validate_one: validate_maintenance,
        validate_set: validate_maintenance_set,
    },
    BranchDefinition {
        branch_type: BranchType::Prerelease,
        filter: is_prerelease,
        validate_one: validate_prerelease,
        validate_set: validate_prerelease_set,
    },
    BranchDefinition {
        branch_type: BranchType::Release,
        filter: |_| true,
        validate_one: |_| None,
        validate_set: validate_release_set,
    },
];

fn is_maintenance(spec: &BranchSpec) -> bool {
    parse_maintenance_range(&spec.name).is_some()
}

fn validate_maintenance(spec: &BranchSpec) -> Option<SemrelError> {
    let implied = parse_maintenance_range(&spec.name)?;
    let range = spec.range.as_ref()?;
    if parse_maintenance_range(range).as_ref() == Some(&implied) {
        None
    } else {
        Some(SemrelError::MaintenanceBranch {
            name: spec.name.clone(),
            range: range.clone(),
        })
    }
}

fn validate_maintenance_set(specs: &[&BranchSpec]) -> Vec<SemrelError> {
    let mut overlapping = Vec::new();
    for (i, a) in specs.iter().enumerate() {
        for b in &specs[i + 1..] {
            let (Some(ra), Some(rb)) = (
                parse_maintenance_range(&a.name),
                parse_maintenance_range(&b.name),
            ) else {
                continue;
            };
            if ra.overlaps(&rb) {
                for name in [&a.name, &b.name] {
                    if !overlapping.contains(name) {
                        overlapping.push(name.clone());
                    }
                }
            }
        }
    }

    if overlapping.is_empty() {
        vec![]
    } else {
        vec![SemrelError::MaintenanceBranches {
            branches: overlapping,
        }]
    }
}

fn is_prerelease(spec: &BranchSpec) -> bool {
    spec.prerelease_id().is_some()
}

fn validate_prerelease(spec: &BranchSpec) -> Option<SemrelError> {
    let id = spec.prerelease_id()?;
    let safe = !id.is_empty()
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && Prerelease::new(&format!("{id}.0")).is_ok();
    if safe {
        None
    } else {
        Some(SemrelError::PrereleaseBranch {
            name: spec.name.clone(),
            prerelease: id,
        })
    }
}

fn validate_prerelease_set(specs: &[&BranchSpec]) -> Vec<SemrelError> {
    let mut errors = Vec::new();
    for (i, spec) in specs.iter().enumerate() {
        let Some(id) = spec.prerelease_id() else {
            continue;
        };
        let duplicated = specs[..i]
            .iter()
            .any(|earlier| earlier.prerelease_id().as_deref() == Some(id.as_str()));
        if duplicated {
            errors.push(SemrelError::PrereleaseBranch {
                name: spec.name.clone(),
                prerelease: id,
            });
        }
    }
    errors
}

fn validate_release_set(specs: &[&BranchSpec]) -> Vec<SemrelError> {
    if (1..=7).contains(&specs.len()) {
        vec![]
    } else {
        vec![SemrelError::ReleaseBranches { count: specs.len() }]
    }
}
