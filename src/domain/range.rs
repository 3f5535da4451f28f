use semver::Version;
use std::fmt;

/// Half-open interval `[min, max)` of versions a branch may publish.
///
/// Containment uses full semver ordering, so `2.0.0-beta.2` is inside
/// `>=2.0.0-beta.1 <3.0.0`. A missing `max` means the range is unbounded
/// above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRange {
    pub min: Version,
    pub max: Option<Version>,
}

impl ReleaseRange {
    pub fn new(min: Version, max: Option<Version>) -> Self {
        ReleaseRange { min, max }
    }

    /// Unbounded range starting at `min`.
    pub fn from(min: Version) -> Self {
        ReleaseRange { min, max: None }
    }

    pub fn contains(&self, version: &Version) -> bool {
        if *version < self.min {
            return false;
        }
        match &self.max {
            Some(max) => version < max,
            None => true,
        }
    }

    /// True when no version can satisfy the range.
    pub fn is_empty(&self) -> bool {
        match &self.max {
            Some(max) => *max <= self.min,
            None => false,
        }
    }

    /// Narrow this range to the part shared with `other`.
    pub fn intersect(&self, other: &ReleaseRange) -> ReleaseRange {
        let min = if self.min >= other.min {
            self.min.clone()
        } else {
            other.min.clone()
        };
        let max = match (&self.max, &other.max) {
            (Some(a), Some(b)) => Some(if a <= b { a.clone() } else { b.clone() }),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };
        ReleaseRange { min, max }
    }

    /// Whether two ranges share any version.
    pub fn overlaps(&self, other: &ReleaseRange) -> bool {
        !self.intersect(other).is_empty()
    }
}

impl fmt::Display for ReleaseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.max {
            Some(max) => write!(f, ">={} <{}", self.min, max),
            None => write!(f, ">={}", self.min),
        }
    }
}

/// Parse a maintenance range expression (`1.x`, `1.2.x`) into the version
/// bucket it denotes. Returns `None` for anything else.
pub fn parse_maintenance_range(expr: &str) -> Option<ReleaseRange> {
    let parts: Vec<&str> = expr.split('.').collect();
    match parts.as_slice() {
        [major, "x"] => {
            let major: u64 = major.parse().ok()?;
            Some(ReleaseRange::new(
                Version::new(major, 0, 0),
                Some(Version::new(major + 1, 0, 0)),
            ))
        }
        [major, minor, "x"] => {
            let major: u64 = major.parse().ok()?;
            let minor: u64 = minor.parse().ok()?;
            Some(ReleaseRange::new(
                Version::new(major, minor, 0),
                Some(Version::new(major, minor + 1, 0)),
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_contains_half_open() {
        let range = ReleaseRange::new(v("1.0.0"), Some(v("2.0.0")));
        assert!(range.contains(&v("1.0.0")));
        assert!(range.contains(&v("1.9.9")));
        assert!(!range.contains(&v("2.0.0")));
        assert!(!range.contains(&v("0.9.0")));
    }

    #[test]
    fn test_contains_unbounded() {
        let range = ReleaseRange::from(v("1.0.0"));
        assert!(range.contains(&v("99.0.0")));
        assert!(!range.contains(&v("0.1.0")));
    }

    #[test]
    fn test_contains_prerelease_ordering() {
        // 2.0.0-beta.2 sorts after 2.0.0-beta.1 and before 2.0.0
        let range = ReleaseRange::from(v("2.0.0-beta.1"));
        assert!(range.contains(&v("2.0.0-beta.2")));
        assert!(range.contains(&v("2.0.0")));
        assert!(!range.contains(&v("1.9.0")));

        let bounded = ReleaseRange::new(v("1.0.0"), Some(v("2.0.0-beta.1")));
        assert!(!bounded.contains(&v("2.0.0-beta.1")));
        assert!(bounded.contains(&v("1.5.0")));
    }

    #[test]
    fn test_empty_range() {
        assert!(ReleaseRange::new(v("1.1.0"), Some(v("1.1.0"))).is_empty());
        assert!(ReleaseRange::new(v("1.2.0"), Some(v("1.1.0"))).is_empty());
        assert!(!ReleaseRange::new(v("1.0.0"), Some(v("1.0.1"))).is_empty());
    }

    #[test]
    fn test_intersect() {
        let a = ReleaseRange::new(v("1.0.0"), Some(v("2.0.0")));
        let b = ReleaseRange::new(v("1.5.0"), None);
        let i = a.intersect(&b);
        assert_eq!(i, ReleaseRange::new(v("1.5.0"), Some(v("2.0.0"))));
    }

    #[test]
    fn test_overlaps() {
        let one_x = parse_maintenance_range("1.x").unwrap();
        let one_two_x = parse_maintenance_range("1.2.x").unwrap();
        let two_x = parse_maintenance_range("2.x").unwrap();

        assert!(one_x.overlaps(&one_two_x));
        assert!(!one_x.overlaps(&two_x));
    }

    #[test]
    fn test_parse_maintenance_range() {
        assert_eq!(
            parse_maintenance_range("1.x"),
            Some(ReleaseRange::new(v("1.0.0"), Some(v("2.0.0"))))
        );
        assert_eq!(
            parse_maintenance_range("1.2.x"),
            Some(ReleaseRange::new(v("1.2.0"), Some(v("1.3.0"))))
        );
        assert_eq!(parse_maintenance_range("1.2.3"), None);
        assert_eq!(parse_maintenance_range("x"), None);
        assert_eq!(parse_maintenance_range("master"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ReleaseRange::new(v("1.0.0"), Some(v("2.0.0"))).to_string(),
            ">=1.0.0 <2.0.0"
        );
        assert_eq!(ReleaseRange::from(v("1.0.0")).to_string(), ">=1.0.0");
    }
}
