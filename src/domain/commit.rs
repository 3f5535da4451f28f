use regex::Regex;
use std::sync::OnceLock;

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z]+)(?:\(([^)]+)\))?(!?):\s*(.*)").unwrap())
}

fn skip_release_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[\s*(?:skip\s+release|release\s+skip)\s*\]").unwrap()
    })
}

impl ParsedCommit {
    /// Parse a commit message according to the conventional commits spec.
    ///
    /// Supports `type(scope)!: description`, `type(scope): description`,
    /// `type!: description` and `type: description`; anything else is
    /// treated as a `chore`.
    pub fn parse(message: &str) -> Self {
        let first_line = message.lines().next().unwrap_or("");
        let breaking_footer = message.contains("BREAKING CHANGE:");

        match header_re().captures(first_line) {
            Some(captures) => ParsedCommit {
                r#type: captures[1].to_string(),
                scope: captures.get(2).map(|m| m.as_str().to_string()),
                description: captures[4].to_string(),
                is_breaking_change: &captures[3] == "!" || breaking_footer,
            },
            None => ParsedCommit {
                r#type: "chore".to_string(),
                scope: None,
                description: first_line.to_string(),
                is_breaking_change: breaking_footer,
            },
        }
    }
}

/// Whether a commit message carries the `[skip release]` / `[release skip]`
/// marker (case-insensitive, flexible whitespace).
pub fn is_skip_release(message: &str) -> bool {
    skip_release_re().is_match(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_scope() {
        let commit = ParsedCommit::parse("feat(auth): add login");
        assert_eq!(commit.r#type, "feat");
        assert_eq!(commit.scope, Some("auth".to_string()));
        assert_eq!(commit.description, "add login");
        assert!(!commit.is_breaking_change);
    }

    #[test]
    fn test_parse_with_breaking_marker() {
        let commit = ParsedCommit::parse("feat(auth)!: redesign login");
        assert_eq!(commit.r#type, "feat");
        assert!(commit.is_breaking_change);
    }

    #[test]
    fn test_parse_breaking_without_scope() {
        let commit = ParsedCommit::parse("feat!: redesign");
        assert_eq!(commit.r#type, "feat");
        assert_eq!(commit.scope, None);
        assert!(commit.is_breaking_change);
    }

    #[test]
    fn test_parse_plain_type() {
        let commit = ParsedCommit::parse("fix: resolve login issue");
        assert_eq!(commit.r#type, "fix");
        assert_eq!(commit.description, "resolve login issue");
    }

    #[test]
    fn test_parse_non_conventional() {
        let commit = ParsedCommit::parse("Random commit message");
        assert_eq!(commit.r#type, "chore");
        assert!(!commit.is_breaking_change);
    }

    #[test]
    fn test_parse_breaking_change_footer() {
        let commit = ParsedCommit::parse("fix: something\n\nBREAKING CHANGE: desc");
        assert!(commit.is_breaking_change);
    }

    #[test]
    fn test_skip_release_markers() {
        assert!(is_skip_release("chore: bump [skip release]"));
        assert!(is_skip_release("chore: bump [release skip]"));
        assert!(is_skip_release("chore: bump [SKIP  RELEASE]"));
        assert!(is_skip_release("fix: x\n\nbody [ Release   Skip ]"));
        assert!(!is_skip_release("fix: release skipping logic"));
        assert!(!is_skip_release("feat: add [skip] release"));
    }
}
