//! Built-in release notes generator plugin.
//!
//! Produces a small markdown section per change category (breaking
//! changes, features, fixes) from the conventional commits in context.

use crate::domain::commit::ParsedCommit;
use crate::error::Result;
use crate::git::CommitInfo;
use crate::pipeline::plugin::{Context, Plugin};

pub struct NotesGenerator;

impl NotesGenerator {
    /// Render markdown notes for a set of commits. Returns `None` when no
    /// commit belongs to a rendered category.
    pub fn render(&self, version: &str, commits: &[CommitInfo]) -> Option<String> {
        let mut breaking = Vec::new();
        let mut features = Vec::new();
        let mut fixes = Vec::new();

        for commit in commits {
            let parsed = ParsedCommit::parse(&commit.message);
            let line = match &parsed.scope {
                Some(scope) => format!("* **{}:** {}", scope, parsed.description),
                None => format!("* {}", parsed.description),
            };
            if parsed.is_breaking_change {
                breaking.push(line);
            } else {
                match parsed.r#type.as_str() {
                    "feat" | "feature" => features.push(line),
                    "fix" | "perf" => fixes.push(line),
                    _ => {}
                }
            }
        }

        if breaking.is_empty() && features.is_empty() && fixes.is_empty() {
            return None;
        }

        let mut sections = vec![format!("# {version}")];
        for (title, lines) in [
            ("Breaking Changes", breaking),
            ("Features", features),
            ("Bug Fixes", fixes),
        ] {
            if !lines.is_empty() {
                sections.push(format!("### {title}\n\n{}", lines.join("\n")));
            }
        }

        Some(sections.join("\n\n"))
    }
}

impl Plugin for NotesGenerator {
    fn name(&self) -> &str {
        "release-notes"
    }

    fn generate_notes(&self, ctx: &Context) -> Result<Option<String>> {
        let version = ctx
            .next_release
            .as_ref()
            .map(|next| next.version.to_string())
            .unwrap_or_default();
        Ok(self.render(&version, &ctx.commits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(message: &str) -> CommitInfo {
        CommitInfo {
            hash: "abc123".to_string(),
            message: message.to_string(),
            author: "Dev".to_string(),
        }
    }

    #[test]
    fn test_render_buckets_by_category() {
        let commits = vec![
            commit("feat(api): add endpoint"),
            commit("fix: null handling"),
            commit("feat!: redesign config"),
            commit("docs: update readme"),
        ];

        let notes = NotesGenerator.render("2.0.0", &commits).unwrap();
        assert!(notes.starts_with("# 2.0.0"));
        assert!(notes.contains("### Breaking Changes"));
        assert!(notes.contains("* redesign config"));
        assert!(notes.contains("### Features"));
        assert!(notes.contains("* **api:** add endpoint"));
        assert!(notes.contains("### Bug Fixes"));
        assert!(notes.contains("* null handling"));
    }

    #[test]
    fn test_render_skips_empty_sections() {
        let notes = NotesGenerator
            .render("1.0.1", &[commit("fix: leak")])
            .unwrap();
        assert!(!notes.contains("Features"));
        assert!(!notes.contains("Breaking"));
    }

    #[test]
    fn test_render_nothing_relevant() {
        assert_eq!(
            NotesGenerator.render("1.0.1", &[commit("chore: deps")]),
            None
        );
        assert_eq!(NotesGenerator.render("1.0.1", &[]), None);
    }
}
