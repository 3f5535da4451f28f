use crate::error::{Result, SemrelError};
use git2::Oid;
use regex::Regex;
use semver::Version;

/// Placeholder substituted with the version when rendering a tag name.
pub const VERSION_PLACEHOLDER: &str = "${version}";

/// A release tag parsed against the configured tag format.
///
/// `channel` is present when the raw name carried an `@<channel>` suffix;
/// its absence means the default (unlabelled) channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub raw_name: String,
    pub version: Version,
    pub channel: Option<String>,
    pub git_head: Oid,
}

/// Tag naming template (e.g. `v${version}`), used both to render new tag
/// names and to parse existing ones back into a version and channel.
#[derive(Debug, Clone)]
pub struct TagFormat {
    template: String,
    matcher: Regex,
}

impl TagFormat {
    /// Compile a tag format template.
    ///
    /// The template must contain the `${version}` placeholder exactly once,
    /// checked by rendering with a single-space version: any other
    /// placeholder count leaves zero or multiple spaces in the result.
    pub fn compile(template: &str) -> Result<Self> {
        let rendered = template.replace(VERSION_PLACEHOLDER, " ");
        if rendered.chars().filter(|c| *c == ' ').count() != 1 || template.contains(' ') {
            return Err(SemrelError::TagNoVersion {
                format: template.to_string(),
            });
        }

        let escaped = regex::escape(template);
        let pattern = escaped.replace(r"\$\{version\}", "(?P<version>.+)");
        let matcher = Regex::new(&format!("^{pattern}$"))
            .map_err(|_| SemrelError::InvalidTagFormat {
                format: template.to_string(),
            })?;

        Ok(TagFormat {
            template: template.to_string(),
            matcher,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render a tag name for a version, with the `@<channel>` suffix when
    /// releasing on a non-default channel.
    pub fn render(&self, version: &Version, channel: Option<&str>) -> String {
        let name = self
            .template
            .replace(VERSION_PLACEHOLDER, &version.to_string());
        match channel {
            Some(channel) => format!("{name}@{channel}"),
            None => name,
        }
    }

    /// Parse a raw tag name back into `(version, channel)`.
    ///
    /// The raw name is first matched as-is, then with the trailing
    /// `@<channel>` (rightmost `@`) stripped. Anything that does not match
    /// the template, or whose version part is not valid semver, yields
    /// `None` and is ignored by the caller.
    pub fn parse(&self, raw: &str) -> Option<(Version, Option<String>)> {
        if let Some(version) = self.parse_name(raw) {
            return Some((version, None));
        }

        let (name, channel) = raw.rsplit_once('@')?;
        if name.is_empty() || channel.is_empty() {
            return None;
        }
        let version = self.parse_name(name)?;
        Some((version, Some(channel.to_string())))
    }

    fn parse_name(&self, name: &str) -> Option<Version> {
        let captures = self.matcher.captures(name)?;
        Version::parse(captures.name("version")?.as_str()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_compile_default_format() {
        let format = TagFormat::compile("v${version}").unwrap();
        assert_eq!(format.template(), "v${version}");
    }

    #[test]
    fn test_compile_rejects_missing_placeholder() {
        let err = TagFormat::compile("release").unwrap_err();
        assert_eq!(err.code(), Some("ETAGNOVERSION"));
    }

    #[test]
    fn test_compile_rejects_repeated_placeholder() {
        let err = TagFormat::compile("${version}-${version}").unwrap_err();
        assert_eq!(err.code(), Some("ETAGNOVERSION"));
    }

    #[test]
    fn test_compile_rejects_space_in_template() {
        let err = TagFormat::compile("v ${version}").unwrap_err();
        assert_eq!(err.code(), Some("ETAGNOVERSION"));
    }

    #[test]
    fn test_render_without_channel() {
        let format = TagFormat::compile("v${version}").unwrap();
        assert_eq!(format.render(&v("1.2.3"), None), "v1.2.3");
    }

    #[test]
    fn test_render_with_channel() {
        let format = TagFormat::compile("v${version}").unwrap();
        assert_eq!(format.render(&v("2.0.0"), Some("next")), "v2.0.0@next");
    }

    #[test]
    fn test_parse_plain() {
        let format = TagFormat::compile("v${version}").unwrap();
        assert_eq!(format.parse("v1.2.3"), Some((v("1.2.3"), None)));
    }

    #[test]
    fn test_parse_with_channel() {
        let format = TagFormat::compile("v${version}").unwrap();
        assert_eq!(
            format.parse("v2.0.0@next"),
            Some((v("2.0.0"), Some("next".to_string())))
        );
    }

    #[test]
    fn test_parse_prerelease_with_channel() {
        let format = TagFormat::compile("v${version}").unwrap();
        assert_eq!(
            format.parse("v2.0.0-beta.1@beta"),
            Some((v("2.0.0-beta.1"), Some("beta".to_string())))
        );
    }

    #[test]
    fn test_parse_rejects_other_prefix() {
        let format = TagFormat::compile("v${version}").unwrap();
        assert_eq!(format.parse("release-1.2.3"), None);
        assert_eq!(format.parse("1.2.3"), None);
    }

    #[test]
    fn test_parse_rejects_invalid_semver() {
        let format = TagFormat::compile("v${version}").unwrap();
        assert_eq!(format.parse("v1.2"), None);
        assert_eq!(format.parse("vfoo"), None);
    }

    #[test]
    fn test_parse_custom_format() {
        let format = TagFormat::compile("release-${version}-final").unwrap();
        assert_eq!(
            format.parse("release-1.5.0-final"),
            Some((v("1.5.0"), None))
        );
        assert_eq!(
            format.parse("release-1.5.0-final@next"),
            Some((v("1.5.0"), Some("next".to_string())))
        );
    }

    #[test]
    fn test_round_trip() {
        let format = TagFormat::compile("v${version}").unwrap();
        for (version, channel) in [
            ("1.0.0", None),
            ("2.0.0", Some("next")),
            ("2.0.0-beta.3", Some("beta")),
        ] {
            let rendered = format.render(&v(version), channel);
            let (parsed, parsed_channel) = format.parse(&rendered).unwrap();
            assert_eq!(parsed, v(version));
            assert_eq!(parsed_channel.as_deref(), channel);
        }
    }
}
