//! Secret scrubbing for everything written to standard output and
//! standard error.
//!
//! The environment is scanned once for secret-looking variables; their
//! literal values are replaced by `[secure]` in every write for the
//! duration of the run. The scrubber is installed as the `env_logger`
//! format hook by `main` and applied by the pipeline driver to its own
//! stdout output.

use regex::Regex;
use std::collections::HashMap;

const MASK: &str = "[secure]";

/// Replaces secret environment values with `[secure]` in output text.
#[derive(Debug, Clone, Default)]
pub struct Scrubber {
    secrets: Vec<String>,
}

impl Scrubber {
    /// Collect secrets from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars().collect())
    }

    /// Collect secrets from an explicit variable map.
    ///
    /// A variable is a secret when its name matches
    /// `token|password|credential|secret|private` (case-insensitive) and
    /// its trimmed value is non-empty.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        let key_pattern = Regex::new("(?i)token|password|credential|secret|private")
            .expect("static pattern");

        let mut secrets: Vec<String> = vars
            .into_iter()
            .filter(|(key, value)| key_pattern.is_match(key) && !value.trim().is_empty())
            .map(|(_, value)| value)
            .collect();
        // Longest first, so partial overlaps never leak a suffix
        secrets.sort_by(|a, b| b.len().cmp(&a.len()));

        Scrubber { secrets }
    }

    /// Replace every occurrence of every secret in `text`.
    pub fn scrub(&self, text: &str) -> String {
        let mut scrubbed = text.to_string();
        for secret in &self.secrets {
            scrubbed = scrubbed.replace(secret.as_str(), MASK);
        }
        scrubbed
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrubber(vars: &[(&str, &str)]) -> Scrubber {
        Scrubber::from_vars(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_masks_matching_keys() {
        let s = scrubber(&[
            ("GH_TOKEN", "hunter2"),
            ("DB_PASSWORD", "tiger"),
            ("MY_SECRET", "s3cr3t"),
            ("PRIVATE_KEY", "pk-123"),
            ("NPM_CREDENTIALS", "cred-456"),
        ]);

        let out = s.scrub("push https://hunter2@host with tiger s3cr3t pk-123 cred-456");
        assert_eq!(out, "push https://[secure]@host with [secure] [secure] [secure] [secure]");
    }

    #[test]
    fn test_ignores_non_secret_keys_and_blank_values() {
        let s = scrubber(&[("PATH", "/usr/bin"), ("GH_TOKEN", "   "), ("HOME", "/root")]);
        assert!(s.is_empty());
        assert_eq!(s.scrub("/usr/bin"), "/usr/bin");
    }

    #[test]
    fn test_masks_repeated_occurrences() {
        let s = scrubber(&[("API_TOKEN", "abc")]);
        assert_eq!(s.scrub("abc and abc"), "[secure] and [secure]");
    }

    #[test]
    fn test_longest_secret_masked_first() {
        let s = scrubber(&[("A_TOKEN", "abc"), ("B_TOKEN", "abcdef")]);
        assert_eq!(s.scrub("value abcdef"), "value [secure]");
    }

    #[test]
    fn test_key_match_is_case_insensitive() {
        let s = scrubber(&[("npm_token", "lowtok")]);
        assert_eq!(s.scrub("lowtok"), "[secure]");
    }
}
