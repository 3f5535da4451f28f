use crate::domain::branch::BranchSpec;
use crate::domain::tag::VERSION_PLACEHOLDER;
use crate::error::{Result, SemrelError};
use crate::pipeline::exec::ExecConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_branches")]
    pub branches: Vec<BranchSpec>,

    #[serde(default = "default_tag_format")]
    pub tag_format: String,

    #[serde(default)]
    pub repository_url: Option<String>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub no_ci: bool,

    #[serde(default)]
    pub exec: ExecConfig,
}

fn default_branches() -> Vec<BranchSpec> {
    vec![BranchSpec::new("main")]
}

fn default_tag_format() -> String {
    format!("v{VERSION_PLACEHOLDER}")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            branches: default_branches(),
            tag_format: default_tag_format(),
            repository_url: None,
            dry_run: false,
            no_ci: false,
            exec: ExecConfig::default(),
        }
    }
}

/// Load the configuration from an explicit path, `./semrel.toml`, or the
/// user configuration directory, falling back to defaults.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./semrel.toml").exists() {
        fs::read_to_string("./semrel.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join("semrel.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    toml::from_str(&config_str).map_err(|e| SemrelError::config(e.to_string()))
}

/// The effective run options: file configuration merged with CLI flags.
#[derive(Debug, Clone)]
pub struct Options {
    pub branches: Vec<BranchSpec>,
    pub tag_format: String,
    pub repository_url: Option<String>,
    pub dry_run: bool,
    pub no_ci: bool,
}

impl Options {
    /// Merge the configuration file with CLI flags; flags can only turn
    /// the boolean modes on.
    pub fn from_config(config: &Config, dry_run: bool, no_ci: bool) -> Self {
        Options {
            branches: config.branches.clone(),
            tag_format: config.tag_format.clone(),
            repository_url: config.repository_url.clone(),
            dry_run: config.dry_run || dry_run,
            no_ci: config.no_ci || no_ci,
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::from_config(&Config::default(), false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::branch::PrereleaseSpec;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.branches.len(), 1);
        assert_eq!(config.branches[0].name, "main");
        assert_eq!(config.tag_format, "v${version}");
        assert!(!config.dry_run);
        assert!(config.exec.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            tag_format = "release-${version}"
            repository_url = "https://github.com/o/r.git"

            [[branches]]
            name = "1.x"

            [[branches]]
            name = "master"

            [[branches]]
            name = "beta"
            prerelease = "beta"

            [exec]
            publish = "./deploy.sh"
            "#,
        )
        .unwrap();

        assert_eq!(config.tag_format, "release-${version}");
        assert_eq!(config.branches.len(), 3);
        assert_eq!(
            config.branches[2].prerelease,
            Some(PrereleaseSpec::Id("beta".to_string()))
        );
        assert_eq!(config.exec.publish.as_deref(), Some("./deploy.sh"));
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tag_format = \"t${{version}}\"").unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.tag_format, "t${version}");
        // Unset fields fall back to defaults
        assert_eq!(config.branches[0].name, "main");
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "branches = 5").unwrap();

        let err = load_config(file.path().to_str()).unwrap_err();
        assert!(matches!(err, SemrelError::Config(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Some("/nonexistent/semrel.toml")).is_err());
    }

    #[test]
    fn test_options_merge_flags() {
        let config = Config {
            dry_run: false,
            no_ci: true,
            ..Config::default()
        };
        let options = Options::from_config(&config, true, false);
        assert!(options.dry_run);
        assert!(options.no_ci);
    }
}
