use crate::error::{Result, SemrelError};
use crate::pipeline::plugin::{Context, Plugin, PluginRelease};
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Command;

/// Shell commands to run at lifecycle steps, from the `[exec]` table of
/// the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecConfig {
    #[serde(default)]
    pub verify_conditions: Option<String>,
    #[serde(default)]
    pub verify_release: Option<String>,
    #[serde(default)]
    pub prepare: Option<String>,
    #[serde(default)]
    pub add_channel: Option<String>,
    #[serde(default)]
    pub publish: Option<String>,
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub fail: Option<String>,
}

impl ExecConfig {
    pub fn is_empty(&self) -> bool {
        *self == ExecConfig::default()
    }
}

/// Plugin that delegates lifecycle steps to configured shell commands.
///
/// Commands run through `sh -c` with the release context exported as
/// `SEMREL_*` environment variables. A non-zero exit code fails the step.
pub struct ExecPlugin {
    config: ExecConfig,
}

impl ExecPlugin {
    pub fn new(config: ExecConfig) -> Self {
        ExecPlugin { config }
    }

    /// Map the context to environment variables for the command.
    fn env_vars(ctx: &Context) -> HashMap<String, String> {
        let mut env = HashMap::new();

        env.insert("SEMREL_BRANCH".to_string(), ctx.branch.name.clone());
        env.insert(
            "SEMREL_CHANNEL".to_string(),
            ctx.branch.channel.clone().unwrap_or_default(),
        );
        env.insert(
            "SEMREL_DRY_RUN".to_string(),
            ctx.options.dry_run.to_string(),
        );
        env.insert(
            "SEMREL_COMMIT_COUNT".to_string(),
            ctx.commits.len().to_string(),
        );

        if let Some(last) = &ctx.last_release {
            env.insert("SEMREL_LAST_VERSION".to_string(), last.version.to_string());
        }
        if let Some(next) = &ctx.next_release {
            env.insert("SEMREL_VERSION".to_string(), next.version.to_string());
            env.insert("SEMREL_TAG_NAME".to_string(), next.git_tag.clone());
            if let Some(notes) = &next.notes {
                env.insert("SEMREL_NOTES".to_string(), notes.clone());
            }
        }

        env
    }

    fn run_command(&self, step: &str, command: &str, ctx: &Context) -> Result<()> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        for (key, value) in Self::env_vars(ctx) {
            cmd.env(key, value);
        }

        let output = cmd
            .output()
            .map_err(|e| SemrelError::plugin("exec", step, format!("cannot spawn '{command}': {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SemrelError::plugin(
                "exec",
                step,
                format!(
                    "'{command}' exited with code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }

        Ok(())
    }
}

impl Plugin for ExecPlugin {
    fn name(&self) -> &str {
        "exec"
    }

    fn verify_conditions(&self, ctx: &Context) -> Result<()> {
        match &self.config.verify_conditions {
            Some(command) => self.run_command("verifyConditions", command, ctx),
            None => Ok(()),
        }
    }

    fn verify_release(&self, ctx: &Context) -> Result<()> {
        match &self.config.verify_release {
            Some(command) => self.run_command("verifyRelease", command, ctx),
            None => Ok(()),
        }
    }

    fn prepare(&self, ctx: &Context) -> Result<()> {
        match &self.config.prepare {
            Some(command) => self.run_command("prepare", command, ctx),
            None => Ok(()),
        }
    }

    fn add_channel(&self, ctx: &Context) -> Result<Option<PluginRelease>> {
        let Some(command) = &self.config.add_channel else {
            return Ok(None);
        };
        self.run_command("addChannel", command, ctx)?;
        Ok(ctx.next_release.as_ref().map(|next| PluginRelease {
            plugin_name: "exec".to_string(),
            name: next.git_tag.clone(),
            url: None,
            channel: next.channel.clone(),
            version: next.version.to_string(),
        }))
    }

    fn publish(&self, ctx: &Context) -> Result<Option<PluginRelease>> {
        let Some(command) = &self.config.publish else {
            return Ok(None);
        };
        self.run_command("publish", command, ctx)?;
        Ok(ctx.next_release.as_ref().map(|next| PluginRelease {
            plugin_name: "exec".to_string(),
            name: next.git_tag.clone(),
            url: None,
            channel: next.channel.clone(),
            version: next.version.to_string(),
        }))
    }

    fn success(&self, ctx: &Context) -> Result<()> {
        match &self.config.success {
            Some(command) => self.run_command("success", command, ctx),
            None => Ok(()),
        }
    }

    fn fail(&self, ctx: &Context, _errors: &[SemrelError]) -> Result<()> {
        match &self.config.fail {
            Some(command) => self.run_command("fail", command, ctx),
            None => Ok(()),
        }
    }
}
