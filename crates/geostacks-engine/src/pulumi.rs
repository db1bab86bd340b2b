//! PulumiEngine — stack lifecycle over the Pulumi CLI.
//!
//! Each stack gets its own workspace directory under
//! `<data_dir>/stacks/<name>` holding a generated `Pulumi.yaml` program;
//! all workspaces share the same project name, so the engine's backend
//! groups their stacks under one namespace. A separate listing workspace
//! with an empty program serves the `list` operation.
//!
//! Failures are classified by matching the CLI's stderr: `already exists`
//! maps to `Conflict`, `no stack named` to `NotFound`, an in-progress or
//! locked update to `ConcurrentUpdate`. Everything else is surfaced
//! verbatim as a `Command` error.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use geostacks_core::Settings;

use crate::engine::{Outputs, StackEngine};
use crate::error::{EngineError, EngineResult};
use crate::program::SiteProgram;

pub struct PulumiEngine {
    binary: PathBuf,
    project: String,
    region: String,
    backend_url: Option<String>,
    plugin_version: String,
    stacks_dir: PathBuf,
}

impl PulumiEngine {
    /// Build an engine client from settings. Creates the stacks directory;
    /// does not touch the engine binary yet (see [`Self::preflight`]).
    pub fn new(settings: &Settings) -> EngineResult<Self> {
        let stacks_dir = settings.data_dir.join("stacks");
        std::fs::create_dir_all(&stacks_dir)?;
        Ok(PulumiEngine {
            binary: find_binary(settings.engine.binary.as_deref()),
            project: settings.project.clone(),
            region: settings.region.clone(),
            backend_url: settings.engine.backend_url.clone(),
            plugin_version: settings.engine.aws_plugin_version.clone(),
            stacks_dir,
        })
    }

    /// Verify the engine binary runs and install the cloud provider plugin.
    /// Called once at service startup so requests never pay for it.
    pub async fn preflight(&self) -> EngineResult<()> {
        let out = self.run("version", "-", &self.stacks_dir, &["version"]).await?;
        let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
        info!(engine = %self.binary.display(), %version, "engine binary located");

        self.run(
            "plugin install",
            "-",
            &self.stacks_dir,
            &["plugin", "install", "resource", "aws", &self.plugin_version],
        )
        .await?;
        info!(version = %self.plugin_version, "aws provider plugin installed");
        Ok(())
    }

    /// Workspace directory for a stack, with its program written out.
    /// Only create uses this; it owns the program file.
    async fn ensure_workspace(&self, name: &str, program: &SiteProgram) -> EngineResult<PathBuf> {
        let dir = self.stacks_dir.join(name);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("Pulumi.yaml"), program.to_yaml()?).await?;
        Ok(dir)
    }

    /// Workspace directory for select/outputs/destroy/remove. These
    /// operations run against recorded state and must not disturb a program
    /// an in-flight create has written, so a no-op program is only written
    /// when no program file exists yet.
    async fn workspace_for(&self, name: &str) -> EngineResult<PathBuf> {
        let dir = self.stacks_dir.join(name);
        tokio::fs::create_dir_all(&dir).await?;
        let program_file = dir.join("Pulumi.yaml");
        if !tokio::fs::try_exists(&program_file).await? {
            let noop = SiteProgram::noop(&self.project);
            tokio::fs::write(&program_file, noop.to_yaml()?).await?;
        }
        Ok(dir)
    }

    /// Shared workspace used only to enumerate the project's stacks.
    async fn listing_workspace(&self) -> EngineResult<PathBuf> {
        self.workspace_for("_project").await
    }

    /// Run the engine binary in `dir`, classifying a non-zero exit by its
    /// stderr. `stack` is only used to label structured errors.
    async fn run(
        &self,
        op: &'static str,
        stack: &str,
        dir: &Path,
        args: &[&str],
    ) -> EngineResult<Output> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).arg("--non-interactive").current_dir(dir);
        if let Some(url) = &self.backend_url {
            cmd.env("PULUMI_BACKEND_URL", url);
        }
        debug!(%op, %stack, ?args, "running engine command");

        let out = cmd.output().await.map_err(|e| {
            EngineError::Spawn(format!("could not run {}: {e}", self.binary.display()))
        })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(classify(op, stack, &stderr));
        }
        Ok(out)
    }

    async fn read_outputs(&self, name: &str, dir: &Path) -> EngineResult<Outputs> {
        let out = self
            .run(
                "stack output",
                name,
                dir,
                &["stack", "output", "--json", "--stack", name],
            )
            .await?;
        serde_json::from_slice(&out.stdout).map_err(|e| EngineError::Output {
            op: "stack output",
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl StackEngine for PulumiEngine {
    async fn create(&self, name: &str, program: &SiteProgram) -> EngineResult<Outputs> {
        let dir = self.ensure_workspace(name, program).await?;

        self.run("stack init", name, &dir, &["stack", "init", name])
            .await?;
        self.run(
            "config set",
            name,
            &dir,
            &["config", "set", "aws:region", &self.region, "--stack", name],
        )
        .await?;

        info!(stack = %name, "provisioning site stack");
        self.run(
            "up",
            name,
            &dir,
            &["up", "--stack", name, "--yes", "--skip-preview"],
        )
        .await?;
        info!(stack = %name, "stack provisioned");

        self.read_outputs(name, &dir).await
    }

    async fn list(&self) -> EngineResult<Vec<String>> {
        let dir = self.listing_workspace().await?;
        let out = self
            .run("stack ls", "-", &dir, &["stack", "ls", "--json"])
            .await?;
        let entries: Vec<StackListEntry> =
            serde_json::from_slice(&out.stdout).map_err(|e| EngineError::Output {
                op: "stack ls",
                message: e.to_string(),
            })?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    async fn select(&self, name: &str) -> EngineResult<()> {
        let dir = self.workspace_for(name).await?;
        self.run("stack select", name, &dir, &["stack", "select", name])
            .await?;
        Ok(())
    }

    async fn outputs(&self, name: &str) -> EngineResult<Outputs> {
        let dir = self.workspace_for(name).await?;
        self.read_outputs(name, &dir).await
    }

    async fn destroy(&self, name: &str) -> EngineResult<()> {
        let dir = self.workspace_for(name).await?;
        info!(stack = %name, "destroying site stack");
        self.run("destroy", name, &dir, &["destroy", "--stack", name, "--yes"])
            .await?;
        info!(stack = %name, "stack destroyed");
        Ok(())
    }

    async fn remove(&self, name: &str) -> EngineResult<()> {
        let dir = self.workspace_for(name).await?;
        self.run("stack rm", name, &dir, &["stack", "rm", name, "--yes"])
            .await?;
        Ok(())
    }
}

/// One entry of `stack ls --json`; fields other than the name are ignored.
#[derive(serde::Deserialize)]
struct StackListEntry {
    name: String,
}

/// Locate the engine binary.
///
/// Search order: explicit setting, `$GEOSTACKS_PULUMI_PATH`, then `pulumi`
/// on `$PATH`. A missing binary surfaces as a `Spawn` error on first use;
/// `preflight` turns that into a startup failure.
fn find_binary(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("GEOSTACKS_PULUMI_PATH") {
        return PathBuf::from(path);
    }
    PathBuf::from("pulumi")
}

fn classify(op: &'static str, stack: &str, stderr: &str) -> EngineError {
    let lower = stderr.to_lowercase();
    if lower.contains("already exists") {
        EngineError::Conflict(stack.to_string())
    } else if lower.contains("no stack named") {
        EngineError::NotFound(stack.to_string())
    } else if lower.contains("currently in progress") || lower.contains("currently locked") {
        EngineError::ConcurrentUpdate(stack.to_string())
    } else {
        EngineError::Command {
            op,
            message: stderr.trim().to_string(),
        }
    }
}
