//! Service settings.
//!
//! Settings are constructed explicitly and passed down to the engine and
//! API layers, never read from ambient global state. Every field has a
//! default so a bare `geostacks.toml` (or none at all) is enough to run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Project namespace under which stacks are created and listed.
    pub project: String,
    /// Cloud region applied to every newly created stack.
    pub region: String,
    /// Directory for per-stack engine workspaces.
    pub data_dir: PathBuf,
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Engine binary path. Falls back to `$GEOSTACKS_PULUMI_PATH`, then
    /// `pulumi` on `$PATH`.
    pub binary: Option<PathBuf>,
    /// Backend URL passed to the engine (e.g. `file:///var/lib/geostacks`).
    /// When unset the engine's ambient login is used.
    pub backend_url: Option<String>,
    /// Cloud provider plugin version installed at startup.
    pub aws_plugin_version: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            project: "GeoStacks".to_string(),
            region: "us-west-2".to_string(),
            data_dir: PathBuf::from("/var/lib/geostacks"),
            engine: EngineSettings::default(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            binary: None,
            backend_url: None,
            aws_plugin_version: "v4.0.0".to_string(),
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let settings = Settings::default();
        assert_eq!(settings.project, "GeoStacks");
        assert_eq!(settings.region, "us-west-2");
        assert_eq!(settings.engine.aws_plugin_version, "v4.0.0");
        assert!(settings.engine.binary.is_none());
    }

    #[test]
    fn parse_minimal() {
        let toml_str = r#"
project = "TestStacks"
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.project, "TestStacks");
        assert_eq!(settings.region, "us-west-2");
    }

    #[test]
    fn parse_engine_section() {
        let toml_str = r#"
region = "eu-central-1"

[engine]
backend_url = "file:///tmp/state"
aws_plugin_version = "v4.2.0"
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.region, "eu-central-1");
        assert_eq!(
            settings.engine.backend_url.as_deref(),
            Some("file:///tmp/state")
        );
        assert_eq!(settings.engine.aws_plugin_version, "v4.2.0");
    }

    #[test]
    fn round_trips_through_toml() {
        let settings = Settings::default();
        let toml_str = settings.to_toml_string().unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.project, settings.project);
        assert_eq!(parsed.data_dir, settings.data_dir);
    }
}
