/// Build configuration, loaded from a RON file with every field defaulted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::password::DEFAULT_PASSWORD_LENGTH;
use crate::core::service::CliService;
use crate::core::splice::{SectionSplicer, DEFAULT_MARKER, DEFAULT_SEPARATOR};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which kind of document a build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// Rules applied to the base template, narrative spliced at the marker.
    #[default]
    Template,
    /// Narrative alone under a reused or synthesized header.
    Standalone,
}

/// Settings for the external service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Environment variables hidden from the service process.
    pub env_remove: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let command = CliService::default();
        Self {
            program: command.program,
            args: command.args,
            env_remove: command.env_remove,
            timeout_secs: 300,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn command(&self) -> CliService {
        CliService {
            program: self.program.clone(),
            args: self.args.clone(),
            env_remove: self.env_remove.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory searched for the newest character sheet.
    pub input_dir: PathBuf,
    pub input_extension: String,
    /// Base document for template mode.
    pub template_path: PathBuf,
    /// Instructions sent ahead of the character sheet.
    pub expand_prompt_path: PathBuf,
    pub output_dir: PathBuf,
    pub output_suffix: String,
    pub mode: OutputMode,
    pub marker: String,
    pub separator: String,
    pub password_length: usize,
    /// Replaces the built-in rule table when set.
    pub rules_path: Option<PathBuf>,
    pub service: ServiceConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("galge-heroines"),
            input_extension: "yaml".to_string(),
            template_path: PathBuf::from("prompts/SUMIRE_FULL.md"),
            expand_prompt_path: PathBuf::from("tools/gal_sim_expand.md"),
            output_dir: PathBuf::from("prompts"),
            output_suffix: "_FULL.md".to_string(),
            mode: OutputMode::Template,
            marker: DEFAULT_MARKER.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            password_length: DEFAULT_PASSWORD_LENGTH,
            rules_path: None,
            service: ServiceConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Load a config file. Relative paths inside it are kept as written.
    pub fn load_from_ron(path: &Path) -> Result<BuildConfig, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<BuildConfig, ConfigError> {
        let config: BuildConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_empty() {
            return Err(ConfigError::Invalid("marker must not be empty".to_string()));
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "service.timeout_secs must be positive".to_string(),
            ));
        }
        if self.service.program.is_empty() {
            return Err(ConfigError::Invalid(
                "service.program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn splicer(&self) -> SectionSplicer {
        SectionSplicer::new(self.marker.clone()).with_separator(self.separator.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = BuildConfig::parse_ron("()").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert_eq!(config.service.timeout(), Duration::from_secs(300));
        assert_eq!(config.service.command().program, "claude");
    }

    #[test]
    fn partial_override() {
        let config = BuildConfig::parse_ron(
            r#"(
                output_dir: "out",
                mode: Standalone,
                service: (timeout_secs: 60),
            )"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.mode, OutputMode::Standalone);
        assert_eq!(config.service.timeout_secs, 60);
        assert_eq!(config.service.args, vec!["-p".to_string()]);
        assert_eq!(config.input_extension, "yaml");
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = BuildConfig::parse_ron("(service: (timeout_secs: 0))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_mode_rejected() {
        assert!(matches!(
            BuildConfig::parse_ron("(mode: Sideways)"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn splicer_uses_configured_marker() {
        let config = BuildConfig {
            marker: "\n## SECTION:\n".to_string(),
            ..BuildConfig::default()
        };
        assert_eq!(config.splicer().marker(), "\n## SECTION:\n");
    }
}
