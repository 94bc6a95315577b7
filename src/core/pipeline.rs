/// The build pipeline: character sheet → service reply → finished document.
///
/// Wires together input resolution, the service call, response parsing,
/// template merging or standalone assembly, and the final write.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BuildConfig, OutputMode};
use crate::core::assemble;
use crate::core::input::{self, InputError};
use crate::core::merge::{MergeWarning, TemplateMerger};
use crate::core::password;
use crate::core::response::{self, ParseError, ParsedResponse};
use crate::core::service::{GenerativeTextService, ServiceError};
use crate::core::splice::SpliceError;
use crate::schema::rule::{RuleError, RuleSet};
use crate::schema::vars::{keys, VariableMapping};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input error: {0}")]
    Input(#[from] InputError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("template error: {0}")]
    Splice(#[from] SpliceError),
    #[error("rule table error: {0}")]
    Rules(#[from] RuleError),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A finished document held in memory, not yet written.
#[derive(Debug, Clone)]
pub struct BuiltDocument {
    pub document: String,
    pub vars: VariableMapping,
    pub warnings: Vec<MergeWarning>,
    pub password_generated: bool,
}

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Character sheet; the newest one in the input directory when unset.
    pub input: Option<PathBuf>,
    /// Parse this saved reply instead of calling the service.
    pub replay_response: Option<PathBuf>,
    /// Save the raw reply here before parsing it.
    pub dump_response: Option<PathBuf>,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub vars: VariableMapping,
    pub warnings: Vec<MergeWarning>,
    pub password_generated: bool,
    pub line_count: usize,
}

impl BuildReport {
    /// Whether the password was generated locally or came from the reply.
    pub fn password_source(&self) -> &'static str {
        if self.password_generated {
            "generated"
        } else {
            "supplied"
        }
    }

    /// Log the summary shown after a successful write.
    pub fn log_summary(&self) {
        let value = |key: &str| self.vars.get(key).unwrap_or("?").to_string();
        info!("generated: {}", self.output.display());
        info!("  heroine:  {}", value(keys::FULL_NAME));
        info!("  mode:     {}", value(keys::MODE_NAME));
        info!("  chink:    {}", value(keys::CHINK_SUMMARY));
        info!(
            "  password: {} ({})",
            value(keys::PASSWORD),
            self.password_source()
        );
        info!("  lines:    {}", self.line_count);
        if !self.warnings.is_empty() {
            warn!("{} replacement rule(s) skipped", self.warnings.len());
        }
    }
}

/// The top-level pipeline. Built via `HeroinePipeline::builder()`.
pub struct HeroinePipeline {
    config: BuildConfig,
    merger: TemplateMerger,
    service: Box<dyn GenerativeTextService>,
}

/// Builder for constructing a `HeroinePipeline`.
#[derive(Default)]
pub struct HeroinePipelineBuilder {
    config: Option<BuildConfig>,
    /// Directly provided rules (for testing without files).
    rules: Option<RuleSet>,
    /// Directly provided service (for testing without a subprocess).
    service: Option<Box<dyn GenerativeTextService>>,
}

impl HeroinePipeline {
    pub fn builder() -> HeroinePipelineBuilder {
        HeroinePipelineBuilder::default()
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn merger(&self) -> &TemplateMerger {
        &self.merger
    }

    /// Run the whole pipeline for one character sheet and write the result.
    pub fn run(&self, request: &RunRequest) -> Result<BuildReport, PipelineError> {
        let input = input::find_input(
            request.input.as_deref(),
            &self.config.input_dir,
            &self.config.input_extension,
        )?;
        info!("processing: {}", input.display());

        let response = match &request.replay_response {
            Some(path) => {
                info!("replaying saved response: {}", path.display());
                read(path)?
            }
            None => self.request_expansion(&input)?,
        };

        if let Some(path) = &request.dump_response {
            write_atomic(path, &response)?;
            debug!(path = %path.display(), "raw response saved");
        }

        let built = self.process_response(&response)?;

        let output_name = input::derive_output_name(&input, &self.config.output_suffix);
        let output = self.config.output_dir.join(output_name);
        write_atomic(&output, &built.document)?;

        Ok(BuildReport {
            input,
            output,
            line_count: built.document.lines().count(),
            vars: built.vars,
            warnings: built.warnings,
            password_generated: built.password_generated,
        })
    }

    /// Build the prompt for `input` and submit it to the service.
    pub fn request_expansion(&self, input: &Path) -> Result<String, PipelineError> {
        let character_yaml = read(input)?;
        let expand_prompt = read(&self.config.expand_prompt_path)?;
        let prompt = input::build_prompt(&expand_prompt, &character_yaml);

        let timeout = self.config.service.timeout();
        info!(
            "asking the generative service to expand the character (up to {}s)...",
            timeout.as_secs()
        );
        let response = self.service.submit(&prompt, timeout)?;
        debug!(bytes = response.len(), "response received");
        Ok(response)
    }

    /// Turn a raw reply into a finished document using the configured mode.
    /// The base template is read from disk in template mode.
    pub fn process_response(&self, response: &str) -> Result<BuiltDocument, PipelineError> {
        match self.config.mode {
            OutputMode::Template => {
                let base = read(&self.config.template_path)?;
                self.merge_response(response, &base)
            }
            OutputMode::Standalone => self.standalone_response(response),
        }
    }

    /// Template mode against an in-memory base template.
    pub fn merge_response(&self, response: &str, base: &str) -> Result<BuiltDocument, PipelineError> {
        let (vars, narrative, password_generated) = self.parse(response)?;
        let outcome = self.merger.merge(base, &vars, &narrative)?;
        Ok(BuiltDocument {
            document: outcome.document,
            vars,
            warnings: outcome.warnings,
            password_generated,
        })
    }

    /// Standalone mode: no base template involved.
    pub fn standalone_response(&self, response: &str) -> Result<BuiltDocument, PipelineError> {
        let (vars, narrative, password_generated) = self.parse(response)?;
        let document = assemble::assemble(&vars, &narrative);
        Ok(BuiltDocument {
            document,
            vars,
            warnings: Vec::new(),
            password_generated,
        })
    }

    fn parse(&self, response: &str) -> Result<(VariableMapping, String, bool), PipelineError> {
        let ParsedResponse { mut vars, narrative } = response::parse_response(response)?;
        let length = self.config.password_length;
        let password_generated =
            vars.fill_if_empty(keys::PASSWORD, || password::generate_password(length));
        if password_generated {
            debug!("no PASSWORD in response, generated one");
        }
        Ok((vars, narrative, password_generated))
    }
}

impl HeroinePipelineBuilder {
    pub fn config(mut self, config: BuildConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide rules directly instead of the configured or built-in table.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Provide the service directly instead of the configured command.
    pub fn with_service(mut self, service: impl GenerativeTextService + 'static) -> Self {
        self.service = Some(Box::new(service));
        self
    }

    pub fn build(self) -> Result<HeroinePipeline, PipelineError> {
        let config = self.config.unwrap_or_default();

        let rules = match (self.rules, &config.rules_path) {
            (Some(rules), _) => rules,
            (None, Some(path)) => RuleSet::load_from_ron(path)?,
            (None, None) => RuleSet::builtin()?,
        };
        debug!(rules = rules.len(), "rule table loaded");

        let service = match self.service {
            Some(service) => service,
            None => Box::new(config.service.command()),
        };

        Ok(HeroinePipeline {
            merger: TemplateMerger::new(rules, config.splicer()),
            service,
            config,
        })
    }
}

fn read(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))
}

// Write to a sibling temp file and rename, so a failed write leaves no
// truncated output behind.
fn write_atomic(path: &Path, contents: &str) -> Result<(), PipelineError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    let result = std::fs::write(&tmp, contents)
        .map_err(|e| PipelineError::io(&tmp, e))
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| PipelineError::io(path, e)));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Canned(&'static str);

    impl GenerativeTextService for Canned {
        fn submit(&self, _prompt: &str, _timeout: Duration) -> Result<String, ServiceError> {
            Ok(self.0.to_string())
        }
    }

    fn pipeline(mode: OutputMode) -> HeroinePipeline {
        HeroinePipeline::builder()
            .config(BuildConfig {
                mode,
                marker: "\n## SECTION:\n".to_string(),
                ..BuildConfig::default()
            })
            .with_rules(RuleSet::from_pairs([("Sumire's bag", "{FIRST_NAME}'s bag")]).unwrap())
            .with_service(Canned(""))
            .build()
            .unwrap()
    }

    #[test]
    fn password_generated_when_absent() {
        let p = pipeline(OutputMode::Standalone);
        let built = p
            .standalone_response("```json\n{\"FULL_NAME\": \"Hana\"}\n```\n```md\nbody\n```")
            .unwrap();
        assert!(built.password_generated);
        assert_eq!(built.vars.get(keys::PASSWORD).map(str::len), Some(10));
        assert_eq!(built.document, "# Hana\n\nbody\n");
    }

    #[test]
    fn supplied_password_kept() {
        let p = pipeline(OutputMode::Standalone);
        let built = p
            .standalone_response("```json\n{\"PASSWORD\": \"given1234\"}\n```\n```md\nbody\n```")
            .unwrap();
        assert!(!built.password_generated);
        assert_eq!(built.vars.get(keys::PASSWORD), Some("given1234"));
    }

    #[test]
    fn parse_failure_propagates() {
        let p = pipeline(OutputMode::Template);
        let err = p.merge_response("no blocks", "base\n## SECTION:\n").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Parse(ParseError::MissingStructuredBlock { .. })
        ));
    }

    #[test]
    fn marker_missing_propagates() {
        let p = pipeline(OutputMode::Template);
        let err = p
            .merge_response("```json\n{}\n```\n```md\nx\n```", "no marker here")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Splice(SpliceError::MarkerNotFound { .. })));
    }

    #[test]
    fn builtin_rules_by_default() {
        let p = HeroinePipeline::builder().with_service(Canned("")).build().unwrap();
        assert_eq!(
            p.merger().rules().len(),
            crate::schema::rule::BUILTIN_RULES.len()
        );
    }

    #[test]
    fn atomic_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/HANA_FULL.md");
        write_atomic(&path, "content").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
        assert!(!path.with_file_name(".HANA_FULL.md.tmp").exists());
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HANA_FULL.md");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();

        let err = write_atomic(&path, "content").unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
        assert!(!dir.path().join(".HANA_FULL.md.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn report_names_password_source() {
        let mut report = BuildReport {
            input: PathBuf::from("hana.yaml"),
            output: PathBuf::from("HANA_FULL.md"),
            vars: VariableMapping::default(),
            warnings: Vec::new(),
            password_generated: true,
            line_count: 0,
        };
        assert_eq!(report.password_source(), "generated");
        report.password_generated = false;
        assert_eq!(report.password_source(), "supplied");
    }
}
