/// Input resolution and output file naming.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;
use thiserror::Error;
use tracing::info;

/// Heading that introduces the character sheet in the expansion prompt.
pub const INPUT_HEADING: &str = "## 入力キャラクターYAML";

static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[_-]").expect("valid prefix regex"));

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("input directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("no *.{extension} files in {dir}")]
    NoCandidates { dir: PathBuf, extension: String },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the input file: an explicit path must exist; otherwise the most
/// recently modified `*.extension` file in `dir` is used.
pub fn find_input(explicit: Option<&Path>, dir: &Path, extension: &str) -> Result<PathBuf, InputError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(InputError::FileNotFound(path.to_path_buf()));
        }
        return Ok(path.to_path_buf());
    }

    if !dir.is_dir() {
        return Err(InputError::DirectoryNotFound(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| InputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let candidates = entries.filter_map(|entry| {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                return Some(Err(InputError::Io {
                    path: dir.to_path_buf(),
                    source,
                }))
            }
        };
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some(extension) {
            return None;
        }
        Some(
            entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| (path.clone(), modified))
                .map_err(|source| InputError::Io { path, source }),
        )
    });

    match pick_newest(candidates)? {
        Some(path) => {
            info!(file = %path.display(), "using most recent input");
            Ok(path)
        }
        None => Err(InputError::NoCandidates {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        }),
    }
}

/// Most recently modified candidate, ties broken by name so the choice is
/// stable. The first failed entry aborts the scan.
fn pick_newest(
    candidates: impl IntoIterator<Item = Result<(PathBuf, SystemTime), InputError>>,
) -> Result<Option<PathBuf>, InputError> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for candidate in candidates {
        let (path, modified) = candidate?;
        let is_newer = match &newest {
            None => true,
            Some((t, p)) => modified > *t || (modified == *t && path > *p),
        };
        if is_newer {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Expansion prompt followed by the character sheet in a fenced yaml block.
pub fn build_prompt(expand_prompt: &str, character_yaml: &str) -> String {
    format!(
        "{}\n\n---\n\n{}\n\n```yaml\n{}\n```",
        expand_prompt, INPUT_HEADING, character_yaml
    )
}

/// Output file name for an input path: the stem without any leading
/// `<digits>_` or `<digits>-`, upper-cased, plus `suffix`.
pub fn derive_output_name(input: &Path, suffix: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let stem = NUMERIC_PREFIX.replace(&stem, "");
    format!("{}{}", stem.to_uppercase(), suffix)
}
