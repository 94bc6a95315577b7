/// Response parsing — splitting a service reply into variables and narrative.

use thiserror::Error;
use tracing::debug;

use crate::core::fence::{self, Closer};
use crate::schema::vars::VariableMapping;

/// Label of the structured-data block.
pub const STRUCTURED_LABEL: &str = "json";
/// Labels of the narrative block, primary first.
pub const NARRATIVE_LABELS: &[&str] = &["markdown", "md"];

/// Number of characters of the response quoted in parse errors.
const EXCERPT_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no ```json block found in response\n--- response head ---\n{excerpt}")]
    MissingStructuredBlock { excerpt: String },
    #[error("```json block is not a flat string mapping: {source}\n--- block ---\n{excerpt}")]
    MalformedStructuredData {
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },
    #[error("no ```markdown or ```md block found in response\n--- response head ---\n{excerpt}")]
    MissingNarrativeBlock { excerpt: String },
}

/// The two artifacts recovered from one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub vars: VariableMapping,
    pub narrative: String,
}

/// First `EXCERPT_CHARS` characters of `text`, cut on a char boundary.
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

/// Parse a full service response.
///
/// The `json` block ends at its first bare fence, since it holds plain data
/// and is followed by the narrative block. The narrative block ends at the
/// last bare fence so that fenced samples inside it survive.
pub fn parse_response(response: &str) -> Result<ParsedResponse, ParseError> {
    let structured = fence::find_block(response, STRUCTURED_LABEL, Closer::First).ok_or_else(
        || ParseError::MissingStructuredBlock {
            excerpt: excerpt(response),
        },
    )?;

    let vars: VariableMapping = serde_json::from_str(structured.content).map_err(|source| {
        ParseError::MalformedStructuredData {
            source,
            excerpt: excerpt(structured.content),
        }
    })?;
    debug!(keys = ?vars.sorted_keys(), "parsed variable mapping");

    let narrative = fence::extract_any(response, NARRATIVE_LABELS, Closer::Outermost)
        .ok_or_else(|| ParseError::MissingNarrativeBlock {
            excerpt: excerpt(response),
        })?;
    debug!(
        label = narrative.label,
        bytes = narrative.content.len(),
        "extracted narrative block"
    );

    Ok(ParsedResponse {
        vars,
        narrative: narrative.content.to_string(),
    })
}
