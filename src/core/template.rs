/// Placeholder templates — parsing `{KEY}` tokens and rendering them
/// against a variable mapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::vars::VariableMapping;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    Parse(String),
}

/// A placeholder with no value in the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no value for placeholder {{{0}}}")]
pub struct MissingKey(pub String);

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Variable substitution: `{KEY}`.
    Placeholder(String),
}

/// A parsed template, as a sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{KEY}` → `Placeholder`
    /// - `{{` / `}}` → literal `{` / `}`
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' {
                if i + 1 < len && chars[i + 1] == '{' {
                    literal_buf.push('{');
                    i += 2;
                    continue;
                }

                if !literal_buf.is_empty() {
                    segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                }

                let start = i + 1;
                let mut end = start;
                while end < len && chars[end] != '}' {
                    if chars[end] == '{' {
                        return Err(TemplateError::Parse(
                            "nested braces are not allowed".to_string(),
                        ));
                    }
                    end += 1;
                }

                if end == len {
                    return Err(TemplateError::Parse("unclosed brace".to_string()));
                }

                let key: String = chars[start..end].iter().collect();
                if key.is_empty() {
                    return Err(TemplateError::Parse("empty braces".to_string()));
                }
                if key.chars().any(char::is_whitespace) {
                    return Err(TemplateError::Parse(format!(
                        "whitespace in placeholder {{{}}}",
                        key
                    )));
                }

                segments.push(TemplateSegment::Placeholder(key));
                i = end + 1;
            } else if chars[i] == '}' {
                if i + 1 < len && chars[i + 1] == '}' {
                    literal_buf.push('}');
                    i += 2;
                    continue;
                }
                return Err(TemplateError::Parse(
                    "unmatched closing brace".to_string(),
                ));
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    /// Placeholder keys in order of appearance (duplicates kept).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Placeholder(key) => Some(key.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }

    /// Render every placeholder from `vars`. Fails on the first missing key
    /// without producing partial output.
    pub fn render(&self, vars: &VariableMapping) -> Result<String, MissingKey> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Placeholder(key) => match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => return Err(MissingKey(key.clone())),
                },
            }
        }
        Ok(out)
    }
}
