/// Section splicing. Cuts the base template at its marker and appends
/// the generated narrative section.

use thiserror::Error;

/// Marker that opens the replaceable character section of the base template.
pub const DEFAULT_MARKER: &str = "\n## 組み込みヒロイン：";
/// Horizontal rule that precedes the marker; the narrative supplies its own.
pub const DEFAULT_SEPARATOR: &str = "\n---\n";
/// How close to the marker (in bytes) the separator must start to be trimmed.
pub const SEPARATOR_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpliceError {
    #[error("section marker {marker:?} not found in base template")]
    MarkerNotFound { marker: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSplicer {
    marker: String,
    separator: String,
    window: usize,
}

impl Default for SectionSplicer {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl SectionSplicer {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            separator: DEFAULT_SEPARATOR.to_string(),
            window: SEPARATOR_WINDOW,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Everything before the marker, minus one trailing separator line if it
    /// sits within the window right before the marker.
    pub fn head<'a>(&self, document: &'a str) -> Result<&'a str, SpliceError> {
        let idx = document
            .find(&self.marker)
            .ok_or_else(|| SpliceError::MarkerNotFound {
                marker: self.marker.clone(),
            })?;
        let head = &document[..idx];

        if self.separator.is_empty() {
            return Ok(head);
        }
        match head.rfind(&self.separator) {
            Some(sep) if sep + self.window > head.len() => Ok(&head[..sep]),
            _ => Ok(head),
        }
    }

    /// Replace the marker section of `document` with `section`.
    pub fn splice(&self, document: &str, section: &str) -> Result<String, SpliceError> {
        let head = self.head(document)?;
        let mut out = String::with_capacity(head.len() + section.len() + 3);
        out.push_str(head);
        out.push_str("\n\n");
        out.push_str(section);
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_separator_right_before_marker() {
        let s = SectionSplicer::default();
        let doc = "# 本文\n\n終わり。\n\n---\n\n## 組み込みヒロイン：柊すみれ\n旧設定\n";
        let out = s.splice(doc, "---\n\n## 組み込みヒロイン：桜井ひかり").unwrap();
        assert_eq!(
            out,
            "# 本文\n\n終わり。\n\n\n---\n\n## 組み込みヒロイン：桜井ひかり\n"
        );
    }

    #[test]
    fn trims_exactly_one_separator() {
        let s = SectionSplicer::new("\n## SECTION:\n");
        let doc = "intro\n---\n---\n\n## SECTION:\nold";
        assert_eq!(s.head(doc).unwrap(), "intro\n---");
    }

    #[test]
    fn keeps_head_without_separator() {
        let s = SectionSplicer::new("\n## SECTION:\n");
        let doc = "intro text\n## SECTION:\nold";
        assert_eq!(s.head(doc).unwrap(), "intro text");
    }

    #[test]
    fn distant_separator_is_kept() {
        let s = SectionSplicer::new("\n## SECTION:\n");
        let doc = "intro\n---\nthis paragraph is long enough\n## SECTION:\nold";
        assert_eq!(
            s.head(doc).unwrap(),
            "intro\n---\nthis paragraph is long enough"
        );
    }

    #[test]
    fn missing_marker_is_fatal() {
        let s = SectionSplicer::new("\n## SECTION:\n");
        assert_eq!(
            s.splice("no section here", "x"),
            Err(SpliceError::MarkerNotFound {
                marker: "\n## SECTION:\n".to_string()
            })
        );
    }

    #[test]
    fn only_first_marker_is_used() {
        let s = SectionSplicer::new("\n## SECTION:\n");
        let doc = "a\n## SECTION:\nb\n## SECTION:\nc";
        assert_eq!(s.splice(doc, "new").unwrap(), "a\n\nnew\n");
    }
}
