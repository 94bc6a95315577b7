/// Standalone assembly — building a self-contained document from the
/// narrative section alone, without a base template.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::schema::vars::{keys, VariableMapping};

/// Used in the synthesized header when `FULL_NAME` is missing.
pub const UNKNOWN_NAME: &str = "不明";
/// Replaces the legacy character sub-header in standalone documents.
pub const SECTION_LABEL: &str = "## キャラクター設定";

// `# Title` on the first line. `##` and deeper do not count.
static TOP_LEVEL_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[ \t]+\S").expect("valid header regex"));

// `## 組み込みヒロイン：NAME（READING）`
static LEGACY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]*組み込みヒロイン[：:][ \t]*(?P<name>[^（\n]+?)[ \t]*（(?P<reading>[^）\n]+)）[ \t]*$")
        .expect("valid legacy header regex")
});

// Older replies used ASCII parentheses: `## 組み込みヒロイン：NAME (READING)`
static LEGACY_HEADER_ASCII: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]*組み込みヒロイン[：:][ \t]*(?P<name>[^(\n]+?)[ \t]*\((?P<reading>[^)\n]+)\)[ \t]*$")
        .expect("valid ascii legacy header regex")
});

// Same header with no reading at all.
static LEGACY_HEADER_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]*組み込みヒロイン[：:][ \t]*(?P<name>[^\n]*?)[ \t]*$")
        .expect("valid bare legacy header regex")
});

/// The legacy sub-header line found inside a narrative section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyHeader {
    /// Byte range of the header line, excluding its newline.
    pub span: Range<usize>,
    pub name: String,
    pub reading: Option<String>,
}

/// True if the section already opens with its own top-level header.
pub fn has_top_level_header(section: &str) -> bool {
    TOP_LEVEL_HEADER.is_match(section)
}

/// Locate the legacy sub-header, trying the full-width form first.
pub fn find_legacy_header(section: &str) -> Option<LegacyHeader> {
    for pattern in [&*LEGACY_HEADER, &*LEGACY_HEADER_ASCII] {
        if let Some(caps) = pattern.captures(section) {
            let whole = caps.get(0)?;
            return Some(LegacyHeader {
                span: whole.range(),
                name: caps["name"].trim().to_string(),
                reading: Some(caps["reading"].trim().to_string()),
            });
        }
    }

    let caps = LEGACY_HEADER_BARE.captures(section)?;
    Some(LegacyHeader {
        span: caps.get(0)?.range(),
        name: caps["name"].trim().to_string(),
        reading: None,
    })
}

/// Produce a standalone document from the variable mapping and narrative.
///
/// A section that already starts with a top-level header is returned as is.
/// Otherwise a `# FULL_NAME（reading）` header is synthesized, and the legacy
/// sub-header line, if any, is replaced with a generic section label.
pub fn assemble(vars: &VariableMapping, section: &str) -> String {
    if has_top_level_header(section) {
        let mut out = String::with_capacity(section.len() + 1);
        out.push_str(section);
        out.push('\n');
        return out;
    }

    let legacy = find_legacy_header(section);
    let name = vars.non_empty(keys::FULL_NAME).unwrap_or(UNKNOWN_NAME);
    let header = match legacy.as_ref().and_then(|h| h.reading.as_deref()) {
        Some(reading) => format!("# {}（{}）", name, reading),
        None => format!("# {}", name),
    };

    let body = match &legacy {
        Some(h) => format!(
            "{}{}{}",
            &section[..h.span.start],
            SECTION_LABEL,
            &section[h.span.end..]
        ),
        None => section.to_string(),
    };

    format!("{}\n\n{}\n", header, body)
}
