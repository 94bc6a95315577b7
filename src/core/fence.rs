/// Fenced block extraction — locating ```` ```label ```` blocks in free text.
///
/// Extraction is a two-phase scan: find the labeled opener, then pick a bare
/// closing fence after the content start. Which closer is picked is explicit
/// (`Closer`), so blocks that embed their own fenced samples can be recovered
/// whole.

/// Fence prefix shared by openers and closers.
pub const FENCE: &str = "```";

/// Which bare closing fence terminates a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closer {
    /// The first bare fence after the content start.
    First,
    /// The last bare fence in the text. Tolerates nested fences.
    Outermost,
}

/// A located block. Offsets are byte positions in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    pub label: &'a str,
    /// Trimmed inner content.
    pub content: &'a str,
    /// Start of the line following the opener.
    pub content_start: usize,
    /// Position of the closing fence.
    pub closer_start: usize,
}

/// Byte offset where the content of the first ```` ```label ```` block begins,
/// i.e. the start of the line after the opener.
pub fn content_start(text: &str, label: &str) -> Option<usize> {
    let opener = format!("{}{}", FENCE, label);
    let mut from = 0;
    while let Some(pos) = text[from..].find(&opener) {
        let at = from + pos;
        let after = at + opener.len();
        if label_ends_at(text, after) {
            let newline = text[after..].find('\n')?;
            return Some(after + newline + 1);
        }
        from = after;
    }
    None
}

/// Locate the block opened by ```` ```label ````.
pub fn find_block<'a>(text: &'a str, label: &'a str, closer: Closer) -> Option<FencedBlock<'a>> {
    let start = content_start(text, label)?;
    let tail = &text[start..];
    let relative = match closer {
        Closer::First => tail
            .match_indices(FENCE)
            .map(|(i, _)| i)
            .find(|&i| is_bare_fence(tail, i)),
        Closer::Outermost => tail
            .rmatch_indices(FENCE)
            .map(|(i, _)| i)
            .find(|&i| is_bare_fence(tail, i)),
    }?;
    let closer_start = start + relative;
    Some(FencedBlock {
        label,
        content: text[start..closer_start].trim(),
        content_start: start,
        closer_start,
    })
}

/// Trimmed content of the ```` ```label ```` block, closed by the outermost fence.
pub fn extract(text: &str, label: &str) -> Option<String> {
    find_block(text, label, Closer::Outermost).map(|b| b.content.to_string())
}

/// Try each label in turn; the first one whose block is found wins.
pub fn extract_any<'a>(
    text: &'a str,
    labels: &[&'a str],
    closer: Closer,
) -> Option<FencedBlock<'a>> {
    labels
        .iter()
        .find_map(|label| find_block(text, label, closer))
}

// The label must not continue into a longer word: ```md is not ```mdx.
fn label_ends_at(text: &str, at: usize) -> bool {
    match text[at..].chars().next() {
        None => true,
        Some(c) => c.is_whitespace(),
    }
}

// A bare fence has nothing but whitespace after it on its line.
fn is_bare_fence(text: &str, at: usize) -> bool {
    let rest = &text[at + FENCE.len()..];
    let line = rest.split('\n').next().unwrap_or("");
    line.trim().is_empty()
}
