/// Replacement rules — literal base-template text mapped to placeholder templates.

use std::path::Path;
use thiserror::Error;

use crate::core::template::{Template, TemplateError};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule {index} ({literal:?}): {source}")]
    Template {
        index: usize,
        literal: String,
        #[source]
        source: TemplateError,
    },
    #[error("rule {0} has an empty literal")]
    EmptyLiteral(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// The built-in table, written against `SUMIRE_FULL.md`.
///
/// Left: text as it appears in the base template.
/// Right: replacement with `{KEY}` placeholders.
pub const BUILTIN_RULES: &[(&str, &str)] = &[
    (
        "すみれのCHINK、防壁パターン、Say/Do Gapに対応",
        "{FIRST_NAME}のCHINK、防壁パターン、Say/Do Gapに対応",
    ),
    ("ヒロイン（柊すみれ）", "ヒロイン（{FULL_NAME}）"),
    ("（友達モードに戻ろうとする）", "（{MODE_NAME}に戻ろうとする）"),
    (
        "すみれのCHINK（昔と違うね、友達じゃダメ？、他の誰かと付き合ったら）",
        "{FIRST_NAME}のCHINK（{CHINK_SUMMARY}）",
    ),
    (
        "すみれの防壁パターン（友達トーク、恋愛回避、弱点突かれた時の強化反応）",
        "{FIRST_NAME}の防壁パターン（{BARRIER_SUMMARY}）",
    ),
    (
        "プレイヤーは**すみれのペルソナを理解して選ぶ**",
        "プレイヤーは**{FIRST_NAME}のペルソナを理解して選ぶ**",
    ),
    (
        "1. 「すみれ、最近雰囲気変わったよね」（CHINK-A近似）",
        "1. {STAGE1_CHOICE_A}",
    ),
    (
        "2. 「久しぶりだね。元気だった？」（友達トーク維持）",
        "2. {STAGE1_CHOICE_B}",
    ),
    (
        "1. 「俺たち、ずっと友達のままでいいよね」（CHINK-B直撃狙い）",
        "1. {STAGE2_CHOICE_A}",
    ),
    (
        "2. 「すみれ、そのワンピース似合ってるよ」（Say/Do Gap指摘）",
        "2. {STAGE2_CHOICE_B}",
    ),
    (
        "1. 「すみれは、誰かいい人いないの？」（CHINK-C狙い）",
        "1. {STAGE3_CHOICE_A}",
    ),
    ("- すみれに刺さらない行動", "- {FIRST_NAME}に刺さらない行動"),
    (
        "- すみれのペルソナを無視した行動",
        "- {FIRST_NAME}のペルソナを無視した行動",
    ),
    (
        "   - 抵抗値0→10: 「…っ、何、してた…の…」（茫然）",
        "   - 抵抗値0→10: {RESET_DIALOGUE}",
    ),
    (
        "「友達モード」に戻ろうとする（でも身体は覚えている）",
        "「{MODE_NAME}」に戻ろうとする（でも身体は覚えている）",
    ),
    ("すみれの肩が、震えた。", "{FIRST_NAME}の肩が、震えた。"),
    (
        "すみれは鞄を肩にかけ、立ち上がった。",
        "{FIRST_NAME}は鞄を肩にかけ、立ち上がった。",
    ),
    // Access token baked into the base template
    ("rxXnFWZdWYp7", "{PASSWORD}"),
];

/// A single literal → template substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    pub literal: String,
    pub template: Template,
}

impl ReplacementRule {
    pub fn new(literal: &str, template: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            literal: literal.to_string(),
            template: Template::parse(template)?,
        })
    }
}

/// An ordered table of replacement rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub rules: Vec<ReplacementRule>,
}

impl RuleSet {
    /// The table compiled into the binary.
    pub fn builtin() -> Result<RuleSet, RuleError> {
        Self::from_pairs(BUILTIN_RULES.iter().copied())
    }

    /// Build a rule set from `(literal, template)` pairs, validating each template.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<RuleSet, RuleError> {
        let mut rules = Vec::new();
        for (index, (literal, template)) in pairs.into_iter().enumerate() {
            if literal.is_empty() {
                return Err(RuleError::EmptyLiteral(index));
            }
            let rule =
                ReplacementRule::new(literal, template).map_err(|source| RuleError::Template {
                    index,
                    literal: literal.to_string(),
                    source,
                })?;
            rules.push(rule);
        }
        Ok(RuleSet { rules })
    }

    /// Load a rule table from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<RuleSet, RuleError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a rule table from a RON string: `[("literal", "template"), ...]`.
    pub fn parse_ron(input: &str) -> Result<RuleSet, RuleError> {
        let pairs: Vec<(String, String)> = ron::from_str(input)?;
        Self::from_pairs(pairs.iter().map(|(l, t)| (l.as_str(), t.as_str())))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
