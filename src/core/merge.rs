/// Template merging — applying replacement rules to a base document and
/// splicing in the narrative section.

use thiserror::Error;
use tracing::warn;

use crate::core::splice::{SectionSplicer, SpliceError};
use crate::core::template::{MissingKey, TemplateSegment};
use crate::schema::rule::{ReplacementRule, RuleSet};
use crate::schema::vars::VariableMapping;

/// A rule that was skipped. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeWarning {
    #[error("missing variable {{{key}}}, rule skipped: {template:?}")]
    MissingVariable {
        rule: usize,
        key: String,
        template: String,
    },
    #[error("literal not found in template, rule skipped: {literal:?}")]
    LiteralNotFound { rule: usize, literal: String },
}

impl MergeWarning {
    /// Index of the rule in its rule set.
    pub fn rule(&self) -> usize {
        match self {
            MergeWarning::MissingVariable { rule, .. } | MergeWarning::LiteralNotFound { rule, .. } => {
                *rule
            }
        }
    }
}

/// Result of applying a rule set: the rewritten document and every skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub document: String,
    pub warnings: Vec<MergeWarning>,
}

/// Applies a rule set to base documents.
#[derive(Debug, Clone)]
pub struct TemplateMerger {
    rules: RuleSet,
    splicer: SectionSplicer,
}

impl TemplateMerger {
    pub fn new(rules: RuleSet, splicer: SectionSplicer) -> Self {
        Self { rules, splicer }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn splicer(&self) -> &SectionSplicer {
        &self.splicer
    }

    /// Apply every rule to `base`. Each rule replaces the first occurrence
    /// of its literal, or is skipped with a warning.
    pub fn apply_rules(&self, base: &str, vars: &VariableMapping) -> MergeOutcome {
        let mut document = base.to_string();
        let mut warnings = Vec::new();

        for (index, rule) in self.rules.rules.iter().enumerate() {
            if let Err(warning) = apply_rule(&mut document, index, rule, vars) {
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        MergeOutcome { document, warnings }
    }

    /// Apply every rule, then replace the marker section with `narrative`.
    pub fn merge(
        &self,
        base: &str,
        vars: &VariableMapping,
        narrative: &str,
    ) -> Result<MergeOutcome, SpliceError> {
        let MergeOutcome { document, warnings } = self.apply_rules(base, vars);
        let document = self.splicer.splice(&document, narrative)?;
        Ok(MergeOutcome { document, warnings })
    }
}

fn apply_rule(
    document: &mut String,
    index: usize,
    rule: &ReplacementRule,
    vars: &VariableMapping,
) -> Result<(), MergeWarning> {
    let rendered = rule
        .template
        .render(vars)
        .map_err(|MissingKey(key)| MergeWarning::MissingVariable {
            rule: index,
            key,
            template: template_source(rule),
        })?;

    let Some(at) = document.find(&rule.literal) else {
        return Err(MergeWarning::LiteralNotFound {
            rule: index,
            literal: rule.literal.clone(),
        });
    };
    document.replace_range(at..at + rule.literal.len(), &rendered);
    Ok(())
}

// Re-serialize a parsed template for diagnostics.
fn template_source(rule: &ReplacementRule) -> String {
    rule.template
        .segments
        .iter()
        .map(|s| match s {
            TemplateSegment::Literal(text) => text.replace('{', "{{").replace('}', "}}"),
            TemplateSegment::Placeholder(key) => format!("{{{}}}", key),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(pairs: &[(&str, &str)]) -> RuleSet {
        RuleSet::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn vars(pairs: &[(&str, &str)]) -> VariableMapping {
        pairs.iter().copied().collect()
    }

    fn merger(pairs: &[(&str, &str)]) -> TemplateMerger {
        TemplateMerger::new(rules(pairs), SectionSplicer::new("\n## SECTION:\n"))
    }

    #[test]
    fn replaces_first_occurrence_only() {
        let m = merger(&[("Sumire's bag", "{FIRST_NAME}'s bag")]);
        let out = m.apply_rules(
            "Sumire's bag. Sumire's bag.",
            &vars(&[("FIRST_NAME", "Hana")]),
        );
        assert_eq!(out.document, "Hana's bag. Sumire's bag.");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn missing_key_leaves_literal_and_warns_once() {
        let m = merger(&[("Sumire's bag", "{FIRST_NAME}'s {ITEM}")]);
        let base = "She took Sumire's bag.";
        let out = m.apply_rules(base, &vars(&[("FIRST_NAME", "Hana")]));
        assert_eq!(out.document, base);
        assert_eq!(out.warnings.len(), 1);
        assert!(matches!(
            &out.warnings[0],
            MergeWarning::MissingVariable { rule: 0, key, .. } if key == "ITEM"
        ));
    }

    #[test]
    fn absent_literal_warns_and_continues() {
        let m = merger(&[
            ("not in the document", "{FIRST_NAME}"),
            ("Sumire", "{FIRST_NAME}"),
        ]);
        let out = m.apply_rules("Hello Sumire", &vars(&[("FIRST_NAME", "Hana")]));
        assert_eq!(out.document, "Hello Hana");
        assert_eq!(
            out.warnings,
            vec![MergeWarning::LiteralNotFound {
                rule: 0,
                literal: "not in the document".to_string()
            }]
        );
        assert_eq!(out.warnings[0].rule(), 0);
    }

    #[test]
    fn second_application_is_a_no_op() {
        let m = merger(&[
            ("Sumire's bag", "{FIRST_NAME}'s bag"),
            ("rxXnFWZdWYp7", "{PASSWORD}"),
        ]);
        let v = vars(&[("FIRST_NAME", "Hana"), ("PASSWORD", "k3yK3yk3y0")]);
        let once = m.apply_rules("Sumire's bag / pw: rxXnFWZdWYp7", &v);
        let twice = m.apply_rules(&once.document, &v);
        assert_eq!(twice.document, once.document);
        assert_eq!(twice.warnings.len(), 2);
        assert!(twice
            .warnings
            .iter()
            .all(|w| matches!(w, MergeWarning::LiteralNotFound { .. })));
    }

    #[test]
    fn merge_splices_narrative_after_rules() {
        let m = merger(&[("Sumire's bag", "{FIRST_NAME}'s bag")]);
        let base = "# Guide\nSumire's bag is red.\n\n---\n\n## SECTION:\nSumire details\n";
        let out = m
            .merge(base, &vars(&[("FIRST_NAME", "Hana")]), "---\n\n## SECTION: Hana")
            .unwrap();
        assert_eq!(
            out.document,
            "# Guide\nHana's bag is red.\n\n\n---\n\n## SECTION: Hana\n"
        );
    }

    #[test]
    fn merge_fails_without_marker() {
        let m = merger(&[]);
        let err = m.merge("no marker", &vars(&[]), "x").unwrap_err();
        assert!(matches!(err, SpliceError::MarkerNotFound { .. }));
    }

    #[test]
    fn warning_shows_template_source() {
        let m = merger(&[("a", "{{x}} {MISSING}")]);
        let out = m.apply_rules("a", &vars(&[]));
        assert_eq!(
            out.warnings[0].to_string(),
            "missing variable {MISSING}, rule skipped: \"{{x}} {MISSING}\""
        );
    }
}
