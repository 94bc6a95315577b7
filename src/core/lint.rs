/// Static checks of a base template against a rule table.

use crate::schema::rule::RuleSet;
use crate::schema::vars::keys;

/// Findings of one lint run. Errors make the merge unreliable; warnings
/// only mean some rule will be skipped or replace less than expected.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

pub fn lint_template(template: &str, rules: &RuleSet, marker: &str) -> LintReport {
    let mut report = LintReport::default();

    // The marker decides where the character section starts
    match template.matches(marker).count() {
        0 => report
            .errors
            .push(format!("Section marker {:?} not found", marker)),
        1 => {}
        n => report.warnings.push(format!(
            "Section marker {:?} occurs {} times; only the first is used",
            marker, n
        )),
    }
    let head_end = template.find(marker).unwrap_or(template.len());
    let head = &template[..head_end];

    for (index, rule) in rules.rules.iter().enumerate() {
        match head.matches(rule.literal.as_str()).count() {
            0 if template.contains(rule.literal.as_str()) => report.warnings.push(format!(
                "Rule {} literal {:?} only occurs inside the replaced section",
                index, rule.literal
            )),
            0 => report.warnings.push(format!(
                "Rule {} literal {:?} not found in template",
                index, rule.literal
            )),
            1 => {}
            n => report.warnings.push(format!(
                "Rule {} literal {:?} occurs {} times; only the first is replaced",
                index, rule.literal, n
            )),
        }

        for key in rule.template.placeholders() {
            if !keys::ALL.contains(&key) {
                report.warnings.push(format!(
                    "Rule {} uses placeholder {{{}}} which the expansion prompt does not produce",
                    index, key
                ));
            }
        }
    }

    // A literal containing another literal makes the result depend on rule order
    for (i, a) in rules.rules.iter().enumerate() {
        for (j, b) in rules.rules.iter().enumerate() {
            if i != j && a.literal.contains(b.literal.as_str()) {
                report.errors.push(format!(
                    "Rule {} literal contains rule {} literal {:?}; results depend on order",
                    i, j, b.literal
                ));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "\n## SECTION";

    fn rules(pairs: &[(&str, &str)]) -> RuleSet {
        RuleSet::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn clean_template() {
        let report = lint_template(
            "Name: Alice\n## SECTION\nold",
            &rules(&[("Alice", "{FIRST_NAME}")]),
            MARKER,
        );
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn missing_marker_is_an_error() {
        let report = lint_template("Name: Alice", &rules(&[("Alice", "{FIRST_NAME}")]), MARKER);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("not found"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn repeated_marker_warns() {
        let report = lint_template(
            "Alice\n## SECTION\na\n## SECTION\nb",
            &rules(&[("Alice", "{FIRST_NAME}")]),
            MARKER,
        );
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("occurs 2 times"));
    }

    #[test]
    fn literal_only_in_replaced_section() {
        let report = lint_template(
            "head\n## SECTION\nAlice",
            &rules(&[("Alice", "{FIRST_NAME}")]),
            MARKER,
        );
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("only occurs inside the replaced section"));
    }

    #[test]
    fn literal_missing() {
        let report = lint_template("head\n## SECTION\n", &rules(&[("Alice", "{FIRST_NAME}")]), MARKER);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("not found in template"));
    }

    #[test]
    fn literal_repeated_in_head() {
        let report = lint_template(
            "Alice and Alice\n## SECTION\n",
            &rules(&[("Alice", "{FIRST_NAME}")]),
            MARKER,
        );
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("occurs 2 times; only the first is replaced"));
    }

    #[test]
    fn unknown_placeholder_warns() {
        let report = lint_template(
            "Alice\n## SECTION\n",
            &rules(&[("Alice", "{NICKNAME}")]),
            MARKER,
        );
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("{NICKNAME}"));
    }

    #[test]
    fn overlapping_literals_are_errors() {
        let report = lint_template(
            "Alice Liddell\n## SECTION\n",
            &rules(&[("Alice Liddell", "{FULL_NAME}"), ("Alice", "{FIRST_NAME}")]),
            MARKER,
        );
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Rule 0 literal contains rule 1"));
    }
}
