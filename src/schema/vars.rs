/// Variable mapping parsed from the structured-data block of a response.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Well-known keys read by the merger, the assembler and the run summary.
pub mod keys {
    pub const FULL_NAME: &str = "FULL_NAME";
    pub const FIRST_NAME: &str = "FIRST_NAME";
    pub const MODE_NAME: &str = "MODE_NAME";
    pub const CHINK_SUMMARY: &str = "CHINK_SUMMARY";
    pub const BARRIER_SUMMARY: &str = "BARRIER_SUMMARY";
    pub const STAGE1_CHOICE_A: &str = "STAGE1_CHOICE_A";
    pub const STAGE1_CHOICE_B: &str = "STAGE1_CHOICE_B";
    pub const STAGE2_CHOICE_A: &str = "STAGE2_CHOICE_A";
    pub const STAGE2_CHOICE_B: &str = "STAGE2_CHOICE_B";
    pub const STAGE3_CHOICE_A: &str = "STAGE3_CHOICE_A";
    pub const RESET_DIALOGUE: &str = "RESET_DIALOGUE";
    pub const PASSWORD: &str = "PASSWORD";

    /// Every key the built-in rule table and the assembler know about.
    pub const ALL: &[&str] = &[
        FULL_NAME,
        FIRST_NAME,
        MODE_NAME,
        CHINK_SUMMARY,
        BARRIER_SUMMARY,
        STAGE1_CHOICE_A,
        STAGE1_CHOICE_B,
        STAGE2_CHOICE_A,
        STAGE2_CHOICE_B,
        STAGE3_CHOICE_A,
        RESET_DIALOGUE,
        PASSWORD,
    ];
}

/// Flat string-to-string mapping. Any key may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableMapping {
    values: FxHashMap<String, String>,
}

impl VariableMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, treating an empty string the same as a missing key.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fill `key` with the value produced by `fallback` when it is missing
    /// or empty. Returns true if the fallback was used.
    pub fn fill_if_empty(&mut self, key: &str, fallback: impl FnOnce() -> String) -> bool {
        if self.non_empty(key).is_some() {
            return false;
        }
        self.values.insert(key.to_string(), fallback());
        true
    }

    /// Keys in sorted order, for stable diagnostics.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_empty_values() {
        let vars: VariableMapping = [("FIRST_NAME", "Hana"), ("PASSWORD", "")]
            .into_iter()
            .collect();
        assert_eq!(vars.get("FIRST_NAME"), Some("Hana"));
        assert_eq!(vars.get("PASSWORD"), Some(""));
        assert_eq!(vars.non_empty("PASSWORD"), None);
        assert_eq!(vars.get("MODE_NAME"), None);
    }

    #[test]
    fn fill_if_empty_only_replaces_blank_values() {
        let mut vars: VariableMapping = [("PASSWORD", "")].into_iter().collect();
        assert!(vars.fill_if_empty(keys::PASSWORD, || "abc123".to_string()));
        assert_eq!(vars.get(keys::PASSWORD), Some("abc123"));

        assert!(!vars.fill_if_empty(keys::PASSWORD, || "other".to_string()));
        assert_eq!(vars.get(keys::PASSWORD), Some("abc123"));
    }

    #[test]
    fn deserializes_from_flat_json_object() {
        let vars: VariableMapping =
            serde_json::from_str(r#"{"FULL_NAME": "桜井ひかり", "FIRST_NAME": "ひかり"}"#).unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.sorted_keys(), vec!["FIRST_NAME", "FULL_NAME"]);
    }

    #[test]
    fn rejects_nested_values() {
        let result: Result<VariableMapping, _> =
            serde_json::from_str(r#"{"FULL_NAME": {"given": "Hana"}}"#);
        assert!(result.is_err());
    }
}
