//! Source-to-target file name suffix table

use serde::{Deserialize, Serialize};

/// One `from -> to` suffix rule, e.g. `.cs -> .java`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRule {
    pub from: String,
    pub to: String,
}

/// Ordered suffix table. The first rule whose `from` ends a path applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuffixMap {
    rules: Vec<SuffixRule>,
}

impl Default for SuffixMap {
    fn default() -> Self {
        Self::single(".cs", ".java")
    }
}

impl SuffixMap {
    pub fn new(rules: Vec<SuffixRule>) -> Self {
        Self { rules }
    }

    pub fn single(from: &str, to: &str) -> Self {
        Self::new(vec![SuffixRule {
            from: from.to_string(),
            to: to.to_string(),
        }])
    }

    pub fn rules(&self) -> &[SuffixRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn rule_for(&self, path: &str) -> Option<&SuffixRule> {
        self.rules
            .iter()
            .find(|rule| !rule.from.is_empty() && path.ends_with(&rule.from))
    }

    /// Whether `path` is a translatable source file
    pub fn is_source(&self, path: &str) -> bool {
        self.rule_for(path).is_some()
    }

    /// `path` with its trailing source suffix swapped, if any rule matches
    pub fn target_path(&self, path: &str) -> Option<String> {
        self.rule_for(path).map(|rule| {
            let stem = &path[..path.len() - rule.from.len()];
            format!("{}{}", stem, rule.to)
        })
    }

    /// [`SuffixMap::target_path`], or `path` itself when no rule matches
    pub fn target_path_or_same(&self, path: &str) -> String {
        self.target_path(path).unwrap_or_else(|| path.to_string())
    }

    /// `path` with its trailing source suffix removed
    pub fn strip_source_suffix<'a>(&self, path: &'a str) -> &'a str {
        match self.rule_for(path) {
            Some(rule) => &path[..path.len() - rule.from.len()],
            None => path,
        }
    }
}
