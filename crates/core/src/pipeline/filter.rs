//! Ignore rules applied to listed objects

use glob::Pattern;
use regex::Regex;

use crate::error::{Error, Result};
use crate::traits::ObjectInfo;

/// Prefix marking a regular expression in textual rules
const REGEX_PREFIX: &str = "re:";

/// A single exclusion rule matched against the full object name
#[derive(Debug, Clone)]
pub enum IgnoreRule {
    Exact(String),
    Glob(Pattern),
    Regex(Regex),
}

impl IgnoreRule {
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        Pattern::new(pattern)
            .map(Self::Glob)
            .map_err(|e| Error::Config(format!("Invalid glob pattern '{pattern}': {e}")))
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| Error::Config(format!("Invalid regular expression '{pattern}': {e}")))
    }

    /// `re:<expr>` is a regex, text containing `*`, `?` or `[` is a glob,
    /// anything else must match exactly.
    pub fn parse(rule: &str) -> Result<Self> {
        if let Some(expr) = rule.strip_prefix(REGEX_PREFIX) {
            return Self::regex(expr);
        }
        if rule.contains(['*', '?', '[']) {
            return Self::glob(rule);
        }
        Ok(Self::exact(rule))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == name,
            Self::Glob(pattern) => pattern.matches(name),
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

/// A set of rules; an object is ignored when any rule matches
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules(Vec<IgnoreRule>);

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every textual rule with [`IgnoreRule::parse`]
    pub fn parse<I, S>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        rules
            .into_iter()
            .map(|r| IgnoreRule::parse(r.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn push(&mut self, rule: IgnoreRule) {
        self.0.push(rule);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|rule| rule.matches(name))
    }

    /// Drop ignored objects, keeping the listed order
    pub fn apply(&self, mut objects: Vec<ObjectInfo>) -> Vec<ObjectInfo> {
        if !self.is_empty() {
            objects.retain(|o| !self.matches(&o.key));
        }
        objects
    }
}

impl From<IgnoreRule> for IgnoreRules {
    fn from(rule: IgnoreRule) -> Self {
        Self(vec![rule])
    }
}

impl FromIterator<IgnoreRule> for IgnoreRules {
    fn from_iter<I: IntoIterator<Item = IgnoreRule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(objects: &[ObjectInfo]) -> Vec<&str> {
        objects.iter().map(|o| o.key.as_str()).collect()
    }

    fn listing() -> Vec<ObjectInfo> {
        ["a.txt", "b.txt", "c.txt", "logs/today.log", "logs/old.log.gz"]
            .into_iter()
            .map(|n| ObjectInfo::file(n, 1))
            .collect()
    }

    #[test]
    fn test_parse_kinds() {
        assert!(matches!(IgnoreRule::parse("b.txt").unwrap(), IgnoreRule::Exact(_)));
        assert!(matches!(IgnoreRule::parse("*.log").unwrap(), IgnoreRule::Glob(_)));
        assert!(matches!(
            IgnoreRule::parse(r"re:\.gz$").unwrap(),
            IgnoreRule::Regex(_)
        ));
        assert!(IgnoreRule::parse("re:(").is_err());
        assert!(IgnoreRule::parse("[").is_err());
    }

    #[test]
    fn test_no_rules_is_noop() {
        let kept = IgnoreRules::new().apply(listing());
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn test_single_exact() {
        let rules = IgnoreRules::from(IgnoreRule::exact("b.txt"));
        let kept = rules.apply(listing());
        assert_eq!(
            names(&kept),
            vec!["a.txt", "c.txt", "logs/today.log", "logs/old.log.gz"]
        );
    }

    #[test]
    fn test_exact_does_not_match_substring() {
        let rules = IgnoreRules::from(IgnoreRule::exact("a"));
        assert_eq!(rules.apply(listing()).len(), 5);
    }

    #[test]
    fn test_mixed_rules() {
        let rules = IgnoreRules::parse(["a.txt", "logs/*.log", r"re:\.gz$"]).unwrap();
        assert_eq!(rules.len(), 3);
        let kept = rules.apply(listing());
        assert_eq!(names(&kept), vec!["b.txt", "c.txt"]);
    }
}
