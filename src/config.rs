//! Filter configuration: which resources are in scope for deletion
//!
//! The filter document maps a resource type name to a rule of id patterns
//! and tag patterns. An absent type is out of scope entirely; a present but
//! empty rule selects every resource of that type.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

/// Fatal configuration errors. Nothing destructive runs after one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read filter config {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Covers malformed YAML and invalid regex patterns alike: patterns are
    /// compiled during deserialization, so a bad pattern fails the load.
    #[error("Invalid filter config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Per-type selection rule.
///
/// A rule with no id patterns and no tag patterns matches every resource of
/// its type. Otherwise the rule matches if ANY id pattern matches the
/// resource id, or ANY tag pattern's key is present with a matching value.
/// Id and tag patterns are alternatives, never a conjunction.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRule {
    #[serde(default, deserialize_with = "regex_vec")]
    pub ids: Vec<Regex>,
    #[serde(default, deserialize_with = "regex_map")]
    pub tags: HashMap<String, Regex>,
}

impl FilterRule {
    fn is_match_all(&self) -> bool {
        self.ids.is_empty() && self.tags.is_empty()
    }

    fn matches(&self, id: &str, tags: &HashMap<String, String>) -> bool {
        if self.is_match_all() {
            return true;
        }
        if self.ids.iter().any(|re| re.is_match(id)) {
            return true;
        }
        self.tags
            .iter()
            .any(|(key, re)| tags.get(key).is_some_and(|value| re.is_match(value)))
    }
}

/// The parsed filter document, immutable after load.
///
/// Keyed by terraform-style type name (e.g. `aws_vpc`). A BTreeMap keeps
/// iteration deterministic for serialization and reporting.
#[derive(Debug, Default)]
pub struct FilterConfig {
    rules: BTreeMap<String, FilterRule>,
}

impl<'de> Deserialize<'de> for FilterConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A bare `aws_vpc:` entry deserializes as null; that is the
        // empty-but-present (match-all) form.
        let raw = BTreeMap::<String, Option<FilterRule>>::deserialize(deserializer)?;
        Ok(Self {
            rules: raw
                .into_iter()
                .map(|(key, rule)| (key, rule.unwrap_or_default()))
                .collect(),
        })
    }
}

impl FilterConfig {
    /// Parse a YAML filter document. Invalid regex patterns fail here, not
    /// at match time.
    pub fn from_yaml(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(document)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&document)
    }

    /// A config with an empty (match-all) rule for each given type. Used by
    /// the wipe-all command.
    pub fn match_all(resource_types: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            rules: resource_types
                .into_iter()
                .map(|t| (t.to_string(), FilterRule::default()))
                .collect(),
        }
    }

    /// Whether a resource is in scope for deletion.
    ///
    /// Types without a registered rule are never in scope.
    pub fn matches(&self, resource_type: &str, id: &str, tags: &HashMap<String, String>) -> bool {
        match self.rules.get(resource_type) {
            Some(rule) => rule.matches(id, tags),
            None => false,
        }
    }

    /// Types the document mentions, in document key order.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

fn compile<E: serde::de::Error>(pattern: &str) -> Result<Regex, E> {
    Regex::new(pattern).map_err(|err| {
        E::invalid_value(
            serde::de::Unexpected::Str(pattern),
            &format!("a valid regex: {err}").as_str(),
        )
    })
}

fn regex_vec<'de, D>(deserializer: D) -> Result<Vec<Regex>, D::Error>
where
    D: Deserializer<'de>,
{
    let patterns = Vec::<String>::deserialize(deserializer)?;
    patterns.iter().map(|p| compile(p)).collect()
}

fn regex_map<'de, D>(deserializer: D) -> Result<HashMap<String, Regex>, D::Error>
where
    D: Deserializer<'de>,
{
    let patterns = HashMap::<String, String>::deserialize(deserializer)?;
    patterns
        .into_iter()
        .map(|(key, p)| Ok((key, compile(&p)?)))
        .collect()
}
