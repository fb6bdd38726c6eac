//! Outcome types produced by probes and merged into a report

use crate::error::WatchmanError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Outcome of a single probe execution.
///
/// Serialized as `{"ok": true}` or `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CheckResultWire", from = "CheckResultWire")]
pub enum CheckResult {
    Ok,
    Error(String),
}

impl CheckResult {
    /// Builds an error outcome; an empty message is replaced so the
    /// serialized `"error"` field is never blank.
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            CheckResult::Error("check failed".to_string())
        } else {
            CheckResult::Error(message)
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CheckResult::Ok)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            CheckResult::Ok => None,
            CheckResult::Error(message) => Some(message),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CheckResultWire {
    Ok { ok: bool },
    Error { error: String },
}

impl From<CheckResult> for CheckResultWire {
    fn from(result: CheckResult) -> Self {
        match result {
            CheckResult::Ok => CheckResultWire::Ok { ok: true },
            CheckResult::Error(error) => CheckResultWire::Error { error },
        }
    }
}

impl From<CheckResultWire> for CheckResult {
    fn from(wire: CheckResultWire) -> Self {
        match wire {
            CheckResultWire::Ok { ok: true } => CheckResult::Ok,
            CheckResultWire::Ok { ok: false } => CheckResult::error("check reported not ok"),
            CheckResultWire::Error { error } => CheckResult::error(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedResult {
    pub name: String,
    pub result: CheckResult,
}

impl NamedResult {
    pub fn new(name: impl Into<String>, result: CheckResult) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

/// Result of one category: a singleton check or one entry per configured instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CategoryResultWire", from = "CategoryResultWire")]
pub enum CategoryResult {
    Single(CheckResult),
    Instances(Vec<NamedResult>),
}

impl CategoryResult {
    /// Sorts entries by name and drops repeated names, keeping the first.
    pub fn instances(mut entries: Vec<NamedResult>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.dedup_by(|later, earlier| later.name == earlier.name);
        CategoryResult::Instances(entries)
    }

    pub fn has_errors(&self) -> bool {
        match self {
            CategoryResult::Single(result) => !result.is_ok(),
            CategoryResult::Instances(entries) => entries.iter().any(|entry| !entry.result.is_ok()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        match self {
            CategoryResult::Single(_) => None,
            CategoryResult::Instances(entries) => entries
                .iter()
                .find(|entry| entry.name == name)
                .map(|entry| &entry.result),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CategoryResultWire {
    Single(CheckResult),
    Instances(Vec<BTreeMap<String, CheckResult>>),
}

impl From<CategoryResult> for CategoryResultWire {
    fn from(result: CategoryResult) -> Self {
        match result {
            CategoryResult::Single(result) => CategoryResultWire::Single(result),
            CategoryResult::Instances(entries) => CategoryResultWire::Instances(
                entries
                    .into_iter()
                    .map(|entry| BTreeMap::from([(entry.name, entry.result)]))
                    .collect(),
            ),
        }
    }
}

impl From<CategoryResultWire> for CategoryResult {
    fn from(wire: CategoryResultWire) -> Self {
        match wire {
            CategoryResultWire::Single(result) => CategoryResult::Single(result),
            CategoryResultWire::Instances(entries) => CategoryResult::instances(
                entries
                    .into_iter()
                    .flatten()
                    .map(|(name, result)| NamedResult::new(name, result))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Caches,
    Databases,
    Email,
    Storage,
}

impl Category {
    /// Checks enabled when nothing else is configured.
    pub const DEFAULTS: &'static [Category] =
        &[Category::Caches, Category::Databases, Category::Storage];

    /// Checks that cost something to run (a real message is sent).
    pub const PAID: &'static [Category] = &[Category::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Caches => "caches",
            Category::Databases => "databases",
            Category::Email => "email",
            Category::Storage => "storage",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = WatchmanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caches" => Ok(Category::Caches),
            "databases" => Ok(Category::Databases),
            "email" => Ok(Category::Email),
            "storage" => Ok(Category::Storage),
            other => Err(WatchmanError::Config(format!("Unknown check: {}", other))),
        }
    }
}

/// Mapping from category name to its result, built fresh for every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(BTreeMap<String, CategoryResult>);

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(category: Category, result: CategoryResult) -> Self {
        let mut report = Self::new();
        report.insert(category, result);
        report
    }

    pub fn insert(&mut self, category: Category, result: CategoryResult) {
        self.0.insert(category.as_str().to_string(), result);
    }

    pub fn merge(&mut self, other: Report) {
        self.0.extend(other.0);
    }

    pub fn get(&self, category: Category) -> Option<&CategoryResult> {
        self.0.get(category.as_str())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when any probe anywhere in the report failed.
    pub fn has_errors(&self) -> bool {
        self.0.values().any(CategoryResult::has_errors)
    }
}
