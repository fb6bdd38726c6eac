//! Decides which categories run and merges their results into one report

use crate::checks::{self, Backends, Category, CategoryResult, CheckResult, Report};
use crate::config::WatchmanConfig;
use std::time::Instant;
use tracing::{error, info, warn};

/// Request-level narrowing of the enabled checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckFilter {
    /// `None` when no `check` list was given. A given list restricts the
    /// run to its known names, so a list of only unknown names runs nothing.
    pub check: Option<Vec<Category>>,
    pub skip: Vec<Category>,
}

impl CheckFilter {
    /// Parses comma-separated category lists; unknown names are dropped.
    pub fn parse(check: Option<&str>, skip: Option<&str>) -> Self {
        Self {
            check: check.map(parse_categories),
            skip: skip.map(parse_categories).unwrap_or_default(),
        }
    }

    /// Narrows `enabled` down to what this filter allows, keeping its order.
    pub fn select(&self, enabled: &[Category]) -> Vec<Category> {
        enabled
            .iter()
            .copied()
            .filter(|category| self.check.as_ref().map_or(true, |check| check.contains(category)))
            .filter(|category| !self.skip.contains(category))
            .collect()
    }
}

fn parse_categories(list: &str) -> Vec<Category> {
    let mut categories = Vec::new();
    for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        match name.parse::<Category>() {
            Ok(category) if !categories.contains(&category) => categories.push(category),
            Ok(_) => {}
            Err(_) => warn!("Ignoring unknown check in request: {}", name),
        }
    }
    categories
}

pub struct CheckRegistry {
    backends: Backends,
    config: WatchmanConfig,
}

impl CheckRegistry {
    pub fn new(backends: Backends, config: WatchmanConfig) -> Self {
        Self { backends, config }
    }

    pub fn config(&self) -> &WatchmanConfig {
        &self.config
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn enabled(&self) -> Vec<Category> {
        self.config.enabled_categories()
    }

    pub async fn run_all(&self) -> Report {
        self.run(&CheckFilter::default()).await
    }

    pub async fn run(&self, filter: &CheckFilter) -> Report {
        let categories = filter.select(&self.enabled());
        info!("Running {} checks: {:?}", categories.len(), categories);

        let start = Instant::now();
        let mut report = Report::new();
        for category in categories {
            report.merge(self.run_category(category).await);
        }

        if report.has_errors() {
            warn!("Checks completed with errors in {:?}", start.elapsed());
        } else {
            info!("All checks passed in {:?}", start.elapsed());
        }
        report
    }

    pub async fn run_category(&self, category: Category) -> Report {
        match category {
            Category::Caches => checks::caches(&self.backends, &self.config).await,
            Category::Databases => checks::databases(&self.backends, &self.config).await,
            Category::Email => checks::email(&self.backends, &self.config).await,
            Category::Storage => match checks::storage(&self.backends, &self.config).await {
                Ok(report) => report,
                Err(e) => {
                    // Reported in place so the other categories still show up.
                    error!("Storage check refused to run: {}", e);
                    Report::single(
                        Category::Storage,
                        CategoryResult::Single(CheckResult::error(e.to_string())),
                    )
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse() {
        let filter = CheckFilter::parse(Some("caches, storage,queues,caches"), Some("email"));
        assert_eq!(filter.check, Some(vec![Category::Caches, Category::Storage]));
        assert_eq!(filter.skip, vec![Category::Email]);

        assert_eq!(CheckFilter::parse(None, Some("")), CheckFilter::default());
    }

    #[test]
    fn test_filter_select() {
        let enabled = [Category::Caches, Category::Databases, Category::Storage];

        assert_eq!(CheckFilter::default().select(&enabled), enabled.to_vec());

        let only = CheckFilter::parse(Some("storage,email"), None);
        assert_eq!(only.select(&enabled), vec![Category::Storage]);

        let skip = CheckFilter::parse(None, Some("databases"));
        assert_eq!(skip.select(&enabled), vec![Category::Caches, Category::Storage]);

        let both = CheckFilter::parse(Some("caches,databases"), Some("caches"));
        assert_eq!(both.select(&enabled), vec![Category::Databases]);
    }

    #[test]
    fn test_filter_with_only_unknown_checks_selects_nothing() {
        let enabled = [Category::Caches, Category::Databases, Category::Storage];

        let unknown = CheckFilter::parse(Some("queues"), None);
        assert_eq!(unknown.check, Some(Vec::new()));
        assert!(unknown.select(&enabled).is_empty());

        let blank = CheckFilter::parse(Some(""), None);
        assert!(blank.select(&enabled).is_empty());
    }

    #[tokio::test]
    async fn test_run_with_unknown_check_returns_empty_report() {
        let registry = CheckRegistry::new(Backends::default(), WatchmanConfig::default());

        let report = registry.run(&CheckFilter::parse(Some("queues"), None)).await;

        assert!(report.is_empty());
        assert!(!report.has_errors());
    }
}
