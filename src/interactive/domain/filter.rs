use super::models::{LevelFilter, SignalType, SortOrder};
use crate::backend::{FieldFilter, Lookback, Polarity, QueryScope};

/// Everything that narrows what the backend returns.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterState {
    pub query: String,
    pub level: LevelFilter,
    pub field_filters: Vec<FieldFilter>,
    pub lookback: Lookback,
    pub sort: SortOrder,
    pub index: String,
    /// Traces drill-down target.
    pub transaction: Option<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            level: LevelFilter::All,
            field_filters: Vec::new(),
            lookback: Lookback::default(),
            sort: SortOrder::NewestFirst,
            index: String::new(),
            transaction: None,
        }
    }
}

impl FilterState {
    pub fn scope(&self, signal: SignalType) -> QueryScope {
        QueryScope {
            index: self.index.clone(),
            signal,
            query: self.query.clone(),
            min_level: self.level.min_level(),
            filters: self.field_filters.clone(),
            lookback: self.lookback,
        }
    }

    /// Add `filter`, replacing any filter on the same field and value.
    /// Returns false when an identical filter was already present.
    pub fn add_field_filter(&mut self, filter: FieldFilter) -> bool {
        if self.field_filters.contains(&filter) {
            return false;
        }
        self.field_filters
            .retain(|f| !(f.field == filter.field && f.value == filter.value));
        self.field_filters.push(filter);
        true
    }

    pub fn clear_field_filters(&mut self) -> bool {
        let had_any = !self.field_filters.is_empty();
        self.field_filters.clear();
        had_any
    }

    /// One-line summary for the header.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("index={}", if self.index.is_empty() { "-" } else { &self.index }),
            format!("last {}", self.lookback),
            format!("level {}", self.level.label()),
            self.sort.label().to_string(),
        ];
        if !self.query.trim().is_empty() {
            parts.push(format!("q=\"{}\"", self.query));
        }
        for filter in &self.field_filters {
            let sign = match filter.polarity {
                Polarity::Include => '+',
                Polarity::Exclude => '-',
            };
            parts.push(format!("{sign}{}:{}", filter.field, filter.value));
        }
        if let Some(transaction) = &self.transaction {
            parts.push(format!("txn={transaction}"));
        }
        parts.join("  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_carries_filters() {
        let filters = FilterState {
            query: "timeout".into(),
            level: LevelFilter::Warn,
            index: "logs-*".into(),
            ..FilterState::default()
        };
        let scope = filters.scope(SignalType::Logs);
        assert_eq!(scope.index, "logs-*");
        assert_eq!(scope.query, "timeout");
        assert_eq!(scope.min_level, LevelFilter::Warn.min_level());
    }

    #[test]
    fn test_field_filter_replaces_opposite_polarity() {
        let mut filters = FilterState::default();
        assert!(filters.add_field_filter(FieldFilter::include("service", "api")));
        assert!(!filters.add_field_filter(FieldFilter::include("service", "api")));
        assert!(filters.add_field_filter(FieldFilter::exclude("service", "api")));
        assert_eq!(filters.field_filters, vec![FieldFilter::exclude("service", "api")]);
        assert!(filters.clear_field_filters());
        assert!(!filters.clear_field_filters());
    }

    #[test]
    fn test_summary_mentions_active_filters() {
        let mut filters = FilterState {
            query: "boom".into(),
            transaction: Some("GET /orders".into()),
            ..FilterState::default()
        };
        filters.add_field_filter(FieldFilter::exclude("service", "healthcheck"));
        let summary = filters.summary();
        assert!(summary.contains("q=\"boom\""));
        assert!(summary.contains("-service:healthcheck"));
        assert!(summary.contains("txn=GET /orders"));
        assert!(summary.contains("last 15m"));
    }
}
