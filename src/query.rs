use std::cmp::Ordering;

use crate::models::{AlertPage, AlertRecord, Severity, Status};

/// Filter parameters for the alert list view. All filters are conjunctive;
/// an unset filter imposes no constraint.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// Exact match on the raw severity; alerts with no severity never match.
    pub severity: Option<Severity>,
    /// Exact match on the raw status; alerts with no status never match.
    pub status: Option<Status>,
    /// Case-insensitive substring match on `source`.
    pub source: Option<String>,
    /// Case-insensitive substring match across `message`, `type`, `source`.
    pub search: Option<String>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &AlertRecord) -> bool {
        if let Some(severity) = self.severity {
            if alert.severity != Some(severity) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if alert.status != Some(status) {
                return false;
            }
        }
        if let Some(ref source) = self.source {
            if !source.is_empty() {
                let needle = source.to_lowercase();
                match alert.source.as_deref() {
                    Some(s) if s.to_lowercase().contains(&needle) => {}
                    _ => return false,
                }
            }
        }
        if let Some(ref search) = self.search {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let hit = [
                    alert.message.as_deref(),
                    alert.alert_type.as_deref(),
                    alert.source.as_deref(),
                ]
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
                if !hit {
                    return false;
                }
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

/// Deterministic list order: newest event time first, alerts without a
/// parseable timestamp last, ties broken by ascending identity key. Keeps
/// pagination stable across pages on a static collection.
fn list_order(a: &AlertRecord, b: &AlertRecord) -> Ordering {
    match (a.event_time(), b.event_time()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.key().cmp(b.key()))
}

/// `total` counts every matching alert before the page window is cut.
pub fn query(alerts: &[AlertRecord], filter: &AlertFilter, page: &Pagination) -> AlertPage {
    let mut hits: Vec<&AlertRecord> = alerts.iter().filter(|a| filter.matches(a)).collect();
    hits.sort_by(|a, b| list_order(a, b));

    let total = hits.len();
    let items: Vec<AlertRecord> = hits
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect();

    AlertPage {
        total,
        limit: page.limit,
        offset: page.offset,
        items,
    }
}
