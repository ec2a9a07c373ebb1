use std::collections::BTreeMap;

use chrono::NaiveDate;

pub const TOP_N: usize = 10;
pub const LABEL_MAX: usize = 15;
pub const WINDOW_LONG_DAYS: usize = 30;
pub const WINDOW_SHORT_DAYS: usize = 14;

/// `key` is the untouched underlying category key; `label` is
/// presentation-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEntry {
    pub key: String,
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Capitalize the first letter and replace underscores with spaces.
pub fn display_label(raw: &str) -> String {
    let spaced = raw.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

/// Truncate to the first `LABEL_MAX` characters plus an ellipsis marker.
pub fn truncate_label(raw: &str) -> String {
    if raw.chars().count() > LABEL_MAX {
        let head: String = raw.chars().take(LABEL_MAX).collect();
        format!("{head}...")
    } else {
        raw.to_string()
    }
}

pub fn zero_filter(map: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    map.iter()
        .filter(|(_, count)| **count > 0)
        .map(|(key, count)| (key.clone(), *count))
        .collect()
}

pub fn categorical(map: &BTreeMap<String, u64>) -> Vec<ChartEntry> {
    zero_filter(map)
        .into_iter()
        .map(|(key, value)| ChartEntry {
            label: display_label(&key),
            key,
            value,
        })
        .collect()
}

/// Stable sort, so ties keep their incoming order and the result is
/// deterministic.
pub fn top_n(mut entries: Vec<ChartEntry>, n: usize) -> Vec<ChartEntry> {
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries.truncate(n);
    entries
}

/// Truncated display label with the full key retained, descending by
/// count, first `TOP_N`.
pub fn top_categories(map: &BTreeMap<String, u64>) -> Vec<ChartEntry> {
    let entries = zero_filter(map)
        .into_iter()
        .map(|(key, value)| ChartEntry {
            label: truncate_label(&key),
            key,
            value,
        })
        .collect();
    top_n(entries, TOP_N)
}

/// Ascending by the parsed date, keeping only the most recent `keep`
/// entries; unparseable keys are dropped.
pub fn recent_days(series: &BTreeMap<String, u64>, keep: usize) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = series
        .iter()
        .filter_map(|(day, count)| {
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .ok()
                .map(|date| SeriesPoint {
                    date,
                    value: *count as f64,
                })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    if points.len() > keep {
        points.drain(..points.len() - keep);
    }
    points
}
