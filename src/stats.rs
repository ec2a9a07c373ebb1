use crate::models::{AlertRecord, StatsSummary};

/// Compute the overview counts in a single pass. `total_alerts` counts every
/// record; each grouping counts only records that carry a value for that
/// dimension, so the per-group sums are not guaranteed to reach the total.
pub fn compute_stats(alerts: &[AlertRecord]) -> StatsSummary {
    let mut summary = StatsSummary {
        total_alerts: alerts.len() as u64,
        ..StatsSummary::default()
    };

    for alert in alerts {
        if let Some(severity) = alert.severity {
            *summary
                .by_severity
                .entry(severity.as_str().to_string())
                .or_insert(0) += 1;
        }
        if let Some(status) = alert.status {
            *summary
                .by_status
                .entry(status.as_str().to_string())
                .or_insert(0) += 1;
        }
        if let Some(ref source) = alert.source {
            *summary.by_source.entry(source.clone()).or_insert(0) += 1;
        }
        if let Some(day) = alert.event_date() {
            *summary
                .by_day
                .entry(day.format("%Y-%m-%d").to_string())
                .or_insert(0) += 1;
        }
    }

    summary
}
