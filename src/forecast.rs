use std::collections::BTreeMap;

use crate::models::{
    AlertRecord, DailyMetrics, ForecastConfidence, Predictions, PredictiveSummary, TrendAnalysis,
    TrendDirection,
};

/// Trailing window compared against the preceding window of equal length.
pub const FORECAST_WINDOW_DAYS: usize = 7;
/// Relative change (percent) below which the trend reads as stable.
pub const TREND_THRESHOLD_PCT: f64 = 5.0;
/// Coefficient of variation of the recent window at or under which the
/// prediction is reported with high confidence.
pub const CONFIDENCE_CV_MAX: f64 = 0.3;

/// Alert counts, per-day average risk score (days without any scored alert
/// stay absent), and per-day summed cost. Gaps are never filled.
pub fn daily_metrics(alerts: &[AlertRecord]) -> DailyMetrics {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut risk: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    let mut cost: BTreeMap<String, f64> = BTreeMap::new();

    for alert in alerts {
        let Some(day) = alert.event_date() else {
            continue;
        };
        let key = day.format("%Y-%m-%d").to_string();
        *counts.entry(key.clone()).or_insert(0) += 1;

        if let Some(score) = alert.risk_analysis.as_ref().and_then(|r| r.risk_score) {
            let entry = risk.entry(key.clone()).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
        let spend = alert
            .cost_impact
            .as_ref()
            .and_then(|c| c.estimated_cost_usd)
            .unwrap_or(0.0);
        *cost.entry(key).or_insert(0.0) += spend;
    }

    DailyMetrics {
        alerts: counts,
        average_risk: risk
            .into_iter()
            .map(|(day, (sum, n))| (day, sum / n as f64))
            .collect(),
        cost,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Computed fresh on every call; no clock, no cached model. The input
/// series is re-exported verbatim.
pub fn forecast(daily: DailyMetrics) -> PredictiveSummary {
    // ISO date keys make the BTreeMap iteration chronological.
    let counts: Vec<f64> = daily.alerts.values().map(|c| *c as f64).collect();

    let window = FORECAST_WINDOW_DAYS.min(counts.len());
    let (older, recent) = counts.split_at(counts.len() - window);
    let prior = &older[older.len().saturating_sub(window)..];

    let recent_mean = mean(recent);
    let prior_mean = mean(prior);

    // Degenerate prior (empty or all-zero) reports 0% rather than dividing.
    let change_percentage = if prior_mean == 0.0 {
        0.0
    } else {
        (recent_mean - prior_mean) / prior_mean * 100.0
    };

    let direction = if change_percentage > TREND_THRESHOLD_PCT {
        TrendDirection::Increasing
    } else if change_percentage < -TREND_THRESHOLD_PCT {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    let confidence = if recent_mean > 0.0 && std_dev(recent) / recent_mean <= CONFIDENCE_CV_MAX {
        ForecastConfidence::High
    } else {
        ForecastConfidence::Low
    };

    PredictiveSummary {
        trend_analysis: TrendAnalysis {
            direction,
            change_percentage,
            recent_daily_average: recent_mean,
            prior_daily_average: prior_mean,
        },
        predictions: Predictions {
            predicted_daily_average: recent_mean,
            predicted_alerts_next_7_days: (recent_mean * 7.0).round() as u64,
            confidence,
        },
        daily_metrics: daily,
    }
}
