use std::fmt::Write;

use chrono::Utc;

use crate::chart;
use crate::models::{AdvancedAnalyticsSummary, PredictiveSummary, StatsSummary};

fn section_categorical(output: &mut String, title: &str, map: &std::collections::BTreeMap<String, u64>) {
    let _ = writeln!(output, "## {}", title);
    let entries = chart::categorical(map);
    if entries.is_empty() {
        let _ = writeln!(output, "No data recorded.");
    } else {
        for entry in &entries {
            let _ = writeln!(output, "- {}: {}", entry.label, entry.value);
        }
    }
    let _ = writeln!(output);
}

pub fn build_report(
    stats: &StatsSummary,
    advanced: &AdvancedAnalyticsSummary,
    predictive: &PredictiveSummary,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Cloud Security Alert Dashboard");
    let _ = writeln!(output, "Generated {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);
    let _ = writeln!(output, "Total alerts: {}", stats.total_alerts);
    let _ = writeln!(output);

    section_categorical(&mut output, "Alerts by Severity", &stats.by_severity);
    section_categorical(&mut output, "Alerts by Status", &stats.by_status);

    let _ = writeln!(output, "## Top Sources");
    let sources = chart::top_categories(&stats.by_source);
    if sources.is_empty() {
        let _ = writeln!(output, "No data recorded.");
    } else {
        for entry in &sources {
            if entry.label == entry.key {
                let _ = writeln!(output, "- {}: {}", entry.label, entry.value);
            } else {
                let _ = writeln!(output, "- {} ({}): {}", entry.label, entry.key, entry.value);
            }
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Timeline (last {} days observed)", chart::WINDOW_LONG_DAYS);
    let timeline = chart::recent_days(&stats.by_day, chart::WINDOW_LONG_DAYS);
    if timeline.is_empty() {
        let _ = writeln!(output, "No dated alerts recorded.");
    } else {
        for point in &timeline {
            let _ = writeln!(output, "- {}: {}", point.date, point.value as u64);
        }
    }
    let _ = writeln!(output);

    let threat = &advanced.threat_intelligence;
    let _ = writeln!(output, "## Threat Intelligence");
    let actors = chart::top_categories(&threat.top_threat_actors);
    if actors.is_empty() {
        let _ = writeln!(output, "No attributed threat actors.");
    } else {
        let _ = writeln!(output, "Top threat actors:");
        for entry in &actors {
            let _ = writeln!(output, "- {}: {}", entry.label, entry.value);
        }
    }
    let observed_stages: Vec<_> = threat
        .attack_chain_sequence
        .iter()
        .filter(|stage| stage.count > 0)
        .collect();
    if !observed_stages.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Attack chain progression:");
        for stage in observed_stages {
            let _ = writeln!(output, "- {}: {}", stage.stage, stage.count);
        }
    }
    let _ = writeln!(output);

    let risk = &advanced.risk_analysis;
    let _ = writeln!(output, "## Risk Analysis");
    let _ = writeln!(output, "Average risk score: {:.1}", risk.average_risk_score);
    let _ = writeln!(output, "Average confidence: {:.1}", risk.average_confidence);
    for (band, count) in chart::zero_filter(&risk.risk_distribution) {
        let _ = writeln!(output, "- {} risk: {}", chart::display_label(&band), count);
    }
    let exploitable: u64 = risk
        .exploitability_breakdown
        .iter()
        .filter(|(level, _)| level.as_str() != "none")
        .map(|(_, count)| count)
        .sum();
    let _ = writeln!(output, "Alerts with known exploitability: {}", exploitable);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Geographic Spread");
    let countries = chart::top_categories(&advanced.geographic.countries);
    if countries.is_empty() {
        let _ = writeln!(output, "No geolocated alerts.");
    } else {
        for entry in &countries {
            let _ = writeln!(output, "- {}: {}", entry.label, entry.value);
        }
        let _ = writeln!(
            output,
            "Mappable alert locations: {}",
            advanced.geographic.heatmap_data.len()
        );
    }
    let _ = writeln!(output);

    let compliance = &advanced.compliance;
    let _ = writeln!(output, "## Compliance");
    let standing = if compliance.compliance_score >= 80.0 {
        "good"
    } else if compliance.compliance_score >= 60.0 {
        "at risk"
    } else {
        "poor"
    };
    let _ = writeln!(
        output,
        "Compliance score: {:.1} ({})",
        compliance.compliance_score, standing
    );
    for (framework, count) in chart::zero_filter(&compliance.framework_violations) {
        let _ = writeln!(output, "- {}: {} violations", framework, count);
    }
    let _ = writeln!(output);

    let cost = &advanced.cost_impact;
    let _ = writeln!(output, "## Cost Impact");
    let _ = writeln!(output, "Estimated total cost: ${:.2}", cost.total_cost_usd);
    let _ = writeln!(output, "Total downtime: {:.0} minutes", cost.total_downtime_minutes);
    let _ = writeln!(output, "Total data loss: {:.0} MB", cost.total_data_loss_mb);
    if stats.total_alerts > 0 {
        let _ = writeln!(
            output,
            "Average cost per alert: ${:.2}",
            cost.total_cost_usd / stats.total_alerts as f64
        );
    }
    let _ = writeln!(output);

    let trend = &predictive.trend_analysis;
    let predictions = &predictive.predictions;
    let _ = writeln!(output, "## Forecast");
    let _ = writeln!(
        output,
        "Trend: {} ({:+.1}% vs prior window)",
        trend.direction.as_str(),
        trend.change_percentage
    );
    let _ = writeln!(
        output,
        "Predicted alerts next 7 days: {} ({} confidence)",
        predictions.predicted_alerts_next_7_days,
        predictions.confidence.as_str()
    );
    let recent = chart::recent_days(&predictive.daily_metrics.alerts, chart::WINDOW_SHORT_DAYS);
    if !recent.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Recent daily volume:");
        for point in &recent {
            let _ = writeln!(output, "- {}: {}", point.date, point.value as u64);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::compute_advanced;
    use crate::forecast::{daily_metrics, forecast};
    use crate::models::AlertRecord;
    use crate::stats::compute_stats;

    fn alert(json: serde_json::Value) -> AlertRecord {
        serde_json::from_value(json).unwrap()
    }

    fn sample_alerts() -> Vec<AlertRecord> {
        vec![
            alert(serde_json::json!({
                "id": "a-1",
                "severity": "critical",
                "status": "open",
                "source": "aws_guardduty",
                "timestamp": "2024-03-01T10:00:00Z",
                "threat_intelligence": {
                    "threat_actor": "APT29",
                    "attack_stage": "Exploitation"
                },
                "risk_analysis": {"risk_score": 91.0, "confidence": 0.9},
                "compliance": {"frameworks": ["SOC2"]},
                "cost_impact": {"estimated_cost_usd": 1200.0}
            })),
            alert(serde_json::json!({
                "id": "a-2",
                "severity": "low",
                "status": "closed",
                "source": "azure_sentinel",
                "timestamp": "2024-03-02T11:00:00Z"
            })),
        ]
    }

    #[test]
    fn report_has_all_sections() {
        let alerts = sample_alerts();
        let stats = compute_stats(&alerts);
        let advanced = compute_advanced(&alerts);
        let predictive = forecast(daily_metrics(&alerts));
        let report = build_report(&stats, &advanced, &predictive);

        for heading in [
            "# Cloud Security Alert Dashboard",
            "## Alerts by Severity",
            "## Alerts by Status",
            "## Top Sources",
            "## Timeline",
            "## Threat Intelligence",
            "## Risk Analysis",
            "## Geographic Spread",
            "## Compliance",
            "## Cost Impact",
            "## Forecast",
        ] {
            assert!(report.contains(heading), "missing {heading}");
        }
    }

    #[test]
    fn report_labels_are_display_formatted() {
        let alerts = sample_alerts();
        let stats = compute_stats(&alerts);
        let advanced = compute_advanced(&alerts);
        let predictive = forecast(daily_metrics(&alerts));
        let report = build_report(&stats, &advanced, &predictive);

        assert!(report.contains("Total alerts: 2"));
        assert!(report.contains("- Critical: 1"));
        assert!(report.contains("- APT29: 1"));
        assert!(report.contains("- Exploitation: 1"));
        assert!(report.contains("Compliance score: 50.0"));
        assert!(report.contains("Estimated total cost: $1200.00"));
        assert!(report.contains("Average cost per alert: $600.00"));
    }

    #[test]
    fn report_on_empty_collection_is_well_formed() {
        let alerts: Vec<AlertRecord> = Vec::new();
        let stats = compute_stats(&alerts);
        let advanced = compute_advanced(&alerts);
        let predictive = forecast(daily_metrics(&alerts));
        let report = build_report(&stats, &advanced, &predictive);

        assert!(report.contains("Total alerts: 0"));
        assert!(report.contains("No data recorded."));
        assert!(report.contains("No dated alerts recorded."));
        assert!(report.contains("Compliance score: 100.0"));
    }

    #[test]
    fn truncated_source_shows_full_key() {
        let mut alerts = sample_alerts();
        alerts.push(alert(serde_json::json!({
            "id": "a-3",
            "severity": "high",
            "status": "open",
            "source": "very_long_security_scanner_name",
            "timestamp": "2024-03-03T09:00:00Z"
        })));
        let stats = compute_stats(&alerts);
        let advanced = compute_advanced(&alerts);
        let predictive = forecast(daily_metrics(&alerts));
        let report = build_report(&stats, &advanced, &predictive);

        assert!(report.contains("... (very_long_security_scanner_name): 1"));
    }
}
