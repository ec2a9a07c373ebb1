use std::collections::BTreeMap;

use crate::models::{
    AdvancedAnalyticsSummary, AlertRecord, ComplianceSummary, CostImpactSummary,
    GeographicSummary, HeatmapPoint, RiskAnalysisSummary, StageCount, ThreatIntelligenceSummary,
    TimePatternsSummary,
};

/// Canonical kill-chain ordering for `attack_chain_sequence`. Charts render
/// this left to right regardless of observed frequency.
pub const KILL_CHAIN: [&str; 7] = [
    "Reconnaissance",
    "Weaponization",
    "Delivery",
    "Exploitation",
    "Installation",
    "CommandControl",
    "ActionsOnObjectives",
];

/// Risk band thresholds (score > threshold). Pinned by tests.
pub const RISK_BAND_CRITICAL: f64 = 80.0;
pub const RISK_BAND_HIGH: f64 = 60.0;
pub const RISK_BAND_MEDIUM: f64 = 40.0;

fn risk_band(score: f64) -> &'static str {
    if score > RISK_BAND_CRITICAL {
        "critical"
    } else if score > RISK_BAND_HIGH {
        "high"
    } else if score > RISK_BAND_MEDIUM {
        "medium"
    } else {
        "low"
    }
}

/// Records missing an extension are skipped by the reductions that read
/// it; nothing here can fail.
pub fn compute_advanced(alerts: &[AlertRecord]) -> AdvancedAnalyticsSummary {
    AdvancedAnalyticsSummary {
        threat_intelligence: threat_intelligence(alerts),
        risk_analysis: risk_analysis(alerts),
        geographic: geographic(alerts),
        compliance: compliance(alerts),
        cost_impact: cost_impact(alerts),
        time_patterns: time_patterns(alerts),
    }
}

pub fn threat_intelligence(alerts: &[AlertRecord]) -> ThreatIntelligenceSummary {
    let mut summary = ThreatIntelligenceSummary::default();
    let mut chain: BTreeMap<&str, u64> = KILL_CHAIN.iter().map(|s| (*s, 0)).collect();

    for alert in alerts {
        let Some(ref intel) = alert.threat_intelligence else {
            continue;
        };
        if let Some(ref actor) = intel.threat_actor {
            *summary.top_threat_actors.entry(actor.clone()).or_insert(0) += 1;
        }
        if let Some(ref country) = intel.threat_actor_country {
            *summary
                .threat_actor_countries
                .entry(country.clone())
                .or_insert(0) += 1;
        }
        if let Some(ref stage) = intel.attack_stage {
            *summary.attack_stages.entry(stage.clone()).or_insert(0) += 1;
            if let Some(count) = chain.get_mut(stage.as_str()) {
                *count += 1;
            }
        }
        if let Some(ref ioc) = intel.ioc_type {
            *summary.ioc_types.entry(ioc.clone()).or_insert(0) += 1;
        }
    }

    summary.attack_chain_sequence = KILL_CHAIN
        .iter()
        .map(|stage| StageCount {
            stage: (*stage).to_string(),
            count: chain[stage],
        })
        .collect();
    summary
}

pub fn risk_analysis(alerts: &[AlertRecord]) -> RiskAnalysisSummary {
    let mut summary = RiskAnalysisSummary::default();
    let mut risk_sum = 0.0;
    let mut risk_count = 0u64;
    let mut confidence_sum = 0.0;
    let mut confidence_count = 0u64;
    let mut by_severity: BTreeMap<String, (f64, u64)> = BTreeMap::new();

    for alert in alerts {
        let signals = alert.risk_analysis.as_ref();

        // Absent scores are excluded from both numerator and denominator.
        if let Some(score) = signals.and_then(|r| r.risk_score) {
            risk_sum += score;
            risk_count += 1;
            *summary
                .risk_distribution
                .entry(risk_band(score).to_string())
                .or_insert(0) += 1;
            let entry = by_severity
                .entry(alert.effective_severity().as_str().to_string())
                .or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
        if let Some(confidence) = signals.and_then(|r| r.confidence) {
            confidence_sum += confidence;
            confidence_count += 1;
        }

        // Absent or negative exploitability signal is tracked as "none":
        // consumers subtract it to report exploitable counts.
        let exploitability = signals
            .and_then(|r| r.exploitability.as_deref())
            .unwrap_or("none");
        *summary
            .exploitability_breakdown
            .entry(exploitability.to_string())
            .or_insert(0) += 1;
    }

    if risk_count > 0 {
        summary.average_risk_score = risk_sum / risk_count as f64;
    }
    if confidence_count > 0 {
        summary.average_confidence = confidence_sum / confidence_count as f64;
    }
    summary.risk_by_severity = by_severity
        .into_iter()
        .map(|(severity, (sum, count))| (severity, sum / count as f64))
        .collect();
    summary
}

pub fn geographic(alerts: &[AlertRecord]) -> GeographicSummary {
    let mut summary = GeographicSummary::default();

    for alert in alerts {
        let Some(ref resource) = alert.resource else {
            continue;
        };
        if let Some(ref country) = resource.country {
            *summary.countries.entry(country.clone()).or_insert(0) += 1;
        }
        if let Some(ref region) = resource.region {
            *summary.regions.entry(region.clone()).or_insert(0) += 1;
        }
        // One point per alert carrying coordinates; clustering is a
        // presentation concern.
        if let (Some(lat), Some(lon)) = (resource.latitude, resource.longitude) {
            summary.heatmap_data.push(HeatmapPoint {
                lat,
                lon,
                severity: alert.effective_severity().as_str().to_string(),
            });
        }
    }

    summary
}

pub fn compliance(alerts: &[AlertRecord]) -> ComplianceSummary {
    let mut summary = ComplianceSummary::default();
    let mut clean = 0u64;

    for alert in alerts {
        match alert.compliance {
            Some(ref info) if !info.frameworks.is_empty() => {
                for framework in &info.frameworks {
                    *summary
                        .framework_violations
                        .entry(framework.clone())
                        .or_insert(0) += 1;
                }
            }
            _ => clean += 1,
        }
        if let Some(ref label) = alert
            .compliance
            .as_ref()
            .and_then(|info| info.data_classification.clone())
        {
            *summary
                .data_classifications
                .entry(label.clone())
                .or_insert(0) += 1;
        }
    }

    // 100 x (alerts with zero violations / total); an empty collection has
    // nothing violating and scores 100.
    summary.compliance_score = if alerts.is_empty() {
        100.0
    } else {
        100.0 * clean as f64 / alerts.len() as f64
    };
    summary
}

pub fn cost_impact(alerts: &[AlertRecord]) -> CostImpactSummary {
    let mut summary = CostImpactSummary::default();

    for alert in alerts {
        let cost = alert.cost_impact.as_ref();
        // Missing cost fields contribute zero to the sums; the record still
        // counts toward totals elsewhere, so per-alert averages computed
        // downstream are diluted on purpose.
        let usd = cost.and_then(|c| c.estimated_cost_usd).unwrap_or(0.0);
        let downtime = cost.and_then(|c| c.downtime_minutes).unwrap_or(0.0);
        let data_loss = cost.and_then(|c| c.data_loss_mb).unwrap_or(0.0);

        summary.total_cost_usd += usd;
        summary.total_downtime_minutes += downtime;
        summary.total_data_loss_mb += data_loss;

        let severity = alert.effective_severity().as_str().to_string();
        *summary.cost_by_severity.entry(severity.clone()).or_insert(0.0) += usd;
        *summary
            .downtime_by_severity
            .entry(severity.clone())
            .or_insert(0.0) += downtime;
        *summary.data_loss_by_severity.entry(severity).or_insert(0.0) += data_loss;
    }

    summary
}

pub fn time_patterns(alerts: &[AlertRecord]) -> TimePatternsSummary {
    let mut summary = TimePatternsSummary::default();
    for alert in alerts {
        if let Some(hour) = alert.event_hour() {
            *summary.by_hour.entry(hour).or_insert(0) += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ComplianceInfo, CostImpact, ResourceInfo, RiskSignals, Severity, ThreatIntel,
    };

    fn risk_alert(score: Option<f64>, exploitability: Option<&str>) -> AlertRecord {
        AlertRecord {
            risk_analysis: Some(RiskSignals {
                risk_score: score,
                confidence: score.map(|s| s + 10.0),
                exploitability: exploitability.map(str::to_string),
            }),
            ..AlertRecord::default()
        }
    }

    #[test]
    fn average_risk_excludes_missing_scores() {
        let alerts = vec![
            risk_alert(Some(80.0), None),
            risk_alert(Some(40.0), None),
            risk_alert(None, None),
            AlertRecord::default(),
        ];
        let summary = risk_analysis(&alerts);
        // (80 + 40) / 2, never / 4.
        assert!((summary.average_risk_score - 60.0).abs() < 1e-9);
        assert!((summary.average_confidence - 75.0).abs() < 1e-9);
    }

    #[test]
    fn risk_bands_are_exclusive_at_thresholds() {
        let alerts = vec![
            risk_alert(Some(95.0), None),
            risk_alert(Some(80.0), None), // boundary: not critical
            risk_alert(Some(61.0), None),
            risk_alert(Some(40.0), None), // boundary: not medium
            risk_alert(Some(10.0), None),
        ];
        let summary = risk_analysis(&alerts);
        assert_eq!(summary.risk_distribution.get("critical"), Some(&1));
        assert_eq!(summary.risk_distribution.get("high"), Some(&2));
        assert_eq!(summary.risk_distribution.get("medium"), None);
        assert_eq!(summary.risk_distribution.get("low"), Some(&2));
    }

    #[test]
    fn exploitability_tracks_absent_signal_as_none() {
        let alerts = vec![
            risk_alert(Some(50.0), Some("high")),
            risk_alert(Some(50.0), None),
            AlertRecord::default(),
        ];
        let summary = risk_analysis(&alerts);
        assert_eq!(summary.exploitability_breakdown.get("high"), Some(&1));
        assert_eq!(summary.exploitability_breakdown.get("none"), Some(&2));
        let exploitable: u64 = summary
            .exploitability_breakdown
            .iter()
            .filter(|(k, _)| k.as_str() != "none")
            .map(|(_, v)| v)
            .sum();
        assert_eq!(exploitable, 1);
    }

    #[test]
    fn risk_by_severity_averages_per_effective_severity() {
        let mut a = risk_alert(Some(90.0), None);
        a.severity = Some(Severity::Critical);
        let mut b = risk_alert(Some(70.0), None);
        b.severity = Some(Severity::Critical);
        let c = risk_alert(Some(20.0), None); // no severity -> low

        let summary = risk_analysis(&[a, b, c]);
        assert!((summary.risk_by_severity["critical"] - 80.0).abs() < 1e-9);
        assert!((summary.risk_by_severity["low"] - 20.0).abs() < 1e-9);
    }

    fn intel_alert(actor: &str, stage: &str) -> AlertRecord {
        AlertRecord {
            threat_intelligence: Some(ThreatIntel {
                threat_actor: Some(actor.to_string()),
                threat_actor_country: Some("Unknown".to_string()),
                attack_stage: Some(stage.to_string()),
                ioc_type: Some("IP".to_string()),
                ioc_value: None,
            }),
            ..AlertRecord::default()
        }
    }

    #[test]
    fn attack_chain_keeps_canonical_order_with_zeros() {
        let alerts = vec![
            intel_alert("APT28", "Exploitation"),
            intel_alert("Lazarus", "Reconnaissance"),
            intel_alert("APT28", "Exploitation"),
        ];
        let summary = threat_intelligence(&alerts);
        let stages: Vec<&str> = summary
            .attack_chain_sequence
            .iter()
            .map(|s| s.stage.as_str())
            .collect();
        assert_eq!(stages, KILL_CHAIN.to_vec());
        assert_eq!(summary.attack_chain_sequence[0].count, 1); // Reconnaissance
        assert_eq!(summary.attack_chain_sequence[3].count, 2); // Exploitation
        assert_eq!(summary.attack_chain_sequence[6].count, 0);
        assert_eq!(summary.top_threat_actors.get("APT28"), Some(&2));
    }

    #[test]
    fn alerts_without_intel_are_skipped_without_error() {
        let alerts = vec![AlertRecord::default(), intel_alert("FIN7", "Delivery")];
        let summary = threat_intelligence(&alerts);
        assert_eq!(summary.top_threat_actors.len(), 1);
        assert_eq!(summary.ioc_types.get("IP"), Some(&1));
    }

    fn geo_alert(country: &str, lat: Option<f64>, lon: Option<f64>) -> AlertRecord {
        AlertRecord {
            severity: Some(Severity::High),
            resource: Some(ResourceInfo {
                country: Some(country.to_string()),
                region: Some("us-east-1".to_string()),
                latitude: lat,
                longitude: lon,
                ..ResourceInfo::default()
            }),
            ..AlertRecord::default()
        }
    }

    #[test]
    fn heatmap_gets_one_point_per_alert_with_coordinates() {
        let alerts = vec![
            geo_alert("USA", Some(39.8), Some(-98.6)),
            geo_alert("USA", Some(39.8), Some(-98.6)), // duplicate kept
            geo_alert("Japan", Some(35.7), None),      // missing lon: no point
        ];
        let summary = geographic(&alerts);
        assert_eq!(summary.heatmap_data.len(), 2);
        assert_eq!(summary.heatmap_data[0].severity, "high");
        assert_eq!(summary.countries.get("USA"), Some(&2));
        assert_eq!(summary.countries.get("Japan"), Some(&1));
        assert_eq!(summary.regions.get("us-east-1"), Some(&3));
    }

    fn compliance_alert(frameworks: &[&str]) -> AlertRecord {
        AlertRecord {
            compliance: Some(ComplianceInfo {
                frameworks: frameworks.iter().map(|s| s.to_string()).collect(),
                data_classification: Some("Confidential".to_string()),
            }),
            ..AlertRecord::default()
        }
    }

    #[test]
    fn compliance_score_is_clean_share_of_total() {
        let alerts = vec![
            compliance_alert(&["SOC2", "GDPR"]),
            compliance_alert(&[]),
            AlertRecord::default(),
            AlertRecord::default(),
        ];
        let summary = compliance(&alerts);
        // 3 of 4 carry zero violations.
        assert!((summary.compliance_score - 75.0).abs() < 1e-9);
        assert_eq!(summary.framework_violations.get("SOC2"), Some(&1));
        assert_eq!(summary.framework_violations.get("GDPR"), Some(&1));
        assert_eq!(summary.data_classifications.get("Confidential"), Some(&2));
    }

    #[test]
    fn empty_collection_scores_fully_compliant() {
        let summary = compliance(&[]);
        assert_eq!(summary.compliance_score, 100.0);
        assert!(summary.framework_violations.is_empty());
    }

    fn cost_alert(severity: Severity, usd: Option<f64>) -> AlertRecord {
        AlertRecord {
            severity: Some(severity),
            cost_impact: usd.map(|value| CostImpact {
                estimated_cost_usd: Some(value),
                downtime_minutes: Some(30.0),
                data_loss_mb: Some(100.0),
            }),
            ..AlertRecord::default()
        }
    }

    #[test]
    fn missing_cost_contributes_zero_without_excluding_the_alert() {
        let alerts = vec![
            cost_alert(Severity::Critical, Some(1000.0)),
            cost_alert(Severity::Critical, None),
            cost_alert(Severity::Low, Some(10.0)),
        ];
        let summary = cost_impact(&alerts);
        assert!((summary.total_cost_usd - 1010.0).abs() < 1e-9);
        assert!((summary.cost_by_severity["critical"] - 1000.0).abs() < 1e-9);
        assert!((summary.cost_by_severity["low"] - 10.0).abs() < 1e-9);
        // Downstream per-alert average divides by all three alerts.
        assert!((summary.total_cost_usd / alerts.len() as f64 - 336.666_666).abs() < 1e-3);
        assert!((summary.total_downtime_minutes - 60.0).abs() < 1e-9);
        assert!((summary.total_data_loss_mb - 200.0).abs() < 1e-9);
    }

    #[test]
    fn hour_buckets_use_the_encoded_hour() {
        let alerts = vec![
            AlertRecord {
                timestamp: Some("2024-06-01T23:59:00Z".to_string()),
                ..AlertRecord::default()
            },
            AlertRecord {
                timestamp: Some("2024-06-02T23:05:00+02:00".to_string()),
                ..AlertRecord::default()
            },
            AlertRecord {
                timestamp: Some("2024-06-02".to_string()),
                ..AlertRecord::default()
            },
        ];
        let summary = time_patterns(&alerts);
        assert_eq!(summary.by_hour.get(&23), Some(&2));
        assert_eq!(summary.by_hour.len(), 1);
    }

    #[test]
    fn compute_advanced_is_deterministic() {
        let alerts = vec![
            intel_alert("APT28", "Delivery"),
            risk_alert(Some(85.0), Some("critical")),
            geo_alert("Germany", Some(50.1), Some(8.7)),
            cost_alert(Severity::High, Some(250.0)),
        ];
        let a = compute_advanced(&alerts);
        let b = compute_advanced(&alerts);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
