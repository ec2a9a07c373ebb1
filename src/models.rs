use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "unknown severity {other:?}; expected low|medium|high|critical"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Closed,
    Resolved,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Closed => "closed",
            Status::Resolved => "resolved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Status::Open),
            "in_progress" => Ok(Status::InProgress),
            "closed" => Ok(Status::Closed),
            "resolved" => Ok(Status::Resolved),
            other => Err(format!(
                "unknown status {other:?}; expected open|in_progress|closed|resolved"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatIntel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_actor_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ioc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ioc_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskSignals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploitability: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceInfo {
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_classification: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostImpact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downtime_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_loss_mb: Option<f64>,
}

/// One security alert. Every field is optional at the boundary; defaults
/// are applied only through `effective_severity` / `effective_status`.
/// Unrecognized top-level keys land in `extra` and round-trip verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_intelligence: Option<ThreatIntel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<RiskSignals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_impact: Option<CostImpact>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AlertRecord {
    /// Stable identity: first of `id`, `alert_id`, `uuid`, else `"unknown"`.
    pub fn key(&self) -> &str {
        self.id
            .as_deref()
            .or(self.alert_id.as_deref())
            .or(self.uuid.as_deref())
            .unwrap_or("unknown")
    }

    /// The only place the `low` default exists.
    pub fn effective_severity(&self) -> Severity {
        self.severity.unwrap_or(Severity::Low)
    }

    pub fn effective_status(&self) -> Status {
        self.status.unwrap_or(Status::Open)
    }

    /// `timestamp`, falling back to `time`.
    pub fn raw_timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref().or(self.time.as_deref())
    }

    /// Calendar date encoded in the timestamp string itself, not a
    /// local-time reinterpretation.
    pub fn event_date(&self) -> Option<NaiveDate> {
        self.raw_timestamp().and_then(parse_event_date)
    }

    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        self.raw_timestamp().and_then(parse_event_time)
    }

    /// Hour-of-day as encoded in the timestamp; bare dates carry none.
    pub fn event_hour(&self) -> Option<u32> {
        let raw = self.raw_timestamp()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.hour());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|dt| dt.hour())
    }
}

/// Parse the date component out of an ISO-8601 string, keeping the encoded
/// date (offsets are not normalized away). Accepts full RFC 3339, a naive
/// date-time, or a bare `YYYY-MM-DD`.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Parse a full instant for ordering; bare dates sort at midnight UTC.
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub items: Vec<AlertRecord>,
}

/// Mapping keys are wire labels; missing dimension values are omitted,
/// never bucketed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_alerts: u64,
    pub by_severity: BTreeMap<String, u64>,
    pub by_status: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
    pub by_day: BTreeMap<String, u64>,
}

/// Sequence order is the canonical chain, not observed frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatIntelligenceSummary {
    pub top_threat_actors: BTreeMap<String, u64>,
    pub threat_actor_countries: BTreeMap<String, u64>,
    pub attack_stages: BTreeMap<String, u64>,
    pub ioc_types: BTreeMap<String, u64>,
    pub attack_chain_sequence: Vec<StageCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysisSummary {
    pub average_risk_score: f64,
    pub average_confidence: f64,
    pub risk_distribution: BTreeMap<String, u64>,
    pub risk_by_severity: BTreeMap<String, f64>,
    pub exploitability_breakdown: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub lat: f64,
    pub lon: f64,
    pub severity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeographicSummary {
    pub countries: BTreeMap<String, u64>,
    pub regions: BTreeMap<String, u64>,
    pub heatmap_data: Vec<HeatmapPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub framework_violations: BTreeMap<String, u64>,
    pub data_classifications: BTreeMap<String, u64>,
    /// 0-100; 100 x (alerts with zero violations / total alerts).
    pub compliance_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostImpactSummary {
    pub total_cost_usd: f64,
    pub total_downtime_minutes: f64,
    pub total_data_loss_mb: f64,
    pub cost_by_severity: BTreeMap<String, f64>,
    pub downtime_by_severity: BTreeMap<String, f64>,
    pub data_loss_by_severity: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimePatternsSummary {
    pub by_hour: BTreeMap<u32, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedAnalyticsSummary {
    pub threat_intelligence: ThreatIntelligenceSummary,
    pub risk_analysis: RiskAnalysisSummary,
    pub geographic: GeographicSummary,
    pub compliance: ComplianceSummary,
    pub cost_impact: CostImpactSummary,
    pub time_patterns: TimePatternsSummary,
}

/// Day-keyed series (ISO date keys). Missing days stay absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub alerts: BTreeMap<String, u64>,
    pub average_risk: BTreeMap<String, f64>,
    pub cost: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastConfidence {
    High,
    Low,
}

impl ForecastConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastConfidence::High => "high",
            ForecastConfidence::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    pub change_percentage: f64,
    pub recent_daily_average: f64,
    pub prior_daily_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub predicted_daily_average: f64,
    pub predicted_alerts_next_7_days: u64,
    pub confidence: ForecastConfidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveSummary {
    pub trend_analysis: TrendAnalysis,
    pub predictions: Predictions,
    pub daily_metrics: DailyMetrics,
}
