use std::io::BufRead;

use anyhow::Context;
use serde::Deserialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{AlertRecord, Severity, Status};

/// Create the schema. Scalar columns shadow the identity/classification
/// fields for indexing; the authoritative record is the `raw` payload,
/// which round-trips extension fields verbatim.
pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("CREATE SCHEMA IF NOT EXISTS cloud_alerts")
        .execute(pool)
        .await
        .context("failed to create schema")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cloud_alerts.alerts (
            key TEXT PRIMARY KEY,
            severity TEXT,
            status TEXT,
            source TEXT,
            event_time TIMESTAMPTZ,
            raw JSONB NOT NULL,
            ingested_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("failed to create alerts table")?;

    for ddl in [
        "CREATE INDEX IF NOT EXISTS alerts_severity_idx ON cloud_alerts.alerts (severity)",
        "CREATE INDEX IF NOT EXISTS alerts_status_idx ON cloud_alerts.alerts (status)",
        "CREATE INDEX IF NOT EXISTS alerts_source_idx ON cloud_alerts.alerts (source)",
        "CREATE INDEX IF NOT EXISTS alerts_event_time_idx ON cloud_alerts.alerts (event_time)",
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .context("failed to create index")?;
    }

    Ok(())
}

/// Storage key for a record: its resolved identity, or a generated one so
/// identity-less records never collide on the primary key. The generated
/// key is storage-only; the record itself is not rewritten.
fn storage_key(alert: &AlertRecord) -> String {
    match alert.key() {
        "unknown" => format!("import-{}", Uuid::new_v4()),
        key => key.to_string(),
    }
}

/// Insert one alert; returns false when the key already existed.
pub async fn insert_alert(pool: &PgPool, alert: &AlertRecord) -> Result<bool, StoreError> {
    let raw = serde_json::to_value(alert).map_err(|e| StoreError::Malformed {
        detail: e.to_string(),
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO cloud_alerts.alerts (key, severity, status, source, event_time, raw)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (key) DO NOTHING
        "#,
    )
    .bind(storage_key(alert))
    .bind(alert.severity.map(|s| s.as_str()))
    .bind(alert.status.map(|s| s.as_str()))
    .bind(alert.source.as_deref())
    .bind(alert.event_time())
    .bind(raw)
    .execute(pool)
    .await
    .map_err(StoreError::from_sqlx)?;

    Ok(result.rows_affected() > 0)
}

/// Rows whose payload no longer decodes are skipped with a data-quality
/// note; only a failing query propagates.
pub async fn fetch_alerts(pool: &PgPool) -> Result<Vec<AlertRecord>, StoreError> {
    let rows = sqlx::query("SELECT key, raw FROM cloud_alerts.alerts ORDER BY key")
        .fetch_all(pool)
        .await
        .map_err(StoreError::from_sqlx)?;

    let mut alerts = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        let raw: serde_json::Value = row.get("raw");
        match serde_json::from_value::<AlertRecord>(raw) {
            Ok(alert) => alerts.push(alert),
            Err(err) => {
                let key: String = row.get("key");
                eprintln!("data quality: skipping undecodable alert {key}: {err}");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        eprintln!("data quality: {skipped} stored alerts could not be decoded");
    }

    Ok(alerts)
}

pub async fn fetch_alert(pool: &PgPool, id: &str) -> Result<AlertRecord, StoreError> {
    let row = sqlx::query("SELECT raw FROM cloud_alerts.alerts WHERE key = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(StoreError::from_sqlx)?
        .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

    let raw: serde_json::Value = row.get("raw");
    serde_json::from_value(raw).map_err(|e| StoreError::Malformed {
        detail: e.to_string(),
    })
}

/// Decode JSONL input, one JSON object per line. Blank lines are ignored;
/// malformed lines are skipped with a note and counted, never fatal.
fn decode_jsonl_lines(lines: impl Iterator<Item = String>) -> (Vec<AlertRecord>, usize) {
    let mut alerts = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AlertRecord>(&line) {
            Ok(alert) => alerts.push(alert),
            Err(err) => {
                eprintln!("data quality: skipping line {}: {err}", line_no + 1);
                skipped += 1;
            }
        }
    }
    (alerts, skipped)
}

/// Import alerts from a JSONL file; returns (inserted, skipped).
pub async fn import_jsonl(
    pool: &PgPool,
    path: &std::path::Path,
) -> anyhow::Result<(usize, usize)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let lines = std::io::BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read import lines")?;

    let (alerts, skipped) = decode_jsonl_lines(lines.into_iter());
    let mut inserted = 0usize;
    for alert in &alerts {
        if insert_alert(pool, alert).await? {
            inserted += 1;
        }
    }

    Ok((inserted, skipped))
}

/// Flat CSV export row; enrichment objects do not survive flattening, so
/// CSV imports carry only the fixed schema.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: Option<String>,
    severity: Option<Severity>,
    status: Option<Status>,
    source: Option<String>,
    #[serde(rename = "type")]
    alert_type: Option<String>,
    message: Option<String>,
    timestamp: Option<String>,
}

fn csv_row_to_alert(row: CsvRow) -> AlertRecord {
    AlertRecord {
        id: row.id,
        severity: row.severity,
        status: row.status,
        source: row.source,
        alert_type: row.alert_type,
        message: row.message,
        timestamp: row.timestamp,
        ..AlertRecord::default()
    }
}

/// Import alerts from a CSV export. Rows that fail to deserialize are
/// skipped with a note; returns (inserted, skipped).
pub async fn import_csv(pool: &PgPool, path: &std::path::Path) -> anyhow::Result<(usize, usize)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for (row_no, result) in reader.deserialize::<CsvRow>().enumerate() {
        match result {
            Ok(row) => {
                if insert_alert(pool, &csv_row_to_alert(row)).await? {
                    inserted += 1;
                }
            }
            Err(err) => {
                eprintln!("data quality: skipping row {}: {err}", row_no + 1);
                skipped += 1;
            }
        }
    }

    Ok((inserted, skipped))
}

/// Insert a small deterministic demo set.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let raw_alerts = [
        serde_json::json!({
            "id": "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2",
            "severity": "critical",
            "status": "open",
            "source": "AWS-GuardDuty",
            "type": "UnauthorizedAccessAttempt",
            "message": "Unauthorized access attempt targeting s3_bucket_41877",
            "timestamp": "2026-02-02T09:14:00Z",
            "resource": {
                "name": "s3_bucket_41877",
                "type": "S3-Bucket",
                "region": "us-east-1",
                "country": "USA",
                "latitude": 39.8283,
                "longitude": -98.5795
            },
            "threat_intelligence": {
                "threat_actor": "APT28",
                "threat_actor_country": "Russia",
                "attack_stage": "Exploitation",
                "ioc_type": "IP"
            },
            "risk_analysis": {"risk_score": 92.5, "confidence": 88.0, "exploitability": "high"},
            "compliance": {"frameworks": ["SOC2", "GDPR"], "data_classification": "Confidential"},
            "cost_impact": {"estimated_cost_usd": 12400.0, "downtime_minutes": 95.0, "data_loss_mb": 0.0}
        }),
        serde_json::json!({
            "id": "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc",
            "severity": "medium",
            "status": "in_progress",
            "source": "GCP-CloudLogging",
            "type": "AnomalousTraffic",
            "message": "Anomalous network traffic from 203.0.113.7",
            "timestamp": "2026-01-30T22:41:00Z",
            "resource": {"name": "vpc_subnet_1021", "type": "VPC-Subnet", "region": "eu-west-1", "country": "Ireland"},
            "risk_analysis": {"risk_score": 48.0, "confidence": 74.0, "exploitability": "low"}
        }),
        serde_json::json!({
            "id": "d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2",
            "severity": "low",
            "status": "closed",
            "source": "Azure-Sentinel",
            "type": "FailedLoginAttempt",
            "message": "Repeated failed logins for user_4410",
            "timestamp": "2026-01-28T06:02:00Z",
            "resource": {"name": "iam_role_977", "type": "IAM-Role", "region": "eu-central-1", "country": "Germany"}
        }),
    ];

    for raw in raw_alerts {
        let alert: AlertRecord =
            serde_json::from_value(raw).context("seed alert failed to decode")?;
        insert_alert(pool, &alert).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_generates_only_for_identityless_records() {
        let alert = AlertRecord {
            alert_id: Some("a-7".to_string()),
            ..AlertRecord::default()
        };
        assert_eq!(storage_key(&alert), "a-7");

        let anon = AlertRecord::default();
        let key = storage_key(&anon);
        assert!(key.starts_with("import-"));
        // Generated keys never rewrite the record itself.
        assert_eq!(anon.key(), "unknown");
    }

    #[test]
    fn malformed_jsonl_lines_are_skipped_not_fatal() {
        let lines = [
            r#"{"id": "a-1", "severity": "high"}"#.to_string(),
            "not json at all".to_string(),
            String::new(),
            r#"{"id": "a-2", "status": "closed"}"#.to_string(),
        ];
        let (alerts, skipped) = decode_jsonl_lines(lines.into_iter());
        assert_eq!(skipped, 1);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].key(), "a-1");
        assert_eq!(alerts[1].key(), "a-2");
    }

    #[test]
    fn csv_rows_map_onto_the_fixed_schema() {
        let mut reader = csv::Reader::from_reader(
            "id,severity,status,source,type,message,timestamp\n\
             a-1,high,open,AWS-CloudTrail,SuspiciousAPICall,DeleteBucket call,2024-04-01T10:00:00Z\n"
                .as_bytes(),
        );
        let row: CsvRow = reader.deserialize().next().unwrap().unwrap();

        let first = csv_row_to_alert(row);
        assert_eq!(first.key(), "a-1");
        assert_eq!(first.severity, Some(Severity::High));
        assert_eq!(first.status, Some(Status::Open));
        assert_eq!(first.source.as_deref(), Some("AWS-CloudTrail"));
    }

    #[test]
    fn short_csv_rows_leave_fields_absent() {
        let mut reader = csv::Reader::from_reader(
            "id,severity,status,source,type,message,timestamp\n\
             a-2,,,,,,\n"
                .as_bytes(),
        );
        let row: CsvRow = reader.deserialize().next().unwrap().unwrap();
        let alert = csv_row_to_alert(row);
        assert_eq!(alert.severity, None);
        assert_eq!(alert.status, None);
        assert_eq!(alert.effective_severity(), Severity::Low);
    }
}
