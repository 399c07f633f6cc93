//! Dataset export for dashboards and offline analysis.

use crate::metrics::error::MetricsResult;
use crate::metrics::types::LoadRecord;

/// Supported export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Full ordered record list as a JSON array.
pub fn to_json<'a>(records: impl Iterator<Item = &'a LoadRecord>) -> MetricsResult<String> {
    let all: Vec<&LoadRecord> = records.collect();
    Ok(serde_json::to_string_pretty(&all)?)
}

/// One line per record in insertion order, preceded by the fixed header.
pub fn to_csv<'a>(records: impl Iterator<Item = &'a LoadRecord>) -> String {
    let mut out = String::from("url,loadTime,success,timestamp,deviceType,errorType,retryCount\n");
    for record in records {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            record.url,
            record.load_time_ms,
            record.success,
            record.timestamp.to_rfc3339(),
            record.device_class.as_str(),
            record.error_kind.map(|k| k.as_str()).unwrap_or(""),
            record.retry_count,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::{DeviceClass, ErrorKind};
    use chrono::Utc;

    fn sample(url: &str, success: bool) -> LoadRecord {
        LoadRecord {
            url: url.to_string(),
            load_time_ms: if success { 250.0 } else { 0.0 },
            timestamp: Utc::now(),
            success,
            error_kind: if success { None } else { Some(ErrorKind::Network) },
            retry_count: 0,
            device_class: DeviceClass::Desktop,
            resolved: false,
            size_bytes: None,
        }
    }

    #[test]
    fn test_csv_header_and_line_count() {
        let records = vec![
            sample("https://x.test/a.jpg", true),
            sample("https://x.test/b.jpg", false),
        ];
        let csv = to_csv(records.iter());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "url,loadTime,success,timestamp,deviceType,errorType,retryCount"
        );
        assert!(lines[1].starts_with("https://x.test/a.jpg,250,true,"));
        assert!(lines[2].contains(",network,"));
    }

    #[test]
    fn test_csv_empty_error_field_for_success() {
        let records = vec![sample("https://x.test/a.jpg", true)];
        let csv = to_csv(records.iter());
        let line = csv.lines().nth(1).unwrap();
        let fields: Vec<&str> = line.split(',').collect();

        assert_eq!(fields.len(), 7);
        assert_eq!(fields[5], "");
    }

    #[test]
    fn test_json_round_trip() {
        let records = vec![
            sample("https://x.test/a.jpg", true),
            sample("https://x.test/b.jpg", false),
        ];
        let json = to_json(records.iter()).unwrap();
        let parsed: Vec<LoadRecord> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].url, "https://x.test/a.jpg");
        assert_eq!(parsed[1].error_kind, Some(ErrorKind::Network));
    }
}
