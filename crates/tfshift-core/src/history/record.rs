//! History records and their file format.

use super::error::HistoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current version of the history file format.
pub const HISTORY_VERSION: u32 = 1;

/// Record of one applied migration file. Keyed by filename in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration kind, e.g. `state`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Migration name.
    pub name: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    records: BTreeMap<String, MigrationRecord>,
}

/// Append-only log of applied migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    records: BTreeMap<String, MigrationRecord>,
}

impl HistoryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `filename` has a record.
    pub fn contains(&self, filename: &str) -> bool {
        self.records.contains_key(filename)
    }

    /// Look up the record for `filename`.
    pub fn get(&self, filename: &str) -> Option<&MigrationRecord> {
        self.records.get(filename)
    }

    /// Add a record. Existing records are never replaced; returns whether
    /// the record was added.
    pub fn insert(&mut self, filename: impl Into<String>, record: MigrationRecord) -> bool {
        let filename = filename.into();
        if self.records.contains_key(&filename) {
            return false;
        }
        self.records.insert(filename, record);
        true
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(filename, record)` pairs in filename order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MigrationRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode the log as a history file.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HistoryError> {
        let file = HistoryFile {
            version: HISTORY_VERSION,
            records: self.records.clone(),
        };
        Ok(serde_json::to_vec_pretty(&file)?)
    }

    /// Decode a history file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HistoryError> {
        let file: HistoryFile = serde_json::from_slice(bytes)?;
        if file.version != HISTORY_VERSION {
            return Err(HistoryError::UnsupportedVersion {
                version: file.version,
                expected: HISTORY_VERSION,
            });
        }
        Ok(Self {
            records: file.records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(name: &str) -> MigrationRecord {
        MigrationRecord {
            kind: "state".to_string(),
            name: name.to_string(),
            applied_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_insert_is_write_once() {
        let mut log = HistoryLog::new();
        assert!(log.insert("001_a.json", record("a")));
        assert!(!log.insert("001_a.json", record("other")));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get("001_a.json").unwrap().name, "a");
    }

    #[test]
    fn test_file_format() {
        let mut log = HistoryLog::new();
        log.insert("001_a.json", record("a"));
        let bytes = log.to_bytes().unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["records"]["001_a.json"]["type"], "state");
        assert_eq!(value["records"]["001_a.json"]["applied_at"], "2024-05-01T12:00:00Z");

        assert_eq!(HistoryLog::from_bytes(&bytes).unwrap(), log);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let result = HistoryLog::from_bytes(br#"{"version": 2, "records": {}}"#);
        assert!(matches!(
            result,
            Err(HistoryError::UnsupportedVersion { version: 2, .. })
        ));
    }
}
