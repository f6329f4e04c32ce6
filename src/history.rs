use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use path_slash::PathExt;
use serde::{Deserialize, Serialize};

use crate::HISTORY_FILE_NAME;

/// One completed move. Appended the instant the move succeeds, never
/// mutated afterwards. Paths are stored slash-normalized so the dashboard
/// can render them verbatim on any platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub original_name: String,
    pub new_name: String,
    pub original_path: String,
    pub new_path: String,
    pub category: String,
    pub size_bytes: u64,
    pub description: Option<String>,
}

impl OperationRecord {
    pub fn organized(
        original: &Path,
        destination: &Path,
        category: &str,
        size_bytes: u64,
        description: Option<String>,
    ) -> Self {
        let name_of = |p: &Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        Self {
            timestamp: Utc::now(),
            action: "organize".to_string(),
            original_name: name_of(original),
            new_name: name_of(destination),
            original_path: original.to_slash_lossy().into_owned(),
            new_path: destination.to_slash_lossy().into_owned(),
            category: category.to_string(),
            size_bytes,
            description,
        }
    }
}

/// Aggregate counts over the whole history, consumed by the dashboard.
#[derive(Debug, Clone, Default)]
pub struct HistoryStats {
    pub total_moved: usize,
    pub per_category: HashMap<String, usize>,
    pub last_operation: Option<DateTime<Utc>>,
}

/// Append-only JSONL log of completed moves, kept inside the source root.
///
/// One record per line keeps appends atomic with respect to prior entries:
/// a crash mid-write can tear at most the final line, and readers skip
/// lines that fail to parse.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn open(source_root: &Path) -> Self {
        Self {
            path: source_root.join(HISTORY_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one record as a single line.
    ///
    /// If a previous append was torn (file not ending in a newline), the
    /// line boundary is restored first so the torn line harms only itself.
    pub fn append(&self, record: &OperationRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("failed to open history file {}", self.path.display()))?;

        let len = file.metadata().context("failed to stat history file")?.len();
        if len > 0 {
            file.seek(SeekFrom::End(-1))?;
            let mut last = [0u8; 1];
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }

        let line = serde_json::to_string(record).context("failed to serialize record")?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        file.sync_all()
            .context("failed to sync history file to disk")?;
        Ok(())
    }

    /// All parsable records in append order. A missing file is an empty
    /// history, not an error.
    pub fn read_all(&self) -> Result<Vec<OperationRecord>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read history file {}", self.path.display())
                })
            }
        };

        Ok(data
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    /// The most recent `n` records, newest first.
    pub fn list_recent(&self, n: usize) -> Result<Vec<OperationRecord>> {
        let mut records = self.read_all()?;
        records.reverse();
        records.truncate(n);
        Ok(records)
    }

    pub fn stats(&self) -> Result<HistoryStats> {
        let records = self.read_all()?;
        let mut stats = HistoryStats {
            total_moved: records.len(),
            ..Default::default()
        };
        for record in &records {
            *stats.per_category.entry(record.category.clone()).or_insert(0) += 1;
            stats.last_operation = match stats.last_operation {
                Some(latest) if latest >= record.timestamp => Some(latest),
                _ => Some(record.timestamp),
            };
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(category: &str, name: &str) -> OperationRecord {
        OperationRecord::organized(
            Path::new(name),
            &Path::new(category).join(name),
            category,
            42,
            None,
        )
    }

    #[test]
    fn list_recent_is_newest_first_and_bounded() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path());

        store.append(&record("images", "a.jpg")).unwrap();
        store.append(&record("documents", "b.pdf")).unwrap();
        store.append(&record("images", "c.png")).unwrap();

        let recent = store.list_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].new_name, "c.png");
        assert_eq!(recent[1].new_name, "b.pdf");
    }

    #[test]
    fn stats_count_per_category() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path());

        store.append(&record("images", "a.jpg")).unwrap();
        store.append(&record("images", "b.png")).unwrap();
        store.append(&record("archives", "c.zip")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_moved, 3);
        assert_eq!(stats.per_category.get("images"), Some(&2));
        assert_eq!(stats.per_category.get("archives"), Some(&1));
        assert!(stats.last_operation.is_some());
    }

    #[test]
    fn missing_file_reads_as_empty_history() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path());
        assert!(store.read_all().unwrap().is_empty());
        assert_eq!(store.stats().unwrap().total_moved, 0);
    }

    #[test]
    fn torn_final_line_is_skipped_on_read() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path());

        store.append(&record("images", "a.jpg")).unwrap();
        let mut file = OpenOptions::new().append(true).open(store.path()).unwrap();
        file.write_all(b"{\"timestamp\":\"2025-08").unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].new_name, "a.jpg");
    }

    #[test]
    fn append_after_torn_line_restores_boundary() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path());

        store.append(&record("images", "a.jpg")).unwrap();
        let mut file = OpenOptions::new().append(true).open(store.path()).unwrap();
        file.write_all(b"{\"torn\":").unwrap();
        drop(file);

        store.append(&record("documents", "b.pdf")).unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].new_name, "b.pdf");
    }

    #[test]
    fn records_store_slash_normalized_paths() {
        let record = OperationRecord::organized(
            Path::new("downloads/report final.pdf"),
            Path::new("downloads/documents/report_final.pdf"),
            "documents",
            7,
            Some("quarterly report".to_string()),
        );
        assert_eq!(record.original_name, "report final.pdf");
        assert_eq!(record.new_name, "report_final.pdf");
        assert!(!record.new_path.contains('\\'));
        assert_eq!(record.category, "documents");
    }
}
