//! Scan history
//!
//! Every completed batch is archived as one entry keyed by its completion
//! time in epoch milliseconds. Ids are unique within an archive: an entry
//! whose id is already taken is moved past the newest one. Archives are
//! append-only apart from explicit deletion; listing returns newest first.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use proinfo_core::TargetRecord;

/// Archive errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("History I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("History entry is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One archived batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Epoch milliseconds at archival
    pub id: i64,
    /// RFC 3339 archival time
    pub timestamp: String,
    /// Number of records in the batch
    pub targets: usize,
    pub data: Vec<TargetRecord>,
}

impl HistoryEntry {
    pub fn new(data: Vec<TargetRecord>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            timestamp: now.to_rfc3339(),
            targets: data.len(),
            data,
        }
    }

    /// Move the id past `newest` when it would collide
    fn claim_id(&mut self, newest: Option<i64>) {
        if let Some(newest) = newest {
            if self.id <= newest {
                self.id = newest + 1;
            }
        }
    }

    /// First few identifiers, for listings
    pub fn preview(&self, limit: usize) -> String {
        let shown: Vec<&str> = self
            .data
            .iter()
            .take(limit)
            .map(|r| r.identifier.as_str())
            .collect();
        let mut preview = shown.join(", ");
        if self.data.len() > limit {
            preview.push_str("...");
        }
        preview
    }
}

/// Destination for completed batches
#[async_trait]
pub trait HistoryArchive: Send + Sync {
    async fn append(&self, entry: HistoryEntry) -> Result<(), ArchiveError>;

    /// Entries, newest first
    async fn entries(&self) -> Result<Vec<HistoryEntry>, ArchiveError>;

    /// Delete one entry; returns whether it existed
    async fn remove(&self, id: i64) -> Result<bool, ArchiveError>;

    async fn clear(&self) -> Result<(), ArchiveError>;
}

/// In-process archive
#[derive(Debug, Default)]
pub struct MemoryArchive {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.with_entries(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut Vec<HistoryEntry>) -> T) -> T {
        let mut guard = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *guard)
    }
}

#[async_trait]
impl HistoryArchive for MemoryArchive {
    async fn append(&self, mut entry: HistoryEntry) -> Result<(), ArchiveError> {
        self.with_entries(|entries| {
            entry.claim_id(entries.iter().map(|e| e.id).max());
            entries.push(entry);
        });
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>, ArchiveError> {
        Ok(self.with_entries(|entries| entries.iter().rev().cloned().collect()))
    }

    async fn remove(&self, id: i64) -> Result<bool, ArchiveError> {
        Ok(self.with_entries(|entries| {
            let before = entries.len();
            entries.retain(|e| e.id != id);
            entries.len() != before
        }))
    }

    async fn clear(&self) -> Result<(), ArchiveError> {
        self.with_entries(|entries| entries.clear());
        Ok(())
    }
}

/// JSON Lines file archive, one entry per line in chronological order
#[derive(Debug, Clone)]
pub struct JsonlArchive {
    path: PathBuf,
}

impl JsonlArchive {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<HistoryEntry>, ArchiveError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(ArchiveError::from))
            .collect()
    }

    async fn write_all(&self, entries: &[HistoryEntry]) -> Result<(), ArchiveError> {
        let mut content = String::new();
        for entry in entries {
            content.push_str(&serde_json::to_string(entry)?);
            content.push('\n');
        }
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryArchive for JsonlArchive {
    async fn append(&self, mut entry: HistoryEntry) -> Result<(), ArchiveError> {
        let existing = self.read_all().await?;
        entry.claim_id(existing.iter().map(|e| e.id).max());

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>, ArchiveError> {
        let mut entries = self.read_all().await?;
        entries.reverse();
        Ok(entries)
    }

    async fn remove(&self, id: i64) -> Result<bool, ArchiveError> {
        let mut entries = self.read_all().await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write_all(&entries).await?;
        Ok(true)
    }

    async fn clear(&self) -> Result<(), ArchiveError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, targets: &[&str]) -> HistoryEntry {
        let data: Vec<TargetRecord> = targets.iter().map(|t| TargetRecord::pending(t)).collect();
        HistoryEntry {
            id,
            timestamp: "2026-10-18T09:00:00+00:00".to_string(),
            targets: data.len(),
            data,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("proinfo-{}-{}.jsonl", name, std::process::id()))
    }

    #[test]
    fn test_new_entry_shape() {
        let entry = HistoryEntry::new(vec![TargetRecord::pending("8.8.8.8")]);
        assert!(entry.id > 0);
        assert_eq!(entry.targets, 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&entry.timestamp).is_ok());

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("id").is_some());
        assert_eq!(json["data"][0]["identifier"], "8.8.8.8");
    }

    #[test]
    fn test_preview() {
        let e = entry(1, &["a.example", "b.example", "c.example", "d.example"]);
        assert_eq!(e.preview(3), "a.example, b.example, c.example...");
        assert_eq!(entry(2, &["a.example"]).preview(3), "a.example");
    }

    #[tokio::test]
    async fn test_memory_archive() {
        let archive = MemoryArchive::new();
        archive.append(entry(1, &["1.1.1.1"])).await.unwrap();
        archive.append(entry(2, &["8.8.8.8"])).await.unwrap();

        let ids: Vec<i64> = archive.entries().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);

        assert!(archive.remove(1).await.unwrap());
        assert!(!archive.remove(1).await.unwrap());
        assert_eq!(archive.len(), 1);

        archive.clear().await.unwrap();
        assert!(archive.is_empty());
    }

    #[tokio::test]
    async fn test_jsonl_archive_round_trip() {
        let path = temp_path("history");
        let archive = JsonlArchive::new(&path);
        archive.clear().await.unwrap();

        assert!(archive.entries().await.unwrap().is_empty());

        archive.append(entry(10, &["example.com"])).await.unwrap();
        archive.append(entry(20, &["1.1.1.1", "8.8.8.8"])).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);

        let entries = archive.entries().await.unwrap();
        assert_eq!(entries[0].id, 20);
        assert_eq!(entries[0].targets, 2);
        assert_eq!(entries[1].data[0].identifier, "example.com");

        assert!(archive.remove(10).await.unwrap());
        assert_eq!(archive.entries().await.unwrap().len(), 1);

        archive.clear().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_same_millisecond_entries_stay_distinct() {
        let memory = MemoryArchive::new();
        memory.append(entry(500, &["1.1.1.1"])).await.unwrap();
        memory.append(entry(500, &["8.8.8.8"])).await.unwrap();

        let ids: Vec<i64> = memory.entries().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![501, 500]);
        assert!(memory.remove(500).await.unwrap());
        assert_eq!(memory.len(), 1);

        let path = temp_path("same-ms");
        let archive = JsonlArchive::new(&path);
        archive.clear().await.unwrap();
        archive.append(entry(700, &["1.1.1.1"])).await.unwrap();
        archive.append(entry(700, &["8.8.8.8"])).await.unwrap();
        archive.append(entry(650, &["9.9.9.9"])).await.unwrap();

        let ids: Vec<i64> = archive.entries().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![702, 701, 700]);
        assert!(archive.remove(700).await.unwrap());
        let left: Vec<String> = archive
            .entries()
            .await
            .unwrap()
            .iter()
            .map(|e| e.data[0].identifier.clone())
            .collect();
        assert_eq!(left, vec!["9.9.9.9", "8.8.8.8"]);
        archive.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_jsonl_corrupt_line() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{not json}\n").unwrap();

        let archive = JsonlArchive::new(&path);
        assert!(matches!(archive.entries().await, Err(ArchiveError::Serde(_))));
        archive.clear().await.unwrap();
    }
}
