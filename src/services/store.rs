use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::Result;
use crate::models::song::SongRecord;

/// JSON sidecar holding one record per playlist song, in playlist order.
///
/// Every mutation rewrites the whole file. There is no atomic rename or
/// backup: a crash halfway through a write can leave a truncated store.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record; a missing file is an empty store.
    pub fn load(&self) -> Result<Vec<SongRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                log::error!("Error reading metadata file {}: {}", self.path.display(), e);
                return Err(e.into());
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            log::error!("Error parsing metadata file {}: {}", self.path.display(), e);
            e.into()
        })
    }

    /// Overwrites the store with `records`.
    pub fn save(&self, records: &[SongRecord]) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut json = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut json, PrettyFormatter::with_indent(b"    "));
        records.serialize(&mut serializer)?;

        let mut file = File::create(&self.path)?;
        file.write_all(&json)?;
        file.flush()?;
        Ok(())
    }

    pub fn append(&self, record: SongRecord) -> Result<()> {
        let mut records = self.load()?;
        records.push(record);
        self.save(&records)
    }

    /// Drops every record whose location is in `locations`.
    pub fn remove_locations(&self, locations: &[&Path]) -> Result<usize> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|record| !locations.contains(&record.location.as_path()));
        let removed = before - records.len();
        self.save(&records)?;
        Ok(removed)
    }

    pub fn clear(&self) -> Result<()> {
        self.save(&[])
    }
}
