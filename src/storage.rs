use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::models::{RecycledTask, Task, TaskId};

/// Side store holding recycled tasks.
///
/// An entry belongs to one task, identified by its id together with its
/// creation time. Ids alone are not unique: a restarted store hands them out
/// again, so two entries may share an id. Lookups by id answer with the most
/// recently recycled one.
///
/// Entries are kept in the order they were recycled and written to disk as a
/// flat JSON list. A bin without a path lives only in memory.
#[derive(Debug, Default)]
pub struct RecycleBin {
    entries: Vec<RecycledTask>,
    path: Option<PathBuf>,
}

impl RecycleBin {
    /// A bin that is never written to disk.
    pub fn in_memory() -> Self {
        RecycleBin::default()
    }

    /// Loads the bin stored at `path`.
    ///
    /// A missing file yields an empty bin; an unreadable or malformed one is
    /// an error, so its contents are not overwritten on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "recycle bin loaded");
        Ok(RecycleBin { entries, path: Some(path) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[RecycledTask] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&RecycledTask> {
        self.entries.iter().rev().find(|e| e.id() == id)
    }

    /// The entry recorded for this exact task, if any.
    pub fn entry_for(&self, task: &Task) -> Option<&RecycledTask> {
        self.entries.iter().find(|e| e.is_snapshot_of(task))
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Adds an entry unless the same task is already present.
    ///
    /// Returns `false` when the existing entry was kept.
    pub fn insert(&mut self, entry: RecycledTask) -> bool {
        if self.entry_for(&entry.task).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Removes the most recently recycled entry with this id.
    pub fn remove(&mut self, id: TaskId) -> Option<RecycledTask> {
        let pos = self.entries.iter().rposition(|e| e.id() == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn remove_entry(&mut self, entry: &RecycledTask) -> bool {
        match self.entries.iter().position(|e| e == entry) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Keeps the entries matching `keep`, returning how many were dropped.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&RecycledTask) -> bool,
    {
        let len_before = self.entries.len();
        self.entries.retain(keep);
        len_before - self.entries.len()
    }

    /// Drops every entry, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Writes the bin to its file and syncs it. No-op for in-memory bins.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let s = serde_json::to_string_pretty(&self.entries)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        f.write_all(s.as_bytes())?;
        f.sync_all()?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<Vec<RecycledTask>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut f = OpenOptions::new().read(true).open(path)?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<RecycledTask> = serde_json::from_str(&s)?;
    // one entry per task; the first recorded deletion wins
    let mut seen = std::collections::HashSet::new();
    entries.retain(|e| seen.insert((e.id(), e.task.created_at)));
    Ok(entries)
}
