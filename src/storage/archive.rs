//! Persisted URL sets: collection entry points and leaf items.
//!
//! Both archives are rewritten in full on every run as the union of what was
//! on disk and what the run observed. The previous contents are copied to
//! `<file>.bak` first.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Workspace;
use crate::utils::fs::{read_plain_urls, write_plain_urls};
use crate::utils::url::clean_entry;

/// A newline-delimited URL set on disk.
#[derive(Debug, Clone)]
pub struct UrlArchive {
    path: PathBuf,
}

/// Size of an archive before and after a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub before: usize,
    pub after: usize,
}

impl MergeSummary {
    pub fn added(&self) -> usize {
        self.after.saturating_sub(self.before)
    }
}

impl UrlArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<file>.bak` next to the archive.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Cleaned entries currently on disk; a missing file is an empty set.
    pub fn load(&self) -> Result<BTreeSet<String>> {
        Ok(read_plain_urls(&self.path)?
            .iter()
            .filter_map(|line| clean_entry(line))
            .collect())
    }

    /// Back up the current file and write back its union with `candidates`.
    pub fn merge<I, S>(&self, candidates: I) -> Result<MergeSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw = read_plain_urls(&self.path)?;
        if self.path.exists() {
            write_plain_urls(&raw, &self.backup_path())?;
        }

        let mut entries: BTreeSet<String> =
            raw.iter().filter_map(|line| clean_entry(line)).collect();
        let before = entries.len();

        entries.extend(candidates.into_iter().filter_map(|c| clean_entry(c.as_ref())));
        write_plain_urls(&entries, &self.path)?;

        Ok(MergeSummary {
            before,
            after: entries.len(),
        })
    }
}

/// The lists and items archives of a workspace.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    pub lists: UrlArchive,
    pub items: UrlArchive,
}

/// Outcome of committing one run's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub lists: MergeSummary,
    pub items: MergeSummary,
}

impl ArchiveStore {
    pub fn new(workspace: &Workspace) -> Self {
        Self {
            lists: UrlArchive::new(workspace.lists_file()),
            items: UrlArchive::new(workspace.items_file()),
        }
    }

    /// Merge observed collection and item URLs into their archives.
    pub fn commit(&self, lists: &[String], items: &[String]) -> Result<ArchiveSummary> {
        let lists_summary = self.lists.merge(lists)?;
        log::info!(
            "Saved lists: {} (+{}) --> {}",
            lists_summary.after,
            lists_summary.added(),
            self.lists.path().display()
        );

        let items_summary = self.items.merge(items)?;
        log::info!(
            "Saved items: {} (+{}) --> {}",
            items_summary.after,
            items_summary.added(),
            self.items.path().display()
        );

        Ok(ArchiveSummary {
            lists: lists_summary,
            items: items_summary,
        })
    }
}
