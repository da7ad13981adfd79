//! Persistence for state that survives between runs.
//!
//! ## Directory Structure
//!
//! ```text
//! conf/
//! ├── lists.txt                 # Collection entry points (+ .bak)
//! ├── items.txt                 # Leaf items (+ .bak)
//! ├── downloaded_xc_p.txt       # Written by the downloader
//! ├── pl_archive_xc_p.txt       # Rebuilt playlist archive
//! ├── pl_archive_xc_p.txt.curr.txt
//! └── pl_archive_xc_p_2023.txt  # Historical shard, read only
//! ```
//!
//! Files are plain newline-delimited URL sets. Each read or write takes an
//! advisory lock for that call only; see [`crate::utils::fs`].

pub mod archive;
pub mod playlist;

// Re-export for convenience
pub use archive::{ArchiveStore, ArchiveSummary, MergeSummary, UrlArchive};
pub use playlist::{rebuild, rebuild_all};
