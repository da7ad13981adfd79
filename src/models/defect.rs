//! Audit findings and the remediation actions derived from them.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Kinds of mirror defects.
///
/// The derived ordering is also the order batches are planned in within a
/// stage: moves before merges before prunes, clears before re-fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefectKind {
    MisfiledModelPrefix,
    DuplicateIdAcrossDirs,
    EmptyModelDirectory,
    DuplicateFileSizeCluster,
    IncompletePvCount,
    MissingId,
    MissingPvCount,
    NoMediaFiles,
    UnexpectedFileType,
}

impl DefectKind {
    /// Repair stage of this kind, or `None` for report-only kinds.
    pub fn stage(self) -> Option<Stage> {
        match self {
            DefectKind::MisfiledModelPrefix
            | DefectKind::DuplicateIdAcrossDirs
            | DefectKind::EmptyModelDirectory => Some(Stage::Structural),
            DefectKind::DuplicateFileSizeCluster | DefectKind::IncompletePvCount => {
                Some(Stage::Content)
            }
            DefectKind::MissingId
            | DefectKind::MissingPvCount
            | DefectKind::NoMediaFiles
            | DefectKind::UnexpectedFileType => None,
        }
    }
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefectKind::MisfiledModelPrefix => "misfiled-model-prefix",
            DefectKind::DuplicateIdAcrossDirs => "duplicate-id-across-dirs",
            DefectKind::EmptyModelDirectory => "empty-model-directory",
            DefectKind::DuplicateFileSizeCluster => "duplicate-file-size-cluster",
            DefectKind::IncompletePvCount => "incomplete-pv-count",
            DefectKind::MissingId => "missing-id",
            DefectKind::MissingPvCount => "missing-pv-count",
            DefectKind::NoMediaFiles => "no-media-files",
            DefectKind::UnexpectedFileType => "unexpected-file-type",
        };
        f.write_str(name)
    }
}

/// Photo and video counts of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PvCount {
    pub photos: u32,
    pub videos: u32,
}

impl PvCount {
    pub fn new(photos: u32, videos: u32) -> Self {
        Self { photos, videos }
    }

    pub fn total(&self) -> u64 {
        u64::from(self.photos) + u64::from(self.videos)
    }
}

impl fmt::Display for PvCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}P{}V", self.photos, self.videos)
    }
}

/// A single audit finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Defect {
    MissingId {
        path: PathBuf,
    },
    MissingPvCount {
        path: PathBuf,
    },
    NoMediaFiles {
        path: PathBuf,
    },
    UnexpectedFileType {
        path: PathBuf,
        files: Vec<String>,
    },
    IncompletePvCount {
        path: PathBuf,
        id: String,
        expected: PvCount,
        found: PvCount,
    },
    DuplicateFileSizeCluster {
        path: PathBuf,
        size: u64,
        count: usize,
    },
    DuplicateIdAcrossDirs {
        id: String,
        paths: Vec<PathBuf>,
    },
    MisfiledModelPrefix {
        path: PathBuf,
        prefix: String,
    },
    EmptyModelDirectory {
        path: PathBuf,
    },
}

impl Defect {
    pub fn kind(&self) -> DefectKind {
        match self {
            Defect::MissingId { .. } => DefectKind::MissingId,
            Defect::MissingPvCount { .. } => DefectKind::MissingPvCount,
            Defect::NoMediaFiles { .. } => DefectKind::NoMediaFiles,
            Defect::UnexpectedFileType { .. } => DefectKind::UnexpectedFileType,
            Defect::IncompletePvCount { .. } => DefectKind::IncompletePvCount,
            Defect::DuplicateFileSizeCluster { .. } => DefectKind::DuplicateFileSizeCluster,
            Defect::DuplicateIdAcrossDirs { .. } => DefectKind::DuplicateIdAcrossDirs,
            Defect::MisfiledModelPrefix { .. } => DefectKind::MisfiledModelPrefix,
            Defect::EmptyModelDirectory { .. } => DefectKind::EmptyModelDirectory,
        }
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::MissingId { path }
            | Defect::MissingPvCount { path }
            | Defect::NoMediaFiles { path }
            | Defect::EmptyModelDirectory { path } => {
                write!(f, "{} --> {}", self.kind(), path.display())
            }
            Defect::UnexpectedFileType { path, files } => write!(
                f,
                "{} files:{} [{}] --> {}",
                self.kind(),
                files.len(),
                files.join(", "),
                path.display()
            ),
            Defect::IncompletePvCount {
                path,
                expected,
                found,
                ..
            } => write!(f, "incomplete {found} != {expected} --> {}", path.display()),
            Defect::DuplicateFileSizeCluster { path, size, count } => {
                write!(f, "dup size:{size}, cnt:{count} --> {}", path.display())
            }
            Defect::DuplicateIdAcrossDirs { id, paths } => {
                let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "dup id:{id} --> {}", paths.join(" | "))
            }
            Defect::MisfiledModelPrefix { path, prefix } => {
                write!(f, "misfiled under '{prefix}' --> {}", path.display())
            }
        }
    }
}

/// A concrete filesystem or download action fixing one defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Remediation {
    /// Re-download a collection into its existing directory
    Refetch { id: String, dir: PathBuf },
    /// Delete every file in a directory, keeping it for a re-download
    ClearFiles { id: String, dir: PathBuf },
    /// Move a directory to a new location
    Move { from: PathBuf, to: PathBuf },
    /// Move a directory's contents into another, then delete it
    Merge { from: PathBuf, into: PathBuf },
    /// Delete marker files, then the directory if it is empty
    Prune { dir: PathBuf, markers: Vec<String> },
}

/// Repair stages; each assumes the previous one has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Directory moves, merges and removals
    Structural,
    /// File clearing and re-downloads inside existing directories
    Content,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Structural => f.write_str("stage 1 (structural)"),
            Stage::Content => f.write_str("stage 2 (content)"),
        }
    }
}

/// Remediations for one defect kind, in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixBatch {
    pub kind: DefectKind,
    pub actions: Vec<Remediation>,
}
