//! Consistency audit of a mirrored channel directory.
//!
//! The mirror is two levels deep: model directories, each holding collection
//! directories named `<title>-<P>P<V>V-<id>`. Every collection is checked on
//! its own, then the whole tree is checked for misplaced, duplicated and
//! empty model directories. Malformed names are recorded and the scan goes
//! on; only I/O failures abort it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::error::{AppError, Result};
use crate::models::{AuditConfig, Defect, DefectKind, PvCount, Remediation};

static PV_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)P(?:(\d+)V)?$").expect("valid count segment pattern")
});

/// What a collection directory name says about its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionName {
    /// No `-<id>` suffix
    MissingId,
    /// Id present, but no `<P>P<V>V` segment before it
    MissingCounts { id: String },
    Complete { id: String, expected: PvCount },
}

impl CollectionName {
    pub fn parse(name: &str) -> Self {
        let Some((left, id)) = name.rsplit_once('-') else {
            return CollectionName::MissingId;
        };
        if id.is_empty() {
            return CollectionName::MissingId;
        }
        let id = id.to_string();

        let Some((_, segment)) = left.rsplit_once('-') else {
            return CollectionName::MissingCounts { id };
        };
        let Some(caps) = PV_SEGMENT.captures(segment) else {
            return CollectionName::MissingCounts { id };
        };

        let photos = caps[1].parse().ok();
        let videos = match caps.get(2) {
            Some(v) => v.as_str().parse().ok(),
            None => Some(0),
        };
        match (photos, videos) {
            (Some(photos), Some(videos)) => CollectionName::Complete {
                id,
                expected: PvCount::new(photos, videos),
            },
            _ => CollectionName::MissingCounts { id },
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            CollectionName::MissingId => None,
            CollectionName::MissingCounts { id } | CollectionName::Complete { id, .. } => {
                Some(id)
            }
        }
    }
}

/// How a file inside a collection is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileClass {
    Hidden,
    Photo,
    Video,
    Sidecar,
    Unknown,
}

impl FileClass {
    fn of(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.starts_with('.') {
            FileClass::Hidden
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            FileClass::Photo
        } else if lower.ends_with(".mp4") {
            FileClass::Video
        } else if lower.ends_with(".json") || lower.ends_with(".txt") {
            FileClass::Sidecar
        } else {
            FileClass::Unknown
        }
    }
}

/// Findings of one audit, grouped by defect kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub root: PathBuf,
    pub models: usize,
    pub collections: usize,
    pub defects: BTreeMap<DefectKind, Vec<Defect>>,
    pub remediations: BTreeMap<DefectKind, Vec<Remediation>>,
}

impl AuditReport {
    fn record(&mut self, defect: Defect) {
        self.defects.entry(defect.kind()).or_default().push(defect);
    }

    fn remedy(&mut self, kind: DefectKind, action: Remediation) {
        self.remediations.entry(kind).or_default().push(action);
    }

    /// Findings of one kind.
    pub fn defects_of(&self, kind: DefectKind) -> &[Defect] {
        self.defects.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remediation candidates of one kind.
    pub fn remediations_of(&self, kind: DefectKind) -> &[Remediation] {
        self.remediations.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Log a per-kind summary followed by the actionable findings.
    pub fn log_summary(&self) {
        log::info!(
            "Scanned {}: {} model dirs, {} collections",
            self.root.display(),
            self.models,
            self.collections
        );
        for (kind, defects) in &self.defects {
            log::info!(
                "    {}: {} ({} fixable)",
                kind,
                defects.len(),
                self.remediations_of(*kind).len()
            );
        }
        for kind in [
            DefectKind::MissingId,
            DefectKind::IncompletePvCount,
            DefectKind::DuplicateFileSizeCluster,
        ] {
            for defect in self.defects_of(kind) {
                log::info!("{}", defect);
            }
        }
        for defect in self.defects_of(DefectKind::UnexpectedFileType) {
            log::debug!("{}", defect);
        }
    }
}

/// Audits a mirror directory against naming and content rules.
pub struct Auditor<'a> {
    config: &'a AuditConfig,
}

impl<'a> Auditor<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    /// Walk the mirror rooted at `root` and collect every finding.
    pub fn audit(&self, root: &Path) -> Result<AuditReport> {
        if !root.is_dir() {
            return Err(AppError::config(format!(
                "scan path does not exist: {}",
                root.display()
            )));
        }
        log::info!("Start scanning dir: {}", root.display());

        let mut report = AuditReport {
            root: root.to_path_buf(),
            ..AuditReport::default()
        };
        let mut ids: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

        for model in list_dir(root)? {
            if !model.file_type().is_dir() {
                continue;
            }
            report.models += 1;
            let model_name = model.file_name().to_string_lossy().into_owned();
            self.check_model_prefix(root, model.path(), &model_name, &mut report);

            let mut collections = 0;
            for collection in list_dir(model.path())? {
                if !collection.file_type().is_dir() {
                    continue;
                }
                collections += 1;
                let name = collection.file_name().to_string_lossy();
                let parsed = CollectionName::parse(&name);
                if let Some(id) = parsed.id() {
                    ids.entry(id.to_string())
                        .or_default()
                        .push(collection.path().to_path_buf());
                }
                self.check_collection(collection.path(), &parsed, &mut report)?;
            }

            report.collections += collections;
            if collections == 0 {
                report.record(Defect::EmptyModelDirectory {
                    path: model.path().to_path_buf(),
                });
                report.remedy(
                    DefectKind::EmptyModelDirectory,
                    Remediation::Prune {
                        dir: model.path().to_path_buf(),
                        markers: self.config.marker_files.clone(),
                    },
                );
            }
        }

        self.check_duplicate_ids(root, ids, &mut report);
        Ok(report)
    }

    fn check_collection(
        &self,
        path: &Path,
        parsed: &CollectionName,
        report: &mut AuditReport,
    ) -> Result<()> {
        let expected = match parsed {
            CollectionName::MissingId => {
                report.record(Defect::MissingId {
                    path: path.to_path_buf(),
                });
                PvCount::default()
            }
            CollectionName::MissingCounts { .. } => {
                report.record(Defect::MissingPvCount {
                    path: path.to_path_buf(),
                });
                PvCount::default()
            }
            CollectionName::Complete { expected, .. } => *expected,
        };

        let entries = list_dir(path)?;
        if entries.is_empty() {
            report.record(Defect::NoMediaFiles {
                path: path.to_path_buf(),
            });
            return Ok(());
        }

        let mut found = PvCount::default();
        let mut unknown = Vec::new();
        let mut sizes: BTreeMap<u64, usize> = BTreeMap::new();
        for entry in &entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            match FileClass::of(&name) {
                FileClass::Hidden | FileClass::Sidecar => continue,
                FileClass::Photo => found.photos += 1,
                FileClass::Video => found.videos += 1,
                FileClass::Unknown => unknown.push(name),
            }
            *sizes.entry(entry.metadata()?.len()).or_default() += 1;
        }

        if !unknown.is_empty() {
            report.record(Defect::UnexpectedFileType {
                path: path.to_path_buf(),
                files: unknown,
            });
        }

        if expected.total() > 0 {
            // A single missing photo is tolerated; videos must match exactly.
            let photo_shortfall = i64::from(expected.photos) - i64::from(found.photos);
            if photo_shortfall > 1 || expected.videos != found.videos {
                if let Some(id) = parsed.id() {
                    report.record(Defect::IncompletePvCount {
                        path: path.to_path_buf(),
                        id: id.to_string(),
                        expected,
                        found,
                    });
                    report.remedy(
                        DefectKind::IncompletePvCount,
                        Remediation::Refetch {
                            id: id.to_string(),
                            dir: path.to_path_buf(),
                        },
                    );
                }
                return Ok(());
            }
        }

        let media = found.total() as usize;
        let mut clustered = false;
        for (&size, &count) in &sizes {
            if (count > 1 && size < self.config.small_file_threshold) || count * 2 >= media {
                report.record(Defect::DuplicateFileSizeCluster {
                    path: path.to_path_buf(),
                    size,
                    count,
                });
                clustered = true;
            }
        }
        // Without an id the cleared collection could not be fetched again.
        if let (true, Some(id)) = (clustered, parsed.id()) {
            report.remedy(
                DefectKind::DuplicateFileSizeCluster,
                Remediation::ClearFiles {
                    id: id.to_string(),
                    dir: path.to_path_buf(),
                },
            );
        }
        Ok(())
    }

    fn check_model_prefix(
        &self,
        root: &Path,
        path: &Path,
        name: &str,
        report: &mut AuditReport,
    ) {
        let Some(prefix) = self
            .config
            .misfiled_prefixes
            .iter()
            .find(|prefix| is_decorated(name, prefix))
        else {
            return;
        };

        report.record(Defect::MisfiledModelPrefix {
            path: path.to_path_buf(),
            prefix: prefix.clone(),
        });
        let target = root.join(prefix).join(name);
        if target.exists() {
            log::warn!(
                "Skipping move of {}: {} already exists",
                path.display(),
                target.display()
            );
            return;
        }
        report.remedy(
            DefectKind::MisfiledModelPrefix,
            Remediation::Move {
                from: path.to_path_buf(),
                to: target,
            },
        );
    }

    fn check_duplicate_ids(
        &self,
        root: &Path,
        ids: BTreeMap<String, Vec<PathBuf>>,
        report: &mut AuditReport,
    ) {
        for (id, paths) in ids {
            let models: BTreeSet<&Path> = paths.iter().filter_map(|p| p.parent()).collect();
            if models.len() < 2 {
                continue;
            }
            if let [a, b] = paths.as_slice() {
                let marker = self.config.not_applicable_marker.as_str();
                let merge = match (has_segment(root, a, marker), has_segment(root, b, marker)) {
                    (true, false) => Some((a, b)),
                    (false, true) => Some((b, a)),
                    _ => None,
                };
                if let Some((from, into)) = merge {
                    report.remedy(
                        DefectKind::DuplicateIdAcrossDirs,
                        Remediation::Merge {
                            from: from.clone(),
                            into: into.clone(),
                        },
                    );
                }
            }
            report.record(Defect::DuplicateIdAcrossDirs { id, paths });
        }
    }
}

/// `name` is `prefix` followed by a non-alphanumeric separator and more text.
fn is_decorated(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_alphanumeric())
}

/// Whether a path below `root` has a component equal to `segment`.
fn has_segment(root: &Path, path: &Path, segment: &str) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| matches!(c, Component::Normal(s) if s == segment))
}

/// Direct children of a directory, sorted by name.
fn list_dir(path: &Path) -> Result<Vec<DirEntry>> {
    WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_files(dir: &Path, files: &[(&str, usize)]) {
        fs::create_dir_all(dir).unwrap();
        for (name, size) in files {
            fs::write(dir.join(name), vec![0u8; *size]).unwrap();
        }
    }

    /// `n` photos of distinct, large sizes.
    fn photos(n: usize) -> Vec<(String, usize)> {
        (0..n).map(|i| (format!("{i:03}.jpg"), 40_000 + i)).collect()
    }

    fn collection(root: &Path, model: &str, name: &str, photo_count: usize, videos: usize) -> PathBuf {
        let dir = root.join(model).join(name);
        let mut files = photos(photo_count);
        files.extend((0..videos).map(|i| (format!("v{i}.mp4"), 90_000 + i)));
        let refs: Vec<(&str, usize)> = files.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        write_files(&dir, &refs);
        dir
    }

    fn audit(root: &Path) -> AuditReport {
        let config = AuditConfig::default();
        Auditor::new(&config).audit(root).unwrap()
    }

    #[test]
    fn test_parse_collection_name() {
        assert_eq!(
            CollectionName::parse("Foo-10P2V-555"),
            CollectionName::Complete {
                id: "555".into(),
                expected: PvCount::new(10, 2)
            }
        );
        assert_eq!(
            CollectionName::parse("Some-Title-48P-abc"),
            CollectionName::Complete {
                id: "abc".into(),
                expected: PvCount::new(48, 0)
            }
        );
        assert_eq!(
            CollectionName::parse("Title-999"),
            CollectionName::MissingCounts { id: "999".into() }
        );
        assert_eq!(
            CollectionName::parse("Foo-bar-999"),
            CollectionName::MissingCounts { id: "999".into() }
        );
        assert_eq!(CollectionName::parse("NoDashes"), CollectionName::MissingId);
    }

    #[test]
    fn test_incomplete_shortfall_of_two() {
        let tmp = TempDir::new().unwrap();
        collection(tmp.path(), "Foo", "Foo-10P2V-555", 8, 2);

        let report = audit(tmp.path());
        let defects = report.defects_of(DefectKind::IncompletePvCount);
        assert_eq!(defects.len(), 1);
        assert_eq!(
            report.remediations_of(DefectKind::IncompletePvCount),
            &[Remediation::Refetch {
                id: "555".into(),
                dir: tmp.path().join("Foo/Foo-10P2V-555"),
            }]
        );
        assert!(report.defects_of(DefectKind::DuplicateFileSizeCluster).is_empty());
    }

    #[test]
    fn test_shortfall_of_one_tolerated() {
        let tmp = TempDir::new().unwrap();
        collection(tmp.path(), "Foo", "Foo-10P2V-555", 9, 2);

        let report = audit(tmp.path());
        assert!(report.defects.is_empty(), "{:?}", report.defects);
        assert_eq!(report.collections, 1);
    }

    #[test]
    fn test_video_mismatch_is_exact() {
        let tmp = TempDir::new().unwrap();
        collection(tmp.path(), "Foo", "Foo-3P2V-7", 3, 1);

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::IncompletePvCount).len(), 1);
    }

    #[test]
    fn test_empty_collection_is_only_no_media() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("Foo/Foo-10P2V-1")).unwrap();

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::NoMediaFiles).len(), 1);
        assert!(report.defects_of(DefectKind::IncompletePvCount).is_empty());
        assert!(report.defects_of(DefectKind::DuplicateFileSizeCluster).is_empty());
        assert!(report.remediations.is_empty());
    }

    #[test]
    fn test_unknown_files_recorded_alongside_incomplete() {
        let tmp = TempDir::new().unwrap();
        let dir = collection(tmp.path(), "Foo", "Foo-10P0V-2", 5, 0);
        write_files(&dir, &[("part.webp", 10), ("info.json", 3), (".hidden", 1)]);

        let report = audit(tmp.path());
        assert_eq!(
            report.defects_of(DefectKind::UnexpectedFileType),
            &[Defect::UnexpectedFileType {
                path: dir.clone(),
                files: vec!["part.webp".into()],
            }]
        );
        assert_eq!(report.defects_of(DefectKind::IncompletePvCount).len(), 1);
    }

    #[test]
    fn test_small_duplicate_sizes_cluster() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Foo/Foo-6P0V-9");
        write_files(
            &dir,
            &[
                ("1.jpg", 100),
                ("2.jpg", 100),
                ("3.jpg", 50_001),
                ("4.jpg", 50_002),
                ("5.jpg", 50_003),
                ("6.jpg", 50_004),
            ],
        );

        let report = audit(tmp.path());
        assert_eq!(
            report.defects_of(DefectKind::DuplicateFileSizeCluster),
            &[Defect::DuplicateFileSizeCluster {
                path: dir.clone(),
                size: 100,
                count: 2,
            }]
        );
        assert_eq!(
            report.remediations_of(DefectKind::DuplicateFileSizeCluster),
            &[Remediation::ClearFiles {
                id: "9".into(),
                dir
            }]
        );
    }

    #[test]
    fn test_dominant_size_bucket_clusters() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Foo/Foo-4P0V-9");
        write_files(
            &dir,
            &[
                ("1.jpg", 60_000),
                ("2.jpg", 60_000),
                ("3.jpg", 70_000),
                ("4.jpg", 80_000),
            ],
        );

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::DuplicateFileSizeCluster).len(), 1);
        assert_eq!(report.remediations_of(DefectKind::DuplicateFileSizeCluster).len(), 1);
    }

    #[test]
    fn test_malformed_names_do_not_stop_scan() {
        let tmp = TempDir::new().unwrap();
        collection(tmp.path(), "Foo", "NoId", 3, 0);
        collection(tmp.path(), "Foo", "Title-55", 3, 0);
        collection(tmp.path(), "Foo", "Foo-4P0V-8", 4, 0);

        let report = audit(tmp.path());
        assert_eq!(report.collections, 3);
        assert_eq!(report.defects_of(DefectKind::MissingId).len(), 1);
        assert_eq!(report.defects_of(DefectKind::MissingPvCount).len(), 1);
    }

    #[test]
    fn test_duplicate_id_with_single_na_copy_merges() {
        let tmp = TempDir::new().unwrap();
        let na = collection(tmp.path(), "NA", "Set-4P0V-42", 4, 0);
        let named = collection(tmp.path(), "Alice", "Set-4P0V-42", 4, 0);

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::DuplicateIdAcrossDirs).len(), 1);
        assert_eq!(
            report.remediations_of(DefectKind::DuplicateIdAcrossDirs),
            &[Remediation::Merge { from: na, into: named }]
        );
    }

    #[test]
    fn test_duplicate_id_without_na_is_report_only() {
        let tmp = TempDir::new().unwrap();
        collection(tmp.path(), "Alice", "Set-4P0V-42", 4, 0);
        collection(tmp.path(), "Bob", "Set-4P0V-42", 4, 0);

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::DuplicateIdAcrossDirs).len(), 1);
        assert!(report.remediations_of(DefectKind::DuplicateIdAcrossDirs).is_empty());
    }

    #[test]
    fn test_shared_id_within_one_model_is_not_duplicate() {
        let tmp = TempDir::new().unwrap();
        collection(tmp.path(), "Alice", "A-1P0V-42", 1, 0);
        collection(tmp.path(), "Alice", "B-1P0V-42", 1, 0);

        let report = audit(tmp.path());
        assert!(report.defects_of(DefectKind::DuplicateIdAcrossDirs).is_empty());
    }

    #[test]
    fn test_huge_counts_in_name_do_not_abort_scan() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Foo/x-4294967295P1V-1");
        write_files(&dir, &[("a.jpg", 40_000)]);
        collection(tmp.path(), "Foo", "y-2P0V-2", 2, 0);

        let report = audit(tmp.path());
        assert_eq!(report.collections, 2);
        assert_eq!(
            report.defects_of(DefectKind::IncompletePvCount),
            &[Defect::IncompletePvCount {
                path: dir,
                id: "1".into(),
                expected: PvCount::new(u32::MAX, 1),
                found: PvCount::new(1, 0),
            }]
        );
    }

    #[test]
    fn test_size_cluster_without_id_is_report_only() {
        let tmp = TempDir::new().unwrap();
        write_files(
            &tmp.path().join("Foo/untitled"),
            &[("1.jpg", 100), ("2.jpg", 100), ("3.jpg", 50_001)],
        );

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::DuplicateFileSizeCluster).len(), 1);
        assert!(report.remediations_of(DefectKind::DuplicateFileSizeCluster).is_empty());
    }

    #[test]
    fn test_misfiled_prefix_moves_under_bare_prefix() {
        let tmp = TempDir::new().unwrap();
        collection(tmp.path(), "NA (2)", "Set-4P0V-1", 4, 0);
        collection(tmp.path(), "NAOMI", "Set-4P0V-2", 4, 0);

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::MisfiledModelPrefix).len(), 1);
        assert_eq!(
            report.remediations_of(DefectKind::MisfiledModelPrefix),
            &[Remediation::Move {
                from: tmp.path().join("NA (2)"),
                to: tmp.path().join("NA").join("NA (2)"),
            }]
        );
    }

    #[test]
    fn test_misfiled_prefix_skips_existing_target() {
        let tmp = TempDir::new().unwrap();
        collection(tmp.path(), "NA_old", "Set-4P0V-1", 4, 0);
        fs::create_dir_all(tmp.path().join("NA/NA_old")).unwrap();

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::MisfiledModelPrefix).len(), 1);
        assert!(report.remediations_of(DefectKind::MisfiledModelPrefix).is_empty());
    }

    #[test]
    fn test_empty_model_directory() {
        let tmp = TempDir::new().unwrap();
        write_files(&tmp.path().join("Ghost"), &[(".DS_Store", 4)]);

        let report = audit(tmp.path());
        assert_eq!(report.defects_of(DefectKind::EmptyModelDirectory).len(), 1);
        match &report.remediations_of(DefectKind::EmptyModelDirectory)[0] {
            Remediation::Prune { dir, markers } => {
                assert_eq!(dir, &tmp.path().join("Ghost"));
                assert!(markers.contains(&".DS_Store".to_string()));
            }
            other => panic!("unexpected remediation: {other:?}"),
        }
    }

    #[test]
    fn test_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let config = AuditConfig::default();
        assert!(Auditor::new(&config).audit(&tmp.path().join("xc_p")).is_err());
    }
}
