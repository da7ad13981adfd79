// src/pipeline/scan.rs

//! Mirror audit and repair pipeline.

use std::path::PathBuf;

use crate::error::Result;
use crate::models::{ChannelId, Config, DefectKind, Remediation, Stage, Workspace};
use crate::services::{
    AuditReport, Auditor, RepairPlan, ScriptOptions, ScriptWriter, plan, write_fix_script,
};
use crate::utils::fs::{remove_if_exists, save_json};

const STRUCTURE_SCRIPT: &str = "fix-structure.sh";
const CLEAR_SCRIPT: &str = "fix-dup.sh";

/// Everything one scan produced.
#[derive(Debug)]
pub struct ScanOutcome {
    pub report: AuditReport,
    pub plan: RepairPlan,
    /// Repair scripts meant for review before running
    pub fix_scripts: Vec<PathBuf>,
    /// Downloader scripts re-fetching incomplete collections
    pub download_scripts: Vec<PathBuf>,
}

/// Audit the photo mirror, save the report and emit the next repair stage.
pub fn run_scan(config: &Config, workspace: &Workspace) -> Result<ScanOutcome> {
    let channel = ChannelId::Photo;
    let root = workspace.channel_dir(channel);
    log::info!("Scanning {}", root.display());

    let report = Auditor::new(&config.audit).audit(&root)?;
    save_json(&workspace.scan_report_file(), &report)?;
    log::info!("Saved report --> {}", workspace.scan_report_file().display());
    report.log_summary();

    let plan = plan(&report, channel);
    let mut fix_scripts = Vec::new();
    let mut download_scripts = Vec::new();

    match plan.stage {
        Some(Stage::Structural) => {
            let path = workspace.bin_dir().join(STRUCTURE_SCRIPT);
            write_fix_script(&path, &plan.batches)?;
            fix_scripts.push(path);
        }
        Some(Stage::Content) => {
            let clearing: Vec<_> = plan
                .batches
                .iter()
                .filter(|b| {
                    b.actions
                        .iter()
                        .any(|a| matches!(a, Remediation::ClearFiles { .. }))
                })
                .cloned()
                .collect();
            if !clearing.is_empty() {
                let path = workspace.bin_dir().join(CLEAR_SCRIPT);
                write_fix_script(&path, &clearing)?;
                fix_scripts.push(path);
            }

            if !plan.tasks.is_empty() {
                let archive = workspace.fix_archive_file();
                remove_if_exists(&archive)?;
                let options = ScriptOptions {
                    download_archive: Some(archive),
                    update_playlist: false,
                    ..ScriptOptions::new("fix")
                };
                let writer = ScriptWriter::new(workspace, &config.downloader);
                download_scripts = writer.write_all(&plan.tasks, &options)?;
            }
        }
        None => {}
    }

    if let Some(batch) = plan.batch(DefectKind::IncompletePvCount) {
        log::info!("Re-fetching {} incomplete collections", batch.actions.len());
    }

    Ok(ScanOutcome {
        report,
        plan,
        fix_scripts,
        download_scripts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(path: &Path, size: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![b'x'; size]).unwrap();
    }

    fn setup() -> (TempDir, Config, Workspace) {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let ws = Workspace::new(tmp.path(), &config);
        (tmp, config, ws)
    }

    #[test]
    fn test_scan_structural_stage() {
        let (_tmp, config, ws) = setup();
        let root = ws.channel_dir(ChannelId::Photo);
        fs::create_dir_all(root.join("Empty")).unwrap();
        touch(&root.join("Foo/Foo-2P0V-555/1.jpg"), 40_000);
        touch(&root.join("Foo/Foo-2P0V-555/2.jpg"), 50_000);

        let outcome = run_scan(&config, &ws).unwrap();
        assert_eq!(outcome.plan.stage, Some(Stage::Structural));
        assert_eq!(outcome.fix_scripts, vec![ws.bin_dir().join(STRUCTURE_SCRIPT)]);
        assert!(outcome.download_scripts.is_empty());
        assert!(ws.scan_report_file().exists());

        let script = fs::read_to_string(&outcome.fix_scripts[0]).unwrap();
        assert!(script.contains("rmdir"));
    }

    #[test]
    fn test_scan_content_stage_refetches() {
        let (_tmp, config, ws) = setup();
        let root = ws.channel_dir(ChannelId::Photo);
        let dir = root.join("Foo/Foo-10P2V-555");
        for i in 0..8 {
            touch(&dir.join(format!("{i}.jpg")), 40_000 + i);
        }
        touch(&dir.join("a.mp4"), 900_000);
        touch(&dir.join("b.mp4"), 900_001);
        fs::create_dir_all(ws.config_root()).unwrap();
        fs::write(ws.fix_archive_file(), "stale\n").unwrap();

        let outcome = run_scan(&config, &ws).unwrap();
        assert_eq!(outcome.plan.stage, Some(Stage::Content));
        assert!(outcome.fix_scripts.is_empty());
        assert_eq!(outcome.download_scripts.len(), 1);
        assert!(!ws.fix_archive_file().exists());

        let script = fs::read_to_string(&outcome.download_scripts[0]).unwrap();
        assert!(script.contains("id-555.html?force_iter=1"));
        assert!(script.contains("fix-downloaded.txt"));
        assert!(!script.contains("pagemirror playlist"));
    }

    #[test]
    fn test_scan_clears_and_refetches_size_cluster() {
        let (_tmp, config, ws) = setup();
        let dir = ws.channel_dir(ChannelId::Photo).join("Foo/Foo-4P0V-9");
        touch(&dir.join("1.jpg"), 60_000);
        touch(&dir.join("2.jpg"), 60_000);
        touch(&dir.join("3.jpg"), 70_000);
        touch(&dir.join("4.jpg"), 80_000);

        let outcome = run_scan(&config, &ws).unwrap();
        assert_eq!(outcome.plan.stage, Some(Stage::Content));
        assert_eq!(outcome.fix_scripts, vec![ws.bin_dir().join(CLEAR_SCRIPT)]);
        assert_eq!(outcome.download_scripts.len(), 1);

        let script = fs::read_to_string(&outcome.download_scripts[0]).unwrap();
        assert!(script.contains("id-9.html?force_iter=1"));
        assert!(script.contains("Foo-4P0V-9/%(title)s.%(ext)s"));
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let (_tmp, config, ws) = setup();
        assert!(run_scan(&config, &ws).is_err());
    }
}
