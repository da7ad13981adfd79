// src/pipeline/sync.rs

//! Download synchronization pipeline.

use std::path::PathBuf;

use crate::error::Result;
use crate::models::{ChannelId, Config, Workspace};
use crate::services::{Frontier, ScriptOptions, ScriptWriter, write_failed};
use crate::storage::{UrlArchive, rebuild_all};

/// Listings walked by the photo run mode.
pub const PHOTO_LISTINGS: [&str; 2] = [
    "https://xchina.co/photos/kind-1.html",
    "https://xchina.co/photos/kind-2.html",
];

/// Resolve seeds, update the archives and write one script per channel.
pub fn run_sync(
    config: &Config,
    workspace: &Workspace,
    seeds: &[String],
    recent_only: bool,
) -> Result<Vec<PathBuf>> {
    let frontier = Frontier::new(workspace, &config.frontier);
    let resolution = frontier.resolve(seeds, recent_only)?;
    write_failed(workspace, &resolution.failed)?;

    for channel in ChannelId::ALL {
        log::info!("Tasks {}: {}", channel, resolution.tasks.count(channel));
    }

    let writer = ScriptWriter::new(workspace, &config.downloader);
    writer.write_all(&resolution.tasks, &ScriptOptions::new("sync"))
}

/// Rebuild playlist archives, then re-sync every known collection.
pub fn run_lists(
    config: &Config,
    workspace: &Workspace,
    recent_only: bool,
) -> Result<Vec<PathBuf>> {
    rebuild_all(workspace, None)?;

    let seeds: Vec<String> = UrlArchive::new(workspace.lists_file())
        .load()?
        .into_iter()
        .collect();
    log::info!("Re-syncing {} lists (recent only: {})", seeds.len(), recent_only);
    run_sync(config, workspace, &seeds, recent_only)
}

/// Sync the most recent photo listings.
pub fn run_photo(config: &Config, workspace: &Workspace) -> Result<Vec<PathBuf>> {
    let seeds: Vec<String> = PHOTO_LISTINGS.iter().map(|s| s.to_string()).collect();
    run_sync(config, workspace, &seeds, true)
}

/// Rebuild the playlist archives of all channels or of one.
pub fn run_playlist(workspace: &Workspace, only: Option<ChannelId>) -> Result<usize> {
    let counts = rebuild_all(workspace, only)?;
    Ok(counts.iter().map(|(_, count)| count).sum())
}

/// Validate configuration and report the resolved layout.
pub fn run_validate(config: &Config, workspace: &Workspace) -> Result<()> {
    config.validate()?;
    log::info!("Config root: {}", workspace.config_root().display());
    log::info!("Data root: {}", workspace.data_root().display());
    for channel in ChannelId::ALL {
        let dir = workspace.channel_dir(channel);
        if !dir.is_dir() {
            log::warn!("Channel directory missing: {}", dir.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config, Workspace) {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let ws = Workspace::new(tmp.path(), &config);
        (tmp, config, ws)
    }

    #[test]
    fn test_run_sync_writes_scripts_and_archives() {
        let (_tmp, config, ws) = setup();
        let seeds = vec![
            "https://xchina.co/photo/id-777.html".to_string(),
            "https://example.com/nope".to_string(),
        ];

        let scripts = run_sync(&config, &ws, &seeds, false).unwrap();
        assert_eq!(scripts.len(), 1);
        let script = fs::read_to_string(&scripts[0]).unwrap();
        assert!(script.contains("https://xchina.co/photo/id-777.html"));

        assert_eq!(
            fs::read_to_string(ws.failed_file()).unwrap(),
            "https://example.com/nope\n"
        );
        assert!(ws.items_file().exists());
    }

    #[test]
    fn test_run_sync_nothing_to_do() {
        let (_tmp, config, ws) = setup();
        let scripts = run_sync(&config, &ws, &[], false).unwrap();
        assert!(scripts.is_empty());
        assert!(!ws.failed_file().exists());
    }

    #[test]
    fn test_run_lists_reads_lists_archive() {
        let (_tmp, config, ws) = setup();
        fs::create_dir_all(ws.config_root()).unwrap();
        fs::write(ws.lists_file(), "https://xbbs.me/forum/id-3.html\n\n").unwrap();

        let scripts = run_lists(&config, &ws, true).unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(ws.playlist_archive(ChannelId::Thread).exists());
    }

    #[test]
    fn test_run_validate_rejects_bad_config() {
        let (_tmp, mut config, ws) = setup();
        assert!(run_validate(&config, &ws).is_ok());

        config.downloader.program = " ".into();
        assert!(run_validate(&config, &ws).is_err());
    }
}
