//! Resolved on-disk layout of a work directory.
//!
//! ```text
//! {work_dir}/
//! ├── pagemirror.toml             # Optional configuration
//! ├── conf/                       # Configuration root
//! │   ├── lists.txt               # Collection entry points
//! │   ├── items.txt               # Leaf items
//! │   ├── failed.txt              # Unsupported seeds of the last run
//! │   ├── downloaded_{sid}.txt    # Downloader completion log
//! │   └── pl_archive_{sid}.txt    # Playlist archive (+ _*.txt shards)
//! ├── bin/                        # Generated scripts
//! └── {sid}/                      # Mirrored content per channel
//! ```

use std::path::{Path, PathBuf};

use crate::models::{ChannelId, Config};

pub const CONFIG_FILE: &str = "pagemirror.toml";

const LISTS_FILE: &str = "lists.txt";
const ITEMS_FILE: &str = "items.txt";
const FAILED_FILE: &str = "failed.txt";
const FIX_ARCHIVE_FILE: &str = "fix-downloaded.txt";
const SCAN_REPORT_FILE: &str = "scan_report.json";

/// Concrete paths derived from the work directory and configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    work_dir: PathBuf,
    config_root: PathBuf,
    data_root: PathBuf,
}

impl Workspace {
    pub fn new(work_dir: impl Into<PathBuf>, config: &Config) -> Self {
        let work_dir = work_dir.into();
        Self {
            config_root: work_dir.join(&config.paths.config_root),
            data_root: work_dir.join(&config.paths.data_root),
            work_dir,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn config_root(&self) -> &Path {
        &self.config_root
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.work_dir.join("bin")
    }

    pub fn lists_file(&self) -> PathBuf {
        self.config_root.join(LISTS_FILE)
    }

    pub fn items_file(&self) -> PathBuf {
        self.config_root.join(ITEMS_FILE)
    }

    pub fn failed_file(&self) -> PathBuf {
        self.config_root.join(FAILED_FILE)
    }

    pub fn fix_archive_file(&self) -> PathBuf {
        self.config_root.join(FIX_ARCHIVE_FILE)
    }

    pub fn scan_report_file(&self) -> PathBuf {
        self.config_root.join(SCAN_REPORT_FILE)
    }

    /// The downloader's completion log for a channel.
    pub fn source_archive(&self, channel: ChannelId) -> PathBuf {
        self.config_root.join(format!("downloaded_{}.txt", channel.sid()))
    }

    /// The rebuilt playlist archive for a channel.
    pub fn playlist_archive(&self, channel: ChannelId) -> PathBuf {
        self.config_root.join(format!("pl_archive_{}.txt", channel.sid()))
    }

    /// Mirror directory of a channel.
    pub fn channel_dir(&self, channel: ChannelId) -> PathBuf {
        self.data_root.join(channel.sid())
    }

    /// Default downloader output template of a channel.
    pub fn output_template(&self, channel: ChannelId) -> String {
        format!(
            "{}/{}",
            self.channel_dir(channel).display(),
            channel.output_template()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let ws = Workspace::new("/w", &Config::default());
        assert_eq!(ws.lists_file(), PathBuf::from("/w/conf/lists.txt"));
        assert_eq!(
            ws.playlist_archive(ChannelId::Video),
            PathBuf::from("/w/conf/pl_archive_xc_v.txt")
        );
        assert_eq!(
            ws.source_archive(ChannelId::Thread),
            PathBuf::from("/w/conf/downloaded_xbbs.txt")
        );
        assert_eq!(ws.channel_dir(ChannelId::Photo), PathBuf::from("/w/./xc_p"));
    }

    #[test]
    fn test_custom_roots() {
        let mut config = Config::default();
        config.paths.config_root = "state".into();
        config.paths.data_root = "/mnt/mirror".into();

        let ws = Workspace::new("/w", &config);
        assert_eq!(ws.items_file(), PathBuf::from("/w/state/items.txt"));
        assert_eq!(ws.channel_dir(ChannelId::Photo), PathBuf::from("/mnt/mirror/xc_p"));
        assert_eq!(
            ws.output_template(ChannelId::Video),
            "/mnt/mirror/xc_v/%(uploader)s/%(title)s-%(id)s.%(ext)s"
        );
    }
}
