//! Download channels and the tasks queued for them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One of the three download channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    /// Photo sets from the gallery site
    #[serde(rename = "xc_p")]
    Photo,
    /// Videos from the gallery site
    #[serde(rename = "xc_v")]
    Video,
    /// Forum threads
    #[serde(rename = "xbbs")]
    Thread,
}

impl ChannelId {
    pub const ALL: [ChannelId; 3] = [ChannelId::Photo, ChannelId::Video, ChannelId::Thread];

    /// Short identifier used in file names and on the command line.
    pub fn sid(self) -> &'static str {
        match self {
            ChannelId::Photo => "xc_p",
            ChannelId::Video => "xc_v",
            ChannelId::Thread => "xbbs",
        }
    }

    /// Extractor name, which is also the line prefix in the downloader's completion log.
    pub fn extractor(self) -> &'static str {
        match self {
            ChannelId::Photo => "xchinaphoto",
            ChannelId::Video => "xchinavideo",
            ChannelId::Thread => "xbbsthread",
        }
    }

    /// Downloader output template, relative to the channel directory.
    pub fn output_template(self) -> &'static str {
        match self {
            ChannelId::Photo => {
                "%(uploader)s/%(playlist_title)s-%(playlist_id)s/%(title)s.%(ext)s"
            }
            ChannelId::Video => "%(uploader)s/%(title)s-%(id)s.%(ext)s",
            ChannelId::Thread => {
                "%(playlist_title)s/%(playlist_index)s-%(playlist_id)s.%(ext)s"
            }
        }
    }

    /// Canonical item URL pattern; `%s` is replaced by the item id.
    pub fn url_format(self) -> &'static str {
        match self {
            ChannelId::Photo => "https://xchina.co/photo/id-%s.html",
            ChannelId::Video => "https://xchina.co/video/id-%s.html",
            ChannelId::Thread => "https://xbbs.me/thread/id-%s.html",
        }
    }

    /// Canonical URL of one item.
    pub fn item_url(self, id: &str) -> String {
        self.url_format().replacen("%s", id, 1)
    }

    /// File-name part of the output template (from the last `/`).
    pub fn file_template(self) -> &'static str {
        let template = self.output_template();
        &template[template.rfind('/').unwrap_or(0)..]
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sid())
    }
}

impl FromStr for ChannelId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelId::ALL
            .into_iter()
            .find(|c| c.sid() == s.trim())
            .ok_or_else(|| AppError::invalid("channel", s))
    }
}

/// A single invocation of the external downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTask {
    /// Target URL, possibly carrying archive and batch-limit query parameters
    pub url: String,

    /// Output template overriding the channel default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_template: Option<String>,

    /// Extra downloader arguments for this task only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_template: None,
            args: Vec::new(),
        }
    }

    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }
}

/// Pending tasks of one channel keyed by canonical URL.
///
/// Iteration is in ascending key order, which is the order scripts run them.
pub type TaskMap = BTreeMap<String, DownloadTask>;

/// Pending tasks of every channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelTasks {
    tasks: BTreeMap<ChannelId, TaskMap>,
}

impl ChannelTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; a later task with the same key replaces the earlier one.
    pub fn insert(&mut self, channel: ChannelId, key: impl Into<String>, task: DownloadTask) {
        self.tasks
            .entry(channel)
            .or_default()
            .insert(key.into(), task);
    }

    /// Tasks of one channel, if any were registered.
    pub fn get(&self, channel: ChannelId) -> Option<&TaskMap> {
        self.tasks.get(&channel)
    }

    /// Merge another set of tasks into this one, later entries winning.
    pub fn merge(&mut self, other: ChannelTasks) {
        for (channel, tasks) in other.tasks {
            self.tasks.entry(channel).or_default().extend(tasks);
        }
    }

    /// Non-empty channels in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &TaskMap)> {
        self.tasks
            .iter()
            .filter(|(_, tasks)| !tasks.is_empty())
            .map(|(channel, tasks)| (*channel, tasks))
    }

    /// Number of tasks queued for one channel.
    pub fn count(&self, channel: ChannelId) -> usize {
        self.get(channel).map_or(0, |tasks| tasks.len())
    }

    /// Total number of tasks across channels.
    pub fn len(&self) -> usize {
        self.tasks.values().map(|tasks| tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_str() {
        assert_eq!("xc_p".parse::<ChannelId>().unwrap(), ChannelId::Photo);
        assert_eq!(" xbbs ".parse::<ChannelId>().unwrap(), ChannelId::Thread);
        assert!("xc_x".parse::<ChannelId>().is_err());
    }

    #[test]
    fn test_item_url_and_file_template() {
        assert_eq!(
            ChannelId::Photo.item_url("555"),
            "https://xchina.co/photo/id-555.html"
        );
        assert_eq!(ChannelId::Photo.file_template(), "/%(title)s.%(ext)s");
    }

    #[test]
    fn test_tasks_last_write_wins_and_sorted() {
        let mut tasks = ChannelTasks::new();
        tasks.insert(ChannelId::Photo, "b", DownloadTask::new("first"));
        tasks.insert(ChannelId::Photo, "a", DownloadTask::new("x"));
        tasks.insert(ChannelId::Photo, "b", DownloadTask::new("second"));

        let photo = tasks.get(ChannelId::Photo).unwrap();
        let keys: Vec<_> = photo.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(photo["b"].url, "second");
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_merge_keeps_both_channels() {
        let mut left = ChannelTasks::new();
        left.insert(ChannelId::Video, "v", DownloadTask::new("v"));
        let mut right = ChannelTasks::new();
        right.insert(ChannelId::Photo, "p", DownloadTask::new("p"));

        left.merge(right);
        assert_eq!(left.count(ChannelId::Video), 1);
        assert_eq!(left.count(ChannelId::Photo), 1);
        assert_eq!(left.iter().count(), 2);
    }
}
