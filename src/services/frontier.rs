//! Breadth-first resolution of seed URLs into download tasks.
//!
//! Models expand into their photo and video listings; listings and items
//! become tasks on their channel. Processing order only affects efficiency,
//! because model expansion is the only step that produces new work and it is
//! one level deep.

use std::collections::VecDeque;
use std::path::Path;

use crate::error::Result;
use crate::models::{
    ChannelId, ChannelTasks, DownloadTask, FrontierConfig, ResourceKind, Workspace, classify,
    get_model_pv_urls,
};
use crate::storage::{ArchiveStore, ArchiveSummary};
use crate::utils::fs::{read_plain_urls, write_plain_urls};
use crate::utils::url::with_query;

/// Query parameter naming the playlist archive for the downloader.
const ARCHIVE_PARAM: &str = "archive";

/// Query parameter capping how many items of a listing are walked.
const BATCH_LIMIT_PARAM: &str = "abcm";

/// Tasks and archive candidates produced from one set of seeds.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub tasks: ChannelTasks,
    /// Seeds and expansions that could not be classified
    pub failed: Vec<String>,
    /// Candidates for the lists archive
    pub lists: Vec<String>,
    /// Candidates for the items archive
    pub items: Vec<String>,
}

/// Result of a full resolve, after the archives were updated.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub tasks: ChannelTasks,
    pub failed: Vec<String>,
    pub archives: ArchiveSummary,
}

/// Resolves seed URLs against a workspace.
pub struct Frontier<'a> {
    workspace: &'a Workspace,
    config: &'a FrontierConfig,
}

impl<'a> Frontier<'a> {
    pub fn new(workspace: &'a Workspace, config: &'a FrontierConfig) -> Self {
        Self { workspace, config }
    }

    /// Classify and expand seeds without touching the archives.
    pub fn expand(&self, seeds: &[String], recent_only: bool) -> Expansion {
        let mut out = Expansion::default();
        let mut todo: VecDeque<String> = seeds
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        while let Some(url) = todo.pop_front() {
            let Some(resource) = classify(&url) else {
                log::warn!("Unsupported URL: {}", url);
                out.failed.push(url);
                continue;
            };

            match resource.kind {
                ResourceKind::Model => {
                    if let Some(model_id) = resource.model_id.as_deref() {
                        let (photos, videos) = get_model_pv_urls(model_id);
                        log::debug!("Model {} -> {}, {}", model_id, photos, videos);
                        todo.push_back(photos);
                        todo.push_back(videos);
                    }
                }
                kind if kind.is_collection() => {
                    let channel = channel_of(kind);
                    let page = resource.page_end();
                    let key = if recent_only {
                        page.first_page.clone()
                    } else {
                        page.deep_link.clone()
                    };
                    let task = DownloadTask::new(self.listing_url(&key, channel, recent_only));
                    out.tasks.insert(channel, key, task);
                    out.lists
                        .push(resource.model_url().unwrap_or(page.first_page));
                }
                kind => {
                    let channel = channel_of(kind);
                    let first_page = resource.page_end().first_page;
                    out.tasks
                        .insert(channel, first_page.clone(), DownloadTask::new(&first_page));
                    out.items.push(first_page);
                }
            }
        }

        out
    }

    /// Expand seeds and merge the observed URLs into the archives.
    pub fn resolve(&self, seeds: &[String], recent_only: bool) -> Result<Resolution> {
        log::info!(
            "Syncing {} urls with work dir: {}",
            seeds.len(),
            self.workspace.work_dir().display()
        );

        let expansion = self.expand(seeds, recent_only);
        let store = ArchiveStore::new(self.workspace);
        let archives = store.commit(&expansion.lists, &expansion.items)?;
        log::info!(
            "Read lists from {}: {}",
            store.lists.path().display(),
            archives.lists.before
        );
        log::info!(
            "Read items from {}: {}",
            store.items.path().display(),
            archives.items.before
        );

        Ok(Resolution {
            tasks: expansion.tasks,
            failed: expansion.failed,
            archives,
        })
    }

    /// Listing URL decorated with the playlist archive and, for recent photo
    /// listings, the batch limit.
    fn listing_url(&self, url: &str, channel: ChannelId, recent_only: bool) -> String {
        let archive = self.workspace.playlist_archive(channel).display().to_string();
        let limit = self.config.recent_batch_limit.to_string();

        let mut pairs = vec![(ARCHIVE_PARAM, archive.as_str())];
        if recent_only && channel == ChannelId::Photo {
            pairs.push((BATCH_LIMIT_PARAM, limit.as_str()));
        }
        with_query(url, &pairs)
    }
}

fn channel_of(kind: ResourceKind) -> ChannelId {
    match kind {
        ResourceKind::PhotoCollection | ResourceKind::PhotoItem | ResourceKind::Model => {
            ChannelId::Photo
        }
        ResourceKind::VideoCollection | ResourceKind::VideoItem => ChannelId::Video,
        ResourceKind::Thread | ResourceKind::ForumOrUser => ChannelId::Thread,
    }
}

/// Turn command-line inputs into seed URLs.
///
/// Inputs ending in `.txt` are read as newline-delimited seed files with
/// blank lines ignored; anything else is taken as a URL.
pub fn collect_seeds(inputs: &[String]) -> Result<Vec<String>> {
    let mut seeds = Vec::new();
    for input in inputs {
        let input = input.trim();
        if input.ends_with(".txt") {
            let urls: Vec<String> = read_plain_urls(Path::new(input))?
                .into_iter()
                .filter(|line| !line.trim().is_empty())
                .collect();
            log::info!("Got {} URLs from file: {}", urls.len(), input);
            seeds.extend(urls);
        } else if !input.is_empty() {
            seeds.push(input.to_string());
        }
    }
    Ok(seeds)
}

/// Write the failed-URL report, leaving any previous report alone when
/// nothing failed.
pub fn write_failed(workspace: &Workspace, failed: &[String]) -> Result<()> {
    let path = workspace.failed_file();
    if !failed.is_empty() {
        write_plain_urls(failed, &path)?;
    }
    log::info!("Failed URLs: {} --> {}", failed.len(), path.display());
    Ok(())
}
