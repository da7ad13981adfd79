//! Per-channel playlist archives.
//!
//! A playlist archive lists the canonical URL of every item the downloader
//! has already finished, so listing pages can skip them. It is recomputed on
//! each call from the downloader's completion log, then unioned with any
//! historical shard files (`pl_archive_xc_p_2023.txt` next to
//! `pl_archive_xc_p.txt`). The previous output itself is never read back.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{ChannelId, Workspace};
use crate::utils::fs::{read_plain_urls, write_plain_urls};
use crate::utils::url::clean_entry;

/// Rebuild one playlist archive, returning the number of URLs written.
///
/// Lines of `log_path` starting with `line_prefix` carry an item id after a
/// one-character separator; anything from the first `_` on is dropped. An id
/// equal to the previously accepted one is skipped, which relies on the log
/// grouping an item's lines together.
pub fn rebuild(
    log_path: &Path,
    output_path: &Path,
    line_prefix: &str,
    url_template: &str,
) -> Result<usize> {
    let mut ids: Vec<String> = Vec::new();
    let lines = read_plain_urls(log_path)?;
    if lines.is_empty() && !log_path.exists() {
        log::warn!("Completion log not found: {}", log_path.display());
    }

    for line in &lines {
        let Some(rest) = line.strip_prefix(line_prefix) else {
            continue;
        };
        let rest = rest.get(1..).unwrap_or_default();
        let Some(id) = clean_entry(rest) else {
            continue;
        };
        let id = match id.find('_') {
            Some(underscore) if underscore > 0 => id[..underscore].to_string(),
            _ => id,
        };
        if ids.last() != Some(&id) {
            ids.push(id);
        }
    }

    let current: BTreeSet<String> = ids
        .iter()
        .map(|id| url_template.replacen("%s", id, 1))
        .collect();
    write_plain_urls(&current, &current_snapshot_path(output_path))?;

    let mut all = current;
    for shard in shard_files(output_path)? {
        all.extend(
            read_plain_urls(&shard)?
                .iter()
                .filter_map(|line| clean_entry(line)),
        );
    }

    write_plain_urls(&all, output_path)?;
    Ok(all.len())
}

/// Rebuild the playlist archive of every channel, or of a single one.
pub fn rebuild_all(
    workspace: &Workspace,
    only: Option<ChannelId>,
) -> Result<Vec<(ChannelId, usize)>> {
    log::info!("Start generating playlist archive files");

    let mut counts = Vec::new();
    for channel in ChannelId::ALL {
        if only.is_some_and(|c| c != channel) {
            continue;
        }
        let output = workspace.playlist_archive(channel);
        let count = rebuild(
            &workspace.source_archive(channel),
            &output,
            channel.extractor(),
            channel.url_format(),
        )?;
        log::info!("Generated - {} : {} --> {}", channel, count, output.display());
        counts.push((channel, count));
    }
    Ok(counts)
}

/// `<output>.curr.txt`: the log-derived part of the last rebuild.
pub fn current_snapshot_path(output_path: &Path) -> PathBuf {
    let mut name = OsString::from(output_path.as_os_str());
    name.push(".curr.txt");
    PathBuf::from(name)
}

/// Shard files next to `output_path` named `<stem>_*<ext>`, sorted.
pub fn shard_files(output_path: &Path) -> Result<Vec<PathBuf>> {
    let dir = output_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = output_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::invalid("playlist archive path", output_path.display()))?;
    let (stem, ext) = match file_name.rfind('.') {
        Some(dot) => (&file_name[..dot], &file_name[dot..]),
        None => (file_name, ""),
    };
    let prefix = format!("{stem}_");

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::Io(e)),
    };

    let mut shards = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(ext) && entry.file_type()?.is_file() {
            shards.push(entry.path());
        }
    }
    shards.sort();
    Ok(shards)
}
