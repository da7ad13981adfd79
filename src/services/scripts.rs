//! Shell script emission for download tasks and repair batches.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;

use crate::error::Result;
use crate::models::{
    ChannelId, ChannelTasks, DownloadTask, DownloaderConfig, FixBatch, Remediation, TaskMap,
    Workspace,
};
use crate::utils::fs::ensure_dir;
use crate::utils::url::referer;

const SCRIPT_HEADER: &str = "#!/bin/bash\n\nset -x\n\n";
const PARAM_ERROR: &str = "echo \"param err, continue...\"\n";

/// Per-run options for downloader scripts.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// File name prefix, e.g. `sync` or `fix`
    pub prefix: String,
    /// Download archive overriding each channel's completion log
    pub download_archive: Option<PathBuf>,
    /// Rebuild the channel's playlist archive after every task
    pub update_playlist: bool,
    /// Command line echoed at the end of each script
    pub generated_by: String,
}

impl ScriptOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            download_archive: None,
            update_playlist: true,
            generated_by: std::env::args().collect::<Vec<_>>().join(" "),
        }
    }
}

/// Renders one downloader script per channel.
pub struct ScriptWriter<'a> {
    workspace: &'a Workspace,
    downloader: &'a DownloaderConfig,
}

impl<'a> ScriptWriter<'a> {
    pub fn new(workspace: &'a Workspace, downloader: &'a DownloaderConfig) -> Self {
        Self {
            workspace,
            downloader,
        }
    }

    /// Write a script for every non-empty channel, returning their paths.
    pub fn write_all(&self, tasks: &ChannelTasks, options: &ScriptOptions) -> Result<Vec<PathBuf>> {
        let bin_dir = self.workspace.bin_dir();
        ensure_dir(&bin_dir)?;

        let stamp = Local::now().format("%y%j-%H%M%S").to_string();
        let mut scripts = Vec::new();
        for (channel, channel_tasks) in tasks.iter() {
            let name = format!("{}_{}_{}.sh", options.prefix, channel.sid(), stamp);
            let path = bin_dir.join(&name);
            fs::write(&path, self.render(channel, channel_tasks, &name, options))?;
            log::info!(
                "Generated script: {} ({} tasks)",
                path.display(),
                channel_tasks.len()
            );
            scripts.push(path);
        }
        Ok(scripts)
    }

    /// Full script text for one channel.
    pub fn render(
        &self,
        channel: ChannelId,
        tasks: &TaskMap,
        script_name: &str,
        options: &ScriptOptions,
    ) -> String {
        let default_template = self.workspace.output_template(channel);
        let archive = options
            .download_archive
            .clone()
            .unwrap_or_else(|| self.workspace.source_archive(channel));

        let mut script = String::from(SCRIPT_HEADER);
        let total = tasks.len();
        for (index, task) in tasks.values().enumerate() {
            script.push_str(&format!(
                "echo -e \"\\033]0;{script_name}:[{}/{total}]\\007\"\n",
                index + 1
            ));
            let template = task.output_template.as_deref().unwrap_or(&default_template);
            script.push_str(&self.render_command(task, template, &archive));
            if options.update_playlist {
                script.push_str(&format!("pagemirror playlist {}\n", channel.sid()));
            }
            script.push('\n');
        }

        script.push_str(&format!(
            "echo -e \"\\033]0;{script_name}:[finished]\\007\"\n"
        ));
        script.push_str(&format!(
            "\necho \"Finished!!\\nGenerated by: {}\"\n",
            quote_inner(&options.generated_by)
        ));
        script
    }

    /// One downloader invocation, newline-terminated.
    pub fn render_command(&self, task: &DownloadTask, template: &str, archive: &Path) -> String {
        if task.url.trim().is_empty() || template.trim().is_empty() {
            return PARAM_ERROR.to_string();
        }

        let mut line = format!(
            "{} {} --no-progress --user-agent {} -o {}",
            self.downloader.program,
            quote(&task.url),
            quote(&self.downloader.user_agent),
            quote(template)
        );
        if let Some(referer) = referer(&task.url) {
            line.push_str(&format!(" --referer {}", quote(&referer)));
        }
        line.push_str(&format!(
            " --download-archive {}",
            quote(&archive.display().to_string())
        ));
        if let Some(extra) = self
            .downloader
            .extra_args
            .as_deref()
            .filter(|a| !a.trim().is_empty())
        {
            line.push(' ');
            line.push_str(extra);
        }
        for arg in &task.args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push_str(" $@\n");
        line
    }
}

/// Write a repair script for structural or clearing batches.
///
/// Re-fetch actions are skipped; they become downloader tasks instead.
pub fn write_fix_script(path: &Path, batches: &[FixBatch]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, render_fix_script(batches))?;
    log::info!("Generated fix script: {}", path.display());
    Ok(())
}

pub fn render_fix_script(batches: &[FixBatch]) -> String {
    let mut script = String::from(SCRIPT_HEADER);
    for batch in batches {
        let lines: Vec<String> = batch.actions.iter().flat_map(shell_lines).collect();
        if lines.is_empty() {
            continue;
        }
        script.push_str(&format!("# {}\n", batch.kind));
        for line in lines {
            script.push_str(&line);
            script.push('\n');
        }
        script.push('\n');
    }
    script
}

fn shell_lines(action: &Remediation) -> Vec<String> {
    match action {
        Remediation::Refetch { .. } => Vec::new(),
        Remediation::ClearFiles { dir, .. } => vec![format!("rm -rf {}/*", quote_path(dir))],
        Remediation::Move { from, to } => {
            let mut lines = Vec::new();
            if let Some(parent) = to.parent() {
                lines.push(format!("mkdir -p {}", quote_path(parent)));
            }
            lines.push(format!("mv -n {} {}", quote_path(from), quote_path(to)));
            lines
        }
        Remediation::Merge { from, into } => vec![format!(
            "cp -Rn {} {} && rm -rf {}",
            quote(&format!("{}/.", from.display())),
            quote(&format!("{}/", into.display())),
            quote_path(from)
        )],
        Remediation::Prune { dir, markers } => {
            let mut lines: Vec<String> = markers
                .iter()
                .map(|m| format!("rm -f {}", quote_path(&dir.join(m))))
                .collect();
            lines.push(format!("rmdir {}", quote_path(dir)));
            lines
        }
    }
}

/// Run scripts one after another with `bash`.
///
/// A script exiting non-zero is logged and the next one still runs.
pub fn execute(scripts: &[PathBuf]) -> Result<()> {
    for script in scripts {
        log::info!("Executing {}", script.display());
        let status = Command::new("bash").arg(script).status()?;
        if !status.success() {
            log::warn!("{} exited with {}", script.display(), status);
        }
    }
    Ok(())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", quote_inner(value))
}

fn quote_path(path: &Path) -> String {
    quote(&path.display().to_string())
}

/// Escape the characters bash still expands inside double quotes.
fn quote_inner(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
