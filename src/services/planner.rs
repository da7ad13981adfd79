//! Staged repair planning.
//!
//! Structural repairs move, merge and delete directories, which changes the
//! paths content repairs would target. So whenever any structural batch
//! exists, only structural batches are planned; content repairs wait for a
//! rescan after the structural ones have been applied by hand.

use std::path::Path;

use crate::models::{
    ChannelId, ChannelTasks, DefectKind, DownloadTask, FixBatch, Remediation, Stage,
};
use crate::services::auditor::AuditReport;
use crate::utils::url::with_query;

/// Query parameter forcing the downloader to walk a whole collection.
const FORCE_ITERATE_PARAM: &str = "force_iter";

/// Batches of a single stage, plus any download tasks they produced.
#[derive(Debug, Clone, Default)]
pub struct RepairPlan {
    /// Stage the batches belong to; `None` when nothing is actionable
    pub stage: Option<Stage>,
    pub batches: Vec<FixBatch>,
    /// Re-fetch tasks, only ever set for the content stage
    pub tasks: ChannelTasks,
}

impl RepairPlan {
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The batch for one defect kind, if planned.
    pub fn batch(&self, kind: DefectKind) -> Option<&FixBatch> {
        self.batches.iter().find(|b| b.kind == kind)
    }
}

/// Plan the next stage of repairs for a channel's audit report.
pub fn plan(report: &AuditReport, channel: ChannelId) -> RepairPlan {
    let structural = batches_for(report, Stage::Structural);
    if !structural.is_empty() {
        log::info!(
            "Planned {} with {} batches; apply it and rescan before content fixes",
            Stage::Structural,
            structural.len()
        );
        return RepairPlan {
            stage: Some(Stage::Structural),
            batches: structural,
            tasks: ChannelTasks::new(),
        };
    }

    let content = batches_for(report, Stage::Content);
    if content.is_empty() {
        log::info!("Nothing to repair");
        return RepairPlan::default();
    }

    let mut tasks = ChannelTasks::new();
    for batch in &content {
        for action in &batch.actions {
            // Cleared collections are downloaded again into the emptied directory.
            if let Remediation::Refetch { id, dir } | Remediation::ClearFiles { id, dir } = action
            {
                let url = channel.item_url(id);
                tasks.insert(channel, url.clone(), refetch_task(channel, &url, dir));
            }
        }
    }
    log::info!(
        "Planned {} with {} batches, {} re-fetch tasks",
        Stage::Content,
        content.len(),
        tasks.len()
    );

    RepairPlan {
        stage: Some(Stage::Content),
        batches: content,
        tasks,
    }
}

fn batches_for(report: &AuditReport, stage: Stage) -> Vec<FixBatch> {
    report
        .remediations
        .iter()
        .filter(|(kind, actions)| kind.stage() == Some(stage) && !actions.is_empty())
        .map(|(kind, actions)| FixBatch {
            kind: *kind,
            actions: actions.clone(),
        })
        .collect()
}

/// Download the whole collection again into its existing directory.
fn refetch_task(channel: ChannelId, url: &str, dir: &Path) -> DownloadTask {
    DownloadTask::new(with_query(url, &[(FORCE_ITERATE_PARAM, "1")]))
        .with_output_template(format!("{}{}", dir.display(), channel.file_template()))
}
