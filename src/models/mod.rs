// src/models/mod.rs

//! Domain models for the mirror tooling.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod channel;
mod config;
mod defect;
mod resource;
mod workspace;

// Re-export all public types
pub use channel::{ChannelId, ChannelTasks, DownloadTask, TaskMap};
pub use config::{AuditConfig, Config, DownloaderConfig, FrontierConfig, PathsConfig};
pub use defect::{Defect, DefectKind, FixBatch, PvCount, Remediation, Stage};
pub use resource::{
    ROOT_XBBS, ROOT_XCHINA, Resource, ResourceKind, Site, classify, get_model_id,
    get_model_pv_urls, model_url,
};
pub use workspace::{CONFIG_FILE, Workspace};
