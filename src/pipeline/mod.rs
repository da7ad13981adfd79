//! Pipeline entry points for mirror operations.
//!
//! - `run_sync`: Resolve seeds into downloader scripts
//! - `run_lists`: Re-sync every archived collection
//! - `run_photo`: Sync the latest photo listings
//! - `run_playlist`: Rebuild playlist archives
//! - `run_scan`: Audit the mirror and plan repairs
//! - `run_validate`: Check configuration

pub mod scan;
pub mod sync;

pub use scan::{ScanOutcome, run_scan};
pub use sync::{run_lists, run_photo, run_playlist, run_sync, run_validate};
