//! Service layer for the mirror tooling.
//!
//! This module contains the business logic for:
//! - Seed expansion into download tasks (`Frontier`)
//! - Mirror auditing (`Auditor`)
//! - Staged repair planning (`plan`)
//! - Shell script emission (`ScriptWriter`)

pub mod auditor;
pub mod frontier;
pub mod planner;
pub mod scripts;

pub use auditor::{AuditReport, Auditor, CollectionName};
pub use frontier::{Expansion, Frontier, Resolution, collect_seeds, write_failed};
pub use planner::{RepairPlan, plan};
pub use scripts::{ScriptOptions, ScriptWriter, execute, render_fix_script, write_fix_script};
