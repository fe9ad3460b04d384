//! Fatal error categories surfaced by bundle and checklist operations.
//!
//! Recoverable problems never reach this type; they are collected as warnings.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Campaign run file does not exist: {}", .0.display())]
    CampaignRunMissing(PathBuf),

    #[error("Output directory is not empty: {}. Use overwrite to replace.", .0.display())]
    OutputDirNotEmpty(PathBuf),

    #[error("Unknown checklist template '{name}'. Available: {available}")]
    UnknownTemplate { name: String, available: String },

    #[error("{0}")]
    ChecklistPolicy(String),
}
