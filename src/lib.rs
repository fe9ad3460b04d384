//! Tamper-evident evidence bundles for campaign runs.
//!
//! A bundle packages one campaign run with its decision trail, lineage graph,
//! provenance records, copied inputs, and regulatory checklist reports, sealed
//! by a SHA-256 checksum file.
pub mod bundle;
pub mod checklist;
pub mod error;
pub mod extract;
pub mod lineage;
pub mod model;
pub mod provenance;
pub mod util;

pub use bundle::{
    build, load_bundle_summary, verify, BuildOptions, BundleSummary, DEFAULT_SOURCE_KIND,
};
pub use error::BundleError;
pub use model::{EvidenceBundleManifest, VerificationResult};
