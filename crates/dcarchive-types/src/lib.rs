//! Shared types for the Discord build archive.
//!
//! The discovery engine (`dcarchive-fetch`) produces these records and the
//! server (`dcarchive-server`) persists and serves them. Nothing in this crate
//! performs I/O.

pub mod catalog;
pub mod error;
pub mod pagination;
pub mod platform;
pub mod record;
pub mod version;

pub use catalog::{MODULE_CATALOG, MODULE_COUNT, is_catalog_module};
pub use error::TypeError;
pub use pagination::Pagination;
pub use platform::Platform;
pub use record::{BuildRecord, DiscoveredBuild, ModuleRecord, ProbeResult, VersionCandidate, empty_module_map};
pub use version::VersionTriple;

/// Returned by the version extractor when no pattern matches.
pub const UNKNOWN_VERSION: &str = "Unknown Version";

/// Reported in place of a version when a "latest" lookup failed.
pub const UNRESOLVED_VERSION: &str = "Error fetching version";

/// Value stored in link fields whose feature (mirror hosting, custom
/// installers, ...) does not exist yet.
pub const PLACEHOLDER: &str = "placeholder";
