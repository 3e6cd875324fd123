//! Database abstraction layer.
//!
//! [`BuildStore`] is the archive's persistence interface; the default
//! implementation is [`sqlite::SqliteStore`]. Trait methods use `impl Future`
//! in their signatures so no `async-trait` boxing is needed here.

pub mod sqlite;

use dcarchive_types::{BuildRecord, ModuleRecord, Platform};

/// Persistence for archived builds and their modules.
///
/// Builds are unique per `(platform, version)` and modules per
/// `(platform, version, module_name)`; both upserts replace on conflict.
pub trait BuildStore: Send + Sync + 'static {
    fn upsert_build(
        &self,
        build: &BuildRecord,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;

    fn upsert_module(
        &self,
        module: &ModuleRecord,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;

    /// One page of builds, newest version first, each carrying a module map
    /// with every catalog key.
    fn list_builds(
        &self,
        platform: Option<Platform>,
        skip: u64,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<Vec<BuildRecord>, sqlx::Error>> + Send;

    fn count_builds(
        &self,
        platform: Option<Platform>,
    ) -> impl std::future::Future<Output = Result<u64, sqlx::Error>> + Send;

    fn get_build(
        &self,
        platform: Platform,
        version: &str,
    ) -> impl std::future::Future<Output = Result<Option<BuildRecord>, sqlx::Error>> + Send;

    /// Delete every build and module; returns the number of builds removed.
    fn clear(&self) -> impl std::future::Future<Output = Result<u64, sqlx::Error>> + Send;
}
