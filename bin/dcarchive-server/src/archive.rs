//! Discovery output persisted into the SQLite archive.

use async_trait::async_trait;
use dcarchive_fetch::{ArchiveSink, SinkError};
use dcarchive_types::{BuildRecord, ModuleRecord};

use crate::db::BuildStore;
use crate::db::sqlite::SqliteStore;

#[async_trait]
impl ArchiveSink for SqliteStore {
    async fn upsert_build(&self, build: &BuildRecord) -> Result<(), SinkError> {
        BuildStore::upsert_build(self, build).await.map_err(|e| {
            SinkError::with_source(
                format!("failed to store {} build {}", build.platform, build.version),
                e,
            )
        })
    }

    async fn upsert_module(&self, module: &ModuleRecord) -> Result<(), SinkError> {
        BuildStore::upsert_module(self, module).await.map_err(|e| {
            SinkError::with_source(
                format!(
                    "failed to store module {} of {} build {}",
                    module.module_name, module.platform, module.version
                ),
                e,
            )
        })
    }
}
