//! Persistence seam for discovered records.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dcarchive_types::{BuildRecord, ModuleRecord, Platform};
use tokio::sync::Mutex;

use crate::error::SinkError;

/// Receives normalised records from a discovery run.
///
/// Both operations replace on conflict: builds are keyed by
/// `(platform, version)`, modules by `(platform, version, module_name)`.
/// Implementations must accept concurrent calls for distinct keys.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    async fn upsert_build(&self, build: &BuildRecord) -> Result<(), SinkError>;

    async fn upsert_module(&self, module: &ModuleRecord) -> Result<(), SinkError>;
}

type BuildKey = (Platform, String);
type ModuleKey = (Platform, String, String);

#[derive(Default)]
struct Tables {
    builds: BTreeMap<BuildKey, BuildRecord>,
    modules: BTreeMap<ModuleKey, ModuleRecord>,
}

/// In-memory [`ArchiveSink`] used for dry runs.
#[derive(Default)]
pub struct MemorySink {
    tables: Mutex<Tables>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored builds in key order, each joined with its stored modules.
    pub async fn builds(&self) -> Vec<BuildRecord> {
        let tables = self.tables.lock().await;
        tables
            .builds
            .values()
            .map(|build| {
                let mut joined = build.clone();
                joined.modules.clear();
                for ((platform, version, name), module) in &tables.modules {
                    if *platform == build.platform && *version == build.version {
                        joined.modules.insert(name.clone(), Some(module.clone()));
                    }
                }
                joined.normalize_modules();
                joined
            })
            .collect()
    }

    pub async fn build_count(&self) -> usize {
        self.tables.lock().await.builds.len()
    }

    pub async fn module_count(&self) -> usize {
        self.tables.lock().await.modules.len()
    }
}

#[async_trait]
impl ArchiveSink for MemorySink {
    async fn upsert_build(&self, build: &BuildRecord) -> Result<(), SinkError> {
        let key = (build.platform, build.version.clone());
        self.tables.lock().await.builds.insert(key, build.clone());
        Ok(())
    }

    async fn upsert_module(&self, module: &ModuleRecord) -> Result<(), SinkError> {
        let key = (module.platform, module.version.clone(), module.module_name.clone());
        self.tables.lock().await.modules.insert(key, module.clone());
        Ok(())
    }
}
