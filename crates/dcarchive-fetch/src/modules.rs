//! Per-build module enumeration.

use std::collections::BTreeMap;
use std::sync::Arc;

use dcarchive_types::{MODULE_CATALOG, ModuleRecord, Platform, empty_module_map};
use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::FetchError;
use crate::prober::Probe;
use crate::range::probe_or_cancel;

/// `{base}/{version}/modules/{name}-1.zip`
pub fn module_url(base_url: &str, version: &str, module_name: &str) -> String {
    format!("{}/{version}/modules/{module_name}-1.zip", base_url.trim_end_matches('/'))
}

/// Probes every catalog module of a build, at most `concurrency` at a time.
#[derive(Clone)]
pub struct ModuleEnumerator {
    probe: Arc<dyn Probe>,
    in_flight: Arc<Semaphore>,
}

impl ModuleEnumerator {
    pub fn new(probe: Arc<dyn Probe>, concurrency: usize) -> Self {
        Self {
            probe,
            in_flight: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// One entry per catalog module: the record when the module exists,
    /// `None` otherwise.
    pub async fn enumerate(
        &self,
        platform: Platform,
        base_url: &str,
        version: &str,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, Option<ModuleRecord>>, FetchError> {
        let probes = MODULE_CATALOG.iter().map(|name| async move {
            let _permit = self
                .in_flight
                .acquire()
                .await
                .map_err(|_| FetchError::Cancelled)?;
            let url = module_url(base_url, version, name);
            let result = probe_or_cancel(self.probe.as_ref(), &url, cancel).await?;
            debug!(
                %platform,
                %version,
                module = %name,
                size = result.byte_size,
                etag = %result.etag,
                exists = result.exists,
                "probed module"
            );
            let record = result
                .exists
                .then(|| ModuleRecord::from_probe(platform, version, *name, url, &result));
            Ok::<_, FetchError>((*name, record))
        });

        let mut modules = empty_module_map();
        for (name, record) in try_join_all(probes).await? {
            modules.insert(name.to_owned(), record);
        }
        Ok(modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProbe;
    use dcarchive_types::MODULE_COUNT;

    const BASE: &str = "https://stable.dl2.discordapp.net/apps/linux";

    #[test]
    fn module_url_shape() {
        assert_eq!(
            module_url("https://cdn/apps/osx/", "0.0.329", "discord_voice"),
            "https://cdn/apps/osx/0.0.329/modules/discord_voice-1.zip"
        );
    }

    #[tokio::test]
    async fn every_catalog_key_is_present() {
        let probe = FakeProbe::new()
            .with_hit(module_url(BASE, "0.0.77", "discord_voice"), 5_000, "v")
            .with_hit(module_url(BASE, "0.0.77", "discord_krisp"), 7_000, "k");
        let enumerator = ModuleEnumerator::new(Arc::new(probe), 4);
        let modules = enumerator
            .enumerate(Platform::Linux, BASE, "0.0.77", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(modules.len(), MODULE_COUNT);
        assert_eq!(modules.values().flatten().count(), 2);
        let voice = modules["discord_voice"].as_ref().unwrap();
        assert_eq!(voice.download_size, 5_000);
        assert_eq!(voice.download_link, module_url(BASE, "0.0.77", "discord_voice"));
        assert!(modules["discord_rpc"].is_none());
    }

    #[tokio::test]
    async fn probes_each_module_once() {
        let probe = Arc::new(FakeProbe::new());
        let enumerator = ModuleEnumerator::new(probe.clone(), 1);
        enumerator
            .enumerate(Platform::Mac, BASE, "0.0.1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(probe.attempts(), MODULE_COUNT);
    }

    #[tokio::test]
    async fn cancellation_aborts_enumeration() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let enumerator = ModuleEnumerator::new(Arc::new(FakeProbe::new()), 4);
        let err = enumerator
            .enumerate(Platform::Mac, BASE, "0.0.1", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }
}
