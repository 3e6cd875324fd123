//! The discovery run: one lane per platform, module fan-out per build, and
//! persistence through an [`ArchiveSink`].

use std::sync::Arc;

use dcarchive_types::{BuildRecord, Platform};
use futures::future::try_join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::config::{DiscoveryConfig, PlatformTarget};
use crate::error::FetchError;
use crate::modules::ModuleEnumerator;
use crate::prober::Probe;
use crate::sink::ArchiveSink;

/// Outcome of one platform lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaneReport {
    pub platform: Platform,
    /// The latest version could not be resolved; nothing was probed.
    pub skipped: bool,
    pub builds: usize,
    pub modules: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub lanes: Vec<LaneReport>,
}

impl RunReport {
    pub fn total_builds(&self) -> usize {
        self.lanes.iter().map(|l| l.builds).sum()
    }

    pub fn total_modules(&self) -> usize {
        self.lanes.iter().map(|l| l.modules).sum()
    }
}

pub struct Discovery {
    probe: Arc<dyn Probe>,
    targets: Vec<PlatformTarget>,
    modules: ModuleEnumerator,
}

impl Discovery {
    pub fn new(probe: Arc<dyn Probe>, targets: Vec<PlatformTarget>, module_concurrency: usize) -> Self {
        let modules = ModuleEnumerator::new(Arc::clone(&probe), module_concurrency);
        Self {
            probe,
            targets,
            modules,
        }
    }

    pub fn from_config(probe: Arc<dyn Probe>, config: DiscoveryConfig) -> Self {
        Self::new(probe, config.targets, config.module_concurrency)
    }

    /// Runs every lane concurrently.
    ///
    /// Probe misses and unresolved platforms are not errors. A sink failure
    /// is: it cancels every in-flight probe of the run and is returned.
    /// Cancelling `cancel` aborts the run with [`FetchError::Cancelled`].
    pub async fn run<S>(&self, sink: &S, cancel: CancellationToken) -> Result<RunReport, FetchError>
    where
        S: ArchiveSink + ?Sized,
    {
        let run_cancel = cancel.child_token();
        let lanes = self.targets.iter().map(|target| {
            let span = info_span!("lane", platform = %target.platform);
            self.run_lane(target, sink, &run_cancel).instrument(span)
        });

        match try_join_all(lanes).await {
            Ok(lanes) => {
                let report = RunReport { lanes };
                info!(
                    builds = report.total_builds(),
                    modules = report.total_modules(),
                    "discovery run finished"
                );
                Ok(report)
            }
            Err(e) => {
                run_cancel.cancel();
                error!(error = %e, "discovery run aborted");
                Err(e)
            }
        }
    }

    async fn run_lane<S>(
        &self,
        target: &PlatformTarget,
        sink: &S,
        cancel: &CancellationToken,
    ) -> Result<LaneReport, FetchError>
    where
        S: ArchiveSink + ?Sized,
    {
        let mut report = LaneReport {
            platform: target.platform,
            skipped: false,
            builds: 0,
            modules: 0,
        };

        let Some(discovered) = target
            .strategy
            .discover(self.probe.as_ref(), target.platform, cancel)
            .await?
        else {
            report.skipped = true;
            return Ok(report);
        };
        info!(count = discovered.len(), "confirmed builds");

        for build in &discovered {
            let mut record = BuildRecord::from_discovered(build);
            if let Some(base_url) = &target.module_base_url {
                record.modules = self
                    .modules
                    .enumerate(target.platform, base_url, &record.version, cancel)
                    .await?;
            }

            self.persist(&record, sink, cancel).await?;
            report.builds += 1;
            report.modules += record.found_modules().count();
        }

        Ok(report)
    }

    async fn persist<S>(&self, record: &BuildRecord, sink: &S, cancel: &CancellationToken) -> Result<(), FetchError>
    where
        S: ArchiveSink + ?Sized,
    {
        let result = async {
            sink.upsert_build(record).await?;
            for module in record.found_modules() {
                sink.upsert_module(module).await?;
            }
            Ok::<_, FetchError>(())
        }
        .await;

        if result.is_err() {
            cancel.cancel();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::modules::module_url;
    use crate::prober::RedirectMode;
    use crate::sink::MemorySink;
    use crate::strategy::{RangeProbeConfig, RedirectResolveConfig, Strategy};
    use crate::testing::FakeProbe;
    use async_trait::async_trait;
    use dcarchive_types::{MODULE_COUNT, ModuleRecord};
    use tracing_test::traced_test;

    const LATEST: &str = "https://discord.com/latest";
    const WIN: &str = "https://cdn/win/x64/{version}/DiscordSetup.exe";
    const OSX: &str = "https://cdn/apps/osx";
    const LINUX: &str = "https://cdn/apps/linux";

    fn targets() -> Vec<PlatformTarget> {
        vec![
            PlatformTarget {
                platform: Platform::Windows,
                strategy: Strategy::RedirectResolve(RedirectResolveConfig {
                    latest_url: LATEST.into(),
                    redirect_mode: RedirectMode::Location,
                    installer_template: WIN.into(),
                    max_steps: 4,
                    max_hits: Some(2),
                }),
                module_base_url: None,
            },
            PlatformTarget {
                platform: Platform::Mac,
                strategy: Strategy::RangeProbe(RangeProbeConfig {
                    base_url: OSX.into(),
                    start: 330,
                    steps: 3,
                    artifact_template: "{base}/{version}/Discord.dmg".into(),
                    max_hits: None,
                }),
                module_base_url: Some(OSX.into()),
            },
            PlatformTarget {
                platform: Platform::Linux,
                strategy: Strategy::RangeProbe(RangeProbeConfig {
                    base_url: LINUX.into(),
                    start: 77,
                    steps: 2,
                    artifact_template: "{base}/{version}/discord-{version}.deb".into(),
                    max_hits: None,
                }),
                module_base_url: Some(LINUX.into()),
            },
        ]
    }

    fn upstream() -> FakeProbe {
        FakeProbe::new()
            .with_redirect(LATEST, "https://cdn/win/x64/1.0.9028/DiscordSetup.exe")
            .with_hit("https://cdn/win/x64/1.0.9028/DiscordSetup.exe", 90_000_000, "w1")
            .with_hit("https://cdn/win/x64/1.0.9027/DiscordSetup.exe", 89_000_000, "w2")
            .with_hit("https://cdn/win/x64/1.0.9026/DiscordSetup.exe", 88_000_000, "w3")
            .with_hit(format!("{OSX}/0.0.329/Discord.dmg"), 104_857_600, "abc123")
            .with_hit(module_url(OSX, "0.0.329", "discord_desktop_core"), 3_000_000, "core")
            .with_hit(format!("{LINUX}/0.0.77/discord-0.0.77.deb"), 95_000_000, "deb77")
            .with_hit(format!("{LINUX}/0.0.76/discord-0.0.76.deb"), 94_000_000, "deb76")
            .with_hit(module_url(LINUX, "0.0.77", "discord_voice"), 1_000, "voice")
    }

    #[tokio::test]
    async fn run_archives_every_lane() {
        let discovery = Discovery::new(Arc::new(upstream()), targets(), 4);
        let sink = MemorySink::new();
        let report = discovery.run(&sink, CancellationToken::new()).await.unwrap();

        let windows = &report.lanes[0];
        assert_eq!((windows.builds, windows.skipped), (2, false));
        assert_eq!(report.lanes[1].builds, 1);
        assert_eq!(report.lanes[2].builds, 2);
        assert_eq!(report.total_modules(), 2);

        let builds = sink.builds().await;
        assert_eq!(builds.len(), 5);
        assert!(builds.iter().all(|b| b.modules.len() == MODULE_COUNT));

        let mac = builds.iter().find(|b| b.platform == Platform::Mac).unwrap();
        assert_eq!(mac.version, "0.0.329");
        assert_eq!(mac.installer_size, 104_857_600);
        assert_eq!(mac.installer_etag, "abc123");
        assert!(mac.modules["discord_desktop_core"].is_some());

        let windows_versions: Vec<_> = builds
            .iter()
            .filter(|b| b.platform == Platform::Windows)
            .map(|b| b.version.as_str())
            .collect();
        assert_eq!(windows_versions, ["1.0.9027", "1.0.9028"]);
    }

    #[tokio::test]
    async fn repeated_runs_are_idempotent() {
        let discovery = Discovery::new(Arc::new(upstream()), targets(), 4);
        let sink = MemorySink::new();
        discovery.run(&sink, CancellationToken::new()).await.unwrap();
        let first = sink.builds().await;
        discovery.run(&sink, CancellationToken::new()).await.unwrap();
        let second = sink.builds().await;

        assert_eq!(first, second);
        assert_eq!(sink.build_count().await, 5);
        assert_eq!(sink.module_count().await, 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn unresolved_platform_is_skipped() {
        let probe = FakeProbe::new().with_hit(format!("{LINUX}/0.0.77/discord-0.0.77.deb"), 1, "x");
        let discovery = Discovery::new(Arc::new(probe), targets(), 4);
        let sink = MemorySink::new();
        let report = discovery.run(&sink, CancellationToken::new()).await.unwrap();

        assert!(report.lanes[0].skipped);
        assert_eq!(report.lanes[0].builds, 0);
        assert_eq!(report.total_builds(), 1);
        assert!(logs_contain("skipping platform for this run"));
    }

    #[tokio::test]
    async fn unparseable_latest_skips_only_its_lane() {
        let upstream = FakeProbe::new()
            .with_redirect(LATEST, "https://cdn/win/x64/1.0.4294967296/DiscordSetup.exe")
            .with_hit(format!("{LINUX}/0.0.77/discord-0.0.77.deb"), 95_000_000, "deb77");
        let discovery = Discovery::new(Arc::new(upstream), targets(), 4);
        let sink = MemorySink::new();
        let report = discovery.run(&sink, CancellationToken::new()).await.unwrap();

        assert!(report.lanes[0].skipped);
        assert_eq!(report.lanes[2].builds, 1);
        let stored = sink.builds().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].platform, Platform::Linux);
        assert_eq!(stored[0].version, "0.0.77");
    }

    struct FailingSink;

    #[async_trait]
    impl ArchiveSink for FailingSink {
        async fn upsert_build(&self, _build: &BuildRecord) -> Result<(), SinkError> {
            Err(SinkError::new("store unreachable"))
        }

        async fn upsert_module(&self, _module: &ModuleRecord) -> Result<(), SinkError> {
            Err(SinkError::new("store unreachable"))
        }
    }

    #[tokio::test]
    async fn sink_failure_aborts_run() {
        let discovery = Discovery::new(Arc::new(upstream()), targets(), 4);
        let cancel = CancellationToken::new();
        let err = discovery.run(&FailingSink, cancel.clone()).await.unwrap_err();
        assert!(matches!(err, FetchError::Sink(_)));
        // The caller's token is untouched; only the run's child token fires.
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_run_returns_cancelled() {
        let discovery = Discovery::new(Arc::new(upstream()), targets(), 4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = discovery.run(&MemorySink::new(), cancel).await.unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }
}
