//! Test doubles: a scripted [`Probe`] and a local upstream server.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect};
use axum::routing::get;
use dcarchive_types::ProbeResult;

use crate::prober::{Probe, RedirectMode, RedirectTarget};

pub(crate) const ARTIFACT_BODY: &str = "discord-build-artifact";

/// Serves a handful of fixed artifacts, redirects and failures on an
/// ephemeral port and returns its base URL.
pub(crate) async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/apps/osx/0.0.329/Discord.dmg", get(artifact))
        .route("/distro/app/stable/win/x64/1.0.9028/DiscordSetup.exe", get(artifact))
        .route(
            "/latest",
            get(|| async { Redirect::temporary("/distro/app/stable/win/x64/1.0.9028/DiscordSetup.exe") }),
        )
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                artifact().await
            }),
        )
        .route(
            "/loop/{n}",
            get(|Path(n): Path<u32>| async move { Redirect::temporary(&format!("/loop/{}", n + 1)) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn artifact() -> impl IntoResponse {
    ([(header::ETAG, "\"abc123\"")], ARTIFACT_BODY)
}

/// A [`Probe`] answering from fixed tables and counting every call.
#[derive(Default)]
pub(crate) struct FakeProbe {
    hits: HashMap<String, ProbeResult>,
    redirects: HashMap<String, String>,
    attempts: AtomicUsize,
    probed: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_hit(mut self, url: impl Into<String>, size: u64, etag: &str) -> Self {
        self.hits.insert(url.into(), ProbeResult::found(size, etag));
        self
    }

    pub(crate) fn with_redirect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects.insert(from.into(), to.into());
        self
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn probe(&self, url: &str) -> ProbeResult {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.probed.lock().unwrap().push(url.to_owned());
        self.hits.get(url).cloned().unwrap_or_default()
    }

    async fn resolve_redirect(&self, url: &str, mode: RedirectMode) -> Option<RedirectTarget> {
        let target = self.redirects.get(url)?;
        let probe = match mode {
            RedirectMode::Follow => self.hits.get(target).cloned().unwrap_or_default(),
            RedirectMode::Location => ProbeResult::missing(),
        };
        Some(RedirectTarget {
            url: target.clone(),
            probe,
        })
    }
}
