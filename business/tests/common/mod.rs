#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use qrgen_business::{
    ExportJob, ExportQueue, FetchState, QrConfig, QrForm, QrPreview, RasterSignalCommand,
    register_all,
};
use qrgen_states::{Command, StateCtx, Time};
use wiremock::MockServer;

pub const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 4 4"><rect width="4" height="4"/></svg>"#;
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

/// A registered context talking to a mock QR service, with a virtual clock.
pub struct Fixture {
    pub ctx: StateCtx,
    pub server: MockServer,
    now: DateTime<Utc>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_clipboard(true).await
    }

    pub async fn with_clipboard(clipboard_supported: bool) -> Self {
        let server = MockServer::start().await;
        let config = QrConfig::with_api_base(format!("{}/v1/create-qr-code/", server.uri()));

        let mut ctx = StateCtx::new();
        register_all(
            &mut ctx,
            config,
            FetchState::default(),
            ExportQueue::new(clipboard_supported),
        );

        let mut fixture = Self {
            ctx,
            server,
            now: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or_default(),
        };
        fixture.advance(0);
        fixture
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// One UI frame after moving the virtual clock by `ms`.
    pub fn advance(&mut self, ms: i64) {
        self.now += TimeDelta::milliseconds(ms);
        let now = self.now;
        self.ctx.update::<Time>(|time| *time = Time::at(now));
        self.ctx.sync_computes();
        self.ctx.run_all_dirty();
        self.ctx.sync_computes();
    }

    pub fn preview(&self) -> &QrPreview {
        self.ctx.cached::<QrPreview>().expect("QrPreview is registered")
    }

    pub fn edit_form(&mut self, edit: impl FnOnce(&mut QrForm)) {
        edit(self.ctx.state_mut::<QrForm>());
    }

    pub fn run<T: Command>(&mut self, command: T) {
        self.ctx.record_command(command);
        self.ctx.dispatch::<T>();
        self.ctx.sync_computes();
    }

    /// Frames without moving the clock until `done` holds or real time runs out.
    pub async fn wait_for(&mut self, done: impl Fn(&QrPreview) -> bool) -> bool {
        for _ in 0..300 {
            self.advance(0);
            if done(self.preview()) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Lets HTTP callbacks land without moving the clock.
    pub async fn pump(&mut self, millis: u64) {
        for _ in 0..millis / 10 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.advance(0);
        }
    }

    /// Plays the image loader: reports on whatever raster load is pending.
    pub fn report_raster(&mut self, outcome: Result<(), String>) -> Option<String> {
        let (generation, url) = self
            .preview()
            .awaiting_raster()
            .map(|(generation, url)| (generation, url.to_owned()))?;
        self.run(RasterSignalCommand {
            generation,
            outcome,
        });
        Some(url)
    }

    pub fn export_jobs(&self) -> Vec<ExportJob> {
        self.ctx
            .state::<ExportQueue>()
            .map(|queue| queue.drain().collect())
            .unwrap_or_default()
    }

    pub async fn wait_for_jobs(&mut self) -> Vec<ExportJob> {
        for _ in 0..300 {
            self.advance(0);
            let jobs = self.export_jobs();
            if !jobs.is_empty() {
                return jobs;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Vec::new()
    }

    pub fn notice_text(&self) -> Option<&str> {
        self.preview().notice().map(|notice| notice.text.as_str())
    }
}
