use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use egui_kittest::Harness;
use qrgen_business::{ExportError, ExportJob};
use qrgen_ui::QrGenApp;
use qrgen_ui::state::State;
use qrgen_ui::utils::export::ExportSink;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_PATH: &str = "/v1/create-qr-code/";

/// Default wait time for network operations in milliseconds.
pub const DEFAULT_NETWORK_WAIT_MS: u64 = 20;

/// Export sink that records jobs instead of touching the platform.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub jobs: Rc<RefCell<Vec<ExportJob>>>,
}

impl ExportSink for RecordingSink {
    fn clipboard_supported(&self) -> bool {
        true
    }

    fn run(&mut self, job: &ExportJob, _ctx: &egui::Context) -> Result<(), ExportError> {
        self.jobs.borrow_mut().push(job.clone());
        Ok(())
    }
}

pub struct TestCtx<'a> {
    mock_server: MockServer,
    /// Jobs seen by the recording sink.
    pub jobs: Rc<RefCell<Vec<ExportJob>>>,
    harness: Harness<'a, QrGenApp>,
}

impl<'a> TestCtx<'a> {
    /// App against a QR service answering every request with a small PNG.
    pub async fn new_app() -> Self {
        Self::new_app_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(qr_png()),
        )
        .await
    }

    pub async fn new_app_with(response: ResponseTemplate) -> Self {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let state = State::test(format!("{}{API_PATH}", mock_server.uri()));
        let sink = RecordingSink::default();
        let jobs = Rc::clone(&sink.jobs);
        let app = QrGenApp::with_sink(state, Box::new(sink));
        let harness = Harness::new_eframe(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            app
        });

        Self {
            mock_server,
            jobs,
            harness,
        }
    }

    pub fn harness_mut(&mut self) -> &mut Harness<'a, QrGenApp> {
        &mut self.harness
    }

    #[allow(unused)]
    pub fn harness(&self) -> &Harness<'a, QrGenApp> {
        &self.harness
    }

    #[allow(unused)]
    pub fn mock_server(&self) -> &MockServer {
        &self.mock_server
    }

    #[allow(unused)]
    pub fn jobs(&self) -> Vec<ExportJob> {
        self.jobs.borrow().clone()
    }

    /// Steps frames, yielding to the network in between, until `done` holds.
    pub async fn step_until(&mut self, done: impl Fn(&QrGenApp) -> bool) -> bool {
        for _ in 0..150 {
            self.harness.step();
            if done(self.harness.state()) {
                return true;
            }
            yield_wait_for_network(DEFAULT_NETWORK_WAIT_MS).await;
        }
        false
    }
}

/// Yields to the runtime so mock server responses and HTTP callbacks land.
pub async fn yield_wait_for_network(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// A real 8x8 PNG, decodable by the image loader and the clipboard path.
pub fn qr_png() -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode test png");
    bytes.into_inner()
}
