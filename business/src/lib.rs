mod config;
mod error;
mod export;
mod fetch_service;
mod fetch_state;
mod params;
mod preview;
mod svg;
mod utils;

use qrgen_states::{StateCtx, Time};

pub use config::{DEFAULT_API_BASE, DefaultValues, Limits, Messages, QrConfig};
pub use error::{ExportError, GenerateError};
pub use export::{
    CopyImageCommand, DownloadCommand, ExportJob, ExportQueue, FILE_PREFIX, OpenInNewTabCommand,
};
pub use fetch_service::{EhttpFetcher, FetchCallback, FetchService};
#[cfg(any(test, feature = "test-utils"))]
pub use fetch_service::{MockFetcher, mock_response};
pub use fetch_state::FetchState;
pub use params::{Ecc, QrForm, QrFormat, QrParams};
pub use preview::{
    DismissAlertCommand, GenerateCommand, Loading, Notice, NoticeLevel, Payload, Phase,
    PreviewEvent, QrArtifact, QrPreview, RasterSignalCommand, ResetFormCommand, ShowNoticeCommand,
};
pub use svg::{inline_svg, strip_scripts};
pub use utils::{Debounce, PREVIEW_MAX_CHARS, is_valid_url, preview_text, unique_filename};

/// Registers every state, compute and command of the generator.
///
/// Configuration problems and dependency-graph errors are logged, never fatal.
pub fn register_all(ctx: &mut StateCtx, config: QrConfig, fetch: FetchState, exports: ExportQueue) {
    for problem in config.validate() {
        log::warn!("Configuration problem: {problem}");
    }

    ctx.add_state(Time::default());
    ctx.add_state(QrForm::from_defaults(&config.defaults));
    ctx.record_compute(QrPreview::new(&config));
    ctx.add_state(config);
    ctx.add_state(fetch);
    ctx.add_state(exports);

    ctx.record_command(GenerateCommand);
    ctx.record_command(ResetFormCommand);
    ctx.record_command(DownloadCommand);
    ctx.record_command(CopyImageCommand);
    ctx.record_command(OpenInNewTabCommand);
    ctx.record_command(DismissAlertCommand);

    if let Err(err) = ctx.verify_deps() {
        log::error!("Invalid dependency graph: {err}");
    }
}
