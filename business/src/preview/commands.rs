use log::{debug, info};
use qrgen_states::{Command, Dep, Time, Updater};

use super::{NoticeLevel, PreviewEvent, QrPreview};
use crate::{FetchState, GenerateError, QrConfig, QrForm, QrFormat, QrParams, inline_svg};

pub(crate) fn notify(updater: &Updater, text: impl Into<String>, level: NoticeLevel) {
    updater.notify::<QrPreview>(PreviewEvent::Notice {
        text: text.into(),
        level,
    });
}

/// Starts a generation cycle for `params`.
///
/// Raster requests end here: the UI's image loader reports back through
/// [`RasterSignalCommand`]. Vector requests fetch the markup and fall back to
/// the raster URL of the same parameters on any failure.
fn start_generation(params: &QrParams, deps: Dep<'_>, updater: &Updater) {
    let config = deps.get_state_ref::<QrConfig>();

    let urls = params.validate().and_then(|()| {
        let url = params.request_url(config)?;
        let fallback = params.with_format(QrFormat::Png).request_url(config)?;
        Ok((url, fallback))
    });
    let (url, fallback_url) = match urls {
        Ok(urls) => urls,
        Err(reason) => {
            info!("Generation rejected: {reason}");
            updater.notify::<QrPreview>(PreviewEvent::Rejected { reason });
            return;
        }
    };

    let task = deps.get_compute_ref::<QrPreview>().next_task();
    let generation = task.id().generation();
    let token = task.cancellation_token();

    updater.notify::<QrPreview>(PreviewEvent::Started {
        task,
        format: params.format,
        url: url.to_string(),
        at: deps.get_state_ref::<Time>().now(),
    });

    if !params.format.is_vector() {
        return;
    }

    let mut request = ehttp::Request::get(url.as_str());
    request.headers.insert("Cache-Control", "no-store");

    let updater = updater.clone();
    let fallback_url = fallback_url.to_string();
    deps.get_state_ref::<FetchState>().inner.fetch(
        request,
        Box::new(move |result| {
            if token.is_cancelled() {
                debug!("Dropping SVG response of cancelled generation {generation}");
                return;
            }
            let event = match result
                .map_err(GenerateError::Network)
                .and_then(|response| inline_svg(&response))
            {
                Ok(markup) => PreviewEvent::VectorLoaded { generation, markup },
                Err(reason) => PreviewEvent::VectorFailed {
                    generation,
                    fallback_url,
                    reason,
                },
            };
            updater.notify::<QrPreview>(event);
        }),
    );
}

/// Generates a code from the current form.
#[derive(Debug, Default)]
pub struct GenerateCommand;

impl Command for GenerateCommand {
    fn run(&self, deps: Dep<'_>, updater: Updater) {
        let params = deps.get_state_ref::<QrForm>().params();
        start_generation(&params, deps, &updater);
    }
}

/// Load or error signal of the image loader for a raster request.
#[derive(Debug)]
pub struct RasterSignalCommand {
    pub generation: u64,
    pub outcome: Result<(), String>,
}

impl Command for RasterSignalCommand {
    fn run(&self, _deps: Dep<'_>, updater: Updater) {
        let generation = self.generation;
        let event = match &self.outcome {
            Ok(()) => PreviewEvent::RasterLoaded { generation },
            Err(reason) => PreviewEvent::RasterFailed {
                generation,
                reason: reason.clone(),
            },
        };
        updater.notify::<QrPreview>(event);
    }
}

/// Restores the defaults, drops the current result and regenerates.
#[derive(Debug, Default)]
pub struct ResetFormCommand;

impl Command for ResetFormCommand {
    fn run(&self, deps: Dep<'_>, updater: Updater) {
        let config = deps.get_state_ref::<QrConfig>();
        let form = QrForm::from_defaults(&config.defaults);
        let params = form.params();

        updater.set(form);
        updater.notify::<QrPreview>(PreviewEvent::Cleared);
        start_generation(&params, deps, &updater);
        notify(&updater, config.messages.form_reset, NoticeLevel::Info);
    }
}

#[derive(Debug, Default)]
pub struct DismissAlertCommand;

impl Command for DismissAlertCommand {
    fn run(&self, _deps: Dep<'_>, updater: Updater) {
        updater.notify::<QrPreview>(PreviewEvent::DismissAlert);
    }
}

/// Shows an arbitrary notice, e.g. the outcome of a platform export.
#[derive(Debug)]
pub struct ShowNoticeCommand {
    pub text: String,
    pub level: NoticeLevel,
}

impl Command for ShowNoticeCommand {
    fn run(&self, _deps: Dep<'_>, updater: Updater) {
        notify(&updater, self.text.clone(), self.level);
    }
}
