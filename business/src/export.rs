//! Download, copy and open actions on the current result.
//!
//! Commands only prepare an [`ExportJob`]; the UI owns the platform pieces
//! (save dialog, clipboard, browser) and drains the [`ExportQueue`] each
//! frame, reporting the outcome through [`ExportJob::report`].

use std::any::Any;

use flume::{Receiver, Sender};
use log::{error, info};
use qrgen_states::{Command, Dep, State, Time, Updater, assign_impl};

use crate::preview::notify;
use crate::{
    ExportError, FetchState, Messages, NoticeLevel, Payload, PreviewEvent, QrArtifact, QrConfig,
    QrPreview, unique_filename,
};

/// Prefix of downloaded file names.
pub const FILE_PREFIX: &str = "qr_code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportJob {
    Save { file_name: String, payload: Payload },
    CopyImage { payload: Payload },
    OpenUrl { url: String },
}

impl ExportJob {
    /// Notice for the outcome of running this job, if any.
    pub fn report(
        &self,
        result: &Result<(), ExportError>,
        messages: &Messages,
    ) -> Option<(String, NoticeLevel)> {
        match (self, result) {
            (_, Err(ExportError::Cancelled)) => None,
            (Self::Save { .. }, Ok(())) => {
                Some((messages.download_success.to_owned(), NoticeLevel::Success))
            }
            (Self::CopyImage { .. }, Ok(())) => {
                Some((messages.copy_success.to_owned(), NoticeLevel::Success))
            }
            (Self::OpenUrl { .. }, Ok(())) => None,
            (Self::Save { .. }, Err(err)) => Some((
                format!("{}: {err}", messages.download_error),
                NoticeLevel::Error,
            )),
            (Self::CopyImage { .. }, Err(ExportError::ClipboardUnsupported)) => {
                Some((messages.copy_unsupported.to_owned(), NoticeLevel::Error))
            }
            (Self::CopyImage { .. }, Err(err)) => Some((
                format!("{}: {err}", messages.copy_error),
                NoticeLevel::Error,
            )),
            (Self::OpenUrl { .. }, Err(ExportError::PopupBlocked)) => {
                Some((messages.open_blocked.to_owned(), NoticeLevel::Error))
            }
            (Self::OpenUrl { .. }, Err(err)) => Some((err.to_string(), NoticeLevel::Error)),
        }
    }
}

/// Jobs waiting for the platform layer.
#[derive(Debug, Clone)]
pub struct ExportQueue {
    send: Sender<ExportJob>,
    recv: Receiver<ExportJob>,
    clipboard_supported: bool,
}

impl Default for ExportQueue {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ExportQueue {
    pub fn new(clipboard_supported: bool) -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            send,
            recv,
            clipboard_supported,
        }
    }

    pub fn clipboard_supported(&self) -> bool {
        self.clipboard_supported
    }

    pub fn sender(&self) -> Sender<ExportJob> {
        self.send.clone()
    }

    pub fn drain(&self) -> impl Iterator<Item = ExportJob> + '_ {
        self.recv.try_iter()
    }
}

impl State for ExportQueue {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        assign_impl(self, new_self);
    }
}

fn current_artifact<'a>(deps: Dep<'a>, updater: &Updater) -> Option<&'a QrArtifact> {
    let preview = deps.get_compute_ref::<QrPreview>();
    // A reload keeps the old artifact on screen; it must not be exported.
    let artifact = preview.artifact().filter(|_| !preview.is_loading());
    if artifact.is_none() {
        let messages = deps.get_state_ref::<QrConfig>().messages;
        notify(updater, messages.generate_first, NoticeLevel::Error);
    }
    artifact
}

/// Hands the artifact's payload to `build`, fetching and caching it first if
/// needed. Failures are shown as `"{prefix}: {detail}"`.
fn with_payload(
    artifact: &QrArtifact,
    deps: Dep<'_>,
    updater: &Updater,
    prefix: &'static str,
    build: impl FnOnce(Payload) -> Result<ExportJob, ExportError> + Send + 'static,
) {
    let queue = deps.get_state_ref::<ExportQueue>().sender();
    let reporter = updater.clone();
    let finish = move |payload: Result<Payload, ExportError>| {
        match payload.and_then(build) {
            Ok(job) => {
                if queue.send(job).is_err() {
                    error!("Export queue is closed");
                }
            }
            Err(err) => {
                error!("{prefix}: {err}");
                notify(&reporter, format!("{prefix}: {err}"), NoticeLevel::Error);
            }
        }
    };

    if let Some(payload) = &artifact.payload {
        finish(Ok(payload.clone()));
        return;
    }

    info!("Fetching payload of generation {}", artifact.generation);
    let generation = artifact.generation;
    let fallback_mime = artifact.format.mime();
    let updater = updater.clone();
    deps.get_state_ref::<FetchState>().inner.fetch(
        ehttp::Request::get(&artifact.url),
        Box::new(move |result| {
            let payload = match result {
                Ok(response) if response.ok => {
                    let mime = response.content_type().unwrap_or(fallback_mime).to_owned();
                    let payload = Payload::new(response.bytes, mime);
                    updater.notify::<QrPreview>(PreviewEvent::PayloadFetched {
                        generation,
                        payload: payload.clone(),
                    });
                    Ok(payload)
                }
                Ok(response) => Err(ExportError::Http {
                    status: response.status,
                }),
                Err(err) => Err(ExportError::Network(err)),
            };
            finish(payload);
        }),
    );
}

#[derive(Debug, Default)]
pub struct DownloadCommand;

impl Command for DownloadCommand {
    fn run(&self, deps: Dep<'_>, updater: Updater) {
        let Some(artifact) = current_artifact(deps, &updater) else {
            return;
        };
        let file_name = unique_filename(
            FILE_PREFIX,
            artifact.format.extension(),
            deps.get_state_ref::<Time>().now(),
        );
        let prefix = deps.get_state_ref::<QrConfig>().messages.download_error;
        with_payload(artifact, deps, &updater, prefix, move |payload| {
            Ok(ExportJob::Save { file_name, payload })
        });
    }
}

#[derive(Debug, Default)]
pub struct CopyImageCommand;

impl Command for CopyImageCommand {
    fn run(&self, deps: Dep<'_>, updater: Updater) {
        let Some(artifact) = current_artifact(deps, &updater) else {
            return;
        };
        let messages = deps.get_state_ref::<QrConfig>().messages;
        if !deps.get_state_ref::<ExportQueue>().clipboard_supported() {
            notify(&updater, messages.copy_unsupported, NoticeLevel::Error);
            return;
        }
        with_payload(artifact, deps, &updater, messages.copy_error, |payload| {
            if payload.is_image() {
                Ok(ExportJob::CopyImage { payload })
            } else {
                Err(ExportError::UnsupportedCopyType(payload.mime))
            }
        });
    }
}

#[derive(Debug, Default)]
pub struct OpenInNewTabCommand;

impl Command for OpenInNewTabCommand {
    fn run(&self, deps: Dep<'_>, updater: Updater) {
        let Some(artifact) = current_artifact(deps, &updater) else {
            return;
        };
        let job = ExportJob::OpenUrl {
            url: artifact.url.clone(),
        };
        if deps.get_state_ref::<ExportQueue>().sender().send(job).is_err() {
            error!("Export queue is closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        Payload::new(vec![1, 2, 3], "image/png")
    }

    #[test]
    fn reports_use_configured_prefixes() {
        let messages = Messages::default();
        let save = ExportJob::Save {
            file_name: "qr_code_1.png".to_owned(),
            payload: payload(),
        };
        assert_eq!(
            save.report(&Err(ExportError::Http { status: 404 }), &messages),
            Some(("Download failed: HTTP 404".to_owned(), NoticeLevel::Error))
        );
        assert_eq!(
            save.report(&Ok(()), &messages),
            Some(("Download started".to_owned(), NoticeLevel::Success))
        );
        assert_eq!(save.report(&Err(ExportError::Cancelled), &messages), None);
    }

    #[test]
    fn copy_and_open_reports() {
        let messages = Messages::default();
        let copy = ExportJob::CopyImage { payload: payload() };
        assert_eq!(
            copy.report(&Err(ExportError::ClipboardUnsupported), &messages),
            Some((messages.copy_unsupported.to_owned(), NoticeLevel::Error))
        );

        let open = ExportJob::OpenUrl {
            url: "https://qr/".to_owned(),
        };
        assert_eq!(open.report(&Ok(()), &messages), None);
        assert_eq!(
            open.report(&Err(ExportError::PopupBlocked), &messages),
            Some((messages.open_blocked.to_owned(), NoticeLevel::Error))
        );
    }

    #[test]
    fn queue_hands_out_jobs_in_order() {
        let queue = ExportQueue::new(false);
        let sender = queue.sender();
        for n in 0..3 {
            sender
                .send(ExportJob::OpenUrl {
                    url: format!("https://qr/{n}"),
                })
                .expect("queue open");
        }
        let urls: Vec<_> = queue
            .drain()
            .map(|job| match job {
                ExportJob::OpenUrl { url } => url,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(urls, ["https://qr/0", "https://qr/1", "https://qr/2"]);
        assert!(!queue.clipboard_supported());
    }
}
