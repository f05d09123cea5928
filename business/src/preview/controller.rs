use std::any::{Any, TypeId};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, error, info, warn};
use qrgen_states::{
    Compute, ComputeDeps, Dep, GenerationCounter, TaskHandle, Time, Updater, assign_impl,
};

use super::{Notice, NoticeLevel, Payload, QrArtifact};
use crate::{GenerateError, Messages, QrConfig, QrFormat};

/// How a loading cycle ended, held back until the floor has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Ready(QrArtifact),
    Failed { format: QrFormat, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loading {
    pub generation: u64,
    /// Format currently being loaded. Switches to PNG on fallback.
    pub format: QrFormat,
    pub url: String,
    pub started_at: DateTime<Utc>,
    settled: Option<Outcome>,
}

impl Loading {
    /// Whether the result is known and only the floor keeps the spinner up.
    pub fn is_settled(&self) -> bool {
        self.settled.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading(Loading),
    Ready,
    Failed,
}

/// Everything that moves the preview forward.
///
/// Commands and HTTP callbacks send these through
/// `Updater::notify::<QrPreview>`; they are applied in order on the UI thread.
#[derive(Debug)]
pub enum PreviewEvent {
    Started {
        task: TaskHandle,
        format: QrFormat,
        url: String,
        at: DateTime<Utc>,
    },
    Rejected {
        reason: GenerateError,
    },
    RasterLoaded {
        generation: u64,
    },
    RasterFailed {
        generation: u64,
        reason: String,
    },
    VectorLoaded {
        generation: u64,
        markup: String,
    },
    VectorFailed {
        generation: u64,
        fallback_url: String,
        reason: GenerateError,
    },
    PayloadFetched {
        generation: u64,
        payload: Payload,
    },
    Cleared,
    Notice {
        text: String,
        level: NoticeLevel,
    },
    Tick(DateTime<Utc>),
    DismissAlert,
}

/// State of the preview pane and the actions attached to it.
#[derive(Debug)]
pub struct QrPreview {
    phase: Phase,
    artifact: Option<QrArtifact>,
    last_format: Option<QrFormat>,

    generation: u64,
    generations: GenerationCounter,
    task: Option<TaskHandle>,
    /// Set when a raster load is abandoned; its late failure is swallowed once.
    suppress_next_raster_error: bool,

    notice: Option<Notice>,
    alert: Option<String>,

    now: DateTime<Utc>,
    min_loading: TimeDelta,
    notice_ttl: TimeDelta,
    messages: Messages,
}

impl Default for QrPreview {
    fn default() -> Self {
        Self::new(&QrConfig::default())
    }
}

impl QrPreview {
    pub fn new(config: &QrConfig) -> Self {
        Self {
            phase: Phase::Idle,
            artifact: None,
            last_format: None,
            generation: 0,
            generations: GenerationCounter::default(),
            task: None,
            suppress_next_raster_error: false,
            notice: None,
            alert: None,
            now: Utc::now(),
            min_loading: config.min_loading,
            notice_ttl: config.notice_ttl,
            messages: config.messages,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading(_))
    }

    pub fn artifact(&self) -> Option<&QrArtifact> {
        self.artifact.as_ref()
    }

    /// Download, copy and open are available iff a settled result exists.
    /// A reload keeps the previous image on screen but disables them.
    pub fn actions_enabled(&self) -> bool {
        self.artifact.is_some() && !self.is_loading()
    }

    /// Format of the latest request, after any fallback.
    pub fn last_format(&self) -> Option<QrFormat> {
        self.last_format
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Raster URL the image loader should report on, with its generation.
    pub fn awaiting_raster(&self) -> Option<(u64, &str)> {
        match &self.phase {
            Phase::Loading(loading) if loading.format == QrFormat::Png && !loading.is_settled() => {
                Some((loading.generation, loading.url.as_str()))
            }
            _ => None,
        }
    }

    /// Allocates the handle for the next generation. Shared counter, so it
    /// is safe to call from commands holding `&self`.
    pub fn next_task(&self) -> TaskHandle {
        self.generations.spawn_handle::<Self>()
    }

    fn apply(&mut self, event: PreviewEvent) {
        match event {
            PreviewEvent::Started {
                task,
                format,
                url,
                at,
            } => self.start(task, format, url, at),
            PreviewEvent::Rejected { reason } => {
                let text = match reason {
                    GenerateError::EmptyInput => self.messages.empty_text.to_owned(),
                    other => format!("{}: {other}", self.messages.generation_error),
                };
                self.show(text, NoticeLevel::Error);
            }
            PreviewEvent::RasterLoaded { generation } => {
                if !self.is_current(generation) {
                    debug!("Ignoring load of superseded generation {generation}");
                    return;
                }
                if let Some(url) = self.loading_url() {
                    let artifact = QrArtifact::raster(generation, url);
                    self.settle(Outcome::Ready(artifact));
                }
            }
            PreviewEvent::RasterFailed { generation, reason } => {
                if !self.is_current(generation) {
                    if std::mem::take(&mut self.suppress_next_raster_error) {
                        debug!("Swallowed failure of abandoned load {generation}: {reason}");
                    } else {
                        debug!("Ignoring failure of superseded generation {generation}");
                    }
                    return;
                }
                self.settle(Outcome::Failed {
                    format: self.last_format.unwrap_or_default(),
                    reason,
                });
            }
            PreviewEvent::VectorLoaded { generation, markup } => {
                if !self.is_current(generation) {
                    debug!("Ignoring SVG of superseded generation {generation}");
                    return;
                }
                if let Some(url) = self.loading_url() {
                    let artifact = QrArtifact::vector(generation, url, markup);
                    self.settle(Outcome::Ready(artifact));
                }
            }
            PreviewEvent::VectorFailed {
                generation,
                fallback_url,
                reason,
            } => {
                if !self.is_current(generation) {
                    return;
                }
                warn!("Inline SVG failed ({reason}), falling back to PNG");
                if let Phase::Loading(loading) = &mut self.phase {
                    loading.format = QrFormat::Png;
                    loading.url = fallback_url;
                    loading.settled = None;
                }
                self.last_format = Some(QrFormat::Png);
                self.show(self.messages.svg_fallback.to_owned(), NoticeLevel::Info);
            }
            PreviewEvent::PayloadFetched {
                generation,
                payload,
            } => match &mut self.artifact {
                Some(artifact) if artifact.generation == generation => {
                    artifact.payload = Some(payload);
                }
                _ => debug!("Dropping payload of replaced result {generation}"),
            },
            PreviewEvent::Cleared => {
                self.abandon_task();
                self.phase = Phase::Idle;
                self.artifact = None;
            }
            PreviewEvent::Notice { text, level } => self.show(text, level),
            PreviewEvent::Tick(now) => self.tick(now),
            PreviewEvent::DismissAlert => self.alert = None,
        }
    }

    fn start(&mut self, task: TaskHandle, format: QrFormat, url: String, at: DateTime<Utc>) {
        self.abandon_task();
        let generation = task.id().generation();
        info!("Generation {generation} started ({format}): {url}");

        self.generation = generation;
        self.task = Some(task);
        self.last_format = Some(format);
        self.phase = Phase::Loading(Loading {
            generation,
            format,
            url,
            started_at: at,
            settled: None,
        });
    }

    /// Cancels the in-flight task, arming the suppression flag if it was
    /// waiting on the image loader.
    fn abandon_task(&mut self) {
        if self.awaiting_raster().is_some() {
            self.suppress_next_raster_error = true;
        }
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(&self.phase, Phase::Loading(loading) if loading.generation == generation)
    }

    fn loading_url(&self) -> Option<String> {
        match &self.phase {
            Phase::Loading(loading) => Some(loading.url.clone()),
            _ => None,
        }
    }

    fn settle(&mut self, outcome: Outcome) {
        let Phase::Loading(loading) = &mut self.phase else {
            return;
        };
        if self.now - loading.started_at >= self.min_loading {
            self.finish(outcome);
        } else {
            loading.settled = Some(outcome);
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.task = None;
        match outcome {
            Outcome::Ready(artifact) => {
                info!("Generation {} ready", artifact.generation);
                let text = match artifact.format {
                    QrFormat::Png => self.messages.generated,
                    QrFormat::Svg => self.messages.generated_svg,
                };
                self.artifact = Some(artifact);
                self.phase = Phase::Ready;
                self.show(text.to_owned(), NoticeLevel::Success);
            }
            Outcome::Failed { format, reason } => {
                error!("Generation {} failed: {reason}", self.generation);
                self.artifact = None;
                self.phase = Phase::Failed;
                let text = format!("{} ({}).", self.messages.generation_error, format.label());
                self.show(text, NoticeLevel::Error);
            }
        }
    }

    fn tick(&mut self, now: DateTime<Utc>) {
        self.now = now;

        let floor_elapsed = match &self.phase {
            Phase::Loading(loading) => {
                loading.is_settled() && now - loading.started_at >= self.min_loading
            }
            _ => false,
        };
        if floor_elapsed
            && let Phase::Loading(loading) = &mut self.phase
            && let Some(outcome) = loading.settled.take()
        {
            self.finish(outcome);
        }

        if self
            .notice
            .as_ref()
            .is_some_and(|notice| notice.is_expired(now, self.notice_ttl))
        {
            self.notice = None;
        }
    }

    fn show(&mut self, text: String, level: NoticeLevel) {
        if level == NoticeLevel::Error {
            self.alert = Some(text.clone());
        }
        self.notice = Some(Notice {
            text,
            level,
            shown_at: self.now,
        });
    }
}

impl Compute for QrPreview {
    fn deps(&self) -> ComputeDeps {
        const STATE_IDS: [TypeId; 1] = [TypeId::of::<Time>()];
        (&STATE_IDS, &[])
    }

    fn compute(&self, deps: Dep<'_>, updater: Updater) {
        let now = deps.get_state_ref::<Time>().now();
        if now != self.now {
            updater.notify::<Self>(PreviewEvent::Tick(now));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        match new_self.downcast::<PreviewEvent>() {
            Ok(event) => self.apply(*event),
            Err(other) => assign_impl(self, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).expect("valid timestamp")
    }

    fn preview() -> QrPreview {
        let mut preview = QrPreview::default();
        preview.apply(PreviewEvent::Tick(at(0)));
        preview
    }

    fn start(preview: &mut QrPreview, format: QrFormat, ms: i64) -> u64 {
        let task = preview.next_task();
        let generation = task.id().generation();
        preview.apply(PreviewEvent::Started {
            task,
            format,
            url: format!("https://qr/?n={generation}"),
            at: at(ms),
        });
        generation
    }

    #[test]
    fn fast_load_waits_for_the_floor() {
        let mut preview = preview();
        let generation = start(&mut preview, QrFormat::Png, 0);

        preview.apply(PreviewEvent::Tick(at(50)));
        preview.apply(PreviewEvent::RasterLoaded { generation });
        assert!(preview.is_loading());
        assert!(!preview.actions_enabled());
        assert_eq!(preview.awaiting_raster(), None);

        preview.apply(PreviewEvent::Tick(at(699)));
        assert!(preview.is_loading());

        preview.apply(PreviewEvent::Tick(at(700)));
        assert_eq!(preview.phase(), &Phase::Ready);
        assert!(preview.actions_enabled());
        assert_eq!(
            preview.notice().map(|n| n.level),
            Some(NoticeLevel::Success)
        );
    }

    #[test]
    fn reload_disables_actions_until_settled() {
        let mut preview = preview();
        let first = start(&mut preview, QrFormat::Png, 0);
        preview.apply(PreviewEvent::Tick(at(800)));
        preview.apply(PreviewEvent::RasterLoaded { generation: first });
        assert!(preview.actions_enabled());

        let second = start(&mut preview, QrFormat::Png, 1_000);
        assert!(preview.artifact().is_some());
        assert!(!preview.actions_enabled());

        preview.apply(PreviewEvent::Tick(at(2_000)));
        preview.apply(PreviewEvent::RasterLoaded { generation: second });
        assert!(preview.actions_enabled());
    }

    #[test]
    fn slow_load_finishes_immediately() {
        let mut preview = preview();
        let generation = start(&mut preview, QrFormat::Png, 0);

        preview.apply(PreviewEvent::Tick(at(1_500)));
        preview.apply(PreviewEvent::RasterLoaded { generation });
        assert_eq!(preview.phase(), &Phase::Ready);
    }

    #[test]
    fn failure_clears_result_and_raises_alert() {
        let mut preview = preview();
        let first = start(&mut preview, QrFormat::Png, 0);
        preview.apply(PreviewEvent::Tick(at(800)));
        preview.apply(PreviewEvent::RasterLoaded { generation: first });
        assert!(preview.actions_enabled());

        let second = start(&mut preview, QrFormat::Png, 1_000);
        preview.apply(PreviewEvent::Tick(at(2_000)));
        preview.apply(PreviewEvent::RasterFailed {
            generation: second,
            reason: "404".to_owned(),
        });

        assert_eq!(preview.phase(), &Phase::Failed);
        assert!(!preview.actions_enabled());
        assert_eq!(
            preview.alert(),
            Some("Error while generating the QR code (PNG).")
        );
        preview.apply(PreviewEvent::DismissAlert);
        assert_eq!(preview.alert(), None);
    }

    #[test]
    fn superseded_results_are_ignored() {
        let mut preview = preview();
        let old = start(&mut preview, QrFormat::Svg, 0);
        let new = start(&mut preview, QrFormat::Svg, 10);

        preview.apply(PreviewEvent::Tick(at(1_000)));
        preview.apply(PreviewEvent::VectorLoaded {
            generation: old,
            markup: "<svg>old</svg>".to_owned(),
        });
        assert!(preview.is_loading());

        preview.apply(PreviewEvent::VectorLoaded {
            generation: new,
            markup: "<svg>new</svg>".to_owned(),
        });
        let artifact = preview.artifact().expect("result");
        assert_eq!(artifact.generation, new);
        assert_eq!(
            artifact.payload.as_ref().map(|p| &*p.bytes),
            Some(&b"<svg>new</svg>"[..])
        );
    }

    #[test]
    fn abandoned_raster_failure_is_swallowed_once() {
        let mut preview = preview();
        let old = start(&mut preview, QrFormat::Png, 0);
        let new = start(&mut preview, QrFormat::Png, 10);

        preview.apply(PreviewEvent::RasterFailed {
            generation: old,
            reason: "aborted".to_owned(),
        });
        assert!(preview.is_loading());
        assert_eq!(preview.alert(), None);
        assert_eq!(preview.awaiting_raster().map(|(g, _)| g), Some(new));
    }

    #[test]
    fn cancelling_previous_task_on_start() {
        let mut preview = preview();
        let task = preview.next_task();
        let token = task.cancellation_token();
        preview.apply(PreviewEvent::Started {
            task,
            format: QrFormat::Svg,
            url: "https://qr/".to_owned(),
            at: at(0),
        });
        assert!(!token.is_cancelled());

        start(&mut preview, QrFormat::Png, 5);
        assert!(token.is_cancelled());
    }

    #[test]
    fn vector_failure_switches_to_raster() {
        let mut preview = preview();
        let generation = start(&mut preview, QrFormat::Svg, 0);

        preview.apply(PreviewEvent::VectorFailed {
            generation,
            fallback_url: "https://qr/?png".to_owned(),
            reason: GenerateError::Http { status: 500 },
        });

        assert_eq!(preview.last_format(), Some(QrFormat::Png));
        assert_eq!(
            preview.awaiting_raster(),
            Some((generation, "https://qr/?png"))
        );
        assert_eq!(
            preview.notice().map(|n| n.text.as_str()),
            Some("Could not load the SVG, falling back to PNG.")
        );
        assert_eq!(preview.alert(), None);
    }

    #[test]
    fn notices_expire() {
        let mut preview = preview();
        preview.apply(PreviewEvent::Notice {
            text: "Form reset".to_owned(),
            level: NoticeLevel::Info,
        });
        preview.apply(PreviewEvent::Tick(at(4_999)));
        assert!(preview.notice().is_some());
        preview.apply(PreviewEvent::Tick(at(5_000)));
        assert!(preview.notice().is_none());
    }

    #[test]
    fn empty_input_rejection_keeps_phase() {
        let mut preview = preview();
        preview.apply(PreviewEvent::Rejected {
            reason: GenerateError::EmptyInput,
        });
        assert_eq!(preview.phase(), &Phase::Idle);
        assert_eq!(preview.alert(), Some("Please enter a text or URL."));
    }
}
