use qrgen_business::{
    Debounce, Ecc, ExportQueue, FetchState, GenerateCommand, QrConfig, QrForm, QrFormat,
    register_all,
};
use qrgen_states::{StateCtx, Time};

use crate::utils::export::{ExportSink as _, PlatformSink};
use crate::widgets::{SelectOption, SelectState};

/// The main application state.
///
/// Business states live in `ctx`; widget-local state (open dropdowns, the
/// pending size debounce) lives next to it.
pub struct State {
    /// The state context for business logic.
    pub ctx: StateCtx,
    pub format_select: SelectState<QrFormat>,
    pub ecc_select: SelectState<Ecc>,
    /// Regenerates once the size slider has been still for a while.
    pub size_debounce: Debounce,
}

impl Default for State {
    fn default() -> Self {
        Self::with_config(
            QrConfig::from_env(),
            FetchState::default(),
            ExportQueue::new(PlatformSink.clipboard_supported()),
        )
    }
}

impl State {
    pub fn with_config(config: QrConfig, fetch: FetchState, exports: ExportQueue) -> Self {
        let form = QrForm::from_defaults(&config.defaults);
        let size_debounce = Debounce::new(config.regenerate_debounce);

        let mut ctx = StateCtx::new();
        register_all(&mut ctx, config, fetch, exports);

        Self {
            ctx,
            format_select: format_select(form.format),
            ecc_select: ecc_select(form.ecc),
            size_debounce,
        }
    }

    /// State talking to a QR service at `base_url`, without a loading floor.
    pub fn test(base_url: String) -> Self {
        let config = QrConfig {
            min_loading: chrono::TimeDelta::zero(),
            ..QrConfig::with_api_base(base_url)
        };
        Self::with_config(config, FetchState::default(), ExportQueue::new(true))
    }

    pub fn form(&self) -> Option<&QrForm> {
        self.ctx.state::<QrForm>()
    }

    /// Regenerates once the size debounce has elapsed. An empty text settles
    /// the debounce without a request.
    pub fn fire_size_debounce(&mut self) {
        let now = self.ctx.state::<Time>().map(Time::now).unwrap_or_default();
        if !self.size_debounce.fire(now) {
            return;
        }
        if self.form().is_some_and(QrForm::has_payload) {
            log::debug!("Size settled, regenerating");
            self.ctx.dispatch::<GenerateCommand>();
        } else {
            log::debug!("Size settled without text, nothing to generate");
        }
    }
}

fn format_select(initial: QrFormat) -> SelectState<QrFormat> {
    let options = QrFormat::ALL
        .iter()
        .map(|&format| SelectOption::new(format, format.label()))
        .collect();
    SelectState::new(options, initial)
}

fn ecc_select(initial: Ecc) -> SelectState<Ecc> {
    let options = Ecc::ALL
        .iter()
        .map(|&ecc| SelectOption::new(ecc, ecc.as_str()).with_description(ecc.description()))
        .collect();
    SelectState::new(options, initial)
}
