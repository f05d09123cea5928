use chrono::Utc;
use qrgen_business::{
    ExportQueue, GenerateCommand, QrConfig, QrPreview, ShowNoticeCommand,
};
use qrgen_states::Time;

use crate::utils::export::{ExportSink, PlatformSink};
use crate::{state::State, widgets};

/// Shortest interval between repaints while something time-driven is shown.
const TICK: std::time::Duration = std::time::Duration::from_millis(100);

pub struct QrGenApp {
    state: State,
    sink: Box<dyn ExportSink>,
}

impl QrGenApp {
    /// Called once before the first frame. Starts a generation for the
    /// default form values.
    pub fn new(state: State) -> Self {
        Self::with_sink(state, Box::new(PlatformSink))
    }

    pub fn with_sink(state: State, sink: Box<dyn ExportSink>) -> Self {
        let mut app = Self { state, sink };
        app.tick();
        app.state.ctx.dispatch::<GenerateCommand>();
        app
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Moves the clock and applies everything received since the last frame.
    fn tick(&mut self) {
        let now = Utc::now();
        self.state.ctx.update::<Time>(|time| *time = Time::at(now));
        self.state.ctx.sync_computes();
    }

    fn run_exports(&mut self, egui_ctx: &egui::Context) {
        let Some(queue) = self.state.ctx.state::<ExportQueue>() else {
            return;
        };
        let jobs: Vec<_> = queue.drain().collect();
        let Some(messages) = self.state.ctx.state::<QrConfig>().map(|c| c.messages) else {
            return;
        };

        for job in jobs {
            let result = self.sink.run(&job, egui_ctx);
            if let Err(err) = &result {
                log::warn!("Export failed: {err}");
            }
            if let Some((text, level)) = job.report(&result, &messages) {
                self.state
                    .ctx
                    .record_command(ShowNoticeCommand { text, level });
                self.state.ctx.dispatch::<ShowNoticeCommand>();
            }
        }
    }

    fn needs_ticks(&self) -> bool {
        self.state.size_debounce.is_pending()
            || self
                .state
                .ctx
                .cached::<QrPreview>()
                .is_some_and(|preview| preview.is_loading() || preview.notice().is_some())
    }
}

impl eframe::App for QrGenApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick();
        // Time-driven transitions (loading floor, notice expiry) before render.
        self.state.ctx.run_all_dirty();
        self.state.ctx.sync_computes();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("QR Code Generator");
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                widgets::qr_form(ui, &mut self.state);
                ui.separator();
                widgets::qr_preview(ui, &mut self.state);
                ui.add_space(8.0);
                widgets::qr_actions(ui, &self.state.ctx);
                widgets::notice_line(ui, &self.state.ctx);
            });
        });
        widgets::alert_modal(ctx, &self.state.ctx);

        self.state.fire_size_debounce();
        self.run_exports(ctx);

        // Run background jobs
        self.state.ctx.run_all_dirty();

        if self.needs_ticks() {
            ctx.request_repaint_after(TICK);
        }
    }
}
