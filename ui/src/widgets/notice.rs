use egui::{Modal, Ui};
use qrgen_business::{DismissAlertCommand, QrPreview};
use qrgen_states::StateCtx;

use crate::utils::colors::notice_color;

/// Transient status line under the preview.
pub fn notice_line(ui: &mut Ui, ctx: &StateCtx) {
    if let Some(notice) = ctx.cached::<QrPreview>().and_then(QrPreview::notice) {
        ui.colored_label(notice_color(notice.level), &notice.text);
    }
}

/// Blocking dialog for error notices, shown until dismissed.
pub fn alert_modal(egui_ctx: &egui::Context, ctx: &StateCtx) {
    let Some(alert) = ctx.cached::<QrPreview>().and_then(QrPreview::alert) else {
        return;
    };

    let modal = Modal::new(egui::Id::new("qr_alert")).show(egui_ctx, |ui| {
        ui.set_width(280.0);
        ui.label(alert);
        ui.add_space(8.0);
        ui.button("OK").clicked()
    });
    if modal.inner || modal.should_close() {
        ctx.dispatch::<DismissAlertCommand>();
    }
}
