use egui::{Button, Ui};
use qrgen_business::{CopyImageCommand, DownloadCommand, OpenInNewTabCommand, QrPreview};
use qrgen_states::StateCtx;

pub const DOWNLOAD_LABEL: &str = "Download";
pub const COPY_LABEL: &str = "Copy image";
pub const OPEN_LABEL: &str = "Open in new tab";

/// Download, copy and open buttons; enabled only while a result is shown.
pub fn qr_actions(ui: &mut Ui, ctx: &StateCtx) {
    let enabled = ctx
        .cached::<QrPreview>()
        .is_some_and(QrPreview::actions_enabled);

    ui.horizontal(|ui| {
        if ui.add_enabled(enabled, Button::new(DOWNLOAD_LABEL)).clicked() {
            ctx.dispatch::<DownloadCommand>();
        }
        if ui.add_enabled(enabled, Button::new(COPY_LABEL)).clicked() {
            ctx.dispatch::<CopyImageCommand>();
        }
        if ui.add_enabled(enabled, Button::new(OPEN_LABEL)).clicked() {
            ctx.dispatch::<OpenInNewTabCommand>();
        }
    });
}
