use egui::load::{ImagePoll, SizeHint};
use egui::{Image, Ui};
use qrgen_business::{Phase, QrFormat, QrPreview, RasterSignalCommand, preview_text};

use crate::state::State;

/// Largest edge of the on-screen preview, in points.
const PREVIEW_EDGE: f32 = 320.0;

/// Shows the current result and feeds raster load signals back to the
/// controller.
pub fn qr_preview(ui: &mut Ui, state: &mut State) {
    let Some(preview) = state.ctx.cached::<QrPreview>() else {
        return;
    };
    let content = state
        .form()
        .map(|form| preview_text(&form.text))
        .unwrap_or_default();

    ui.horizontal(|ui| {
        ui.label("Format:");
        ui.strong(preview.last_format().map_or("-", QrFormat::label));
    });
    ui.label(format!("Content: {content}"));
    ui.add_space(4.0);

    let signal = preview
        .awaiting_raster()
        .and_then(|(generation, url)| poll_raster(ui.ctx(), generation, url));

    if preview.is_loading() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Generating...");
        });
    }

    match preview.artifact() {
        Some(artifact) => {
            let uri = artifact.image_uri();
            let image = match (artifact.format, &artifact.payload) {
                (QrFormat::Svg, Some(payload)) => Image::from_bytes(uri, payload.bytes.clone()),
                _ => Image::new(uri),
            };
            ui.add(
                image
                    .max_width(PREVIEW_EDGE)
                    .max_height(PREVIEW_EDGE)
                    .alt_text("QR code"),
            );
        }
        None if preview.phase() == &Phase::Failed => {
            ui.weak("No preview available");
        }
        None => {}
    }

    if let Some(signal) = signal {
        state.ctx.record_command(signal);
        state.ctx.dispatch::<RasterSignalCommand>();
    }
}

/// Polls egui's image loaders for `url`; `None` while still pending.
fn poll_raster(ctx: &egui::Context, generation: u64, url: &str) -> Option<RasterSignalCommand> {
    let outcome = match ctx.try_load_image(url, SizeHint::default()) {
        Ok(ImagePoll::Pending { .. }) => return None,
        Ok(ImagePoll::Ready { .. }) => Ok(()),
        Err(err) => {
            // Failed loads are cached; forget them so a retry hits the network.
            ctx.forget_image(url);
            Err(err.to_string())
        }
    };
    Some(RasterSignalCommand {
        generation,
        outcome,
    })
}
