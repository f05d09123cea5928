use egui::{Button, DragValue, Slider, TextEdit, Ui};
use qrgen_business::{
    Ecc, GenerateCommand, QrConfig, QrForm, QrPreview, ResetFormCommand, is_valid_url,
};
use qrgen_states::Time;

use crate::state::State;
use crate::utils::colors::{COLOR_GREEN, COLOR_RED};
use crate::widgets::select;

pub const TEXT_LABEL: &str = "Text or URL";
pub const SIZE_LABEL: &str = "Size";
pub const FORMAT_LABEL: &str = "Format";
pub const ECC_LABEL: &str = "Error correction";
pub const MARGIN_LABEL: &str = "Margin";

/// The generator form. Writes edits back to [`QrForm`] and dispatches a
/// regeneration when a committed change calls for one.
pub fn qr_form(ui: &mut Ui, state: &mut State) {
    let (Some(form), Some(config)) = (
        state.ctx.state::<QrForm>().cloned(),
        state.ctx.state::<QrConfig>(),
    ) else {
        return;
    };
    let limits = config.limits;
    let messages = config.messages;
    let now = state.ctx.state::<Time>().map(Time::now).unwrap_or_default();
    let loading = state
        .ctx
        .cached::<QrPreview>()
        .is_some_and(QrPreview::is_loading);

    state.format_select.sync_to(form.format);
    state.ecc_select.sync_to(form.ecc);

    let mut edited = form.clone();
    let mut regenerate = false;

    let label = ui.label(TEXT_LABEL);
    ui.add(
        TextEdit::multiline(&mut edited.text)
            .hint_text("https://example.com")
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    )
    .labelled_by(label.id);
    if !edited.has_payload() {
        ui.colored_label(COLOR_RED, messages.empty_text);
    } else if is_valid_url(&edited.text) {
        ui.colored_label(COLOR_GREEN, "Link detected");
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        let label = ui.label(SIZE_LABEL);
        let slider = ui
            .add(Slider::new(&mut edited.size, limits.min_size..=limits.max_size).suffix(" px"))
            .labelled_by(label.id);
        if slider.changed() {
            if edited.has_payload() {
                state.size_debounce.trigger(now);
            } else {
                state.size_debounce.cancel();
            }
        }
    });

    ui.horizontal(|ui| {
        if let Some(format) = select(ui, FORMAT_LABEL, &mut state.format_select) {
            edited.format = format;
            regenerate = true;
        }
    });

    ui.horizontal(|ui| {
        if let Some(ecc) = select(ui, ECC_LABEL, &mut state.ecc_select) {
            edited.ecc = ecc;
            regenerate = true;
        }
        ui.label("ⓘ").on_hover_ui(|ui| {
            for ecc in Ecc::ALL {
                ui.label(format!("{ecc}: {}", ecc.description()));
            }
        });
    });

    // Vector output has no quiet zone setting.
    if !edited.format.is_vector() {
        ui.horizontal(|ui| {
            let label = ui.label(MARGIN_LABEL);
            let margin = ui
                .add(
                    DragValue::new(&mut edited.margin)
                        .range(limits.min_margin..=limits.max_margin),
                )
                .labelled_by(label.id);
            if margin.drag_stopped() || (margin.changed() && !margin.dragged()) {
                regenerate = true;
            }
        });
    }

    ui.add_space(8.0);
    let mut reset = false;
    ui.horizontal(|ui| {
        let generate_label = if loading { "Generating..." } else { "Generate" };
        let enabled = edited.has_payload() && !loading;
        if ui
            .add_enabled(enabled, Button::new(generate_label))
            .clicked()
        {
            regenerate = true;
        }
        if ui.button("Reset").clicked() {
            reset = true;
        }
    });

    if edited != form {
        *state.ctx.state_mut::<QrForm>() = edited.clone();
    }

    if reset {
        state.size_debounce.cancel();
        state.ctx.dispatch::<ResetFormCommand>();
    } else if regenerate && edited.has_payload() {
        state.size_debounce.cancel();
        state.ctx.dispatch::<GenerateCommand>();
    }
}
