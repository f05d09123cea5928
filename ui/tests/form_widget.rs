//! Rendering rules of the generator form.

use chrono::{DateTime, TimeDelta, Utc};
use egui::Key;
use egui::accesskit::Role;
use egui_kittest::Harness;
use kittest::Queryable;
use qrgen_business::{Ecc, QrForm, QrFormat, QrPreview};
use qrgen_states::Time;
use qrgen_ui::state::State;
use qrgen_ui::widgets::qr_form;

fn harness<'a>() -> Harness<'a, State> {
    // Nothing is generated here; the endpoint is never contacted.
    let state = State::test("http://127.0.0.1:9/v1/create-qr-code/".to_owned());
    Harness::new_ui_state(|ui, state: &mut State| qr_form(ui, state), state)
}

#[test]
fn margin_is_hidden_for_svg() {
    let mut harness = harness();
    harness.run();
    assert!(harness.query_all_by_label("Margin").next().is_some());

    harness.state_mut().ctx.state_mut::<QrForm>().format = QrFormat::Svg;
    harness.run();
    assert!(harness.query_all_by_label("Margin").next().is_none());
}

#[test]
fn empty_text_shows_required_message() {
    let mut harness = harness();
    harness.run();
    assert!(harness.query_by_label("Please enter a text or URL.").is_none());
    assert!(harness.query_by_label("Link detected").is_some());

    harness.state_mut().ctx.state_mut::<QrForm>().text = String::new();
    harness.run();
    assert!(harness.query_by_label("Please enter a text or URL.").is_some());
    assert!(harness.query_by_label("Link detected").is_none());

    harness.state_mut().ctx.state_mut::<QrForm>().text = "plain words".to_owned();
    harness.run();
    assert!(harness.query_by_label("Please enter a text or URL.").is_none());
    assert!(harness.query_by_label("Link detected").is_none());
}

#[test]
fn selects_follow_external_form_changes() {
    let mut harness = harness();
    harness.run();
    assert!(harness.query_by_label("Format: PNG").is_some());
    assert!(harness.query_by_label("Error correction: M").is_some());

    {
        let form = harness.state_mut().ctx.state_mut::<QrForm>();
        form.format = QrFormat::Svg;
        form.ecc = Ecc::H;
    }
    harness.run();

    assert!(harness.query_by_label("Format: SVG").is_some());
    assert!(harness.query_by_label("Error correction: H").is_some());
    assert_eq!(harness.state().ecc_select.selected().value, Ecc::H);
}

#[test]
fn choosing_an_option_updates_the_form() {
    let mut harness = harness();
    harness.run();

    harness.get_by_label("Error correction: M").click();
    harness.run();
    harness.get_by_label("Q").click();
    harness.run();

    let form = harness.state().form().expect("form state");
    assert_eq!(form.ecc, Ecc::Q);
}

/// Form plus the per-frame debounce check, on a clock the test moves.
fn slider_harness<'a>(text: &str) -> Harness<'a, State> {
    let mut state = State::test("http://127.0.0.1:9/v1/create-qr-code/".to_owned());
    state.ctx.state_mut::<QrForm>().text = text.to_owned();
    set_clock(&mut state, start());
    Harness::new_ui_state(
        |ui, state: &mut State| {
            qr_form(ui, state);
            state.fire_size_debounce();
        },
        state,
    )
}

fn start() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or_default()
}

fn set_clock(state: &mut State, now: DateTime<Utc>) {
    state.ctx.update::<Time>(|time| *time = Time::at(now));
}

fn nudge_size_slider(harness: &mut Harness<'_, State>) {
    harness.get_by_role(Role::Slider).focus();
    harness.run();
    harness.key_press(Key::ArrowRight);
    harness.run();
}

fn generation(state: &mut State) -> u64 {
    state.ctx.sync_computes();
    state
        .ctx
        .cached::<QrPreview>()
        .map(QrPreview::generation)
        .unwrap_or_default()
}

#[test]
fn size_change_regenerates_after_the_debounce() {
    let mut harness = slider_harness("https://example.com");
    harness.run();
    let before = generation(harness.state_mut());

    nudge_size_slider(&mut harness);
    assert_ne!(harness.state().form().map(|form| form.size), Some(300));
    assert!(harness.state().size_debounce.is_pending());

    set_clock(harness.state_mut(), start() + TimeDelta::milliseconds(399));
    harness.run();
    assert_eq!(generation(harness.state_mut()), before);

    set_clock(harness.state_mut(), start() + TimeDelta::milliseconds(400));
    harness.run();
    assert!(!harness.state().size_debounce.is_pending());
    assert!(generation(harness.state_mut()) > before);
}

#[test]
fn size_change_without_text_requests_nothing() {
    let mut harness = slider_harness("");
    harness.run();
    let before = generation(harness.state_mut());

    nudge_size_slider(&mut harness);
    assert_ne!(harness.state().form().map(|form| form.size), Some(300));
    assert!(!harness.state().size_debounce.is_pending());

    set_clock(harness.state_mut(), start() + TimeDelta::seconds(2));
    harness.run();
    let state = harness.state_mut();
    assert_eq!(generation(state), before);
    let preview = state.ctx.cached::<QrPreview>().expect("QrPreview is registered");
    assert_eq!(preview.alert(), None);
    assert!(!preview.is_loading());
}
