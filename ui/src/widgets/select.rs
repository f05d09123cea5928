//! Accessible single-select dropdown.
//!
//! [`SelectState`] holds the behavior (highlight vs. committed value, keyboard
//! navigation, type-ahead) and is independent of egui; [`select`] renders it.
//!
//! Keyboard model, while the trigger has focus:
//! - Space/Enter opens the list, or commits the highlighted option when open
//! - Arrow Up/Down move the highlight, opening the list first
//! - Home/End jump to the first/last option
//! - a letter or digit highlights the next option starting with it
//! - Escape closes without committing

use egui::{Color32, EventFilter, Id, Key, Rect, Response, Ui, WidgetInfo, WidgetType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption<T> {
    pub value: T,
    pub label: &'static str,
    /// Shown when hovering the option.
    pub description: Option<&'static str>,
}

impl<T> SelectOption<T> {
    pub fn new(value: T, label: &'static str) -> Self {
        Self {
            value,
            label,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// Keys the dropdown reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectKey {
    Space,
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Char(char),
}

#[derive(Debug, Clone)]
pub struct SelectState<T> {
    options: Vec<SelectOption<T>>,
    active: usize,
    selected: usize,
    open: bool,
}

impl<T: Copy + PartialEq> SelectState<T> {
    /// `initial` is selected when present among `options`, else the first option.
    ///
    /// # Panics
    /// Panics if `options` is empty.
    pub fn new(options: Vec<SelectOption<T>>, initial: T) -> Self {
        assert!(!options.is_empty(), "a select needs at least one option");
        let selected = options
            .iter()
            .position(|option| option.value == initial)
            .unwrap_or(0);
        Self {
            options,
            active: selected,
            selected,
            open: false,
        }
    }

    pub fn options(&self) -> &[SelectOption<T>] {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> &SelectOption<T> {
        &self.options[self.selected]
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Moves the highlight. Out-of-range indices are ignored.
    pub fn set_active(&mut self, index: usize) {
        if index < self.options.len() {
            self.active = index;
        }
    }

    /// Commits `index` and closes the list.
    ///
    /// Returns the value only for user-initiated selections; internal
    /// bookkeeping never reports a change. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize, user_initiated: bool) -> Option<T> {
        let option = self.options.get(index)?;
        let value = option.value;
        self.selected = index;
        self.active = index;
        self.open = false;
        user_initiated.then_some(value)
    }

    /// Follows a value changed elsewhere (e.g. a form reset).
    pub fn sync_to(&mut self, value: T) {
        if self.selected().value == value {
            return;
        }
        if let Some(index) = self.options.iter().position(|option| option.value == value) {
            self.select(index, false);
        }
    }

    pub fn handle_key(&mut self, key: SelectKey) -> Option<T> {
        let last = self.options.len() - 1;
        match key {
            SelectKey::Space | SelectKey::Enter => {
                if self.open {
                    return self.select(self.active, true);
                }
                self.open();
            }
            SelectKey::Escape => self.close(),
            SelectKey::ArrowDown => {
                self.open();
                self.set_active((self.active + 1).min(last));
            }
            SelectKey::ArrowUp => {
                self.open();
                self.set_active(self.active.saturating_sub(1));
            }
            SelectKey::Home => self.set_active(0),
            SelectKey::End => self.set_active(last),
            SelectKey::Char(ch) if ch.is_ascii_alphanumeric() => self.type_ahead(ch),
            SelectKey::Char(_) => {}
        }
        None
    }

    /// Highlights the next option whose label starts with `ch`, searching
    /// from the option after the current highlight and wrapping around.
    fn type_ahead(&mut self, ch: char) {
        let needle = ch.to_ascii_lowercase();
        let len = self.options.len();
        let start = (self.active + 1) % len;
        let found = (0..len).map(|offset| (start + offset) % len).find(|&index| {
            self.options[index]
                .label
                .trim()
                .chars()
                .next()
                .is_some_and(|first| first.to_ascii_lowercase() == needle)
        });
        if let Some(index) = found {
            self.active = index;
        }
    }
}

const ARROW: &str = "⏷";

fn pressed_keys(ui: &Ui) -> Vec<SelectKey> {
    ui.input(|input| {
        let mut keys: Vec<SelectKey> = [
            (Key::Escape, SelectKey::Escape),
            (Key::ArrowUp, SelectKey::ArrowUp),
            (Key::ArrowDown, SelectKey::ArrowDown),
            (Key::Home, SelectKey::Home),
            (Key::End, SelectKey::End),
        ]
        .into_iter()
        .filter(|(key, _)| input.key_pressed(*key))
        .map(|(_, select_key)| select_key)
        .collect();

        keys.extend(input.events.iter().filter_map(|event| match event {
            egui::Event::Text(text) => text
                .chars()
                .next()
                .filter(char::is_ascii_alphanumeric)
                .map(SelectKey::Char),
            _ => None,
        }));
        keys
    })
}

/// Renders a labelled dropdown and returns the value committed by the user
/// this frame, if any.
pub fn select<T: Copy + PartialEq>(
    ui: &mut Ui,
    label: &str,
    state: &mut SelectState<T>,
) -> Option<T> {
    let mut change = None;
    let id = Id::new(("qr_select", label));

    ui.label(label);
    let text = format!("{} {ARROW}", state.selected().label);
    let trigger = ui.add(egui::Button::new(text).min_size(egui::vec2(120.0, 0.0)));
    let trigger = trigger.on_hover_text(label);
    // Accessible name carries the current value, e.g. "Format: PNG".
    let name = format!("{label}: {}", state.selected().label);
    trigger.widget_info(|| WidgetInfo::labeled(WidgetType::ComboBox, ui.is_enabled(), &name));

    if trigger.clicked() {
        let by_keyboard =
            ui.input(|i| i.key_pressed(Key::Enter) || i.key_pressed(Key::Space));
        if by_keyboard {
            change = state.handle_key(SelectKey::Enter);
        } else {
            state.toggle();
        }
    }

    if trigger.has_focus() {
        ui.memory_mut(|memory| {
            memory.set_focus_lock_filter(
                trigger.id,
                EventFilter {
                    vertical_arrows: true,
                    escape: true,
                    ..Default::default()
                },
            );
        });
        for key in pressed_keys(ui) {
            change = change.or(state.handle_key(key));
        }
    }

    let mut area = trigger.rect;
    if state.is_open() {
        let list = egui::Frame::popup(ui.style()).show(ui, |ui| {
            ui.push_id(id, |ui| option_list(ui, state, &mut change));
        });
        area = area.union(list.response.rect);
    }
    close_on_outside_click(ui, area, state);

    change
}

fn option_list<T: Copy + PartialEq>(
    ui: &mut Ui,
    state: &mut SelectState<T>,
    change: &mut Option<T>,
) {
    let mut hovered = None;
    let mut clicked = None;
    for (index, option) in state.options().iter().enumerate() {
        let highlighted = index == state.active_index();
        let mut response: Response = ui.selectable_label(highlighted, option.label);
        if index == state.selected_index() {
            response = response.on_hover_text("Selected");
        }
        if let Some(description) = option.description {
            response = response.on_hover_text(description);
        }
        if response.hovered() {
            hovered = Some(index);
        }
        if response.clicked() {
            clicked = Some(index);
        }
        if highlighted {
            ui.painter().rect_stroke(
                response.rect,
                2.0,
                egui::Stroke::new(1.0, Color32::from_gray(140)),
                egui::StrokeKind::Inside,
            );
        }
    }

    if let Some(index) = hovered {
        state.set_active(index);
    }
    if let Some(index) = clicked {
        *change = state.select(index, true);
    }
}

fn close_on_outside_click<T: Copy + PartialEq>(ui: &Ui, area: Rect, state: &mut SelectState<T>) {
    if !state.is_open() {
        return;
    }
    let outside = ui.input(|i| {
        i.pointer.any_pressed()
            && i.pointer
                .interact_pos()
                .is_some_and(|pos| !area.contains(pos))
    });
    if outside {
        state.close();
    }
}
