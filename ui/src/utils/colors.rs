//! Shared color constants for the UI.

use egui::Color32;

use qrgen_business::NoticeLevel;

/// Forest green for success notices and the link hint.
pub const COLOR_GREEN: Color32 = Color32::from_rgb(34, 139, 34);

/// Red for error notices and invalid fields.
pub const COLOR_RED: Color32 = Color32::from_rgb(220, 53, 69);

/// Amber for informational notices.
pub const COLOR_AMBER: Color32 = Color32::from_rgb(255, 193, 7);

pub fn notice_color(level: NoticeLevel) -> Color32 {
    match level {
        NoticeLevel::Info => COLOR_AMBER,
        NoticeLevel::Success => COLOR_GREEN,
        NoticeLevel::Error => COLOR_RED,
    }
}
