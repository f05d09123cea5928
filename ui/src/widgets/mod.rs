pub mod actions;
pub mod form;
mod notice;
pub mod preview;
pub mod select;

pub use actions::qr_actions;
pub use form::qr_form;
pub use notice::{alert_modal, notice_line};
pub use preview::qr_preview;
pub use select::{SelectKey, SelectOption, SelectState, select};
