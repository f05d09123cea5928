//! Generation cycle: request, asynchronous load, loading floor, fallback and
//! the actions available on the result.

mod artifact;
mod commands;
mod controller;
mod notice;

pub use artifact::{Payload, QrArtifact};
pub use commands::{
    DismissAlertCommand, GenerateCommand, RasterSignalCommand, ResetFormCommand,
    ShowNoticeCommand,
};
pub(crate) use commands::notify;
pub use controller::{Loading, Phase, PreviewEvent, QrPreview};
pub use notice::{Notice, NoticeLevel};
