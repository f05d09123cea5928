use thiserror::Error;

/// Why a generation cycle could not produce its requested artifact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("payload is empty")]
    EmptyInput,
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
    #[error("HTTP {status}")]
    Http { status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("response is not an SVG (content-type={content_type})")]
    UnsupportedContent { content_type: String },
}

impl From<url::ParseError> for GenerateError {
    fn from(err: url::ParseError) -> Self {
        Self::Endpoint(err.to_string())
    }
}

/// Failures of the download/copy/open actions.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no QR code has been generated")]
    NoResult,
    #[error("image copy is not supported on this platform")]
    ClipboardUnsupported,
    #[error("unsupported file type for copy: {0}")]
    UnsupportedCopyType(String),
    #[error("could not open a new window, check the pop-up blocker")]
    PopupBlocked,
    #[error("cancelled by the user")]
    Cancelled,
    #[error("HTTP {status}")]
    Http { status: u16 },
    #[error("{0}")]
    Network(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("{0}")]
    Platform(String),
}
