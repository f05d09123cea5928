//! Request parameters and the form state they are read from.

use std::any::Any;
use std::fmt;

use qrgen_states::{State, assign_impl};
use url::Url;

use crate::{DefaultValues, GenerateError, QrConfig};

/// Output format requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrFormat {
    #[default]
    Png,
    Svg,
}

impl QrFormat {
    pub const ALL: [Self; 2] = [Self::Png, Self::Svg];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
        }
    }

    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    pub fn is_vector(self) -> bool {
        self == Self::Svg
    }
}

impl fmt::Display for QrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ecc {
    L,
    #[default]
    M,
    Q,
    H,
}

impl Ecc {
    pub const ALL: [Self; 4] = [Self::L, Self::M, Self::Q, Self::H];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        }
    }

    /// Recovery capacity and intended use, shown as a tooltip.
    pub fn description(self) -> &'static str {
        match self {
            Self::L => "L (≈7%): maximum capacity, fragile. Internal use.",
            Self::M => "M (≈15%): recommended default trade-off.",
            Self::Q => "Q (≈25%): sturdier, tolerates light smudges or a small logo.",
            Self::H => "H (≈30%): maximum tolerance for small codes, harsh environments or a larger logo.",
        }
    }
}

impl fmt::Display for Ecc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to the generation service, as read from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrParams {
    pub text: String,
    pub size: u32,
    pub ecc: Ecc,
    pub margin: u32,
    pub format: QrFormat,
}

impl QrParams {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.text.trim().is_empty() {
            return Err(GenerateError::EmptyInput);
        }
        Ok(())
    }

    pub fn with_format(&self, format: QrFormat) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }

    /// Builds the service URL. Size and margin are clamped to the configured
    /// limits; the margin is always `0` for SVG.
    pub fn request_url(&self, config: &QrConfig) -> Result<Url, GenerateError> {
        let size = config.limits.clamp_size(self.size);
        let margin = if self.format.is_vector() {
            0
        } else {
            config.limits.clamp_margin(self.margin)
        };

        let mut query = vec![
            ("data", self.text.clone()),
            ("size", format!("{size}x{size}")),
            ("ecc", self.ecc.as_str().to_owned()),
            ("margin", margin.to_string()),
        ];
        if self.format.is_vector() {
            query.push(("format", "svg".to_owned()));
        }

        Ok(Url::parse_with_params(&config.api_base, &query)?)
    }
}

/// Editable form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrForm {
    pub text: String,
    pub size: u32,
    pub ecc: Ecc,
    pub margin: u32,
    pub format: QrFormat,
}

impl QrForm {
    pub fn from_defaults(defaults: &DefaultValues) -> Self {
        Self {
            text: defaults.text.trim().to_owned(),
            size: defaults.size,
            ecc: defaults.ecc,
            margin: defaults.margin,
            format: defaults.format,
        }
    }

    /// Parameters for a request, with the payload trimmed.
    pub fn params(&self) -> QrParams {
        QrParams {
            text: self.text.trim().to_owned(),
            size: self.size,
            ecc: self.ecc,
            margin: self.margin,
            format: self.format,
        }
    }

    pub fn has_payload(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

impl Default for QrForm {
    fn default() -> Self {
        Self::from_defaults(&DefaultValues::default())
    }
}

impl State for QrForm {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        assign_impl(self, new_self);
    }
}
