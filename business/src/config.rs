use std::any::Any;

use chrono::TimeDelta;
use qrgen_states::{State, assign_impl};
use serde::Deserialize;

use crate::{Ecc, QrFormat};

pub const DEFAULT_API_BASE: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Variables read by [`QrConfig::from_env`] carry this prefix.
const ENV_PREFIX: &str = "QRGEN_";

/// Initial form values, also restored by a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValues {
    pub text: String,
    pub size: u32,
    pub format: QrFormat,
    pub ecc: Ecc,
    pub margin: u32,
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self {
            text: "https://example.com".to_owned(),
            size: 300,
            format: QrFormat::Png,
            ecc: Ecc::M,
            margin: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min_size: u32,
    pub max_size: u32,
    pub min_margin: u32,
    pub max_margin: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_size: 120,
            max_size: 800,
            min_margin: 0,
            max_margin: 40,
        }
    }
}

impl Limits {
    // `u32::clamp` panics on an inverted range, which `validate` only warns about.
    #[expect(clippy::manual_clamp)]
    pub fn clamp_size(&self, size: u32) -> u32 {
        size.max(self.min_size).min(self.max_size)
    }

    #[expect(clippy::manual_clamp)]
    pub fn clamp_margin(&self, margin: u32) -> u32 {
        margin.max(self.min_margin).min(self.max_margin)
    }
}

/// User-facing texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    pub empty_text: &'static str,
    pub generated: &'static str,
    pub generated_svg: &'static str,
    /// Followed by the requested format, e.g. `... (PNG).`
    pub generation_error: &'static str,
    pub generate_first: &'static str,
    pub download_success: &'static str,
    pub download_error: &'static str,
    pub copy_success: &'static str,
    pub copy_error: &'static str,
    pub copy_unsupported: &'static str,
    pub open_blocked: &'static str,
    pub svg_fallback: &'static str,
    pub form_reset: &'static str,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            empty_text: "Please enter a text or URL.",
            generated: "QR code generated",
            generated_svg: "SVG QR code generated",
            generation_error: "Error while generating the QR code",
            generate_first: "Generate the QR code first.",
            download_success: "Download started",
            download_error: "Download failed",
            copy_success: "QR code copied to the clipboard",
            copy_error: "Copy failed",
            copy_unsupported: "Image copy is not supported on this platform.",
            open_blocked: "Could not open a new window. Check the pop-up blocker.",
            svg_fallback: "Could not load the SVG, falling back to PNG.",
            form_reset: "Form reset",
        }
    }
}

/// Immutable application configuration, registered as a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrConfig {
    pub api_base: String,
    pub defaults: DefaultValues,
    pub limits: Limits,
    pub messages: Messages,
    /// Shortest time the loading indicator stays visible.
    pub min_loading: TimeDelta,
    /// How long a status notice stays before clearing itself.
    pub notice_ttl: TimeDelta,
    /// Quiet period after the last size-slider move before regenerating.
    pub regenerate_debounce: TimeDelta,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            defaults: DefaultValues::default(),
            limits: Limits::default(),
            messages: Messages::default(),
            min_loading: TimeDelta::milliseconds(700),
            notice_ttl: TimeDelta::seconds(5),
            regenerate_debounce: TimeDelta::milliseconds(400),
        }
    }
}

/// Optional overrides, read from `QRGEN_*` variables.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    api_base: Option<String>,
    min_loading_ms: Option<i64>,
}

impl QrConfig {
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }

    /// Defaults, overridden by `QRGEN_API_BASE` and `QRGEN_MIN_LOADING_MS`.
    ///
    /// Unparseable overrides are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let scoped: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(ENV_PREFIX)
                    .map(|name| (name.to_owned(), value.as_ref().to_owned()))
            })
            .collect();

        let overrides: EnvOverrides = match serde_env::from_iter(scoped) {
            Ok(overrides) => overrides,
            Err(err) => {
                log::warn!("Ignoring {ENV_PREFIX}* overrides: {err}");
                EnvOverrides::default()
            }
        };

        let mut config = Self::default();
        if let Some(api_base) = overrides.api_base.filter(|base| !base.trim().is_empty()) {
            log::info!("Using API base from environment: {api_base}");
            config.api_base = api_base;
        }
        if let Some(ms) = overrides.min_loading_ms.filter(|ms| *ms >= 0) {
            config.min_loading = TimeDelta::milliseconds(ms);
        }
        config
    }

    /// Human-readable consistency problems. An empty list means the
    /// configuration is usable.
    pub fn validate(&self) -> Vec<&'static str> {
        let Limits {
            min_size,
            max_size,
            min_margin,
            max_margin,
        } = self.limits;
        let mut problems = Vec::new();

        if min_size >= max_size {
            problems.push("minimum size must be below maximum size");
        }
        if min_margin > max_margin {
            problems.push("minimum margin must not exceed maximum margin");
        }
        if !(min_size..=max_size).contains(&self.defaults.size) {
            problems.push("default size is outside the size limits");
        }
        if !(min_margin..=max_margin).contains(&self.defaults.margin) {
            problems.push("default margin is outside the margin limits");
        }
        problems
    }
}

impl State for QrConfig {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        assert!(QrConfig::default().validate().is_empty());
    }

    #[test]
    fn validate_reports_each_problem() {
        let mut config = QrConfig::default();
        config.limits.min_size = 900;
        config.limits.min_margin = 50;

        let problems = config.validate();
        assert_eq!(problems.len(), 4, "{problems:?}");
    }

    #[test]
    fn clamping_survives_inverted_limits() {
        let limits = Limits {
            min_size: 500,
            max_size: 200,
            ..Limits::default()
        };
        assert_eq!(limits.clamp_size(300), 200);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = QrConfig::from_vars([
            ("QRGEN_API_BASE", "http://127.0.0.1:9000/qr"),
            ("QRGEN_MIN_LOADING_MS", "0"),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(config.api_base, "http://127.0.0.1:9000/qr");
        assert_eq!(config.min_loading, TimeDelta::zero());
    }

    #[test]
    fn invalid_overrides_fall_back_to_defaults() {
        let config = QrConfig::from_vars([("QRGEN_MIN_LOADING_MS", "soon")]);
        assert_eq!(config, QrConfig::default());

        let config = QrConfig::from_vars([("QRGEN_API_BASE", "   ")]);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }
}
