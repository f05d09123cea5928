//! Platform side of the download, copy and open actions.
//!
//! Business commands queue [`ExportJob`]s; an [`ExportSink`] performs them.
//! The trait keeps dialogs, clipboard and browser access out of tests.
//!
//! # Platform Support
//!
//! - **Native**: `rfd` save dialog, `arboard` clipboard, `egui::OpenUrl`.
//! - **Web (WASM)**: Blob + object URL download, `window.open`; image copy is
//!   reported as unsupported.

use qrgen_business::{ExportError, ExportJob};

/// Performs export jobs on the current platform.
pub trait ExportSink {
    /// Whether [`ExportJob::CopyImage`] can succeed here at all.
    fn clipboard_supported(&self) -> bool;

    fn run(&mut self, job: &ExportJob, ctx: &egui::Context) -> Result<(), ExportError>;
}

#[derive(Debug, Default)]
pub struct PlatformSink;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::borrow::Cow;

    use log::info;
    use qrgen_business::{ExportError, ExportJob, Payload, QrFormat};

    use super::{ExportSink, PlatformSink};

    impl ExportSink for PlatformSink {
        fn clipboard_supported(&self) -> bool {
            true
        }

        fn run(&mut self, job: &ExportJob, ctx: &egui::Context) -> Result<(), ExportError> {
            match job {
                ExportJob::Save { file_name, payload } => save_file(file_name, payload),
                ExportJob::CopyImage { payload } => copy_image(payload),
                ExportJob::OpenUrl { url } => {
                    ctx.open_url(egui::OpenUrl::new_tab(url));
                    Ok(())
                }
            }
        }
    }

    fn save_file(file_name: &str, payload: &Payload) -> Result<(), ExportError> {
        let extension = file_name.rsplit('.').next().unwrap_or_default();
        let Some(path) = rfd::FileDialog::new()
            .set_title("Save QR code")
            .set_file_name(file_name)
            .add_filter(extension.to_uppercase(), &[extension])
            .save_file()
        else {
            info!("Save dialog cancelled");
            return Err(ExportError::Cancelled);
        };

        std::fs::write(&path, &payload.bytes)?;
        info!("Saved {} bytes to {}", payload.bytes.len(), path.display());
        Ok(())
    }

    /// PNG payloads go to the clipboard as an image. SVG markup goes as text,
    /// since desktop clipboards have no portable vector image format.
    fn copy_image(payload: &Payload) -> Result<(), ExportError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|err| ExportError::Clipboard(err.to_string()))?;

        if payload.mime == QrFormat::Svg.mime() {
            let markup = String::from_utf8_lossy(&payload.bytes).into_owned();
            return clipboard
                .set_text(markup)
                .map_err(|err| ExportError::Clipboard(err.to_string()));
        }

        let rgba = image::load_from_memory(&payload.bytes)
            .map_err(|err| ExportError::Decode(err.to_string()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        clipboard
            .set_image(arboard::ImageData {
                width: width as usize,
                height: height as usize,
                bytes: Cow::Owned(rgba.into_raw()),
            })
            .map_err(|err| ExportError::Clipboard(err.to_string()))?;
        info!("Copied {width}x{height} image to the clipboard");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use qrgen_business::{ExportError, ExportJob, Payload};
    use log::warn;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast as _, JsValue};
    use web_sys::js_sys::{Array, Function, Uint8Array};

    use super::{ExportSink, PlatformSink};

    /// How long the blob URL outlives the click that starts the download.
    const REVOKE_DELAY_MS: i32 = 1_000;

    fn platform(err: JsValue) -> ExportError {
        ExportError::Platform(format!("{err:?}"))
    }

    fn window() -> Result<web_sys::Window, ExportError> {
        web_sys::window().ok_or_else(|| ExportError::Platform("no window".to_owned()))
    }

    impl ExportSink for PlatformSink {
        fn clipboard_supported(&self) -> bool {
            false
        }

        fn run(&mut self, job: &ExportJob, _ctx: &egui::Context) -> Result<(), ExportError> {
            match job {
                ExportJob::Save { file_name, payload } => save_file(file_name, payload),
                ExportJob::CopyImage { .. } => Err(ExportError::ClipboardUnsupported),
                ExportJob::OpenUrl { url } => open_tab(url),
            }
        }
    }

    fn save_file(file_name: &str, payload: &Payload) -> Result<(), ExportError> {
        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| ExportError::Platform("no document".to_owned()))?;

        let parts = Array::of1(&Uint8Array::from(&payload.bytes[..]));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(&payload.mime);
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(platform)?;
        let href = web_sys::Url::create_object_url_with_blob(&blob).map_err(platform)?;

        let anchor = document
            .create_element("a")
            .map_err(platform)?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|element| platform(element.into()))?;
        anchor.set_href(&href);
        anchor.set_download(file_name);

        // Some browsers ignore clicks on detached anchors.
        let body = document
            .body()
            .ok_or_else(|| ExportError::Platform("no body".to_owned()))?;
        body.append_child(&anchor).map_err(platform)?;
        anchor.click();
        anchor.remove();

        // Revoking right away can abort the download before it starts.
        let revoke = Closure::once_into_js(move || {
            if let Err(err) = web_sys::Url::revoke_object_url(&href) {
                warn!("Failed to revoke {href}: {err:?}");
            }
        });
        window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                revoke.unchecked_ref::<Function>(),
                REVOKE_DELAY_MS,
            )
            .map_err(platform)?;
        Ok(())
    }

    fn open_tab(url: &str) -> Result<(), ExportError> {
        match window()?
            .open_with_url_and_target(url, "_blank")
            .map_err(platform)?
        {
            Some(_) => Ok(()),
            None => Err(ExportError::PopupBlocked),
        }
    }
}
