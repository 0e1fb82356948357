use super::error::PdfError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Mutex;

/// Directory holding a pdfium shared library to prefer over the system one.
pub const PDFIUM_LIB_DIR_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Cached state for lazy Pdfium initialization.
///
/// Stores either the initialization error or the library location, so later
/// calls can bind again quickly without repeating discovery.
enum InitializationState {
    Uninitialized,
    Initialized { lib_dir: Option<PathBuf> },
    Failed(String),
}

/// Pdfium is initialized once, on first use. A failed initialization is
/// remembered and reported on every later call instead of being retried.
static PDFIUM_STATE: Lazy<Mutex<InitializationState>> = Lazy::new(|| Mutex::new(InitializationState::Uninitialized));

fn bind_from(lib_dir: Option<&PathBuf>) -> Result<Box<dyn PdfiumLibraryBindings>, String> {
    match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .map_err(|e| format!("Failed to bind Pdfium in {}: {}", dir.display(), e)),
        None => Pdfium::bind_to_system_library().map_err(|e| format!("Failed to bind system Pdfium: {}", e)),
    }
}

fn bind_pdfium_impl() -> Result<(Option<PathBuf>, Box<dyn PdfiumLibraryBindings>), String> {
    if let Some(dir) = std::env::var_os(PDFIUM_LIB_DIR_ENV).map(PathBuf::from) {
        match bind_from(Some(&dir)) {
            Ok(bindings) => return Ok((Some(dir), bindings)),
            Err(err) => tracing::debug!("{}; falling back to system library", err),
        }
    }

    let bindings = bind_from(None)?;
    Ok((None, bindings))
}

/// Get Pdfium bindings with lazy initialization.
///
/// `map_err` maps the failure message onto the caller's `PdfError` variant and
/// `context` names the operation in error messages.
pub(crate) fn bind_pdfium(
    map_err: fn(String) -> PdfError,
    context: &'static str,
) -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
    let mut state = PDFIUM_STATE
        .lock()
        .map_err(|e| map_err(format!("Failed to acquire lock on Pdfium state ({}): {}", context, e)))?;

    match &*state {
        InitializationState::Uninitialized => match bind_pdfium_impl() {
            Ok((lib_dir, bindings)) => {
                *state = InitializationState::Initialized { lib_dir };
                return Ok(bindings);
            }
            Err(err) => {
                *state = InitializationState::Failed(err.clone());
                return Err(map_err(format!("Pdfium initialization failed ({}): {}", context, err)));
            }
        },
        InitializationState::Failed(err) => {
            return Err(map_err(format!(
                "Pdfium initialization previously failed ({}): {}",
                context, err
            )));
        }
        InitializationState::Initialized { .. } => {}
    }

    let lib_dir = match &*state {
        InitializationState::Initialized { lib_dir } => lib_dir.clone(),
        _ => None,
    };

    bind_from(lib_dir.as_ref()).map_err(|e| map_err(format!("{} ({})", e, context)))
}

/// Whether a Pdfium library can be bound in this process.
pub fn pdfium_available() -> bool {
    bind_pdfium(PdfError::InvalidPdf, "availability check").is_ok()
}
