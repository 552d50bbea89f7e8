//! Process-level error handling shared by the `lnr` binary and its tests.

use lnr_core::secret::{redact, Secret};
use lnr_core::{ErrorKind, LnrError};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_AUTH: i32 = 3;
pub const EXIT_NOT_FOUND: i32 = 4;

/// Map an error to the exit code scripts branch on.
///
/// The first `LnrError` in the chain decides; anything else is a generic
/// failure. Usage errors from argument parsing never get here: clap exits
/// with 2 on its own.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let kind = err
        .chain()
        .find_map(|e| e.downcast_ref::<LnrError>())
        .map(LnrError::kind);
    match kind {
        Some(ErrorKind::Authentication) => EXIT_AUTH,
        Some(ErrorKind::NotFound) => EXIT_NOT_FOUND,
        Some(ErrorKind::Validation) => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

/// The full error chain as one line, with every known key masked.
pub fn render_error(err: &anyhow::Error, secrets: &[Secret]) -> String {
    secrets
        .iter()
        .fold(format!("{err:#}"), |text, secret| redact(&text, secret))
}
