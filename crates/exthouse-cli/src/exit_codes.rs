//! Process exit codes. Part of the CLI contract.

use exthouse_core::ExthouseError;

pub const EXIT_SUCCESS: i32 = 0;
/// The baseline produced no valid sample, so nothing could be compared.
pub const EXIT_MISSING_BASELINE: i32 = 1;
/// Bad config, arguments or setup (including I/O failures before auditing).
pub const EXIT_CONFIG_ERROR: i32 = 2;

pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ExthouseError>() {
        Some(ExthouseError::MissingBaseline(_)) => EXIT_MISSING_BASELINE,
        _ => EXIT_CONFIG_ERROR,
    }
}
