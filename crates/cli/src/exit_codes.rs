//! CLI Exit Code Registry
//!
//! Single source of truth for `tmatch` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, unreadable config file)       |
//! | 3    | Invalid config or rules                              |
//! | 4    | A dataset could not be loaded                        |
//! | 5    | Results could not be exported                        |
//! | 6    | Unmatched rows remain (`run --strict` only)          |
//!
//! New codes: add the constant, document the trigger, update the table.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable config file.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate, or a rule names a column the
/// loaded dataset does not have.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Dataset file missing, unsupported or malformed.
pub const EXIT_LOAD: u8 = 4;

/// Output directory or file could not be written.
pub const EXIT_EXPORT: u8 = 5;

/// `--strict` run left rows unmatched on either side.
pub const EXIT_UNMATCHED: u8 = 6;
