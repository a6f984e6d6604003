//! Exit codes for the CLI.
//!
//! Scripts driving nightly trend collection branch on these, so each
//! failure family gets its own code.

/// Successful execution
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Command-line usage error (bad arguments)
pub const USAGE_ERROR: u8 = 2;

/// Input file or database not found
pub const NOT_FOUND: u8 = 3;

/// A run with the same description is already stored
pub const DUPLICATE_RUN: u8 = 4;

/// Stored runs could not be aligned for at least one request
pub const DATA_INTEGRITY: u8 = 5;

/// Input log or result file could not be decoded
pub const INVALID_INPUT: u8 = 6;
