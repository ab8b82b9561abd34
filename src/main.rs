//! refinar CLI - Casting-Plant Data Screening and Prep
//!
//! Command-line interface for refinar operations.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::uninlined_format_args)]

use std::process::ExitCode;

fn main() -> ExitCode {
    refinar::cli::run()
}
