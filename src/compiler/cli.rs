// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{CompileError, CompileErrorKind, CompileRunError};
use crate::macro_processor::{Limits, DEFAULT_MAX_PASSES};

pub const VERSION: &str = "1.0";

const LONG_ABOUT: &str = "Macro compiler for tape programs.

Reads a macro-annotated program, expands NAME(ARG;ARG) invocations against
their block-private definitions, resolves the '!', '?' and '~' pointer
bookkeeping markers, cancels adjacent inverse instruction pairs, and writes
the resulting stream of the eight primitive instructions to OUTPUT.";

#[derive(Parser, Debug)]
#[command(
    name = "bfmc",
    version = VERSION,
    about = "Macro compiler for tape programs",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        value_name = "INPUT",
        long_help = "Input program. UTF-8 text; '#' starts a line comment."
    )]
    pub input: PathBuf,
    #[arg(
        value_name = "OUTPUT",
        long_help = "Output file for the compiled primitive stream."
    )]
    pub output: PathBuf,
    #[arg(
        long = "max-passes",
        value_name = "N",
        default_value_t = DEFAULT_MAX_PASSES,
        long_help = "Maximum number of rewrite passes per block before macro expansion is treated as non-terminating. Defaults to 1024."
    )]
    pub max_passes: usize,
}

/// Validate CLI arguments and return the expansion limits.
pub fn validate_cli(cli: &Cli) -> Result<Limits, CompileRunError> {
    if cli.max_passes == 0 {
        return Err(CompileRunError::new(
            CompileError::new(CompileErrorKind::Cli, "--max-passes must be at least 1", None),
            Vec::new(),
            Vec::new(),
        ));
    }
    Ok(Limits {
        max_passes: cli.max_passes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_parses_positional_paths() {
        let cli = Cli::parse_from(["bfmc", "prog.bfm", "prog.bf"]);
        assert_eq!(cli.input, PathBuf::from("prog.bfm"));
        assert_eq!(cli.output, PathBuf::from("prog.bf"));
        assert_eq!(cli.max_passes, DEFAULT_MAX_PASSES);
    }

    #[test]
    fn cli_parses_max_passes() {
        let cli = Cli::parse_from(["bfmc", "a", "b", "--max-passes", "16"]);
        assert_eq!(cli.max_passes, 16);
    }

    #[test]
    fn validate_cli_rejects_zero_max_passes() {
        let cli = Cli::parse_from(["bfmc", "a", "b", "--max-passes", "0"]);
        let err = validate_cli(&cli).unwrap_err();
        assert_eq!(err.to_string(), "--max-passes must be at least 1");
    }

    #[test]
    fn validate_cli_returns_limits() {
        let cli = Cli::parse_from(["bfmc", "a", "b", "--max-passes", "9"]);
        let limits = validate_cli(&cli).expect("validate cli");
        assert_eq!(limits.max_passes, 9);
    }
}
