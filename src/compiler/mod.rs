// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Compiler driver - ties the pipeline together.
//!
//! Tokenizes the input, expands macros, resolves pointer-offset markers,
//! strips what is not one of the eight primitives, cancels inverse pairs,
//! and writes the result.

pub mod cli;


use std::fs;

use clap::Parser;
use log::debug;

use crate::error::{
    CompileError, CompileErrorKind, CompileRunError, CompileRunReport, Diagnostic, Severity,
};
use crate::macro_processor::{self, Limits};
use crate::offset_resolver;
use crate::optimizer;
use crate::tokenizer::{self, Token, TokenKind};

use cli::{validate_cli, Cli};

pub use cli::VERSION;

/// Characters allowed in the final output stream.
const PRIMITIVES: &str = "<>+-.,[]";

/// Characters a leftover symbolic token may consist of without being
/// reported: the primitive alphabet plus the resolver markers. A bare `.`
/// or `,` word travels as a symbolic token and is legitimate output.
const RESIDUE_ALPHABET: &str = "<>+-.,[]!?~";

/// Run the compiler with command-line arguments.
pub fn run() -> Result<CompileRunReport, CompileRunError> {
    let cli = Cli::parse();
    let limits = validate_cli(&cli)?;
    run_one(&cli, &limits)
}

fn run_one(cli: &Cli, limits: &Limits) -> Result<CompileRunReport, CompileRunError> {
    let input_name = cli.input.to_string_lossy().to_string();
    let source = fs::read_to_string(&cli.input).map_err(|err| {
        CompileRunError::new(
            CompileError::new(
                CompileErrorKind::Io,
                "Error reading input file",
                Some(&err.to_string()),
            ),
            Vec::new(),
            Vec::new(),
        )
    })?;
    let source_lines = tokenizer::source_lines(&source);

    let (bytes, diagnostics) = match compile_source(&source, limits) {
        Ok(result) => result,
        Err(err) => {
            let diag = Diagnostic::new(err.line().unwrap_or(0), Severity::Error, err.clone())
                .with_file(Some(input_name));
            return Err(CompileRunError::new(err, vec![diag], source_lines));
        }
    };
    let diagnostics: Vec<Diagnostic> = diagnostics
        .into_iter()
        .map(|diag| diag.with_file(Some(input_name.clone())))
        .collect();

    if let Err(err) = fs::write(&cli.output, &bytes) {
        return Err(CompileRunError::new(
            CompileError::new(
                CompileErrorKind::Io,
                "Error writing output file",
                Some(&err.to_string()),
            ),
            diagnostics,
            source_lines,
        ));
    }

    debug!("compiled {input_name}: {} output bytes", bytes.len());
    Ok(CompileRunReport::new(diagnostics, source_lines))
}

/// Compile source text to the primitive output stream, collecting non-fatal
/// diagnostics along the way.
pub fn compile_source(
    source: &str,
    limits: &Limits,
) -> Result<(Vec<u8>, Vec<Diagnostic>), CompileError> {
    let tokens = tokenizer::tokenize(source);
    let expanded = macro_processor::expand(tokens, limits)?;

    let mut diagnostics = Vec::new();
    let flat = flatten(&expanded, &mut diagnostics);

    let resolution = offset_resolver::resolve(&flat)?;
    if resolution.open_frames > 0 {
        diagnostics.push(Diagnostic::new(
            0,
            Severity::Warning,
            CompileError::new(
                CompileErrorKind::Scope,
                "Input ended with suspended '!' frames",
                Some(&resolution.open_frames.to_string()),
            ),
        ));
    }

    let stripped = strip_non_primitives(&resolution.code);
    let optimized = optimizer::optimize(&stripped);
    Ok((optimized.into_bytes(), diagnostics))
}

/// Join expanded tokens into one character stream. A symbolic token that
/// still stands before an argument list at this point is an invocation of a
/// name no scope ever defined; it is reported and its remains are dropped
/// by the primitive strip. Symbolic tokens in data position travel through
/// silently, as arguments routinely carry inert names.
fn flatten(tokens: &[Token], diagnostics: &mut Vec<Diagnostic>) -> String {
    let mut out = String::new();
    for (idx, tok) in tokens.iter().enumerate() {
        if let TokenKind::Symbolic(name) = &tok.kind {
            let invoked = tokens.get(idx + 1).is_some_and(|t| t.is_structural('('));
            if invoked && !name.chars().all(|c| RESIDUE_ALPHABET.contains(c)) {
                diagnostics.push(Diagnostic::new(
                    tok.line,
                    Severity::Warning,
                    CompileError::new(CompileErrorKind::Syntax, "Unresolved symbol", Some(name))
                        .with_line(tok.line),
                ));
            }
        }
        out.push_str(tok.text());
    }
    out
}

fn strip_non_primitives(code: &str) -> String {
    code.chars().filter(|c| PRIMITIVES.contains(*c)).collect()
}
