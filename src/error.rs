// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the compiler.

use std::fmt;

/// Categories of compiler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    Cli,
    Io,
    Syntax,
    Scope,
}

/// A compiler error with a kind, message, and optional source line.
#[derive(Debug, Clone)]
pub struct CompileError {
    kind: CompileErrorKind,
    message: String,
    line: Option<u32>,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
            line: None,
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> CompileErrorKind {
        self.kind
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) severity: Severity,
    pub(crate) error: CompileError,
    pub(crate) file: Option<String>,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, error: CompileError) -> Self {
        Self {
            line,
            severity,
            error,
            file: None,
        }
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn format(&self) -> String {
        let sev = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        format!("{}: {} - {}", self.line, sev, self.error.message())
    }

    pub fn format_with_context(&self, lines: Option<&[String]>, use_color: bool) -> String {
        let sev = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        let sev_colored = if use_color {
            let color = match self.severity {
                Severity::Warning => "\x1b[33m",
                Severity::Error => "\x1b[31m",
            };
            format!("{color}{sev}\x1b[0m")
        } else {
            sev.to_string()
        };

        // Line 0 marks a diagnostic with no source anchor.
        let header = match (&self.file, self.line) {
            (Some(file), 0) => format!("{file}: {sev_colored}"),
            (Some(file), line) => format!("{file}:{line}: {sev_colored}"),
            (None, 0) => sev_colored.clone(),
            (None, line) => format!("{line}: {sev_colored}"),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');

        if self.line > 0 {
            for line in build_context_lines(self.line, lines) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out.push_str(&format!("{sev_colored}: {}", self.error.message()));
        out
    }
}

/// Report from a successful compile run.
#[derive(Debug)]
pub struct CompileRunReport {
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl CompileRunReport {
    pub fn new(diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            diagnostics,
            source_lines,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

/// Error from a failed compile run.
#[derive(Debug)]
pub struct CompileRunError {
    error: CompileError,
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl CompileRunError {
    pub fn new(
        error: CompileError,
        diagnostics: Vec<Diagnostic>,
        source_lines: Vec<String>,
    ) -> Self {
        Self {
            error,
            diagnostics,
            source_lines,
        }
    }

    pub fn error(&self) -> &CompileError {
        &self.error
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }
}

impl fmt::Display for CompileRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for CompileRunError {}

/// Build context lines for error display.
pub fn build_context_lines(line_num: u32, lines: Option<&[String]>) -> Vec<String> {
    let mut out = Vec::new();
    let line_idx = line_num.saturating_sub(1) as usize;

    let lines = match lines {
        Some(lines) if !lines.is_empty() => lines,
        _ => {
            out.push(format!("{:>5} | <source unavailable>", line_num));
            return out;
        }
    };

    if line_idx >= lines.len() {
        out.push(format!("{:>5} | <source unavailable>", line_num));
        return out;
    }

    out.push(format!("{:>5} | {}", line_num, lines[line_idx]));
    out
}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}
