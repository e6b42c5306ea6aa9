// Macro expansion engine implementing block-scoped NAME(PARAM;PARAM){BODY}
// definitions with call-by-value invocation and fixpoint rewriting.

use std::collections::HashMap;

use log::{debug, trace};

use crate::error::{CompileError, CompileErrorKind};
use crate::tokenizer::Token;

pub const DEFAULT_MAX_PASSES: usize = 1024;

/// Expansion limits shared by every block.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_passes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// A macro definition. The body is stored fully expanded with respect to
/// the macros the body itself defines; the enclosing block's definitions
/// are invisible to it.
#[derive(Debug, Clone)]
struct Macro {
    params: Vec<String>,
    body: Vec<Token>,
}

impl Macro {
    fn define(body: Vec<Token>, params: Vec<String>, limits: &Limits) -> Result<Self, CompileError> {
        let body = expand(body, limits)?;
        Ok(Self { params, body })
    }

    /// Evaluate the pre-expanded body once against a throwaway scope binding
    /// each parameter to its already-evaluated argument.
    fn invoke(&self, args: Vec<Vec<Token>>, line: u32) -> Result<Vec<Token>, CompileError> {
        if args.len() != self.params.len() {
            return Err(CompileError::new(
                CompileErrorKind::Syntax,
                "Wrong number of macro arguments",
                Some(&format!("expected {}, got {}", self.params.len(), args.len())),
            )
            .with_line(line));
        }
        let scope: Scope = self
            .params
            .iter()
            .cloned()
            .zip(args.into_iter().map(Binding::Value))
            .collect();
        evaluate(&self.body, &scope)
    }
}

/// What a symbolic name resolves to within one block.
#[derive(Debug, Clone)]
enum Binding {
    Macro(Macro),
    Value(Vec<Token>),
}

type Scope = HashMap<String, Binding>;

/// Expand every macro in `code`, returning a sequence of primitive and
/// marker tokens. Definitions are extracted into the block's private scope
/// first; the remaining code is then rewritten against that scope until a
/// pass changes nothing. Each macro body goes through the same cycle with a
/// fresh scope of its own.
pub fn expand(code: Vec<Token>, limits: &Limits) -> Result<Vec<Token>, CompileError> {
    let mut scope = Scope::new();
    let mut code = extract_macros(code, &mut scope, limits)?;

    let mut passes = 0usize;
    loop {
        let next = evaluate(&code, &scope)?;
        if next == code {
            break;
        }
        code = next;
        passes += 1;
        if passes > limits.max_passes {
            return Err(CompileError::new(
                CompileErrorKind::Syntax,
                "Macro expansion exceeded maximum passes",
                Some(&limits.max_passes.to_string()),
            ));
        }
    }
    trace!("block reached fixpoint after {passes} rewrite passes");
    Ok(code)
}

/// Extraction phase: one scan over the block, collecting every
/// `name ( params ) { body }` run into the scope and removing it from the
/// output. Nested `{…}` pairs inside a body are collected wholesale; they
/// belong to the macro's own scope and are resolved when it is constructed.
fn extract_macros(
    code: Vec<Token>,
    scope: &mut Scope,
    limits: &Limits,
) -> Result<Vec<Token>, CompileError> {
    let mut out: Vec<Token> = Vec::new();
    let mut input = code.into_iter();

    while let Some(tok) = input.next() {
        if tok.is_structural('}') {
            return Err(CompileError::new(
                CompileErrorKind::Syntax,
                "'}' found without matching '{'",
                None,
            )
            .with_line(tok.line));
        }
        if !tok.is_structural('{') {
            out.push(tok);
            continue;
        }

        let open_line = tok.line;
        let body = collect_body(&mut input, open_line)?;

        match out.pop() {
            Some(close) if close.is_structural(')') => {}
            _ => {
                return Err(CompileError::new(
                    CompileErrorKind::Syntax,
                    "Expected ')' before '{'",
                    None,
                )
                .with_line(open_line))
            }
        }

        let mut param_tokens = Vec::new();
        loop {
            let Some(t) = out.pop() else {
                return Err(CompileError::new(
                    CompileErrorKind::Syntax,
                    "'(' before '{' not found",
                    None,
                )
                .with_line(open_line));
            };
            if t.is_structural('(') {
                break;
            }
            param_tokens.push(t);
        }
        param_tokens.reverse();
        let params = parse_params(&param_tokens, open_line)?;

        let name = match out.pop() {
            Some(t) => match t.name() {
                Some(name) => name.to_string(),
                None => {
                    return Err(CompileError::new(
                        CompileErrorKind::Syntax,
                        "Invalid macro name before '('",
                        Some(t.text()),
                    )
                    .with_line(t.line))
                }
            },
            None => {
                return Err(CompileError::new(
                    CompileErrorKind::Syntax,
                    "Macro name before '(' not found",
                    None,
                )
                .with_line(open_line))
            }
        };

        debug!("extracted macro '{name}' with {} parameters", params.len());
        let mac = Macro::define(body, params, limits)?;
        scope.insert(name, Binding::Macro(mac));
    }

    Ok(out)
}

fn collect_body(
    input: &mut impl Iterator<Item = Token>,
    open_line: u32,
) -> Result<Vec<Token>, CompileError> {
    let mut body = Vec::new();
    let mut depth = 1usize;
    loop {
        let Some(tok) = input.next() else {
            return Err(CompileError::new(
                CompileErrorKind::Syntax,
                "'{' not matched with '}'",
                None,
            )
            .with_line(open_line));
        };
        if tok.is_structural('{') {
            depth += 1;
        } else if tok.is_structural('}') {
            depth -= 1;
            if depth == 0 {
                break;
            }
        }
        body.push(tok);
    }
    Ok(body)
}

/// Parse the `;`-separated parameter list of a definition. Every slot must
/// be exactly one symbolic name; names must not repeat.
fn parse_params(tokens: &[Token], open_line: u32) -> Result<Vec<String>, CompileError> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut params = Vec::new();
    for slot in tokens.split(|t| t.is_structural(';')) {
        let tok = match slot {
            [tok] => tok,
            [] => {
                return Err(CompileError::new(
                    CompileErrorKind::Syntax,
                    "Macro parameter name cannot be empty",
                    None,
                )
                .with_line(open_line))
            }
            [first, ..] => {
                return Err(CompileError::new(
                    CompileErrorKind::Syntax,
                    "Macro parameter must be a single name",
                    None,
                )
                .with_line(first.line))
            }
        };
        let Some(name) = tok.name() else {
            return Err(CompileError::new(
                CompileErrorKind::Syntax,
                "Invalid macro parameter name",
                Some(tok.text()),
            )
            .with_line(tok.line));
        };
        if params.iter().any(|p| p == name) {
            return Err(CompileError::new(
                CompileErrorKind::Syntax,
                "Duplicate macro parameter",
                Some(name),
            )
            .with_line(tok.line));
        }
        params.push(name.to_string());
    }
    Ok(params)
}

/// Expansion phase: one left-to-right rewrite of `code` against `scope`.
/// Unbound tokens copy through, bound values substitute, macro references
/// consume their argument list and splice in the invocation result.
fn evaluate(code: &[Token], scope: &Scope) -> Result<Vec<Token>, CompileError> {
    let mut out: Vec<Token> = Vec::new();
    let mut pos = 0usize;

    while pos < code.len() {
        let tok = &code[pos];
        pos += 1;

        let binding = match tok.name().and_then(|name| scope.get(name)) {
            Some(binding) => binding,
            None => {
                append_token(&mut out, tok.clone());
                continue;
            }
        };

        match binding {
            Binding::Value(seq) => append_sequence(&mut out, seq.clone()),
            Binding::Macro(mac) => {
                if !code.get(pos).is_some_and(|t| t.is_structural('(')) {
                    return Err(CompileError::new(
                        CompileErrorKind::Syntax,
                        "'(' in macro invocation not found",
                        None,
                    )
                    .with_line(tok.line));
                }
                pos += 1;
                let (slots, consumed) = collect_arguments(&code[pos..], tok.line)?;
                pos += consumed;

                // Call by value: each argument is expanded in the caller's
                // scope before it is bound.
                let mut args = Vec::with_capacity(slots.len());
                for slot in slots {
                    args.push(evaluate(&slot, scope)?);
                }
                let produced = mac.invoke(args, tok.line)?;
                append_sequence(&mut out, produced);
            }
        }
    }

    Ok(out)
}

/// Collect the argument region of an invocation up to the matching `)`.
/// Top-level `;` splits slots; nested parentheses are collected wholesale.
/// Returns the slots and the number of tokens consumed, closing `)`
/// included. An empty region means zero arguments.
fn collect_arguments(
    code: &[Token],
    line: u32,
) -> Result<(Vec<Vec<Token>>, usize), CompileError> {
    let mut slots: Vec<Vec<Token>> = vec![Vec::new()];
    let mut depth = 1usize;
    let mut pos = 0usize;

    while pos < code.len() {
        let tok = &code[pos];
        pos += 1;

        if depth == 1 {
            if tok.is_structural(')') {
                if slots.len() == 1 && slots[0].is_empty() {
                    slots.clear();
                }
                return Ok((slots, pos));
            }
            if tok.is_structural(';') {
                slots.push(Vec::new());
                continue;
            }
        }
        if tok.is_structural('(') {
            depth += 1;
        } else if tok.is_structural(')') {
            depth -= 1;
        }
        slots.last_mut().unwrap().push(tok.clone());
    }

    Err(CompileError::new(
        CompileErrorKind::Syntax,
        "')' in macro invocation not found",
        None,
    )
    .with_line(line))
}

/// Append a produced block to the running output, merging the boundary pair
/// when both sides are settled so long instruction stretches stay one token.
fn append_sequence(out: &mut Vec<Token>, block: Vec<Token>) {
    let mut rest = block.into_iter();
    let Some(first) = rest.next() else { return };
    append_token(out, first);
    out.extend(rest);
}

fn append_token(out: &mut Vec<Token>, tok: Token) {
    if tok.is_settled() {
        if let Some(last) = out.last_mut() {
            if last.is_settled() {
                last.absorb(&tok);
                return;
            }
        }
    }
    out.push(tok);
}
