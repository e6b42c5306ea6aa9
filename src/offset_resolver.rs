// Pointer-offset resolver for the '!', '?' and '~' bookkeeping markers.

use log::trace;

use crate::error::{CompileError, CompileErrorKind};

/// Outcome of resolving a stream: the rewritten code and the number of
/// frames still suspended when input ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub code: String,
    pub open_frames: usize,
}

/// Rewrite save-and-recall markers into plain pointer moves.
///
/// `>` and `<` are emitted and tracked in the running offset. `!` suspends
/// the offset on the frame stack and starts counting from zero. `?` emits
/// the moves that return the pointer to the current frame's origin and
/// resets the count. `~` discards the current count and resumes the
/// enclosing frame's, without moving the pointer. Every other character
/// passes through untouched.
pub fn resolve(code: &str) -> Result<Resolution, CompileError> {
    let mut out = String::with_capacity(code.len());
    let mut offset: i64 = 0;
    let mut stack: Vec<i64> = Vec::new();

    for c in code.chars() {
        match c {
            '!' => {
                stack.push(offset);
                offset = 0;
            }
            '?' => {
                if offset > 0 {
                    out.push_str(&"<".repeat(offset as usize));
                } else if offset < 0 {
                    out.push_str(&">".repeat(offset.unsigned_abs() as usize));
                }
                offset = 0;
            }
            '~' => {
                offset = stack.pop().ok_or_else(|| {
                    CompileError::new(CompileErrorKind::Scope, "'~' found without matching '!'", None)
                })?;
            }
            _ => {
                out.push(c);
                match c {
                    '>' => offset += 1,
                    '<' => offset -= 1,
                    _ => {}
                }
            }
        }
    }

    if !stack.is_empty() {
        trace!("input ended with {} suspended frames", stack.len());
    }
    Ok(Resolution {
        code: out,
        open_frames: stack.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::error::CompileErrorKind;

    #[test]
    fn returns_pointer_to_frame_origin() {
        let res = resolve("!>>>?").expect("resolve");
        assert_eq!(res.code, ">>><<<");
        assert_eq!(res.open_frames, 1);
    }

    #[test]
    fn returns_from_negative_displacement() {
        let res = resolve("!<<?").expect("resolve");
        assert_eq!(res.code, "<<>>");
    }

    #[test]
    fn recall_at_origin_emits_nothing() {
        let res = resolve("!?+").expect("resolve");
        assert_eq!(res.code, "+");
    }

    #[test]
    fn nested_frames_restore_outer_count() {
        // Inner frame's two moves are discarded by '~'; the outer frame
        // still remembers its single move.
        let res = resolve("!>!>>~?").expect("resolve");
        assert_eq!(res.code, ">>><");
        assert_eq!(res.open_frames, 1);
    }

    #[test]
    fn pop_resumes_counting_in_enclosing_frame() {
        let res = resolve("!>!>~>?").expect("resolve");
        assert_eq!(res.code, ">>><<");
    }

    #[test]
    fn pop_without_frame_is_fatal() {
        let err = resolve("~").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::Scope);
        assert_eq!(err.message(), "'~' found without matching '!'");
    }

    #[test]
    fn non_move_primitives_do_not_affect_offset() {
        let res = resolve("!+[.,]?").expect("resolve");
        assert_eq!(res.code, "+[.,]");
    }

    #[test]
    fn counts_frames_left_open() {
        let res = resolve("!!>").expect("resolve");
        assert_eq!(res.open_frames, 2);
        assert_eq!(res.code, ">");
    }

    #[test]
    fn balanced_frames_leave_none_open() {
        let res = resolve("!>?~").expect("resolve");
        assert_eq!(res.open_frames, 0);
    }
}
