// Peephole optimizer canceling adjacent inverse instruction pairs.

/// Remove every occurrence of `><`, `<>`, `+-` and `-+`, repeating until a
/// scan finds none. A single stack-shaped pass reaches that fixpoint:
/// canceling a character against the previous survivor uncovers the one
/// before it, so cascaded pairs collapse in the same pass.
pub fn optimize(code: &str) -> String {
    let mut out: Vec<char> = Vec::with_capacity(code.len());
    for c in code.chars() {
        match (out.last(), c) {
            (Some('>'), '<') | (Some('<'), '>') | (Some('+'), '-') | (Some('-'), '+') => {
                out.pop();
            }
            _ => out.push(c),
        }
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::optimize;

    #[test]
    fn cancels_adjacent_inverse_pairs() {
        assert_eq!(optimize("><"), "");
        assert_eq!(optimize("<>"), "");
        assert_eq!(optimize("+-"), "");
        assert_eq!(optimize("-+"), "");
    }

    #[test]
    fn cancellation_cascades() {
        assert_eq!(optimize(">+-<"), "");
        assert_eq!(optimize("++--"), "");
        assert_eq!(optimize(">><<>>"), ">>");
    }

    #[test]
    fn keeps_separated_inverses() {
        assert_eq!(optimize(">.<"), ">.<");
        assert_eq!(optimize("+[-]"), "+[-]");
    }

    #[test]
    fn output_never_contains_a_cancelable_pair() {
        for src in ["><><", "+>-<+-", "<<>>++--", ">+<->+<-"] {
            let out = optimize(src);
            for pair in ["><", "<>", "+-", "-+"] {
                assert!(!out.contains(pair), "{src} -> {out} still contains {pair}");
            }
        }
    }

    #[test]
    fn optimize_is_idempotent() {
        for src in ["", "+", "><><", "[->+<]", ">>+--<<", "+>-<+-"] {
            let once = optimize(src);
            assert_eq!(optimize(&once), once);
        }
    }
}
