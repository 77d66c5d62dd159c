/// The three JSON literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Literal {
    Null,
    True,
    False,
}

impl Literal {
    pub(crate) const fn text(self) -> &'static [u8] {
        match self {
            Literal::Null => b"null",
            Literal::True => b"true",
            Literal::False => b"false",
        }
    }
}

/// What happened after feeding one more byte into the literal matcher?
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// Byte matched, but the literal is not finished yet.
    NeedMore,
    /// Byte matched *and* it was the last byte of the literal.
    Done(Literal),
    /// Byte did **not** match the expected byte.
    Reject,
}

/// `None` ➜ not in the middle of a literal.
/// `Some` ➜ `(remaining_bytes, literal)` while matching.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct ExpectedLiteralBuffer(Option<(&'static [u8], Literal)>);

impl ExpectedLiteralBuffer {
    /// Starts matching after the first byte (`n`, `t` or `f`).
    pub(crate) fn new(first: u8) -> Self {
        let literal = match first {
            b'n' => Literal::Null,
            b't' => Literal::True,
            b'f' => Literal::False,
            _ => return ExpectedLiteralBuffer(None),
        };
        ExpectedLiteralBuffer(Some((&literal.text()[1..], literal)))
    }

    pub(crate) fn step(&mut self, b: u8) -> Step {
        let Some((bytes, literal)) = self.0.take() else {
            return Step::Reject;
        };
        match bytes.split_first() {
            Some((&expected, rest)) if expected == b => {
                if rest.is_empty() {
                    Step::Done(literal)
                } else {
                    self.0 = Some((rest, literal));
                    Step::NeedMore
                }
            }
            _ => {
                // Mismatch: restore the state taken at the top.
                self.0 = Some((bytes, literal));
                Step::Reject
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_each_literal() {
        for literal in [Literal::Null, Literal::True, Literal::False] {
            let text = literal.text();
            let mut m = ExpectedLiteralBuffer::new(text[0]);
            for &b in &text[1..text.len() - 1] {
                assert_eq!(m.step(b), Step::NeedMore);
            }
            assert_eq!(m.step(text[text.len() - 1]), Step::Done(literal));
        }
    }

    #[test]
    fn rejects_mismatch_and_keeps_state() {
        let mut m = ExpectedLiteralBuffer::new(b't');
        assert_eq!(m.step(b'r'), Step::NeedMore);
        assert_eq!(m.step(b'x'), Step::Reject);
        assert_eq!(m.step(b'u'), Step::NeedMore);
        assert_eq!(m.step(b'e'), Step::Done(Literal::True));
        assert_eq!(ExpectedLiteralBuffer::new(b'x').step(b'u'), Step::Reject);
    }
}
