//! The JSON number grammar as a resumable state machine.
//!
//! The reader feeds the bytes of a number window by window, so the state has
//! to survive a cut anywhere inside the literal.

/// Position inside `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum NumberState {
    #[default]
    Start,
    Sign,
    Zero,
    DecimalInteger,
    DecimalPoint,
    DecimalFraction,
    DecimalExponent,
    DecimalExponentSign,
    DecimalExponentInteger,
}

use NumberState::{
    DecimalExponent, DecimalExponentInteger, DecimalExponentSign, DecimalFraction,
    DecimalInteger, DecimalPoint, Sign, Start, Zero,
};

impl NumberState {
    /// The state after `b`, or `None` when `b` cannot extend the literal.
    pub(crate) fn next(self, b: u8) -> Option<NumberState> {
        let next = match (self, b) {
            (Start, b'-') => Sign,
            (Start | Sign, b'0') => Zero,
            (Start | Sign, b'1'..=b'9') => DecimalInteger,
            (DecimalInteger, b'0'..=b'9') => DecimalInteger,
            (Zero | DecimalInteger, b'.') => DecimalPoint,
            (DecimalPoint | DecimalFraction, b'0'..=b'9') => DecimalFraction,
            (Zero | DecimalInteger | DecimalFraction, b'e' | b'E') => DecimalExponent,
            (DecimalExponent, b'+' | b'-') => DecimalExponentSign,
            (
                DecimalExponent | DecimalExponentSign | DecimalExponentInteger,
                b'0'..=b'9',
            ) => DecimalExponentInteger,
            _ => return None,
        };
        Some(next)
    }

    /// Whether the bytes seen so far form a complete number.
    pub(crate) fn is_accepting(self) -> bool {
        matches!(
            self,
            Zero | DecimalInteger | DecimalFraction | DecimalExponentInteger
        )
    }

    /// Whether the literal so far is an integer without fraction or
    /// exponent.
    pub(crate) fn is_integer(self) -> bool {
        matches!(self, Zero | DecimalInteger)
    }

    /// Advances over as many bytes of `bytes` as belong to the literal.
    /// Returns how many were consumed.
    pub(crate) fn scan(&mut self, bytes: &[u8]) -> usize {
        let mut state = *self;
        let mut consumed = 0;
        for &b in bytes {
            match state.next(b) {
                Some(next) => state = next,
                None => break,
            }
            consumed += 1;
        }
        *self = state;
        consumed
    }
}

/// Whether `text` is exactly one JSON number.
pub(crate) fn is_valid_number(text: &[u8]) -> bool {
    let mut state = NumberState::Start;
    state.scan(text) == text.len() && state.is_accepting()
}

/// Bytes that may follow a scalar value.
pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}')
}
