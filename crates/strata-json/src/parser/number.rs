use crate::node::NodeKind;

/// What one byte did to an in-progress number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// The byte extended the token.
    Consumed,
    /// The byte is not part of the token; the number ends just before it
    /// and the byte must be re-examined by the outer state.
    Ends,
    /// The byte can never follow what came before it (a second integer
    /// digit after a leading zero).
    Invalid,
}

/// Well-formedness flags for a number token, tracked per byte so the token
/// can straddle any chunk boundary. A number has no closing delimiter: it
/// ends at the first byte that cannot extend it, or at end of stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NumberFlags {
    leading_zero: bool,
    has_dot: bool,
    has_exp: bool,
    has_digit: bool,
    digit_after_dot: bool,
    digit_after_exp: bool,
    ends_with_dot: bool,
    ends_with_e: bool,
    ends_with_sign: bool,
}

impl NumberFlags {
    /// Start a token from its first byte, which the caller has already
    /// checked is `-` or a digit.
    pub(crate) fn begin(first: u8) -> Self {
        NumberFlags {
            leading_zero: first == b'0',
            has_digit: first.is_ascii_digit(),
            ..NumberFlags::default()
        }
    }

    pub(crate) fn step(&mut self, byte: u8) -> Step {
        match byte {
            b'0'..=b'9' => {
                if !self.has_dot && !self.has_exp {
                    if self.has_digit && self.leading_zero {
                        // RFC 8259: no leading zeros except `0` itself
                        return Step::Invalid;
                    }
                    if !self.has_digit {
                        self.leading_zero = byte == b'0';
                    }
                }
                self.has_digit = true;
                if self.has_dot && !self.has_exp {
                    self.digit_after_dot = true;
                }
                if self.has_exp {
                    self.digit_after_exp = true;
                }
                self.ends_with_dot = false;
                self.ends_with_e = false;
                self.ends_with_sign = false;
                Step::Consumed
            }
            b'.' if !self.has_dot && !self.has_exp && self.has_digit => {
                self.has_dot = true;
                self.ends_with_dot = true;
                Step::Consumed
            }
            b'e' | b'E' if !self.has_exp && self.has_digit => {
                self.has_exp = true;
                self.ends_with_e = true;
                Step::Consumed
            }
            b'+' | b'-' if self.ends_with_e => {
                self.ends_with_sign = true;
                self.ends_with_e = false;
                Step::Consumed
            }
            _ => Step::Ends,
        }
    }

    /// Validation applied when the token ends, whether at a terminating
    /// byte or at `finish`.
    pub(crate) fn valid(&self) -> bool {
        // `has_digit` alone also rules out a lone `-`
        self.has_digit
            && !(self.has_dot && !self.digit_after_dot)
            && !(self.has_exp && !self.digit_after_exp)
            && !self.ends_with_dot
            && !self.ends_with_e
            && !self.ends_with_sign
    }

    pub(crate) fn kind(&self) -> NodeKind {
        if self.has_dot || self.has_exp {
            NodeKind::Float
        } else {
            NodeKind::Int
        }
    }
}
