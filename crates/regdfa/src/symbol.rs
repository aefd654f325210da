//! Symbol types for automata transitions.

/// A symbol identifier represented as a u32.
/// Input code units (bytes) are widened to this type; the special value
/// `EPSILON` represents an epsilon (empty) transition.
pub type SymbolId = u32;

/// Special symbol ID representing epsilon (empty) transitions.
/// We use u32::MAX as the epsilon marker, which also sorts it after every
/// real symbol in ordered transition maps.
pub const EPSILON: SymbolId = u32::MAX;

/// Check if a symbol is an epsilon transition.
#[inline]
pub fn is_epsilon(symbol: SymbolId) -> bool {
    symbol == EPSILON
}

/// Widen an input code unit to a symbol.
#[inline]
pub fn from_byte(byte: u8) -> SymbolId {
    SymbolId::from(byte)
}

/// Human-readable label for a transition symbol.
///
/// Printable ASCII renders as itself, epsilon as `eps`, anything else as an
/// escaped hex code.
pub fn label(symbol: SymbolId) -> String {
    if is_epsilon(symbol) {
        return "eps".to_string();
    }
    match u8::try_from(symbol) {
        Ok(byte) if byte.is_ascii_graphic() || byte == b' ' => char::from(byte).to_string(),
        Ok(byte) => format!("\\x{byte:02x}"),
        Err(_) => format!("\\u{{{symbol:x}}}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon() {
        assert!(is_epsilon(EPSILON));
        assert!(!is_epsilon(0));
        assert!(!is_epsilon(from_byte(b'a')));
    }

    #[test]
    fn test_labels() {
        assert_eq!(label(from_byte(b'a')), "a");
        assert_eq!(label(from_byte(b' ')), " ");
        assert_eq!(label(from_byte(b'\n')), "\\x0a");
        assert_eq!(label(from_byte(0xff)), "\\xff");
        assert_eq!(label(EPSILON), "eps");
        assert_eq!(label(0x1234), "\\u{1234}");
    }
}
