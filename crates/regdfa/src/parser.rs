//! LL(1) recursive-descent parser for the regex syntax.
//!
//! ```text
//! expr   ::= ε | seq | seq '|' expr
//! seq    ::= star | star seq
//! star   ::= unit | unit '*'
//! unit   ::= symbol | '(' expr ')'
//! symbol ::= any byte except '|', '*', '(', ')'
//! ```
//!
//! There is no AST: every production hands its pieces straight to a
//! [`FragmentBuilder`], which decides what a fragment is. [`NfaBuilder`]
//! builds Thompson-style NFA fragments.

use crate::error::{Found, ParseError};
use crate::nfa::Nfa;
use crate::symbol::{SymbolId, from_byte};

/// Receives grammar events from the parser and composes fragments.
///
/// Combinators take their operands by value; a consumed fragment cannot be
/// used again.
pub trait FragmentBuilder {
    type Fragment;

    /// The language containing only the empty string.
    fn empty(&mut self) -> Self::Fragment;
    /// The language containing only the one-symbol string `symbol`.
    fn symbol(&mut self, symbol: SymbolId) -> Self::Fragment;
    fn concat(&mut self, first: Self::Fragment, second: Self::Fragment) -> Self::Fragment;
    fn alternative(&mut self, first: Self::Fragment, second: Self::Fragment) -> Self::Fragment;
    fn kleene(&mut self, fragment: Self::Fragment) -> Self::Fragment;
}

/// Builds [`Nfa`] fragments with the NFA combinators.
#[derive(Debug, Default, Clone, Copy)]
pub struct NfaBuilder;

impl FragmentBuilder for NfaBuilder {
    type Fragment = Nfa;

    fn empty(&mut self) -> Nfa {
        Nfa::new()
    }

    fn symbol(&mut self, symbol: SymbolId) -> Nfa {
        let mut nfa = Nfa::new();
        nfa.add_symbol(symbol);
        nfa
    }

    fn concat(&mut self, mut first: Nfa, second: Nfa) -> Nfa {
        first.concat(second);
        first
    }

    fn alternative(&mut self, mut first: Nfa, second: Nfa) -> Nfa {
        first.alternative(second);
        first
    }

    fn kleene(&mut self, mut fragment: Nfa) -> Nfa {
        fragment.kleene();
        fragment
    }
}

/// Parse `regex` into an NFA.
pub fn parse(regex: &str) -> Result<Nfa, ParseError> {
    parse_with(regex, NfaBuilder)
}

/// Parse `regex`, composing fragments with `builder`.
pub fn parse_with<B: FragmentBuilder>(regex: &str, builder: B) -> Result<B::Fragment, ParseError> {
    let mut parser = Parser {
        input: regex.as_bytes(),
        pos: 0,
        builder,
    };
    let fragment = parser.expr()?;
    match parser.peek() {
        None => Ok(fragment),
        found => Err(ParseError::TrailingInput {
            position: parser.pos,
            found: Found(found),
        }),
    }
}

/// True for lookaheads that cannot start a unit.
fn ends_unit(lookahead: Option<u8>) -> bool {
    matches!(lookahead, None | Some(b'|' | b'*' | b')'))
}

struct Parser<'a, B> {
    input: &'a [u8],
    pos: usize,
    builder: B,
}

impl<B: FragmentBuilder> Parser<'_, B> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    // `|` chains and sequences fold left in a loop; only groups recurse.
    fn expr(&mut self) -> Result<B::Fragment, ParseError> {
        if ends_unit(self.peek()) {
            return Ok(self.builder.empty());
        }
        let mut fragment = self.seq()?;
        while self.peek() == Some(b'|') {
            self.bump();
            // An empty last branch ends the chain; `a||b` leaves `|b` unparsed.
            if ends_unit(self.peek()) {
                let empty = self.builder.empty();
                return Ok(self.builder.alternative(fragment, empty));
            }
            let next = self.seq()?;
            fragment = self.builder.alternative(fragment, next);
        }
        Ok(fragment)
    }

    fn seq(&mut self) -> Result<B::Fragment, ParseError> {
        let mut fragment = self.star()?;
        while !ends_unit(self.peek()) {
            let next = self.star()?;
            fragment = self.builder.concat(fragment, next);
        }
        Ok(fragment)
    }

    fn star(&mut self) -> Result<B::Fragment, ParseError> {
        let unit = self.unit()?;
        if self.peek() == Some(b'*') {
            self.bump();
            return Ok(self.builder.kleene(unit));
        }
        Ok(unit)
    }

    fn unit(&mut self) -> Result<B::Fragment, ParseError> {
        let open = self.pos;
        let byte = match self.peek() {
            Some(byte) if !ends_unit(Some(byte)) => byte,
            found => {
                return Err(ParseError::UnexpectedToken {
                    position: self.pos,
                    found: Found(found),
                });
            }
        };
        self.bump();

        if byte != b'(' {
            return Ok(self.builder.symbol(from_byte(byte)));
        }
        let inner = self.expr()?;
        if self.peek() != Some(b')') {
            return Err(ParseError::UnclosedParenthesis {
                open,
                position: self.pos,
            });
        }
        self.bump();
        Ok(inner)
    }
}
