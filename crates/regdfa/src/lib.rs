//! Compile a small regular-expression language into minimal DFAs.
//!
//! The supported syntax is literal bytes, grouping, alternation and Kleene
//! star. A regex is parsed straight into an ε-NFA, determinized by subset
//! construction over collapsed epsilon cycles, and minimized with Hopcroft's
//! algorithm. DFAs can be intersected through a product construction.
//!
//! ```
//! use regdfa::Dfa;
//!
//! let div3 = Dfa::from_regex("(0|(1(01*0)*1))*").unwrap();
//! let even = Dfa::from_regex("(0|1)*0").unwrap();
//! let div6 = div3.intersect(&even);
//! assert!(div6.accepts("110"));
//! assert!(!div6.accepts("11"));
//! assert_eq!(div6.size(), 4);
//! ```

pub mod determinize;
mod dfa;
mod dot;
mod error;
mod nfa;
pub mod parser;
mod state;
mod symbol;

pub use dfa::Dfa;
pub use dot::GraphEdge;
pub use error::{Found, ParseError};
pub use nfa::Nfa;
pub use parser::{FragmentBuilder, NfaBuilder, parse, parse_with};
pub use state::{StateId, StateSet};
pub use symbol::{EPSILON, SymbolId, from_byte, is_epsilon};
