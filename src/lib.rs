/*!

Compiles regular expressions over the printable ASCII range into minimal
deterministic automata.

A pattern is tokenized (with implicit concatenation made explicit), evaluated
into a Thompson ε-NFA by a shunting-yard pass over the token stream, converted
to a DFA by subset construction, and finally minimized by partition
refinement. [`Regex`] matches a single pattern against whole input strings;
[`MultiRegex`] compiles several numbered patterns into one DFA whose accept
states remember which patterns they belong to, so a single pass over the
input reports every pattern that matches.

*/

pub mod character;
pub mod debug;
pub mod dfa;
pub mod error;
pub mod nfa;
pub mod parser;
pub mod regex;

use std::collections::BTreeSet;

pub use character::Char;
pub use dfa::{DeterministicAutomaton, REJECT};
pub use error::CompileError;
pub use nfa::NondeterministicAutomaton;
pub use regex::{compile, MultiRegex, Regex};

// We alias types to enforce size restrictions on their values.
pub type Index32     = u32; //< An index into the pattern string
pub type StateId32   = u32; //< Automaton state id
pub type PatternId32 = u32; //< Pattern id marked on an accept state

// Containers of the above.
pub type StateIdSet = BTreeSet<StateId32>;   //< Canonically ordered set of NFA state ids
pub type MarkSet    = BTreeSet<PatternId32>; //< Pattern ids attached to an accept state
