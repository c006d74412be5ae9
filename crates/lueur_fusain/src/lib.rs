//! Fusain - the template tokenizer and parser for Lueur.
//!
//! Turns template source text into the `lueur_esquisse` AST via a
//! byte-indexed state machine and an event-driven tree builder.

pub mod entity;
pub mod parser;
pub mod tokenizer;

pub use parser::{parse, parse_with_options, Parser};
pub use tokenizer::{Callbacks, QuoteType, SpecialKind, State, Tokenizer};
