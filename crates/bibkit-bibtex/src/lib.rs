//! BibTeX parsing and serialization
//!
//! This crate converts BibTeX text into `bibkit_domain::Entry` values and
//! back again.
//!
//! Features:
//! - Position-tracking lexer with nom-based recognizers
//! - Macro-aware parser with `@string` expansion, concatenation and
//!   predefined month macros
//! - Lenient recovery or strict failure, with line/column diagnostics
//! - Eager, lazy and streaming (`BufRead`) parse forms
//! - LaTeX special character decoding and encoding
//! - AASTeX journal macro expansion
//! - Configurable canonical serializer

pub mod encoder;
pub mod error;
pub mod journal_macros;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod serializer;
pub mod settings;

pub use encoder::{decode, encode, is_verbatim_field, VERBATIM_FIELDS};
pub use error::{BibTeXError, ParseError, ParseErrorKind, MAX_FRAGMENT_CHARS};
pub use journal_macros::{expand_journal_macro, is_journal_macro};
pub use lexer::{Lexer, Token, TokenKind};
pub use macros::{MacroTable, MONTHS};
pub use parser::{BlockSource, Document, Entries, Parser, ReaderSource, StrSource};
pub use serializer::Serializer;
pub use settings::{Delimiter, LineEnding, ParserSettings, SerializerSettings};
