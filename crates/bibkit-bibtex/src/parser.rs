//! BibTeX parser
//!
//! This parser handles standard BibTeX format including:
//! - @string definitions, expanded at the point of reference
//! - @preamble declarations
//! - @comment sections and `%` line comments
//! - Standard and registered custom entry types
//! - Braced, quoted, numeric and macro field values joined with `#`
//! - `{...}` and `(...)` entry delimiters
//!
//! Input is consumed one `@` block at a time, from a string or any `BufRead`.
//! In lenient mode a malformed block is recorded as a diagnostic and skipped;
//! in strict mode the first error ends the parse.

use bibkit_domain::{join_names, parse_names, Entry, EntryType, NameOrder, Registry, NAME_FIELDS};
use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::encoder::{decode, is_verbatim_field};
use crate::error::{BibTeXError, ParseError, ParseErrorKind};
use crate::journal_macros::expand_journal_macro;
use crate::lexer::{advance_position, is_ident_char, Lexer, Token, TokenKind};
use crate::macros::MacroTable;
use crate::settings::ParserSettings;

/// Everything found in one parse.
///
/// Preambles, comments and string definitions are only collected when
/// `ParserSettings::preserve_comments` is set; diagnostics always are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub entries: Vec<Entry>,
    pub preambles: Vec<String>,
    pub comments: Vec<String>,
    /// `@string` definitions in definition order
    pub strings: Vec<(String, String)>,
    /// Errors recovered from in lenient mode and undefined-macro fallbacks
    pub diagnostics: Vec<ParseError>,
}

/// BibTeX parser.
///
/// Each parse call gets a fresh macro table; nothing carries over between calls.
#[derive(Debug, Clone)]
pub struct Parser {
    settings: ParserSettings,
    registry: Arc<Registry>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserSettings::default())
    }
}

impl Parser {
    /// Parser using the process-wide registry
    pub fn new(settings: ParserSettings) -> Self {
        Self::with_registry(settings, Registry::global())
    }

    pub fn with_registry(settings: ParserSettings, registry: Arc<Registry>) -> Self {
        Self { settings, registry }
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Parse input expected to hold exactly one entry
    pub fn parse_one(&self, input: &str) -> Result<Entry, BibTeXError> {
        let document = self.parse_document(input)?;
        let mut entries = document.entries.into_iter();
        match (entries.next(), entries.next()) {
            (Some(entry), None) => Ok(entry),
            (None, _) => Err(ParseError::new(ParseErrorKind::NoEntries, 1, 1, input).into()),
            (Some(_), Some(_)) => {
                Err(ParseError::new(ParseErrorKind::MultipleEntries, 1, 1, input).into())
            }
        }
    }

    /// Parse every entry
    pub fn parse_all(&self, input: &str) -> Result<Vec<Entry>, BibTeXError> {
        Ok(self.parse_document(input)?.entries)
    }

    pub fn parse_document(&self, input: &str) -> Result<Document, BibTeXError> {
        let mut engine = self.engine(StrSource::new(input));
        let mut document = Document::default();
        while let Some(block) = engine.next_block()? {
            match block {
                Block::Entry(entry) => document.entries.push(entry),
                Block::Strings(definitions) => document.strings.extend(definitions),
                Block::Preamble(text) => document.preambles.push(text),
                Block::Comment(text) => document.comments.push(text),
            }
        }
        document.diagnostics = engine.diagnostics;
        Ok(document)
    }

    /// Lazily parse entries from a string
    pub fn entries<'a>(&self, input: &'a str) -> Entries<StrSource<'a>> {
        Entries {
            engine: self.engine(StrSource::new(input)),
        }
    }

    /// Lazily parse entries from a reader, buffering one block at a time
    pub fn stream<R: BufRead>(&self, reader: R) -> Entries<ReaderSource<R>> {
        Entries {
            engine: self.engine(ReaderSource::new(reader)),
        }
    }

    fn engine<S: BlockSource>(&self, source: S) -> Engine<S> {
        let macros = if self.settings.predefined_months {
            MacroTable::with_months()
        } else {
            MacroTable::new()
        };
        Engine {
            source,
            settings: self.settings.clone(),
            registry: Arc::clone(&self.registry),
            macros,
            line: 1,
            column: 1,
            pending: VecDeque::new(),
            diagnostics: Vec::new(),
            finished: false,
        }
    }
}

/// Incremental entry iterator.
///
/// Yields one complete entry per step in source order. It ends after the
/// input is exhausted or after the first fatal error, and cannot be
/// restarted.
pub struct Entries<S> {
    engine: Engine<S>,
}

impl<S> Entries<S> {
    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.engine.diagnostics
    }
}

impl<S: BlockSource> Iterator for Entries<S> {
    type Item = Result<Entry, BibTeXError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.engine.next_block() {
                Ok(Some(Block::Entry(entry))) => return Some(Ok(entry)),
                Ok(Some(_)) => continue,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

// ===== Input sources =====

/// Buffered text the parser pulls blocks from
pub trait BlockSource {
    /// Unconsumed text read so far
    fn text(&self) -> &str;
    /// Read more input; `Ok(false)` once nothing is left
    fn fill(&mut self) -> io::Result<bool>;
    fn consume(&mut self, bytes: usize);
    fn is_exhausted(&self) -> bool;
}

pub struct StrSource<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> StrSource<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }
}

impl BlockSource for StrSource<'_> {
    fn text(&self) -> &str {
        &self.input[self.pos..]
    }

    fn fill(&mut self) -> io::Result<bool> {
        Ok(false)
    }

    fn consume(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn is_exhausted(&self) -> bool {
        true
    }
}

/// Reads one line at a time, only as far as the current block needs
pub struct ReaderSource<R> {
    reader: R,
    buffer: String,
    start: usize,
    exhausted: bool,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            start: 0,
            exhausted: false,
        }
    }
}

impl<R: BufRead> BlockSource for ReaderSource<R> {
    fn text(&self) -> &str {
        &self.buffer[self.start..]
    }

    fn fill(&mut self) -> io::Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if self.start > 0 {
            self.buffer.drain(..self.start);
            self.start = 0;
        }
        let read = self.reader.read_line(&mut self.buffer)?;
        if read == 0 {
            self.exhausted = true;
        }
        Ok(read > 0)
    }

    fn consume(&mut self, bytes: usize) {
        self.start += bytes;
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

// ===== Block scanning =====

enum Block {
    Entry(Entry),
    Strings(Vec<(String, String)>),
    Preamble(String),
    Comment(String),
}

struct BlockSpan {
    /// Byte length of the whole block
    len: usize,
    /// Lower-cased block name (`article`, `string`, `comment`, ...)
    name: String,
    /// Text between the delimiters
    body: Range<usize>,
}

enum Scan {
    Complete(BlockSpan),
    Incomplete,
    /// The block can never be completed; `at` is where the problem starts
    Malformed { kind: ParseErrorKind, at: usize },
}

/// Find where the block starting at `text[0] == '@'` ends.
///
/// Tracks brace depth, quoted values at depth zero and `%` comments. An `@`
/// at depth zero outside a quoted value means the block was never closed.
fn scan_block(text: &str, exhausted: bool) -> Scan {
    let incomplete = |kind, at| {
        if exhausted {
            Scan::Malformed { kind, at }
        } else {
            Scan::Incomplete
        }
    };

    let after_at = &text[1..];
    let name_start = 1 + after_at.len() - after_at.trim_start().len();
    let name_end = text[name_start..]
        .find(|c: char| !is_ident_char(c))
        .map_or(text.len(), |i| name_start + i);
    let rest = &text[name_end..];
    let open_pos = name_end + rest.len() - rest.trim_start().len();
    let name = text[name_start..name_end].to_lowercase();

    let Some(open) = text[open_pos..].chars().next() else {
        return incomplete(ParseErrorKind::UnterminatedEntry, 0);
    };
    if name.is_empty() {
        return Scan::Malformed {
            kind: ParseErrorKind::UnexpectedToken,
            at: name_start,
        };
    }

    let raw = name == "comment";
    if open != '{' && open != '(' {
        if !raw {
            return Scan::Malformed {
                kind: ParseErrorKind::UnexpectedToken,
                at: open_pos,
            };
        }
        // `@comment` without delimiters runs to the end of the line
        return match text[open_pos..].find('\n') {
            Some(nl) => Scan::Complete(BlockSpan {
                len: open_pos + nl,
                name,
                body: open_pos..open_pos + nl,
            }),
            None if exhausted => Scan::Complete(BlockSpan {
                len: text.len(),
                name,
                body: open_pos..text.len(),
            }),
            None => Scan::Incomplete,
        };
    }

    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut quote_at = 0;
    let mut brace_at = 0;
    let mut pos = open_pos + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'"' if depth == 0 && !raw => {
                in_quote = !in_quote;
                quote_at = pos;
            }
            b'{' => {
                if depth == 0 {
                    brace_at = pos;
                }
                depth += 1;
            }
            b'}' if depth > 0 => depth -= 1,
            b'}' if in_quote => {
                return Scan::Malformed {
                    kind: ParseErrorKind::UnterminatedQuote,
                    at: quote_at,
                }
            }
            b'}' if open == '{' => {
                return Scan::Complete(BlockSpan {
                    len: pos + 1,
                    name,
                    body: open_pos + 1..pos,
                })
            }
            b')' if depth == 0 && !in_quote && open == '(' => {
                return Scan::Complete(BlockSpan {
                    len: pos + 1,
                    name,
                    body: open_pos + 1..pos,
                })
            }
            b'%' if depth == 0 && !in_quote && !raw => match text[pos..].find('\n') {
                Some(nl) => pos += nl,
                None => return incomplete(ParseErrorKind::UnterminatedEntry, 0),
            },
            b'@' if depth == 0 && !in_quote && !raw => {
                return Scan::Malformed {
                    kind: ParseErrorKind::UnterminatedEntry,
                    at: 0,
                }
            }
            _ => {}
        }
        pos += 1;
    }

    if in_quote {
        incomplete(ParseErrorKind::UnterminatedQuote, quote_at)
    } else if depth > 0 {
        incomplete(ParseErrorKind::UnterminatedBrace, brace_at)
    } else {
        incomplete(ParseErrorKind::UnterminatedEntry, 0)
    }
}

// ===== Engine =====

/// Per-parse state: source position, macro table and diagnostics
struct Engine<S> {
    source: S,
    settings: ParserSettings,
    registry: Arc<Registry>,
    macros: MacroTable,
    line: u32,
    column: u32,
    pending: VecDeque<Block>,
    diagnostics: Vec<ParseError>,
    finished: bool,
}

impl<S: BlockSource> Engine<S> {
    fn next_block(&mut self) -> Result<Option<Block>, BibTeXError> {
        let result = self.advance();
        if result.is_err() {
            self.finished = true;
            self.pending.clear();
        }
        result
    }

    fn advance(&mut self) -> Result<Option<Block>, BibTeXError> {
        loop {
            if let Some(block) = self.pending.pop_front() {
                return Ok(Some(block));
            }
            if self.finished {
                return Ok(None);
            }
            if !self.skip_to_block()? {
                self.finished = true;
                continue;
            }

            let scan = loop {
                match scan_block(self.source.text(), self.source.is_exhausted()) {
                    Scan::Incomplete => {
                        self.source.fill()?;
                    }
                    other => break other,
                }
            };

            match scan {
                Scan::Complete(span) => {
                    let text = self.source.text()[..span.len].to_string();
                    let (line, column) = (self.line, self.column);
                    self.consume(span.len);
                    match self.parse_block(&text, &span, line, column) {
                        // Behind any comments collected before it
                        Ok(Some(block)) => self.pending.push_back(block),
                        Ok(None) => {}
                        Err(error) => self.recover(error)?,
                    }
                }
                Scan::Malformed { kind, at } => {
                    let text = self.source.text();
                    let (line, column) = advance_position(self.line, self.column, &text[..at]);
                    let error = ParseError::new(kind, line, column, &text[at..]);
                    // Resume at the next `@` after this one
                    self.consume(1);
                    self.recover(error)?;
                }
                Scan::Incomplete => {}
            }
        }
    }

    fn recover(&mut self, error: ParseError) -> Result<(), BibTeXError> {
        if self.settings.strict {
            return Err(error.into());
        }
        warn!(
            line = error.line,
            column = error.column,
            kind = ?error.kind,
            "Skipping malformed block"
        );
        self.diagnostics.push(error);
        Ok(())
    }

    fn consume(&mut self, len: usize) {
        (self.line, self.column) =
            advance_position(self.line, self.column, &self.source.text()[..len]);
        self.source.consume(len);
    }

    /// Skip text outside blocks up to the next `@`.
    ///
    /// Returns false at end of input. `%` lines and stray text become
    /// comment blocks when comments are preserved.
    fn skip_to_block(&mut self) -> Result<bool, BibTeXError> {
        let preserve = self.settings.preserve_comments;
        let mut junk = String::new();
        let mut comments = Vec::new();

        let found = loop {
            let text = self.source.text();
            let exhausted = self.source.is_exhausted();
            let mut pos = 0;
            let mut found = false;
            let mut need_more = false;

            while let Some(c) = text[pos..].chars().next() {
                match c {
                    '@' => {
                        found = true;
                        break;
                    }
                    '%' => {
                        let end = match text[pos..].find('\n') {
                            Some(nl) => pos + nl,
                            None if exhausted => text.len(),
                            None => {
                                need_more = true;
                                break;
                            }
                        };
                        if preserve {
                            flush_junk(&mut junk, &mut comments);
                            let comment = text[pos + 1..end].trim();
                            if !comment.is_empty() {
                                comments.push(comment.to_string());
                            }
                        }
                        pos = end;
                    }
                    c => {
                        if preserve {
                            junk.push(c);
                        }
                        pos += c.len_utf8();
                    }
                }
            }

            self.consume(pos);
            if found {
                break true;
            }
            if !self.source.fill()? && !need_more {
                break false;
            }
        };

        flush_junk(&mut junk, &mut comments);
        self.pending.extend(comments.into_iter().map(Block::Comment));
        Ok(found)
    }

    fn parse_block(
        &mut self,
        text: &str,
        span: &BlockSpan,
        line: u32,
        column: u32,
    ) -> Result<Option<Block>, ParseError> {
        if span.name == "comment" {
            return Ok(self
                .settings
                .preserve_comments
                .then(|| Block::Comment(text[span.body.clone()].trim().to_string())));
        }

        let block = BlockParser {
            lexer: Lexer::with_position(text, line, column),
            peeked: None,
            settings: &self.settings,
            registry: &self.registry,
            macros: &mut self.macros,
            diagnostics: &mut self.diagnostics,
        }
        .parse()?;

        Ok(match block {
            Block::Entry(entry) => {
                debug!(key = entry.key(), line, "Parsed entry");
                Some(Block::Entry(entry))
            }
            other if self.settings.preserve_comments => Some(other),
            _ => None,
        })
    }
}

fn flush_junk(junk: &mut String, comments: &mut Vec<String>) {
    let text = junk.trim();
    if !text.is_empty() {
        comments.push(text.to_string());
    }
    junk.clear();
}

fn closing_delimiter(open: char) -> char {
    if open == '(' {
        ')'
    } else {
        '}'
    }
}

// ===== Block grammar =====

struct BlockParser<'p, 'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token<'a>>,
    settings: &'p ParserSettings,
    registry: &'p Registry,
    macros: &'p mut MacroTable,
    diagnostics: &'p mut Vec<ParseError>,
}

impl<'a> BlockParser<'_, 'a> {
    /// Next token, skipping comments
    fn next(&mut self) -> Result<Token<'a>, ParseError> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        loop {
            let token = self.lexer.next_token()?;
            if token.kind != TokenKind::Comment {
                return Ok(token);
            }
        }
    }

    fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        let token = self.next()?;
        let kind = token.kind;
        self.peeked = Some(token);
        Ok(kind)
    }

    fn error_at(&self, kind: ParseErrorKind, token: &Token<'a>) -> ParseError {
        ParseError::new(
            kind,
            token.line,
            token.column,
            &self.lexer.input()[token.offset..],
        )
    }

    fn unexpected(&self, token: &Token<'a>) -> ParseError {
        let kind = if token.kind == TokenKind::Eof {
            ParseErrorKind::UnterminatedEntry
        } else {
            ParseErrorKind::UnexpectedToken
        };
        self.error_at(kind, token)
    }

    fn expect_equals(&mut self) -> Result<(), ParseError> {
        let token = self.next()?;
        if token.kind == TokenKind::Equals {
            Ok(())
        } else {
            Err(self.unexpected(&token))
        }
    }

    /// Consume a separator after a field; true when the block is closed
    fn field_separator(&mut self, close: char) -> Result<bool, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Comma => Ok(false),
            TokenKind::EntryClose(c) if c == close => Ok(true),
            _ => Err(self.unexpected(&token)),
        }
    }

    fn parse(mut self) -> Result<Block, ParseError> {
        let at = self.next()?;
        if at.kind != TokenKind::At {
            return Err(self.unexpected(&at));
        }
        let name = self.next()?;
        if name.kind != TokenKind::Ident {
            return Err(self.unexpected(&name));
        }
        let open = self.next()?;
        let TokenKind::EntryOpen(open) = open.kind else {
            return Err(self.unexpected(&open));
        };
        let close = closing_delimiter(open);

        match name.text.to_lowercase().as_str() {
            "string" => self.parse_strings(close),
            "preamble" => self.parse_preamble(close),
            _ => self.parse_entry(&name, close),
        }
    }

    fn parse_strings(&mut self, close: char) -> Result<Block, ParseError> {
        let mut definitions = Vec::new();
        loop {
            let name = self.next()?;
            match name.kind {
                TokenKind::Ident => {}
                TokenKind::EntryClose(c) if c == close && !definitions.is_empty() => break,
                _ => return Err(self.unexpected(&name)),
            }
            self.expect_equals()?;
            let (value, _) = self.parse_value()?;
            debug!(name = name.text, "Defined macro");
            self.macros.define(name.text, value.clone());
            definitions.push((name.text.to_string(), value));
            if self.field_separator(close)? {
                break;
            }
        }
        Ok(Block::Strings(definitions))
    }

    fn parse_preamble(&mut self, close: char) -> Result<Block, ParseError> {
        self.lexer.expect_value();
        let (value, _) = self.parse_value()?;
        let token = self.next()?;
        match token.kind {
            TokenKind::EntryClose(c) if c == close => Ok(Block::Preamble(value)),
            _ => Err(self.unexpected(&token)),
        }
    }

    fn parse_entry(&mut self, name: &Token<'a>, close: char) -> Result<Block, ParseError> {
        let entry_type = self.registry.resolve_type(name.text);
        if let EntryType::Unknown(type_name) = &entry_type {
            if self.settings.strict {
                return Err(self.error_at(ParseErrorKind::UnknownEntryType, name));
            }
            debug!(entry_type = %type_name, "Unknown entry type, keeping it untyped");
        }

        let first = self.next()?;
        let (key, mut closed) = match first.kind {
            TokenKind::Ident | TokenKind::Number => (first.text, self.field_separator(close)?),
            TokenKind::Comma => ("", false),
            _ => return Err(self.unexpected(&first)),
        };
        let mut entry = Entry::new(entry_type, key);

        while !closed {
            let field = self.next()?;
            match field.kind {
                TokenKind::Ident => {}
                // Trailing comma before the closing delimiter
                TokenKind::EntryClose(c) if c == close => break,
                _ => return Err(self.unexpected(&field)),
            }
            self.expect_equals()?;
            let (raw, value_token) = self.parse_value()?;
            let field_name = self.registry.canonical_field(field.text);
            let value = self.finish_value(&field_name, raw, &value_token)?;
            if entry.get_raw(&field_name).is_some() {
                debug!(key, field = %field_name, "Duplicate field, keeping the last value");
            }
            entry.set_raw(&field_name, value);
            closed = self.field_separator(close)?;
        }

        Ok(Block::Entry(entry))
    }

    /// Parse `operand (# operand)*`, returning the joined value and the
    /// first operand's token
    fn parse_value(&mut self) -> Result<(String, Token<'a>), ParseError> {
        let first = self.next()?;
        let mut value = self.operand(&first)?;
        while self.peek_kind()? == TokenKind::Concat {
            self.next()?;
            let token = self.next()?;
            value.push_str(&self.operand(&token)?);
        }
        Ok((value, first))
    }

    fn operand(&mut self, token: &Token<'a>) -> Result<String, ParseError> {
        match token.kind {
            TokenKind::Braced | TokenKind::Quoted | TokenKind::Number => Ok(token.text.to_string()),
            TokenKind::Ident => {
                if let Some(value) = self.macros.get(token.text) {
                    return Ok(value.to_string());
                }
                let error = self.error_at(ParseErrorKind::UndefinedMacro, token);
                if self.settings.strict || self.settings.strict_macros {
                    return Err(error);
                }
                warn!(
                    name = token.text,
                    line = token.line,
                    column = token.column,
                    "Undefined macro, using its name literally"
                );
                self.diagnostics.push(error);
                Ok(token.text.to_string())
            }
            _ => Err(self.unexpected(token)),
        }
    }

    /// Apply whitespace, LaTeX and name normalization to a field value
    fn finish_value(
        &self,
        name: &str,
        raw: String,
        token: &Token<'a>,
    ) -> Result<String, ParseError> {
        let mut value = if self.settings.normalize_whitespace {
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            raw
        };

        if self.settings.expand_journal_macros && name == "journal" {
            if let Some(full) = expand_journal_macro(&value) {
                value = full.to_string();
            }
        }

        if self.settings.convert_latex && !is_verbatim_field(name) {
            value = decode(&value);
        }

        if name == "year" && self.settings.require_numeric_year {
            let year = value.trim();
            if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
                return Err(self.error_at(ParseErrorKind::NonNumericField, token));
            }
        }

        if self.settings.normalize_authors && NAME_FIELDS.contains(&name) {
            let names = parse_names(&value);
            if !names.is_empty() {
                value = join_names(&names, NameOrder::LastFirst);
            }
        }

        Ok(value)
    }
}
