//! Tokenizer for BibTeX blocks
//!
//! The lexer works on the text of one `@` block and reports a 1-based line
//! and column for every token. After `=` or `#` it is in value mode, where
//! `{` opens a brace-delimited value instead of an entry.

use nom::bytes::complete::{take_while, take_while1};
use nom::IResult;

use crate::error::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    At,
    Ident,
    Number,
    /// `{...}` value; text excludes the outer braces
    Braced,
    /// `"..."` value; text excludes the quotes
    Quoted,
    EntryOpen(char),
    EntryClose(char),
    Comma,
    Equals,
    Concat,
    /// `%` to end of line; text excludes the `%`
    Comment,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub line: u32,
    pub column: u32,
    /// Byte offset of the token start in the lexer input
    pub offset: usize,
}

/// Characters allowed in identifiers, keys and macro names
pub fn is_ident_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '{' | '}' | '(' | ')' | ',' | '=' | '#' | '"' | '%' | '@')
}

/// Line and column reached after reading `text` from `line`/`column`
pub(crate) fn advance_position(mut line: u32, mut column: u32, text: &str) -> (u32, u32) {
    for c in text.chars() {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(is_ident_char)(input)
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    expect_value: bool,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_position(input, 1, 1)
    }

    /// Lexer whose first character sits at `line`/`column` of a larger input
    pub fn with_position(input: &'a str, line: u32, column: u32) -> Self {
        Self {
            input,
            pos: 0,
            line,
            column,
            expect_value: false,
            finished: false,
        }
    }

    /// Treat the next `{` as the start of a value (used after `@preamble{`)
    pub fn expect_value(&mut self) {
        self.expect_value = true;
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn advance(&mut self, len: usize) {
        (self.line, self.column) =
            advance_position(self.line, self.column, &self.input[self.pos..self.pos + len]);
        self.pos += len;
    }

    fn error(&self, kind: ParseErrorKind, line: u32, column: u32, offset: usize) -> ParseError {
        ParseError::new(kind, line, column, &self.input[offset..])
    }

    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        if let Ok((_, ws)) = whitespace(self.rest()) {
            self.advance(ws.len());
        }

        let rest = self.rest();
        let (line, column, offset) = (self.line, self.column, self.pos);
        let token = |kind: TokenKind, text: &'a str| Token {
            kind,
            text,
            line,
            column,
            offset,
        };

        let Some(c) = rest.chars().next() else {
            return Ok(token(TokenKind::Eof, ""));
        };

        let (kind, text, len) = match c {
            '%' => {
                let len = rest.find('\n').unwrap_or(rest.len());
                (TokenKind::Comment, &rest[1..len], len)
            }
            '@' => (TokenKind::At, &rest[..1], 1),
            '{' if self.expect_value => {
                let len = braced_len(rest)
                    .ok_or_else(|| self.error(ParseErrorKind::UnterminatedBrace, line, column, offset))?;
                (TokenKind::Braced, &rest[1..len - 1], len)
            }
            '"' => {
                let len = quoted_len(rest).map_err(|kind| self.error(kind, line, column, offset))?;
                (TokenKind::Quoted, &rest[1..len - 1], len)
            }
            '{' | '(' => (TokenKind::EntryOpen(c), &rest[..1], 1),
            '}' | ')' => (TokenKind::EntryClose(c), &rest[..1], 1),
            ',' => (TokenKind::Comma, &rest[..1], 1),
            '=' => (TokenKind::Equals, &rest[..1], 1),
            '#' => (TokenKind::Concat, &rest[..1], 1),
            _ => {
                let (_, word) = identifier(rest)
                    .map_err(|_| self.error(ParseErrorKind::UnexpectedToken, line, column, offset))?;
                let kind = if word.chars().all(|c| c.is_ascii_digit()) {
                    TokenKind::Number
                } else {
                    TokenKind::Ident
                };
                (kind, word, word.len())
            }
        };

        match kind {
            TokenKind::Comment => {}
            TokenKind::Equals | TokenKind::Concat => self.expect_value = true,
            _ => self.expect_value = false,
        }
        self.advance(len);
        Ok(token(kind, text))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    /// Yields tokens up to and including `Eof`, or the first error
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        self.finished = !matches!(&result, Ok(token) if token.kind != TokenKind::Eof);
        Some(result)
    }
}

/// Length of a `{...}` group including both braces; escaped braces do not count
fn braced_len(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(pos + 1);
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Length of a `"..."` value including both quotes.
///
/// Quotes inside braces do not terminate the value and braces must balance.
fn quoted_len(input: &str) -> Result<usize, ParseErrorKind> {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut pos = 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' => depth += 1,
            b'}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ParseErrorKind::UnterminatedQuote)?;
            }
            b'"' if depth == 0 => return Ok(pos + 1),
            _ => {}
        }
        pos += 1;
    }
    if depth > 0 {
        Err(ParseErrorKind::UnterminatedBrace)
    } else {
        Err(ParseErrorKind::UnterminatedQuote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .map(|t| t.unwrap().kind)
            .filter(|k| *k != TokenKind::Comment)
            .collect()
    }

    #[test]
    fn test_entry_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("@article{key1, title = {A {B} C}, year = 2024 }"),
            vec![
                At,
                Ident,
                EntryOpen('{'),
                Ident,
                Comma,
                Ident,
                Equals,
                Braced,
                Comma,
                Ident,
                Equals,
                Number,
                EntryClose('}'),
                Eof
            ]
        );
    }

    #[test]
    fn test_concatenation_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"@string(full = jan # " " # {2024})"#),
            vec![
                At,
                Ident,
                EntryOpen('('),
                Ident,
                Equals,
                Ident,
                Concat,
                Quoted,
                Concat,
                Braced,
                EntryClose(')'),
                Eof
            ]
        );
    }

    #[test]
    fn test_value_text_excludes_delimiters() {
        let mut lexer = Lexer::new(r#"= {a {nested} \} value} # "quoted {"} text""#);
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap().text, r"a {nested} \} value");
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap().text, r#"quoted {"} text"#);
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens: Vec<_> = Lexer::new("@misc{k,\n  note = {x}}")
            .map(Result::unwrap)
            .collect();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        let note = tokens.iter().find(|t| t.text == "note").unwrap();
        assert_eq!((note.line, note.column), (2, 3));
    }

    #[test]
    fn test_base_position() {
        let mut lexer = Lexer::with_position("@misc", 10, 5);
        let at = lexer.next_token().unwrap();
        assert_eq!((at.line, at.column), (10, 5));
        let ident = lexer.next_token().unwrap();
        assert_eq!((ident.line, ident.column), (10, 6));
    }

    #[test]
    fn test_comments_are_tokens() {
        let tokens: Vec<_> = Lexer::new("@misc{k, % a note\n}")
            .map(Result::unwrap)
            .collect();
        let comment = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Comment)
            .unwrap();
        assert_eq!(comment.text, " a note");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_unterminated_values() {
        let err = Lexer::new("= {open")
            .find_map(Result::err)
            .unwrap();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedBrace);
        assert_eq!((err.line, err.column), (1, 3));

        let err = Lexer::new("= \"open").find_map(Result::err).unwrap();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedQuote);

        let err = Lexer::new("= \"a {b\"").find_map(Result::err).unwrap();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedBrace);
    }

    #[test]
    fn test_keys_allow_punctuation() {
        let mut lexer = Lexer::new("doi:10.1000/x-y_z.2024+a");
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.text, "doi:10.1000/x-y_z.2024+a");
    }
}
