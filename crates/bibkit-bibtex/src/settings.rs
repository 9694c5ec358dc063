//! Parser and serializer settings

use bibkit_domain::NameOrder;
use serde::{Deserialize, Serialize};

/// Parser behaviour.
///
/// Defaults: lenient, LaTeX decoded, author names normalized, whitespace
/// collapsed, comments dropped, month macros predefined, journal macros left
/// alone and `year` required to be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Every parse error aborts the whole parse
    pub strict: bool,
    /// Undefined macro references are errors rather than literal fallbacks
    pub strict_macros: bool,
    /// Decode LaTeX escapes into Unicode
    pub convert_latex: bool,
    /// Rewrite `author`/`editor` fields in canonical `Last, First` form
    pub normalize_authors: bool,
    /// Collapse whitespace runs in values and trim them
    pub normalize_whitespace: bool,
    /// Keep comments, preambles and string definitions in the `Document`
    pub preserve_comments: bool,
    /// Seed each parse with `jan` .. `dec`
    pub predefined_months: bool,
    /// Expand AASTeX journal macros such as `\apj` in `journal`
    pub expand_journal_macros: bool,
    /// Reject a `year` that is not all digits
    pub require_numeric_year: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            strict: false,
            strict_macros: false,
            convert_latex: true,
            normalize_authors: true,
            normalize_whitespace: true,
            preserve_comments: false,
            predefined_months: true,
            expand_journal_macros: false,
            require_numeric_year: true,
        }
    }
}

impl ParserSettings {
    pub fn strict() -> Self {
        Self {
            strict: true,
            strict_macros: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    #[default]
    Braces,
    Quotes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    /// `\r\n` on Windows, `\n` elsewhere
    Native,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Native => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

/// Serializer behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerSettings {
    /// Fields written first, in this order
    pub field_order: Vec<String>,
    /// Sort fields missing from `field_order` alphabetically instead of
    /// keeping model order
    pub sort_unlisted: bool,
    pub delimiter: Delimiter,
    /// Write all-digit values without delimiters
    pub bare_numbers: bool,
    /// Wrap values once a line exceeds this many characters
    pub max_line_length: Option<usize>,
    pub indent: String,
    pub line_ending: LineEnding,
    /// Rendering of `author` and `editor`
    pub name_order: NameOrder,
    /// Encode non-ASCII characters as LaTeX
    pub encode_unicode: bool,
    /// Validate every entry before writing anything
    pub validate: bool,
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self {
            field_order: Vec::new(),
            sort_unlisted: false,
            delimiter: Delimiter::Braces,
            bare_numbers: false,
            max_line_length: None,
            indent: "  ".to_string(),
            line_ending: LineEnding::Lf,
            name_order: NameOrder::LastFirst,
            encode_unicode: true,
            validate: false,
        }
    }
}
