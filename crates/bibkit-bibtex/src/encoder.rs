//! LaTeX escape encoding and decoding
//!
//! Encoding is a character-by-character substitution. Decoding is a single
//! left-to-right scan: every recognised escape is replaced once and the
//! replacement text is never rescanned, so `decode(encode(s)) == s`.
//! Unrecognised commands are left untouched.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use unicode_normalization::char::{compose, decompose_canonical};

/// Fields holding identifiers or paths, never encoded or decoded
pub const VERBATIM_FIELDS: &[&str] = &["url", "doi", "eprint", "file", "pdf"];

pub fn is_verbatim_field(name: &str) -> bool {
    VERBATIM_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// How a named command is written when encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// `{\ss}`
    Braced,
    /// `\euro{}`
    Text,
    /// `$\leq$`
    Math,
}

// ===== Named commands =====

/// One entry per character; the encoder writes exactly this command back
const NAMED: &[(char, &str, Form)] = &[
    // Letters and ligatures
    ('æ', "ae", Form::Braced),
    ('Æ', "AE", Form::Braced),
    ('œ', "oe", Form::Braced),
    ('Œ', "OE", Form::Braced),
    ('ß', "ss", Form::Braced),
    ('ø', "o", Form::Braced),
    ('Ø', "O", Form::Braced),
    ('ł', "l", Form::Braced),
    ('Ł', "L", Form::Braced),
    ('å', "aa", Form::Braced),
    ('Å', "AA", Form::Braced),
    ('ı', "i", Form::Braced),
    ('ȷ', "j", Form::Braced),
    ('ð', "dh", Form::Braced),
    ('Ð', "DH", Form::Braced),
    ('þ', "th", Form::Braced),
    ('Þ', "TH", Form::Braced),
    // Literals that are TeX syntax
    ('\\', "textbackslash", Form::Text),
    ('~', "textasciitilde", Form::Text),
    ('^', "textasciicircum", Form::Text),
    // Quotes and dashes
    ('\u{2018}', "textquoteleft", Form::Text),
    ('\u{2019}', "textquoteright", Form::Text),
    ('\u{201C}', "textquotedblleft", Form::Text),
    ('\u{201D}', "textquotedblright", Form::Text),
    ('«', "guillemotleft", Form::Text),
    ('»', "guillemotright", Form::Text),
    ('‹', "guilsinglleft", Form::Text),
    ('›', "guilsinglright", Form::Text),
    ('\u{2013}', "textendash", Form::Text),
    ('\u{2014}', "textemdash", Form::Text),
    ('¡', "textexclamdown", Form::Text),
    ('¿', "textquestiondown", Form::Text),
    // Currency and symbols
    ('€', "euro", Form::Text),
    ('£', "pounds", Form::Text),
    ('¥', "yen", Form::Text),
    ('¢', "textcent", Form::Text),
    ('©', "copyright", Form::Text),
    ('®', "textregistered", Form::Text),
    ('™', "texttrademark", Form::Text),
    ('§', "S", Form::Text),
    ('¶', "P", Form::Text),
    ('†', "dag", Form::Text),
    ('‡', "ddag", Form::Text),
    ('•', "textbullet", Form::Text),
    ('…', "ldots", Form::Text),
    ('°', "textdegree", Form::Text),
    ('µ', "textmu", Form::Text),
    // Greek
    ('α', "alpha", Form::Math),
    ('β', "beta", Form::Math),
    ('γ', "gamma", Form::Math),
    ('δ', "delta", Form::Math),
    ('ε', "epsilon", Form::Math),
    ('ζ', "zeta", Form::Math),
    ('η', "eta", Form::Math),
    ('θ', "theta", Form::Math),
    ('ι', "iota", Form::Math),
    ('κ', "kappa", Form::Math),
    ('λ', "lambda", Form::Math),
    ('μ', "mu", Form::Math),
    ('ν', "nu", Form::Math),
    ('ξ', "xi", Form::Math),
    ('π', "pi", Form::Math),
    ('ρ', "rho", Form::Math),
    ('σ', "sigma", Form::Math),
    ('τ', "tau", Form::Math),
    ('υ', "upsilon", Form::Math),
    ('φ', "phi", Form::Math),
    ('χ', "chi", Form::Math),
    ('ψ', "psi", Form::Math),
    ('ω', "omega", Form::Math),
    ('Γ', "Gamma", Form::Math),
    ('Δ', "Delta", Form::Math),
    ('Θ', "Theta", Form::Math),
    ('Λ', "Lambda", Form::Math),
    ('Ξ', "Xi", Form::Math),
    ('Π', "Pi", Form::Math),
    ('Σ', "Sigma", Form::Math),
    ('Υ', "Upsilon", Form::Math),
    ('Φ', "Phi", Form::Math),
    ('Ψ', "Psi", Form::Math),
    ('Ω', "Omega", Form::Math),
    // Operators and relations
    ('×', "times", Form::Math),
    ('÷', "div", Form::Math),
    ('±', "pm", Form::Math),
    ('∓', "mp", Form::Math),
    ('·', "cdot", Form::Math),
    ('∗', "ast", Form::Math),
    ('⋆', "star", Form::Math),
    ('∘', "circ", Form::Math),
    ('≤', "leq", Form::Math),
    ('≥', "geq", Form::Math),
    ('≠', "neq", Form::Math),
    ('≈', "approx", Form::Math),
    ('≡', "equiv", Form::Math),
    ('∼', "sim", Form::Math),
    ('∝', "propto", Form::Math),
    ('≪', "ll", Form::Math),
    ('≫', "gg", Form::Math),
    ('∈', "in", Form::Math),
    ('∉', "notin", Form::Math),
    ('⊂', "subset", Form::Math),
    ('⊃', "supset", Form::Math),
    ('⊆', "subseteq", Form::Math),
    ('⊇', "supseteq", Form::Math),
    ('∪', "cup", Form::Math),
    ('∩', "cap", Form::Math),
    ('∅', "emptyset", Form::Math),
    ('→', "rightarrow", Form::Math),
    ('←', "leftarrow", Form::Math),
    ('↔', "leftrightarrow", Form::Math),
    ('⇒', "Rightarrow", Form::Math),
    ('⇐', "Leftarrow", Form::Math),
    ('⇔', "Leftrightarrow", Form::Math),
    ('∞', "infty", Form::Math),
    ('∂', "partial", Form::Math),
    ('∇', "nabla", Form::Math),
    ('∀', "forall", Form::Math),
    ('∃', "exists", Form::Math),
    ('¬', "neg", Form::Math),
    ('∧', "wedge", Form::Math),
    ('∨', "vee", Form::Math),
    ('∑', "sum", Form::Math),
    ('∏', "prod", Form::Math),
    ('∫', "int", Form::Math),
    ('√', "sqrt", Form::Math),
    ('′', "prime", Form::Math),
];

/// Additional spellings accepted when decoding
const DECODE_ALIASES: &[(&str, char)] = &[
    ("dots", '…'),
    ("textellipsis", '…'),
    ("textdagger", '†'),
    ("textdaggerdbl", '‡'),
    ("to", '→'),
    ("le", '≤'),
    ("ge", '≥'),
    ("ne", '≠'),
    ("textunderscore", '_'),
    ("textbraceleft", '{'),
    ("textbraceright", '}'),
    ("textdollar", '$'),
];

// ===== Accents =====

/// Accent command to combining mark
const ACCENTS: &[(char, char)] = &[
    ('`', '\u{0300}'),
    ('\'', '\u{0301}'),
    ('^', '\u{0302}'),
    ('~', '\u{0303}'),
    ('=', '\u{0304}'),
    ('u', '\u{0306}'),
    ('.', '\u{0307}'),
    ('"', '\u{0308}'),
    ('r', '\u{030A}'),
    ('H', '\u{030B}'),
    ('v', '\u{030C}'),
    ('d', '\u{0323}'),
    ('c', '\u{0327}'),
    ('k', '\u{0328}'),
    ('b', '\u{0331}'),
];

lazy_static! {
    static ref ENCODE_TABLE: HashMap<char, String> = NAMED
        .iter()
        .map(|(c, name, form)| {
            let text = match form {
                Form::Braced => format!("{{\\{}}}", name),
                Form::Text => format!("\\{}{{}}", name),
                Form::Math => format!("$\\{}$", name),
            };
            (*c, text)
        })
        .collect();

    static ref DECODE_TABLE: HashMap<&'static str, char> = {
        let mut m: HashMap<&'static str, char> =
            NAMED.iter().map(|(c, name, _)| (*name, *c)).collect();
        for (name, c) in DECODE_ALIASES {
            m.entry(*name).or_insert(*c);
        }
        m
    };

    static ref MARK_FOR_ACCENT: HashMap<char, char> = ACCENTS.iter().copied().collect();

    static ref ACCENT_FOR_MARK: HashMap<char, char> =
        ACCENTS.iter().map(|(accent, mark)| (*mark, *accent)).collect();

    /// Alternatives in priority order; the leftmost match wins at each position.
    static ref ESCAPE: Regex = Regex::new(concat!(
        // \& \% \$ \# \_ \{ \}
        r"\\(?P<lit>[&%$#_{}])",
        // $\leq$
        r"|\$\\(?P<math>[A-Za-z]+)\$",
        // {\"o} {\"{o}} {\'\i}
        r#"|\{\\(?P<bsym>[`'^"~=.])(?:\{(?P<bsym_arg>\\?[A-Za-z])\}|(?P<bsym_bare>\\?[A-Za-z]))\}"#,
        // {\c{c}} {\c c}
        r"|\{\\(?P<blet>[uvHcrkdb])(?:\{(?P<blet_arg>\\?[A-Za-z])\}|\s+(?P<blet_bare>\\?[A-Za-z]))\}",
        // {\ss}
        r"|\{\\(?P<bname>[A-Za-z]+)\}",
        // \"o \"{o}
        r#"|\\(?P<sym>[`'^"~=.])(?:\{(?P<sym_arg>\\?[A-Za-z])\}|(?P<sym_bare>\\?[A-Za-z]))"#,
        // \c{c} \c c
        r"|\\(?P<let>[uvHcrkdb])(?:\{(?P<let_arg>\\?[A-Za-z])\}|\s+(?P<let_bare>[A-Za-z]))",
        // \ldots \euro{}
        r"|\\(?P<name>[A-Za-z]+)(?:\{\})?",
    ))
    .unwrap();
}

// ===== Decoding =====

/// Replace LaTeX escapes with Unicode characters.
///
/// Best effort: unknown commands and malformed accents stay as written.
pub fn decode(input: &str) -> String {
    if !input.contains('\\') {
        return input.to_string();
    }
    ESCAPE
        .replace_all(input, |caps: &Captures| decode_match(caps))
        .into_owned()
}

fn decode_match(caps: &Captures) -> String {
    let original = || caps[0].to_string();

    if let Some(lit) = caps.name("lit") {
        return lit.as_str().to_string();
    }

    let named = caps
        .name("math")
        .or_else(|| caps.name("bname"))
        .or_else(|| caps.name("name"));
    if let Some(name) = named {
        return DECODE_TABLE
            .get(name.as_str())
            .map(|c| c.to_string())
            .unwrap_or_else(original);
    }

    let accent = ["bsym", "blet", "sym", "let"]
        .iter()
        .find_map(|group| caps.name(group));
    let base = ["bsym_arg", "bsym_bare", "blet_arg", "blet_bare"]
        .iter()
        .chain(["sym_arg", "sym_bare", "let_arg", "let_bare"].iter())
        .find_map(|group| caps.name(group));

    match (accent, base) {
        (Some(accent), Some(base)) => {
            accented(accent.as_str(), base.as_str()).unwrap_or_else(original)
        }
        _ => original(),
    }
}

/// Compose `base` (a letter, or `\i`/`\j`) with the mark for `accent`
fn accented(accent: &str, base: &str) -> Option<String> {
    let accent = accent.chars().next()?;
    let mark = *MARK_FOR_ACCENT.get(&accent)?;
    let base = match base {
        "\\i" => 'i',
        "\\j" => 'j',
        other => {
            let mut chars = other.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            c
        }
    };
    Some(match compose(base, mark) {
        Some(c) => c.to_string(),
        None => [base, mark].iter().collect(),
    })
}

// ===== Encoding =====

/// Replace characters that need escaping with LaTeX commands.
///
/// Braces that pair up are kept as grouping; unpaired ones are escaped.
pub fn encode(input: &str) -> String {
    let unpaired = unpaired_braces(input);
    let mut result = String::with_capacity(input.len());

    for (i, c) in input.char_indices() {
        match c {
            '&' | '%' | '$' | '#' | '_' => {
                result.push('\\');
                result.push(c);
            }
            '{' | '}' => {
                if unpaired.contains(&i) {
                    result.push('\\');
                }
                result.push(c);
            }
            c if c.is_ascii() && !matches!(c, '\\' | '~' | '^') => result.push(c),
            c => match ENCODE_TABLE.get(&c) {
                Some(command) => result.push_str(command),
                None => match accent_command(c) {
                    Some(command) => result.push_str(&command),
                    None => result.push(c),
                },
            },
        }
    }
    result
}

/// `{\"o}` style command for a precomposed accented ASCII letter
fn accent_command(c: char) -> Option<String> {
    let mut parts = Vec::with_capacity(2);
    decompose_canonical(c, |d| parts.push(d));
    let [base, mark] = parts[..] else {
        return None;
    };
    if !base.is_ascii_alphabetic() || compose(base, mark) != Some(c) {
        return None;
    }
    let accent = *ACCENT_FOR_MARK.get(&mark)?;
    Some(if accent.is_ascii_alphabetic() {
        format!("{{\\{}{{{}}}}}", accent, base)
    } else {
        format!("{{\\{}{}}}", accent, base)
    })
}

/// Byte offsets of braces without a partner
fn unpaired_braces(input: &str) -> Vec<usize> {
    let mut open = Vec::new();
    let mut unpaired = Vec::new();
    for (i, c) in input.char_indices() {
        match c {
            '{' => open.push(i),
            '}' => {
                if open.pop().is_none() {
                    unpaired.push(i);
                }
            }
            _ => {}
        }
    }
    unpaired.extend(open);
    unpaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"M\"uller"#, "Müller")]
    #[case(r#"M\"{u}ller"#, "Müller")]
    #[case(r#"M{\"u}ller"#, "Müller")]
    #[case(r#"caf\'e"#, "café")]
    #[case(r#"Garc\'{\i}a"#, "García")]
    #[case(r"gar\c con", "garçon")]
    #[case(r"gar{\c{c}}on", "garçon")]
    #[case(r"Dvo\v{r}\'ak", "Dvořák")]
    #[case(r"Erd\H{o}s", "Erdős")]
    #[case(r#"\AA{}ngstr\"om"#, "Ångström")]
    #[case(r"Stra{\ss}e", "Straße")]
    #[case(r"10\% off", "10% off")]
    #[case(r"Smith \& Jones", "Smith & Jones")]
    #[case(r"a $\leq$ b", "a ≤ b")]
    #[case(r"\alpha particles", "α particles")]
    #[case(r"Wait\ldots", "Wait…")]
    #[case(r"\euro{}100", "€100")]
    fn test_decode(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(decode(input), expected);
    }

    #[test]
    fn test_unknown_commands_are_left_untouched() {
        assert_eq!(decode(r"\textbf{bold} \foo"), r"\textbf{bold} \foo");
        assert_eq!(decode(r"{\unknown}"), r"{\unknown}");
    }

    #[test]
    fn test_decode_does_not_touch_dashes_or_braces() {
        assert_eq!(decode("pages 1--10 {DNA} a~b"), "pages 1--10 {DNA} a~b");
    }

    #[test]
    fn test_decoded_text_is_not_rescanned() {
        // \textbackslash{} yields a backslash that must not join the "o"
        assert_eq!(decode(r#"\textbackslash{}"o"#), r#"\"o"#);
    }

    #[rstest]
    #[case("Müller", r#"M{\"u}ller"#)]
    #[case("garçon", r"gar{\c{c}}on")]
    #[case("Straße", r"Stra{\ss}e")]
    #[case("50% & $3 #1 a_b", r"50\% \& \$3 \#1 a\_b")]
    #[case("x ≤ y", r"x $\leq$ y")]
    #[case("C:\\path~^", r"C:\textbackslash{}path\textasciitilde{}\textasciicircum{}")]
    #[case("{DNA} sequencing", "{DNA} sequencing")]
    #[case("a } b {", r"a \} b \{")]
    fn test_encode(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(encode(input), expected);
    }

    #[test]
    fn test_every_table_character_round_trips() {
        for (c, _, _) in NAMED {
            let s = c.to_string();
            assert_eq!(decode(&encode(&s)), s, "character {:?}", c);
        }
        for (accent, mark) in ACCENTS {
            for base in ['a', 'e', 'o', 'u', 'c', 'n', 's', 'z', 'A', 'O'] {
                if let Some(c) = compose(base, *mark) {
                    let s = c.to_string();
                    assert_eq!(decode(&encode(&s)), s, "{}{}", accent, base);
                }
            }
        }
    }

    #[test]
    fn test_non_precomposed_sign_passes_through() {
        // ANGSTROM SIGN decomposes to A + ring but is not the composed form
        assert_eq!(encode("\u{212B}"), "\u{212B}");
    }

    #[test]
    fn test_verbatim_fields() {
        assert!(is_verbatim_field("URL"));
        assert!(is_verbatim_field("doi"));
        assert!(!is_verbatim_field("title"));
    }

    proptest! {
        #[test]
        fn test_decode_inverts_encode(s in "[a-zA-Z0-9 {}\\\\~^&%$#_.,;:'\"()-]{0,40}|[äöüßçéñαβ≤€…–—’ \\\\{}a-z]{0,20}") {
            prop_assert_eq!(decode(&encode(&s)), s);
        }
    }
}
