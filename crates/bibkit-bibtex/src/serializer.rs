//! BibTeX serialization
//!
//! Converts entries back to canonical BibTeX text. Output is deterministic
//! for a given model and `SerializerSettings`.

use bibkit_domain::{parse_names, validate_entry, Entry, Field, Registry, NAME_FIELDS};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::encoder::{encode, is_verbatim_field};
use crate::error::BibTeXError;
use crate::parser::Document;
use crate::settings::{Delimiter, SerializerSettings};

#[derive(Debug, Clone)]
pub struct Serializer {
    settings: SerializerSettings,
    registry: Arc<Registry>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(SerializerSettings::default())
    }
}

impl Serializer {
    /// Serializer validating against the process-wide registry
    pub fn new(settings: SerializerSettings) -> Self {
        Self::with_registry(settings, Registry::global())
    }

    pub fn with_registry(settings: SerializerSettings, registry: Arc<Registry>) -> Self {
        Self { settings, registry }
    }

    pub fn settings(&self) -> &SerializerSettings {
        &self.settings
    }

    /// Format a single entry, ending at its closing `}`
    pub fn serialize_entry(&self, entry: &Entry) -> Result<String, BibTeXError> {
        self.check(std::slice::from_ref(entry))?;
        Ok(self.format_entry(entry))
    }

    /// Format entries separated by blank lines.
    ///
    /// With validation enabled every entry is checked before anything is
    /// formatted.
    pub fn serialize_all(&self, entries: &[Entry]) -> Result<String, BibTeXError> {
        self.check(entries)?;
        let newline = self.settings.line_ending.as_str();
        let mut output = String::new();
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                output.push_str(newline);
            }
            output.push_str(&self.format_entry(entry));
            output.push_str(newline);
        }
        Ok(output)
    }

    /// Write entries to `writer`; nothing is written if validation fails
    pub fn write_all<W: Write>(&self, entries: &[Entry], mut writer: W) -> Result<(), BibTeXError> {
        let output = self.serialize_all(entries)?;
        writer.write_all(output.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Format a whole document: comments, preambles, string definitions, then entries
    pub fn serialize_document(&self, document: &Document) -> Result<String, BibTeXError> {
        self.check(&document.entries)?;
        let newline = self.settings.line_ending.as_str();
        let mut blocks = Vec::new();
        for comment in &document.comments {
            blocks.push(format!("@comment{{{}}}", comment));
        }
        for preamble in &document.preambles {
            blocks.push(format!("@preamble{{{{{}}}}}", preamble));
        }
        for (name, value) in &document.strings {
            blocks.push(format!("@string{{{} = {{{}}}}}", name, value));
        }
        blocks.extend(document.entries.iter().map(|e| self.format_entry(e)));

        let mut output = String::new();
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                output.push_str(newline);
            }
            output.push_str(block);
            output.push_str(newline);
        }
        Ok(output)
    }

    /// Rewrite `author`/`editor` in the configured name order
    pub fn apply_name_format(&self, entry: &mut Entry) {
        for name in NAME_FIELDS {
            if let Some(value) = entry.get_raw(name) {
                let rendered = self.render_names(value);
                entry.set_raw(name, rendered);
            }
        }
    }

    fn check(&self, entries: &[Entry]) -> Result<(), BibTeXError> {
        if !self.settings.validate {
            return Ok(());
        }
        debug!(count = entries.len(), "Validating entries before serialization");
        for entry in entries {
            let result = validate_entry(entry, &self.registry);
            if !result.is_valid() {
                warn!(key = entry.key(), errors = ?result.errors, "Entry failed validation");
                return Err(BibTeXError::Validation {
                    key: entry.key().to_string(),
                    result,
                });
            }
        }
        Ok(())
    }

    fn render_names(&self, value: &str) -> String {
        let names = parse_names(value);
        if names.is_empty() {
            return value.to_string();
        }
        names
            .iter()
            .map(|a| a.render(self.settings.name_order))
            .collect::<Vec<_>>()
            .join(" and ")
    }

    fn format_entry(&self, entry: &Entry) -> String {
        let newline = self.settings.line_ending.as_str();
        let mut result = format!("@{}{{{},", entry.entry_type().as_str(), entry.key());
        result.push_str(newline);

        for field in self.ordered_fields(entry) {
            let value = self.field_value(&field.name, &field.value);
            result.push_str(&self.format_field(&field.name, &value));
            result.push_str(newline);
        }

        result.push('}');
        result
    }

    fn ordered_fields<'e>(&self, entry: &'e Entry) -> Vec<&'e Field> {
        let listed = &self.settings.field_order;
        let is_listed = |name: &str| listed.iter().any(|n| n.eq_ignore_ascii_case(name));

        let mut fields: Vec<&Field> = Vec::with_capacity(entry.field_count());
        for name in listed {
            let found = entry.fields().iter().find(|f| f.name.eq_ignore_ascii_case(name));
            if let Some(field) = found {
                if !fields.iter().any(|f| f.name == field.name) {
                    fields.push(field);
                }
            }
        }

        let mut rest: Vec<&Field> = entry
            .fields()
            .iter()
            .filter(|f| !is_listed(&f.name))
            .collect();
        if self.settings.sort_unlisted {
            rest.sort_by(|a, b| a.name.cmp(&b.name));
        }
        fields.extend(rest);
        fields
    }

    /// Field value as it appears in the output, delimiters included
    fn field_value(&self, name: &str, value: &str) -> String {
        let value = if NAME_FIELDS.contains(&name) {
            self.render_names(value)
        } else {
            value.to_string()
        };
        let value = if self.settings.encode_unicode && !is_verbatim_field(name) {
            encode(&value)
        } else {
            value
        };

        if self.settings.bare_numbers
            && !value.is_empty()
            && value.chars().all(|c| c.is_ascii_digit())
        {
            return value;
        }
        match self.settings.delimiter {
            Delimiter::Quotes if !value.contains('"') => format!("\"{}\"", value),
            _ => format!("{{{}}}", value),
        }
    }

    /// `name = value,` with optional word wrapping
    fn format_field(&self, name: &str, value: &str) -> String {
        let indent = &self.settings.indent;
        let body = format!("{} = {},", name, value);
        let line = format!("{}{}", indent, body);
        let Some(max) = self.settings.max_line_length else {
            return line;
        };
        if line.chars().count() <= max || is_verbatim_field(name) {
            return line;
        }

        let newline = self.settings.line_ending.as_str();
        let continuation = indent.repeat(2);
        let mut wrapped = String::new();
        let mut current = String::from(indent.as_str());
        let mut current_len = indent.chars().count();
        let mut line_has_word = false;

        for word in body.split(' ').filter(|w| !w.is_empty()) {
            let word_len = word.chars().count();
            if line_has_word && current_len + 1 + word_len > max {
                wrapped.push_str(&current);
                wrapped.push_str(newline);
                current = continuation.clone();
                current_len = continuation.chars().count();
                line_has_word = false;
            }
            if line_has_word {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
            line_has_word = true;
        }
        wrapped.push_str(&current);
        wrapped
    }
}
