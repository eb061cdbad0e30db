//! Placeholder scanner.
//!
//! Splits a template such as `"Hello {{NAME}}, today is {{TODAY}}."` into a
//! [`Skeleton`] of literal text and fill slots, plus the ordered placeholder
//! names, one per slot. The scan runs once per template; the result is reused
//! for every record.

use std::fmt;
use thiserror::Error;

pub const OPEN_MARKER: &str = "{{";
pub const CLOSE_MARKER: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated placeholder opened at byte {offset}")]
    UnterminatedPlaceholder { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// Filled by the placeholder name at the same position in [`ParsedTemplate::names`].
    Slot,
}

/// Template text with every placeholder replaced by a fill slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skeleton {
    segments: Vec<Segment>,
}

impl Skeleton {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn slot_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Slot))
            .count()
    }

    /// Renders slots as `%s`, e.g. `"Hello %s, today is %s."`. Diagnostic only;
    /// substitution never goes through this string.
    pub fn to_format_string(&self) -> String {
        self.to_string()
    }

    /// Fills slots in order. Values are copied verbatim; missing values leave
    /// the slot empty.
    pub fn fill<I, V>(&self, values: I) -> String
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut values = values.into_iter();
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot => {
                    if let Some(value) = values.next() {
                        out.push_str(value.as_ref());
                    }
                }
            }
        }
        out
    }

    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Literal(existing)) => existing.push_str(text),
            _ => self.segments.push(Segment::Literal(text.to_string())),
        }
    }
}

impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Slot => f.write_str("%s")?,
            }
        }
        Ok(())
    }
}

/// Scanner output: the skeleton and its positionally aligned placeholder names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTemplate {
    skeleton: Skeleton,
    names: Vec<String>,
}

impl ParsedTemplate {
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// How an open marker with no matching close marker is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanMode {
    /// Drop everything from the unmatched open marker to end of input.
    #[default]
    Lenient,
    /// Fail with [`TemplateError::UnterminatedPlaceholder`].
    Strict,
}

impl ScanMode {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ScanMode::Strict
        } else {
            ScanMode::Lenient
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Literal,
    InPlaceholder { opened_at: usize },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner {
    mode: ScanMode,
}

impl Scanner {
    pub fn new(mode: ScanMode) -> Self {
        Self { mode }
    }

    pub fn scan(&self, template: &str) -> Result<ParsedTemplate, TemplateError> {
        let (parsed, unterminated) = scan_parts(template);
        match (self.mode, unterminated) {
            (ScanMode::Strict, Some(offset)) => {
                Err(TemplateError::UnterminatedPlaceholder { offset })
            }
            _ => Ok(parsed),
        }
    }
}

/// Lenient scan. Never fails: an unterminated placeholder and everything after
/// it is dropped.
pub fn scan(template: &str) -> ParsedTemplate {
    scan_parts(template).0
}

/// Returns the parsed template and, if input ended inside a placeholder, the
/// byte offset of its open marker.
fn scan_parts(template: &str) -> (ParsedTemplate, Option<usize>) {
    let mut parsed = ParsedTemplate::default();
    let mut state = ScanState::Literal;
    let mut literal_start = 0;
    let mut name = String::new();
    let mut pos = 0;

    while pos < template.len() {
        let rest = &template[pos..];
        match state {
            ScanState::Literal => {
                if rest.starts_with(OPEN_MARKER) {
                    parsed.skeleton.push_literal(&template[literal_start..pos]);
                    name.clear();
                    state = ScanState::InPlaceholder { opened_at: pos };
                    pos += OPEN_MARKER.len();
                    continue;
                }
            }
            ScanState::InPlaceholder { .. } => {
                if rest.starts_with(CLOSE_MARKER) {
                    parsed.skeleton.segments.push(Segment::Slot);
                    parsed.names.push(std::mem::take(&mut name));
                    state = ScanState::Literal;
                    pos += CLOSE_MARKER.len();
                    literal_start = pos;
                    continue;
                }
                if let Some(c) = rest.chars().next() {
                    name.push(c);
                }
            }
        }
        pos += rest.chars().next().map_or(1, char::len_utf8);
    }

    match state {
        ScanState::Literal => {
            parsed.skeleton.push_literal(&template[literal_start..]);
            (parsed, None)
        }
        ScanState::InPlaceholder { opened_at } => {
            tracing::debug!(offset = opened_at, "dropping unterminated placeholder");
            (parsed, Some(opened_at))
        }
    }
}
