//! Placeholder resolution.
//!
//! Each placeholder name is looked up in the record first, then in the
//! [`ComputedValues`] registry. Names found in neither are written back as
//! their original `{{name}}` marker so they stay visible in the output.

use crate::core::template::{ParsedTemplate, CLOSE_MARKER, OPEN_MARKER};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};

pub const TODAY: &str = "TODAY";

/// Display format for `{{TODAY}}`, e.g. `18 Oct 2026`.
pub const DEFAULT_DATE_FORMAT: &str = "%-d %b %Y";

pub type ValueProducer = Box<dyn Fn() -> String + Send + Sync>;

/// Reserved placeholder names backed by a producer instead of record data.
/// Read-only once handed to a [`Resolver`].
#[derive(Default)]
pub struct ComputedValues {
    producers: BTreeMap<String, ValueProducer>,
}

impl ComputedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `TODAY` rendered in local time using `date_format`.
    /// A format chrono cannot render falls back to [`DEFAULT_DATE_FORMAT`].
    pub fn standard(date_format: &str) -> Self {
        let date_format = date_format.to_string();
        Self::new().with_value(TODAY, move || {
            let now = chrono::Local::now();
            let mut today = String::new();
            if write!(today, "{}", now.format(&date_format)).is_err() {
                tracing::warn!(
                    "📅 Date format '{}' cannot be rendered, using '{}'",
                    date_format,
                    DEFAULT_DATE_FORMAT
                );
                today = now.format(DEFAULT_DATE_FORMAT).to_string();
            }
            today
        })
    }

    pub fn register<F>(&mut self, name: impl Into<String>, producer: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.producers.insert(name.into(), Box::new(producer));
    }

    pub fn with_value<F>(mut self, name: impl Into<String>, producer: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.register(name, producer);
        self
    }

    pub fn with_constant(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        self.with_value(name, move || value.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.producers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.producers.get(name).map(|producer| producer())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.producers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ComputedValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.producers.keys()).finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    computed: &'a ComputedValues,
}

impl<'a> Resolver<'a> {
    pub fn new(computed: &'a ComputedValues) -> Self {
        Self { computed }
    }

    /// Value for one placeholder name. Never fails.
    pub fn resolve_name<'r>(&self, name: &str, record: &'r HashMap<String, String>) -> Cow<'r, str> {
        if let Some(value) = record.get(name) {
            return Cow::Borrowed(value.as_str());
        }
        if let Some(value) = self.computed.get(name) {
            return Cow::Owned(value);
        }
        tracing::trace!(placeholder = name, "unresolved placeholder kept as marker");
        Cow::Owned(format!("{}{}{}", OPEN_MARKER, name, CLOSE_MARKER))
    }

    /// Renders one record against a scanned template.
    pub fn resolve(&self, template: &ParsedTemplate, record: &HashMap<String, String>) -> String {
        let values: Vec<Cow<'_, str>> = template
            .names()
            .iter()
            .map(|name| self.resolve_name(name, record))
            .collect();
        template.skeleton().fill(values)
    }
}
