//! Dotted-reference resolution for directive targets.
//!
//! # Responsibility
//! - Map dotted identifiers (`myapp.widgets.clock`) to registered objects.
//! - Normalize relative (`.widgets.clock`) and colon (`myapp.widgets:clock`)
//!   forms before lookup.
//!
//! # Invariants
//! - Lookups never fall back to fuzzy matching; unknown identifiers fail.
//! - A path holds exactly one object.

use crate::model::content_type::ContentFactory;
use crate::model::widget::Widget;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static DOTTED_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid dotted path regex")
});

/// Directive target: either the object itself or a dotted path to it.
#[derive(Debug, Clone)]
pub enum Reference<T> {
    Object(T),
    Dotted(String),
}

impl<T> From<&str> for Reference<T> {
    fn from(value: &str) -> Self {
        Self::Dotted(value.to_string())
    }
}

impl<T> From<String> for Reference<T> {
    fn from(value: String) -> Self {
        Self::Dotted(value)
    }
}

impl From<Widget> for Reference<Widget> {
    fn from(value: Widget) -> Self {
        Self::Object(value)
    }
}

impl From<ContentFactory> for Reference<ContentFactory> {
    fn from(value: ContentFactory) -> Self {
        Self::Object(value)
    }
}

/// Category of a resolvable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Widget,
    ContentType,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Widget => "widget",
            Self::ContentType => "content type",
        }
    }
}

/// Object stored in a [`ReferenceTable`].
#[derive(Debug, Clone)]
pub enum Resolvable {
    Widget(Widget),
    ContentType(ContentFactory),
}

impl Resolvable {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Widget(_) => ObjectKind::Widget,
            Self::ContentType(_) => ObjectKind::ContentType,
        }
    }
}

/// Objects that can be produced from a table entry and described for tooling.
pub trait Resolve: Clone + Sized {
    const KIND: ObjectKind;

    fn from_resolvable(value: &Resolvable) -> Option<Self>;

    /// Human-readable description, e.g. `widget myapp.widgets.clock`.
    fn describe(&self) -> String;

    /// Object identity used in conflict keys.
    fn identity(&self) -> usize;
}

impl Resolve for Widget {
    const KIND: ObjectKind = ObjectKind::Widget;

    fn from_resolvable(value: &Resolvable) -> Option<Self> {
        match value {
            Resolvable::Widget(widget) => Some(widget.clone()),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        format!("{} {}", Self::KIND.as_str(), self.qualified_name())
    }

    fn identity(&self) -> usize {
        Widget::identity(self)
    }
}

impl Resolve for ContentFactory {
    const KIND: ObjectKind = ObjectKind::ContentType;

    fn from_resolvable(value: &Resolvable) -> Option<Self> {
        match value {
            Resolvable::ContentType(factory) => Some(factory.clone()),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        format!("{} {}", Self::KIND.as_str(), self.qualified_name())
    }

    fn identity(&self) -> usize {
        ContentFactory::identity(self)
    }
}

/// Lookup table from dotted identifiers to widgets and content factories.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: BTreeMap<String, Resolvable>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a widget under an absolute dotted path.
    pub fn register_widget(&mut self, path: &str, widget: Widget) -> Result<(), ResolutionError> {
        self.insert(path, Resolvable::Widget(widget))
    }

    /// Registers a content factory under an absolute dotted path.
    pub fn register_content_type(
        &mut self,
        path: &str,
        factory: ContentFactory,
    ) -> Result<(), ResolutionError> {
        self.insert(path, Resolvable::ContentType(factory))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns registered paths in sorted order.
    pub fn paths(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Resolves `reference`, using `package` as the anchor for relative paths.
    pub fn resolve<T: Resolve>(
        &self,
        reference: &str,
        package: Option<&str>,
    ) -> Result<T, ResolutionError> {
        let path = normalize_reference(reference, package)?;
        let entry = self
            .entries
            .get(&path)
            .ok_or_else(|| ResolutionError::NotFound(path.clone()))?;
        T::from_resolvable(entry).ok_or(ResolutionError::KindMismatch {
            reference: path,
            expected: T::KIND,
            found: entry.kind(),
        })
    }

    fn insert(&mut self, path: &str, value: Resolvable) -> Result<(), ResolutionError> {
        let path = path.trim();
        if !DOTTED_PATH_RE.is_match(path) {
            return Err(ResolutionError::InvalidReference(path.to_string()));
        }
        if self.entries.contains_key(path) {
            return Err(ResolutionError::DuplicatePath(path.to_string()));
        }
        self.entries.insert(path.to_string(), value);
        Ok(())
    }
}

/// Normalizes a raw reference into an absolute dotted path.
///
/// - `pkg.mod:attr` is read as `pkg.mod.attr`.
/// - A leading `.` anchors at `package`; each extra leading `.` drops one
///   trailing package segment.
pub fn normalize_reference(raw: &str, package: Option<&str>) -> Result<String, ResolutionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ResolutionError::EmptyReference);
    }
    if trimmed.matches(':').count() > 1 {
        return Err(ResolutionError::InvalidReference(trimmed.to_string()));
    }
    let joined = trimmed.replacen(':', ".", 1);

    let absolute = if joined.starts_with('.') {
        let rest = joined.trim_start_matches('.');
        let depth = joined.len() - rest.len();
        let package = package
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ResolutionError::RelativeWithoutPackage(trimmed.to_string()))?;
        let mut segments: Vec<&str> = package.split('.').collect();
        for _ in 1..depth {
            if segments.pop().is_none() {
                return Err(ResolutionError::InvalidReference(trimmed.to_string()));
            }
        }
        if segments.is_empty() {
            return Err(ResolutionError::InvalidReference(trimmed.to_string()));
        }
        if rest.is_empty() {
            segments.join(".")
        } else {
            format!("{}.{rest}", segments.join("."))
        }
    } else {
        joined
    };

    if !DOTTED_PATH_RE.is_match(&absolute) {
        return Err(ResolutionError::InvalidReference(trimmed.to_string()));
    }
    Ok(absolute)
}

/// Reference resolution failures, surfaced at directive call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    EmptyReference,
    InvalidReference(String),
    RelativeWithoutPackage(String),
    NotFound(String),
    DuplicatePath(String),
    KindMismatch {
        reference: String,
        expected: ObjectKind,
        found: ObjectKind,
    },
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyReference => write!(f, "reference must not be empty"),
            Self::InvalidReference(value) => write!(f, "reference is not a dotted name: {value}"),
            Self::RelativeWithoutPackage(value) => {
                write!(f, "relative reference needs a package anchor: {value}")
            }
            Self::NotFound(value) => write!(f, "unknown identifier: {value}"),
            Self::DuplicatePath(value) => write!(f, "identifier already registered: {value}"),
            Self::KindMismatch {
                reference,
                expected,
                found,
            } => write!(
                f,
                "{reference} is a {}, expected a {}",
                found.as_str(),
                expected.as_str()
            ),
        }
    }
}

impl Error for ResolutionError {}
