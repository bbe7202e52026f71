//! Content-type factories, form descriptors and registry records.
//!
//! # Invariants
//! - A derived form always lists the most recent explicit field list.
//! - Omitting fields on re-registration keeps the fields already recorded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid field name regex"));

/// Constructor signature used to build content instances from form values.
pub type ConstructFn = dyn Fn(&BTreeMap<String, String>) -> ContentItem + Send + Sync;

/// One content instance created by a factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub type_name: String,
    pub values: BTreeMap<String, String>,
}

/// Content-type constructor with an intrinsic type name.
#[derive(Clone)]
pub struct ContentFactory {
    type_name: String,
    module: String,
    construct: Arc<ConstructFn>,
}

impl ContentFactory {
    pub fn new<F>(type_name: impl Into<String>, module: impl Into<String>, construct: F) -> Self
    where
        F: Fn(&BTreeMap<String, String>) -> ContentItem + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            module: module.into(),
            construct: Arc::new(construct),
        }
    }

    /// Factory that copies submitted values into a [`ContentItem`] verbatim.
    pub fn simple(type_name: impl Into<String>, module: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let item_type = type_name.clone();
        Self::new(type_name, module, move |values| ContentItem {
            type_name: item_type.clone(),
            values: values.clone(),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn qualified_name(&self) -> String {
        if self.module.is_empty() {
            return self.type_name.clone();
        }
        format!("{}.{}", self.module, self.type_name)
    }

    pub fn create(&self, values: &BTreeMap<String, String>) -> ContentItem {
        (self.construct)(values)
    }

    pub fn same_constructor(&self, other: &ContentFactory) -> bool {
        Arc::ptr_eq(&self.construct, &other.construct)
    }

    /// Address of the shared constructor.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.construct) as *const () as usize
    }
}

impl Debug for ContentFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFactory")
            .field("type_name", &self.type_name)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// Input widget kind for one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "choices")]
pub enum FieldKind {
    Text,
    TextArea,
    Integer,
    Boolean,
    Choice(Vec<String>),
}

/// One add/edit form field declared for a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    /// Optional plain-text field labelled after its name.
    pub fn text(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind: FieldKind::Text,
            required: false,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Rejections for a declared field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFieldError {
    InvalidName(String),
    DuplicateName(String),
    EmptyChoices(String),
}

impl Display for FormFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "form field name is invalid: {value}"),
            Self::DuplicateName(value) => write!(f, "form field is duplicated: {value}"),
            Self::EmptyChoices(value) => {
                write!(f, "choice field must declare at least one choice: {value}")
            }
        }
    }
}

impl Error for FormFieldError {}

/// Validates one field list before it is attached to a content type.
pub fn validate_form_fields(fields: &[FormField]) -> Result<(), FormFieldError> {
    let mut seen = BTreeSet::new();
    for field in fields {
        if !FIELD_NAME_RE.is_match(&field.name) {
            return Err(FormFieldError::InvalidName(field.name.clone()));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(FormFieldError::DuplicateName(field.name.clone()));
        }
        if matches!(&field.kind, FieldKind::Choice(choices) if choices.is_empty()) {
            return Err(FormFieldError::EmptyChoices(field.name.clone()));
        }
    }
    Ok(())
}

/// Add/edit form descriptor for one content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentForm {
    pub title: String,
    pub factory: String,
    pub fields: Vec<FormField>,
}

impl ContentForm {
    /// Derives a form from the factory, composing with the existing form.
    ///
    /// Explicit `fields` replace the recorded ones; `None` keeps them.
    pub fn derive(
        existing: Option<&ContentForm>,
        factory: &ContentFactory,
        title: &str,
        fields: Option<&[FormField]>,
    ) -> Self {
        let fields = match (fields, existing) {
            (Some(fields), _) => fields.to_vec(),
            (None, Some(previous)) => previous.fields.clone(),
            (None, None) => Vec::new(),
        };
        Self {
            title: title.to_string(),
            factory: factory.qualified_name(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Registry record for one named content type.
#[derive(Debug, Clone)]
pub struct ContentTypeRecord {
    pub name: String,
    pub factory: ContentFactory,
    pub form: ContentForm,
}

impl ContentTypeRecord {
    pub fn new(name: &str, factory: &ContentFactory, fields: Option<&[FormField]>) -> Self {
        Self {
            name: name.to_string(),
            factory: factory.clone(),
            form: ContentForm::derive(None, factory, name, fields),
        }
    }

    /// Updates the record in place with a newer registration.
    pub fn update(&mut self, factory: &ContentFactory, fields: Option<&[FormField]>) {
        self.form = ContentForm::derive(Some(&self.form), factory, &self.name, fields);
        self.factory = factory.clone();
    }
}
