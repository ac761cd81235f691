//! Form-body extraction and validation for the dashboard.
//!
//! [`FormData`] accepts both urlencoded and multipart bodies and keeps repeated
//! keys, so multi-selects and file inputs come through unchanged. Parse and
//! choice failures are collected in [`FormErrors`] next to the
//! `validator`-derived checks on each form struct.

mod catalog;
mod product;

pub use catalog::{AttributeForm, CategoryForm, CollectionForm, ProductTypeForm};
pub use product::{attribute_field_name, AttributeField, ProductCreateForm, ProductForm, VariantForm};

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use bytes::Bytes;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use validator::{Validate, ValidationErrors};

use crate::errors::ServiceError;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Not a valid choice.";
pub const INVALID_INTEGER: &str = "Not a valid integer value.";
pub const INVALID_DECIMAL: &str = "Not a valid decimal value.";
pub const INVALID_FLOAT: &str = "Not a valid float value.";

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Decoded form body: text fields in submission order plus uploaded files.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
            return Ok(Self::from_urlencoded(&body));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
        let mut data = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
                    data.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
                    data.fields.push((name, text));
                }
            }
        }
        Ok(data)
    }
}

impl FormData {
    pub fn from_urlencoded(body: &[u8]) -> Self {
        Self {
            fields: url::form_urlencoded::parse(body).into_owned().collect(),
            files: Vec::new(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// First value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Trimmed text, empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(str::trim).unwrap_or_default().to_string()
    }

    /// Checkbox semantics: present and not `""`, `false`, `off` or `0`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "false" | "off" | "0"))
            .unwrap_or(false)
    }

    pub fn int(&self, name: &str, errors: &mut FormErrors) -> Option<i32> {
        self.parse(name, INVALID_INTEGER, errors)
    }

    pub fn decimal(&self, name: &str, errors: &mut FormErrors) -> Option<Decimal> {
        self.parse(name, INVALID_DECIMAL, errors)
    }

    pub fn float(&self, name: &str, errors: &mut FormErrors) -> Option<f64> {
        self.parse(name, INVALID_FLOAT, errors)
    }

    /// Every value under `name` as an integer; non-integers are reported once.
    pub fn ints(&self, name: &str, errors: &mut FormErrors) -> Vec<i32> {
        let mut out = Vec::new();
        let mut invalid = false;
        for raw in self.all(name) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<i32>() {
                Ok(v) if !out.contains(&v) => out.push(v),
                Ok(_) => {}
                Err(_) => invalid = true,
            }
        }
        if invalid {
            errors.add(name, INVALID_INTEGER);
        }
        out
    }

    /// Files under `name`, skipping the empty part browsers send for an untouched input.
    pub fn files(&self, name: &str) -> Vec<&UploadedFile> {
        self.files
            .iter()
            .filter(|f| f.field == name && !f.file_name.trim().is_empty())
            .collect()
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files(name).into_iter().next()
    }

    fn parse<T: FromStr>(&self, name: &str, message: &str, errors: &mut FormErrors) -> Option<T> {
        let raw = self.get(name).map(str::trim).filter(|v| !v.is_empty())?;
        match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.add(name, message);
                None
            }
        }
    }
}

/// Field name to error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        let entry = self.0.entry(field.to_string()).or_default();
        if !entry.contains(&message) {
            entry.push(message);
        }
    }

    pub fn has(&self, field: impl AsRef<str>) -> bool {
        self.0.contains_key(field.as_ref())
    }

    pub fn messages(&self, field: &str) -> Vec<String> {
        self.0.get(field).cloned().unwrap_or_default()
    }

    /// Messages of `field` as one line, for display next to the input.
    pub fn joined(&self, field: impl AsRef<str>) -> String {
        self.0
            .get(field.as_ref())
            .map(|messages| messages.join(" "))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            for message in messages {
                self.add(&field, message);
            }
        }
    }

    /// Runs the `validator` rules of `form` and records their failures.
    pub fn validate<T: Validate>(&mut self, form: &T) {
        if let Err(err) = form.validate() {
            self.merge(err.into());
        }
    }

    pub fn check_choice(&mut self, field: &str, value: i32, allowed: &[SelectOption]) {
        if !allowed.iter().any(|o| o.value == value) {
            self.add(field, INVALID_CHOICE);
        }
    }

    pub fn check_choices(&mut self, field: &str, values: &[i32], allowed: &[SelectOption]) {
        if values
            .iter()
            .any(|v| !allowed.iter().any(|o| o.value == *v))
        {
            self.add(field, INVALID_CHOICE);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(err: ValidationErrors) -> Self {
        let mut errors = FormErrors::default();
        for (field, field_errors) in err.field_errors() {
            for e in field_errors {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", e.code));
                errors.add(field, message);
            }
        }
        errors
    }
}

/// One `<option>` of a select input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: i32,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: i32, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
            selected: false,
        }
    }

    /// The `0 = None` entry of optional selects.
    pub fn none() -> Self {
        Self::new(0, "None")
    }
}

/// Marks options whose value is in `selected`.
pub fn mark_selected(options: &mut [SelectOption], selected: &[i32]) {
    for option in options.iter_mut() {
        option.selected = selected.contains(&option.value);
    }
}
