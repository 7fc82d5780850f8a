//! Per-field constraint checks for one decoded row.

use std::fmt;

use assess_model::messages::{self, fill_template};
use assess_model::{FieldCode, FieldError, IssueCode, ParsedRow, ValidationIssue};

/// How a field value is coerced after presence and membership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Non-negative whole number, optionally bounded (inclusive).
    Integer { min: u32, max: u32 },
    Decimal,
    /// Exactly `n` ASCII digits.
    Digits(usize),
}

/// Constraints for one column.
///
/// The column name is the field code's interchange string. Every failure is
/// reported under `issue`, whatever check raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: FieldCode,
    pub issue: IssueCode,
    pub required: bool,
    pub allowed: Option<&'static [&'static str]>,
    pub max_length: Option<usize>,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(field: FieldCode, issue: IssueCode) -> Self {
        Self {
            field,
            issue,
            required: false,
            allowed: None,
            max_length: None,
            kind: FieldKind::Text,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = Some(values);
        self
    }

    pub const fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    pub const fn integer(self) -> Self {
        self.integer_between(0, u32::MAX)
    }

    pub const fn integer_between(mut self, min: u32, max: u32) -> Self {
        self.kind = FieldKind::Integer { min, max };
        self
    }

    pub const fn decimal(mut self) -> Self {
        self.kind = FieldKind::Decimal;
        self
    }

    pub const fn digits(mut self, count: usize) -> Self {
        self.kind = FieldKind::Digits(count);
        self
    }

    pub fn column(&self) -> &'static str {
        self.field.as_str()
    }

    /// Check one value: required, then allowed set, then length and coercion.
    pub fn check(&self, value: Option<&str>) -> Option<FieldError> {
        let column = self.column();
        let Some(value) = value else {
            return self.required.then(|| {
                ValidationIssue::error(
                    self.field,
                    self.issue,
                    fill_template(messages::FIELD_REQUIRED, &[&column]),
                )
            });
        };

        if let Some(allowed) = self.allowed
            && !allowed.iter().any(|a| a.eq_ignore_ascii_case(value))
        {
            return Some(self.reject(messages::FIELD_NOT_ALLOWED, value, &[]));
        }

        if let Some(max) = self.max_length
            && value.chars().count() > max
        {
            return Some(
                ValidationIssue::error(
                    self.field,
                    self.issue,
                    fill_template(messages::FIELD_TOO_LONG, &[&column, &max]),
                )
                .with_rejected_value(value),
            );
        }

        match self.kind {
            FieldKind::Text => None,
            FieldKind::Integer { min, max } => match value.parse::<u32>() {
                Err(_) => Some(self.reject(messages::FIELD_NOT_INTEGER, value, &[])),
                Ok(n) if n < min || n > max => Some(self.reject(
                    messages::FIELD_OUT_OF_RANGE,
                    value,
                    &[&min, &max],
                )),
                Ok(_) => None,
            },
            FieldKind::Decimal => match value.parse::<f64>() {
                Ok(n) if n.is_finite() => None,
                _ => Some(self.reject(messages::FIELD_NOT_DECIMAL, value, &[])),
            },
            FieldKind::Digits(count) => {
                let ok = value.len() == count && value.bytes().all(|b| b.is_ascii_digit());
                (!ok).then(|| self.reject(messages::FIELD_MALFORMED, value, &[]))
            }
        }
    }

    /// `{column} {value} ...` style error echoing the rejected value.
    fn reject(&self, template: &str, value: &str, extra: &[&dyn fmt::Display]) -> FieldError {
        let column = self.column();
        let mut args: Vec<&dyn fmt::Display> = vec![&column, &value];
        args.extend_from_slice(extra);
        ValidationIssue::error(self.field, self.issue, fill_template(template, &args))
            .with_rejected_value(value)
    }
}

/// A row whose fields all passed their specs.
///
/// Accessors return coerced values; a `None` means the cell was blank.
#[derive(Debug, Clone, Copy)]
pub struct CheckedFields<'a> {
    row: &'a ParsedRow,
}

impl<'a> CheckedFields<'a> {
    pub fn index(&self) -> usize {
        self.row.index
    }

    pub fn text(&self, field: FieldCode) -> Option<&'a str> {
        self.row.get(field.as_str())
    }

    pub fn raw(&self, field: FieldCode) -> Option<&'a str> {
        self.row.get_raw(field.as_str())
    }

    pub fn owned(&self, field: FieldCode) -> Option<String> {
        self.text(field).map(str::to_string)
    }

    /// Uppercased text, for code values.
    pub fn code(&self, field: FieldCode) -> Option<String> {
        self.text(field).map(str::to_ascii_uppercase)
    }

    pub fn integer(&self, field: FieldCode) -> Option<u32> {
        self.text(field).and_then(|v| v.parse().ok())
    }

    pub fn decimal(&self, field: FieldCode) -> Option<f64> {
        self.text(field).and_then(|v| v.parse().ok())
    }
}

/// Check every spec against `row`, collecting one error per failing field.
pub fn validate_fields<'a>(
    row: &'a ParsedRow,
    specs: &[FieldSpec],
) -> Result<CheckedFields<'a>, Vec<FieldError>> {
    let errors: Vec<FieldError> = specs
        .iter()
        .filter_map(|spec| spec.check(row.get(spec.column())))
        .collect();
    if errors.is_empty() {
        Ok(CheckedFields { row })
    } else {
        Err(errors)
    }
}

/// A record type that can be extracted from a decoded row.
pub trait RowRecord: Sized {
    /// Per-file context the record is checked against.
    type Context;

    fn field_specs() -> &'static [FieldSpec];

    /// Build the record from checked fields, applying cross-field checks.
    fn extract(fields: &CheckedFields<'_>, context: &Self::Context)
    -> Result<Self, Vec<FieldError>>;
}

/// Validate `row` against the record's field specs, then extract it.
pub fn validate_and_extract<R: RowRecord>(
    row: &ParsedRow,
    context: &R::Context,
) -> Result<R, Vec<FieldError>> {
    let fields = validate_fields(row, R::field_specs())?;
    R::extract(&fields, context)
}
