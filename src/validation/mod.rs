// Form validation module
// Raw form input is first coerced into canonical types (coerce), then the canonical
// values are checked against the transfer and fee schemas (schema)
//
// Numan Thabit 2025 Nov

pub mod coerce;
pub mod messages;
pub mod schema;

pub use coerce::{coerce_amount, coerce_date, AmountInput, DateInput, InvalidDate};
pub use schema::{
    validate_fee_calculation, validate_fee_calculation_today, validate_transfer_form,
    validate_transfer_form_today, FeeCalculationData, FeeCalculationInput, TransferFormData,
    TransferFormInput, MAX_TRANSFER_AMOUNT, MIN_TRANSFER_AMOUNT,
};

use std::collections::BTreeMap;
use std::fmt;

/// Form field a validation message belongs to. Names follow the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    SourceAccount,
    DestinationAccount,
    TransferAmount,
    TransferDate,
    Amount,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::SourceAccount => "sourceAccount",
            Field::DestinationAccount => "destinationAccount",
            Field::TransferAmount => "transferAmount",
            Field::TransferDate => "transferDate",
            Field::Amount => "amount",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Collected field-level failures, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// First message recorded for `field`, which is the one a form shows.
    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn has_error(&self, field: Field) -> bool {
        self.message_for(field).is_some()
    }

    pub fn first_messages(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for error in &self.errors {
            out.entry(error.field.as_str().to_string())
                .or_insert_with(|| error.message.clone());
        }
        out
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates failures while a schema walks its fields
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: ValidationErrors,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: Field, message: impl Into<String>) {
        self.errors.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_valid() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}
