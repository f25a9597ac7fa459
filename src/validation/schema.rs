// Transfer form and fee calculation schemas
// Validates coerced form values field by field and collects every failure, so the
// whole form can be annotated before anything is submitted
//
// Numan Thabit 2025 Nov

use super::coerce::{coerce_amount, coerce_date, AmountInput, DateInput};
use super::messages;
use super::{Field, ValidationErrors, ValidationResult};
use crate::transport::types::{FeeCalculationRequest, TransferRequest};
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_TRANSFER_AMOUNT: f64 = 0.01;
pub const MAX_TRANSFER_AMOUNT: f64 = 999_999.99;

// ASCII digits only; `\d` would also accept other Unicode digit classes.
static ACCOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid account pattern"));

/// Raw transfer form as the user is filling it
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFormInput {
    pub source_account: String,
    pub destination_account: String,
    pub transfer_amount: AmountInput,
    pub transfer_date: Option<DateInput>,
}

/// Transfer form after schema validation. Accounts may still be empty and the date may
/// be absent; `into_request` enforces completeness at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFormData {
    pub source_account: String,
    pub destination_account: String,
    pub transfer_amount: f64,
    pub transfer_date: Option<NaiveDate>,
}

impl TransferFormData {
    pub fn is_complete(&self) -> bool {
        !self.source_account.is_empty()
            && !self.destination_account.is_empty()
            && self.transfer_date.is_some()
    }

    /// Build the wire request, rejecting fields that were left blank.
    pub fn into_request(self) -> Result<TransferRequest, ValidationErrors> {
        let mut result = ValidationResult::new();
        if self.source_account.is_empty() {
            result.add_error(Field::SourceAccount, messages::SOURCE_ACCOUNT_REQUIRED);
        }
        if self.destination_account.is_empty() {
            result.add_error(
                Field::DestinationAccount,
                messages::DESTINATION_ACCOUNT_REQUIRED,
            );
        }
        let Some(transfer_date) = self.transfer_date else {
            result.add_error(Field::TransferDate, messages::DATE_REQUIRED);
            return Err(result.into_errors());
        };
        result.into_result(TransferRequest {
            source_account: self.source_account,
            destination_account: self.destination_account,
            transfer_amount: self.transfer_amount,
            transfer_date,
        })
    }
}

/// Raw fee preview input
#[derive(Debug, Clone, PartialEq)]
pub struct FeeCalculationInput {
    pub amount: AmountInput,
    pub transfer_date: Option<DateInput>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeCalculationData {
    pub amount: f64,
    pub transfer_date: NaiveDate,
}

impl FeeCalculationData {
    pub fn to_request(&self) -> FeeCalculationRequest {
        FeeCalculationRequest {
            transfer_amount: self.amount,
            transfer_date: self.transfer_date,
        }
    }
}

pub fn validate_transfer_form(
    input: &TransferFormInput,
    today: NaiveDate,
) -> Result<TransferFormData, ValidationErrors> {
    let mut result = ValidationResult::new();

    check_account(
        &mut result,
        Field::SourceAccount,
        &input.source_account,
        messages::SOURCE_ACCOUNT_FORMAT,
    );
    check_account(
        &mut result,
        Field::DestinationAccount,
        &input.destination_account,
        messages::DESTINATION_ACCOUNT_FORMAT,
    );

    let transfer_amount = coerce_amount(&input.transfer_amount);
    check_amount_bounds(&mut result, Field::TransferAmount, transfer_amount);

    let transfer_date = match coerce_date(input.transfer_date.as_ref()) {
        Ok(Some(date)) => {
            check_not_past(&mut result, date, today);
            Some(date)
        }
        Ok(None) => None,
        Err(_) => {
            result.add_error(Field::TransferDate, messages::DATE_INVALID);
            None
        }
    };

    result.into_result(TransferFormData {
        source_account: input.source_account.clone(),
        destination_account: input.destination_account.clone(),
        transfer_amount,
        transfer_date,
    })
}

pub fn validate_transfer_form_today(
    input: &TransferFormInput,
) -> Result<TransferFormData, ValidationErrors> {
    validate_transfer_form(input, Local::now().date_naive())
}

pub fn validate_fee_calculation(
    input: &FeeCalculationInput,
    today: NaiveDate,
) -> Result<FeeCalculationData, ValidationErrors> {
    let mut result = ValidationResult::new();

    let amount = coerce_amount(&input.amount);
    if amount.is_nan() || amount < MIN_TRANSFER_AMOUNT {
        result.add_error(Field::Amount, messages::AMOUNT_TOO_LOW);
    }

    let transfer_date = match coerce_date(input.transfer_date.as_ref()) {
        Ok(Some(date)) => {
            check_not_past(&mut result, date, today);
            Some(date)
        }
        Ok(None) => {
            result.add_error(Field::TransferDate, messages::DATE_REQUIRED);
            None
        }
        Err(_) => {
            result.add_error(Field::TransferDate, messages::DATE_INVALID);
            None
        }
    };

    match transfer_date {
        Some(transfer_date) => result.into_result(FeeCalculationData {
            amount,
            transfer_date,
        }),
        None => Err(result.into_errors()),
    }
}

pub fn validate_fee_calculation_today(
    input: &FeeCalculationInput,
) -> Result<FeeCalculationData, ValidationErrors> {
    validate_fee_calculation(input, Local::now().date_naive())
}

fn check_account(result: &mut ValidationResult, field: Field, value: &str, message: &str) {
    if !value.is_empty() && !ACCOUNT_PATTERN.is_match(value) {
        result.add_error(field, message);
    }
}

fn check_amount_bounds(result: &mut ValidationResult, field: Field, amount: f64) {
    if amount.is_nan() || amount < MIN_TRANSFER_AMOUNT {
        result.add_error(field, messages::AMOUNT_TOO_LOW);
    } else if amount > MAX_TRANSFER_AMOUNT {
        result.add_error(field, messages::AMOUNT_TOO_HIGH);
    }
}

fn check_not_past(result: &mut ValidationResult, date: NaiveDate, today: NaiveDate) {
    if date < today {
        result.add_error(Field::TransferDate, messages::DATE_IN_PAST);
    }
}
