// Transfer scheduling pipeline
// Validates the form locally, previews the fee, and submits through the data-access
// layer; nothing reaches the network until validation passes
//
// Numan Thabit 2025 Nov

use crate::errors::ClientError;
use crate::queries::TransferQueries;
use crate::transport::TransferResponse;
use crate::validation::{
    validate_fee_calculation, validate_transfer_form, FeeCalculationInput, TransferFormData,
    TransferFormInput,
};
use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct FeePreview {
    pub amount: f64,
    pub fee: f64,
    pub total: f64,
    pub transfer_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    /// Transfer as confirmed by the backend; `None` when it answered SUCCESS without data
    pub transfer: Option<TransferResponse>,
    pub message: String,
}

pub const SUCCESS_MESSAGE: &str = "Transferência agendada com sucesso";

#[derive(Clone)]
pub struct TransferScheduler {
    queries: TransferQueries,
    today: Option<NaiveDate>,
}

impl TransferScheduler {
    pub fn new(queries: TransferQueries) -> Self {
        Self {
            queries,
            today: None,
        }
    }

    /// Pin the date used for the "not in the past" rule.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn queries(&self) -> &TransferQueries {
        &self.queries
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn validate(&self, form: &TransferFormInput) -> Result<TransferFormData, ClientError> {
        Ok(validate_transfer_form(form, self.today())?)
    }

    pub async fn preview_fee(&self, input: &FeeCalculationInput) -> Result<FeePreview, ClientError> {
        let data = validate_fee_calculation(input, self.today())?;
        let fee = self.queries.calculate_fee(&data.to_request()).await?;
        debug!(amount = data.amount, fee = fee, date = %data.transfer_date, "fee preview");
        Ok(FeePreview {
            amount: data.amount,
            fee,
            total: data.amount + fee,
            transfer_date: data.transfer_date,
        })
    }

    pub async fn submit(&self, form: &TransferFormInput) -> Result<SubmissionOutcome, ClientError> {
        let request = self
            .validate(form)?
            .into_request()
            .map_err(ClientError::from)
            .map_err(|err| {
                debug!(error = %err, "transfer form incomplete");
                err
            })?;

        match self.queries.create_transfer(&request).await {
            Ok(transfer) => {
                info!(
                    source = %request.source_account,
                    destination = %request.destination_account,
                    amount = request.transfer_amount,
                    "transfer submitted"
                );
                Ok(SubmissionOutcome {
                    transfer,
                    message: SUCCESS_MESSAGE.to_string(),
                })
            }
            Err(err) => {
                warn!(error = %err, "transfer submission failed");
                Err(err)
            }
        }
    }
}
