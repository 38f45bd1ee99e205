//! Binary exports (CSV, PDF).
//!
//! Exports attach the current token but skip refresh-and-replay: a token
//! that expires mid-export surfaces as [`Error::AuthExpired`] and the caller
//! decides whether to retry.

use reqwest::StatusCode;
use tracing::{debug, instrument};

use tally_core::{Error, Result};

use crate::classify;
use crate::dispatcher::ApiClient;
use crate::endpoints::{EXPORT_EXPENSES_CSV, EXPORT_SUMMARY_PDF, ExportQuery};
use crate::request::RequestDescriptor;

/// Suggested file name for the expenses CSV.
pub const EXPENSES_CSV_FILENAME: &str = "expenses.csv";

/// Suggested file name for a monthly summary PDF.
pub fn summary_pdf_filename(month: u32, year: i32) -> String {
    format!("expense-summary-{year}-{month:02}.pdf")
}

impl ApiClient {
    /// Download expenses as CSV, optionally limited to a month and year.
    pub async fn export_expenses_csv(
        &self,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<u8>> {
        let request =
            RequestDescriptor::get(EXPORT_EXPENSES_CSV).with_query(&ExportQuery { month, year })?;
        self.download(request).await
    }

    /// Download the monthly summary PDF.
    pub async fn export_summary_pdf(&self, month: u32, year: i32) -> Result<Vec<u8>> {
        let request = RequestDescriptor::get(EXPORT_SUMMARY_PDF).with_query(&ExportQuery {
            month: Some(month),
            year: Some(year),
        })?;
        self.download(request).await
    }

    #[instrument(skip_all, fields(path = request.path()))]
    async fn download(&self, request: RequestDescriptor) -> Result<Vec<u8>> {
        let token = self
            .store
            .get()
            .map(|session| session.access_token().clone());

        let response = self.transport.send(&request, token.as_ref()).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::AuthExpired);
        }
        if !status.is_success() {
            // Only the status is used; export error bodies are not JSON.
            return Err(classify::classify_status(status, &[]));
        }

        let bytes = response.bytes().await.map_err(classify::transport_error)?;
        debug!(bytes = bytes.len(), "Export downloaded");
        Ok(bytes.to_vec())
    }
}
