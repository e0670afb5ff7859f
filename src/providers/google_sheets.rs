use a1_notation::A1;
use google_sheets4::api::ValueRange;
use google_sheets4::yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};
use google_sheets4::{
    hyper, hyper_rustls,
    hyper_rustls::HttpsConnector,
    hyper_util::{self, client::legacy::connect::HttpConnector},
    Sheets,
};
use serde_json::{Error as JsonError, Value};
use std::{fmt, fs, io, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::providers::SpreadsheetProvider;

pub struct GoogleSheetProvider {
    sheets: Arc<Mutex<Sheets<HttpsConnector<HttpConnector>>>>,
    pub document_id: String,
}

impl fmt::Debug for GoogleSheetProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSheetProvider")
            .field("document_id", &self.document_id)
            .finish()
    }
}

impl GoogleSheetProvider {
    pub async fn try_new(config: &Config) -> Result<Self, GoogleSheetError> {
        let service_account = read_service_account_json(config)?;

        let auth = ServiceAccountAuthenticator::builder(service_account)
            .build()
            .await
            .map_err(|e| GoogleSheetError::Auth(e.to_string()))?;

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| GoogleSheetError::TlsConfig(e.to_string()))?
            .https_or_http()
            .enable_http1()
            .build();

        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(https);

        let sheets = Sheets::new(client, auth);

        Ok(GoogleSheetProvider {
            sheets: Arc::new(Mutex::new(sheets)),
            document_id: config.document_id.clone(),
        })
    }
}

fn read_service_account_json(config: &Config) -> Result<ServiceAccountKey, GoogleSheetError> {
    let contents = fs::read_to_string(&config.service_account_json)?;
    let acc = serde_json::from_str(&contents)?;
    Ok(acc)
}

impl SpreadsheetProvider for GoogleSheetProvider {
    type Error = GoogleSheetError;

    async fn read_range(&self, range: &A1) -> Result<Vec<Vec<Value>>, Self::Error> {
        let range_str = range.to_string();
        let sheets = self.sheets.lock().await;

        let (_, result) = sheets
            .spreadsheets()
            .values_get(&self.document_id, &range_str)
            .doit()
            .await?;

        Ok(result.values.unwrap_or_default())
    }

    async fn write_range(
        &self,
        range: &A1,
        values: Vec<Vec<Value>>,
    ) -> Result<(), Self::Error> {
        let range_str = range.to_string();

        let request = ValueRange {
            major_dimension: Some("ROWS".to_owned()),
            range: Some(range_str.clone()),
            values: Some(values),
        };

        let sheets = self.sheets.lock().await;

        sheets
            .spreadsheets()
            .values_update(request, &self.document_id, &range_str)
            .value_input_option("USER_ENTERED")
            .doit()
            .await?;

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum GoogleSheetError {
    #[error("failed to read service account JSON: {0}")]
    ServiceAccountIo(#[from] io::Error),

    #[error("invalid service account JSON: {0}")]
    ServiceAccountJson(#[from] JsonError),

    #[error("OAuth authentication failed: {0}")]
    Auth(String),

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("HTTP transport error: {0}")]
    HttpTransport(#[from] hyper::Error),

    #[error("Google Sheets API error: {0}")]
    Api(#[from] google_sheets4::Error),
}
