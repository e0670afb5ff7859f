use a1_notation::A1;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt::Debug;

pub mod google_sheets;

#[allow(async_fn_in_trait)]
pub trait SpreadsheetProvider: Debug {
    /// Provider-specific error type.
    type Error: StdError + Send + Sync + 'static;

    /// Read a 2D range of values, row-major.
    ///
    /// A range with no data yields an empty vec; trailing empty rows and
    /// cells inside the range may be omitted by the provider.
    async fn read_range(&self, range: &A1) -> Result<Vec<Vec<Value>>, Self::Error>;

    /// Overwrite a range with the given rows in one batched call.
    async fn write_range(&self, range: &A1, values: Vec<Vec<Value>>)
        -> Result<(), Self::Error>;
}
