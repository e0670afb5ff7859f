use std::{convert::Infallible, error::Error, fmt};

use serde_json::Value;

use crate::cell_encoding::{DecodeCell, EncodeCell};

impl EncodeCell for String {
    type Error = Infallible;
    fn encode_cell(&self) -> Result<Value, Self::Error> {
        Ok(Value::String(self.clone()))
    }
}

/// Sheet reads hand back whatever JSON type the cell renders to, so string
/// decoding accepts scalars and renders them the way the sheet displays
/// them: booleans as `TRUE`/`FALSE` (checkbox cells), numbers verbatim,
/// null as the empty cell.
impl DecodeCell for String {
    type Error = DecodeStringError;
    fn decode_cell(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(true) => Ok("TRUE".to_owned()),
            Value::Bool(false) => Ok("FALSE".to_owned()),
            Value::Null => Ok(String::new()),
            Value::Array(_) | Value::Object(_) => Err(DecodeStringError),
        }
    }
}

#[derive(Debug)]
pub struct DecodeStringError;
impl fmt::Display for DecodeStringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected a scalar cell")
    }
}
impl Error for DecodeStringError {}

impl EncodeCell for &str {
    type Error = Infallible;
    fn encode_cell(&self) -> Result<Value, Self::Error> {
        Ok(Value::String((*self).to_owned()))
    }
}
