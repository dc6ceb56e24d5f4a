use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::relation::Toggleable;

/// Error produced while turning a remote row into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The row does not match the record's shape.
    #[error("malformed {record} record at index {index}: {message}")]
    Malformed {
        record: &'static str,
        index: usize,
        message: String,
    },
    /// The row decoded but violates a record invariant.
    #[error("invalid {record} record: {message}")]
    Invalid {
        record: &'static str,
        message: String,
    },
}

/// A toggleable item that can be decoded from a remote row.
pub trait Record: Toggleable + DeserializeOwned {
    /// Short name used in decode errors.
    const NAME: &'static str;

    /// Check invariants serde cannot express.
    fn validate(&self) -> Result<(), DecodeError> {
        Ok(())
    }

    /// Decode and validate a single row.
    fn decode(value: Value) -> Result<Self, DecodeError> {
        Self::decode_at(value, 0)
    }

    #[doc(hidden)]
    fn decode_at(value: Value, index: usize) -> Result<Self, DecodeError> {
        let record: Self = serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
            record: Self::NAME,
            index,
            message: e.to_string(),
        })?;
        record.validate()?;
        Ok(record)
    }
}

/// Decode a batch of rows, failing on the first bad one.
pub fn decode_records<R: Record>(rows: Vec<Value>) -> Result<Vec<R>, DecodeError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| R::decode_at(row, index))
        .collect()
}
