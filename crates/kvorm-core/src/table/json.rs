//! Genesis JSON helpers shared by every table kind.
use crate::{error::Error, table::JsonValidator, traits::Message};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::io;

pub(super) fn read_json(reader: &mut dyn io::Read) -> Result<JsonValue, Error> {
    serde_json::from_reader(reader)
        .map_err(|err| Error::json_validation(format!("malformed JSON: {err}")))
}

/// Records of a multi-record table. `null` reads as no records.
pub(super) fn records<M: Message>(json: &JsonValue) -> Result<&[JsonValue], Error> {
    match json {
        JsonValue::Null => Ok(&[]),
        JsonValue::Array(items) => Ok(items),
        other => Err(Error::json_validation(format!(
            "{} expects a JSON array, got {}",
            M::MESSAGE_NAME,
            kind_of(other)
        ))),
    }
}

/// Decode one message and run the table's validator on it.
pub(super) fn decode_record<M: Message>(
    json: &JsonValue,
    validator: Option<&JsonValidator<M>>,
) -> Result<M, Error> {
    let message = M::deserialize(json)
        .map_err(|err| Error::json_validation(format!("{}: {err}", M::MESSAGE_NAME)))?;

    if let Some(validate) = validator {
        validate(&message).map_err(|err| {
            Error::json_validation(format!("{} failed validation: {err}", M::MESSAGE_NAME))
        })?;
    }

    Ok(message)
}

pub(super) fn encode_record<M: Message>(message: &M) -> Result<JsonValue, Error> {
    Ok(serde_json::to_value(message)?)
}

pub(super) const fn kind_of(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
