use crate::{
    error::Error,
    model::{FieldDescriptor, SingletonDescriptor, TableDescriptor},
    value::Value,
};
use serde::{Serialize, de::DeserializeOwned};
use std::{any::Any, fmt::Debug};

///
/// Message
///
/// A record type stored in a table. Implementors expose their fields
/// reflectively so codecs can read and write key columns without knowing
/// the concrete type.
///

pub trait Message:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Fully qualified message name; also the table name.
    const MESSAGE_NAME: &'static str;

    fn fields() -> &'static [FieldDescriptor];

    fn table_descriptor() -> Option<TableDescriptor> {
        None
    }

    fn singleton_descriptor() -> Option<SingletonDescriptor> {
        None
    }

    /// Read a field. `None` when the field has no scalar form.
    fn get(&self, field: &FieldDescriptor) -> Option<Value>;

    fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), Error>;

    /// Reset a field to its zero value.
    fn clear(&mut self, field: &FieldDescriptor) -> Result<(), Error> {
        match Value::zero(field.kind) {
            Some(zero) => self.set(field, zero),
            None => Ok(()),
        }
    }

    fn has(&self, field: &FieldDescriptor) -> bool {
        self.get(field).is_some_and(|v| !v.is_default())
    }

    fn field(name: &str) -> Option<&'static FieldDescriptor> {
        Self::fields().iter().find(|f| f.name == name)
    }
}

///
/// DynMessage
///
/// Object-safe view of a message, handed to hooks and debuggers.
///

pub trait DynMessage: Debug {
    fn message_name(&self) -> &'static str;

    fn field_value(&self, name: &str) -> Option<Value>;

    fn to_json(&self) -> Result<serde_json::Value, Error>;

    fn as_any(&self) -> &dyn Any;
}

impl<M: Message> DynMessage for M {
    fn message_name(&self) -> &'static str {
        M::MESSAGE_NAME
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        M::field(name).and_then(|f| self.get(f))
    }

    fn to_json(&self) -> Result<serde_json::Value, Error> {
        Ok(serde_json::to_value(self)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Downcast a hook argument to a concrete message type.
#[must_use]
pub fn downcast_message<M: Message>(message: &dyn DynMessage) -> Option<&M> {
    message.as_any().downcast_ref::<M>()
}
