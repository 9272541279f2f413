//! Hand-written messages shared by the unit tests.
use crate::{
    error::{Error, ErrorKind, ErrorOrigin},
    model::{FieldDescriptor, FieldKind, FieldShape, SingletonDescriptor, TableDescriptor},
    traits::Message,
    value::{Duration, Timestamp, Value},
};
use serde::{Deserialize, Serialize};

fn mismatch(message: &str, field: &FieldDescriptor, value: &Value) -> Error {
    Error::new(
        ErrorKind::InvalidKeyField,
        ErrorOrigin::Field,
        format!("{message}.{} cannot hold {}", field.name, value.kind_name()),
    )
}

///
/// ExampleTable
///
/// One field of every key-eligible kind. Primary key `u32,i64,str`.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ExampleTable {
    pub u32: u32,
    pub u64: u64,
    pub str: String,
    pub bz: Vec<u8>,
    pub ts: Option<Timestamp>,
    pub dur: Option<Duration>,
    pub i32: i32,
    pub s32: i32,
    pub sf32: i32,
    pub i64: i64,
    pub s64: i64,
    pub sf64: i64,
    pub f32: u32,
    pub f64: u64,
    pub b: bool,
    pub e: i32,
    pub repeated: Vec<u32>,
    pub score: f64,
}

static EXAMPLE_TABLE_FIELDS: [FieldDescriptor; 18] = [
    FieldDescriptor::new("u32", 1, FieldKind::Uint32),
    FieldDescriptor::new("u64", 2, FieldKind::Uint64),
    FieldDescriptor::new("str", 3, FieldKind::String),
    FieldDescriptor::new("bz", 4, FieldKind::Bytes),
    FieldDescriptor::new("ts", 5, FieldKind::Timestamp),
    FieldDescriptor::new("dur", 6, FieldKind::Duration),
    FieldDescriptor::new("i32", 7, FieldKind::Int32),
    FieldDescriptor::new("s32", 8, FieldKind::Sint32),
    FieldDescriptor::new("sf32", 9, FieldKind::Sfixed32),
    FieldDescriptor::new("i64", 10, FieldKind::Int64),
    FieldDescriptor::new("s64", 11, FieldKind::Sint64),
    FieldDescriptor::new("sf64", 12, FieldKind::Sfixed64),
    FieldDescriptor::new("f32", 13, FieldKind::Fixed32),
    FieldDescriptor::new("f64", 14, FieldKind::Fixed64),
    FieldDescriptor::new("b", 15, FieldKind::Bool),
    FieldDescriptor::new("e", 16, FieldKind::Enum),
    FieldDescriptor::new("repeated", 17, FieldKind::Uint32).with_shape(FieldShape::Repeated),
    FieldDescriptor::new("score", 18, FieldKind::Double),
];

impl Message for ExampleTable {
    const MESSAGE_NAME: &'static str = "testpb.ExampleTable";

    fn fields() -> &'static [FieldDescriptor] {
        &EXAMPLE_TABLE_FIELDS
    }

    fn table_descriptor() -> Option<TableDescriptor> {
        Some(
            TableDescriptor::new(1, "u32,i64,str")
                .index(1, "u64,str", true)
                .index(2, "str,u32", false)
                .index(3, "bz,str", false),
        )
    }

    fn get(&self, field: &FieldDescriptor) -> Option<Value> {
        let value = match field.name {
            "u32" => Value::Uint32(self.u32),
            "u64" => Value::Uint64(self.u64),
            "str" => Value::String(self.str.clone()),
            "bz" => Value::Bytes(self.bz.clone()),
            "ts" => Value::Timestamp(self.ts),
            "dur" => Value::Duration(self.dur),
            "i32" => Value::Int32(self.i32),
            "s32" => Value::Int32(self.s32),
            "sf32" => Value::Int32(self.sf32),
            "i64" => Value::Int64(self.i64),
            "s64" => Value::Int64(self.s64),
            "sf64" => Value::Int64(self.sf64),
            "f32" => Value::Uint32(self.f32),
            "f64" => Value::Uint64(self.f64),
            "b" => Value::Bool(self.b),
            "e" => Value::Enum(self.e),
            _ => return None,
        };

        Some(value)
    }

    fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), Error> {
        match (field.name, value) {
            ("u32", Value::Uint32(v)) => self.u32 = v,
            ("u64", Value::Uint64(v)) => self.u64 = v,
            ("str", Value::String(v)) => self.str = v,
            ("bz", Value::Bytes(v)) => self.bz = v,
            ("ts", Value::Timestamp(v)) => self.ts = v,
            ("dur", Value::Duration(v)) => self.dur = v,
            ("i32", Value::Int32(v)) => self.i32 = v,
            ("s32", Value::Int32(v)) => self.s32 = v,
            ("sf32", Value::Int32(v)) => self.sf32 = v,
            ("i64", Value::Int64(v)) => self.i64 = v,
            ("s64", Value::Int64(v)) => self.s64 = v,
            ("sf64", Value::Int64(v)) => self.sf64 = v,
            ("f32", Value::Uint32(v)) => self.f32 = v,
            ("f64", Value::Uint64(v)) => self.f64 = v,
            ("b", Value::Bool(v)) => self.b = v,
            ("e", Value::Enum(v)) => self.e = v,
            (_, value) => return Err(mismatch(Self::MESSAGE_NAME, field, &value)),
        }

        Ok(())
    }
}

/// An `ExampleTable` with only its primary key set.
pub fn ex(u32: u32, i64: i64, str: &str) -> ExampleTable {
    ExampleTable {
        u32,
        i64,
        str: str.to_string(),
        ..ExampleTable::default()
    }
}

///
/// ExampleAutoIncrementTable
///
/// Auto-increment primary key `id`, unique index on `x`.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ExampleAutoIncrementTable {
    pub id: u64,
    pub x: String,
    pub y: i32,
}

static AUTO_INCREMENT_FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor::new("id", 1, FieldKind::Uint64),
    FieldDescriptor::new("x", 2, FieldKind::String),
    FieldDescriptor::new("y", 3, FieldKind::Int32),
];

impl Message for ExampleAutoIncrementTable {
    const MESSAGE_NAME: &'static str = "testpb.ExampleAutoIncrementTable";

    fn fields() -> &'static [FieldDescriptor] {
        &AUTO_INCREMENT_FIELDS
    }

    fn table_descriptor() -> Option<TableDescriptor> {
        Some(
            TableDescriptor::new(3, "id")
                .auto_increment()
                .index(1, "x", true),
        )
    }

    fn get(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name {
            "id" => Some(Value::Uint64(self.id)),
            "x" => Some(Value::String(self.x.clone())),
            "y" => Some(Value::Int32(self.y)),
            _ => None,
        }
    }

    fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), Error> {
        match (field.name, value) {
            ("id", Value::Uint64(v)) => self.id = v,
            ("x", Value::String(v)) => self.x = v,
            ("y", Value::Int32(v)) => self.y = v,
            (_, value) => return Err(mismatch(Self::MESSAGE_NAME, field, &value)),
        }

        Ok(())
    }
}

/// An `ExampleAutoIncrementTable` with no id assigned.
pub fn auto(x: &str, y: i32) -> ExampleAutoIncrementTable {
    ExampleAutoIncrementTable {
        id: 0,
        x: x.to_string(),
        y,
    }
}

///
/// ExampleSingleton
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ExampleSingleton {
    pub foo: String,
    pub bar: i32,
}

static SINGLETON_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new("foo", 1, FieldKind::String),
    FieldDescriptor::new("bar", 2, FieldKind::Int32),
];

impl Message for ExampleSingleton {
    const MESSAGE_NAME: &'static str = "testpb.ExampleSingleton";

    fn fields() -> &'static [FieldDescriptor] {
        &SINGLETON_FIELDS
    }

    fn singleton_descriptor() -> Option<SingletonDescriptor> {
        Some(SingletonDescriptor { id: 4 })
    }

    fn get(&self, field: &FieldDescriptor) -> Option<Value> {
        match field.name {
            "foo" => Some(Value::String(self.foo.clone())),
            "bar" => Some(Value::Int32(self.bar)),
            _ => None,
        }
    }

    fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), Error> {
        match (field.name, value) {
            ("foo", Value::String(v)) => self.foo = v,
            ("bar", Value::Int32(v)) => self.bar = v,
            (_, value) => return Err(mismatch(Self::MESSAGE_NAME, field, &value)),
        }

        Ok(())
    }
}
