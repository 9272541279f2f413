mod field;
mod names;
mod table;

pub use field::{FieldDescriptor, FieldKind, FieldShape};
pub use names::FieldNames;
pub use table::{
    INDEX_ID_LIMIT, PRIMARY_KEY_INDEX_ID, PrimaryKeyDescriptor, SEQUENCE_INDEX_ID,
    SecondaryIndexDescriptor, SingletonDescriptor, TableDescriptor,
};
