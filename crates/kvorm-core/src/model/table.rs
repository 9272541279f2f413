///
/// PRIMARY_KEY_INDEX_ID
/// Index id of the primary key inside every table.
///
pub const PRIMARY_KEY_INDEX_ID: u32 = 0;

///
/// INDEX_ID_LIMIT
/// Secondary index ids live in `1..INDEX_ID_LIMIT`.
///
pub const INDEX_ID_LIMIT: u32 = 32_768;

///
/// SEQUENCE_INDEX_ID
/// Reserved id under which auto-increment tables keep their counter.
///
pub const SEQUENCE_INDEX_ID: u32 = INDEX_ID_LIMIT;

///
/// PrimaryKeyDescriptor
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PrimaryKeyDescriptor {
    pub fields: String,
    pub auto_increment: bool,
}

///
/// SecondaryIndexDescriptor
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecondaryIndexDescriptor {
    pub id: u32,
    pub fields: String,
    pub unique: bool,
}

///
/// TableDescriptor
///
/// Declared shape of a table: its id, primary key and secondary indexes.
///
/// ```ignore
/// TableDescriptor::new(1, "u32,i64,str")
///     .index(1, "u64,str", true)
///     .index(2, "str,u32", false)
/// ```
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TableDescriptor {
    pub id: u32,
    pub primary_key: PrimaryKeyDescriptor,
    pub indexes: Vec<SecondaryIndexDescriptor>,
}

impl TableDescriptor {
    #[must_use]
    pub fn new(id: u32, primary_key_fields: &str) -> Self {
        Self {
            id,
            primary_key: PrimaryKeyDescriptor {
                fields: primary_key_fields.to_string(),
                auto_increment: false,
            },
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.primary_key.auto_increment = true;
        self
    }

    #[must_use]
    pub fn index(mut self, id: u32, fields: &str, unique: bool) -> Self {
        self.indexes.push(SecondaryIndexDescriptor {
            id,
            fields: fields.to_string(),
            unique,
        });
        self
    }
}

///
/// SingletonDescriptor
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SingletonDescriptor {
    pub id: u32,
}
