use crate::{
    encoding::{
        IndexCodec, IndexKeyCodec, PrimaryKeyCodec, SeqCodec, UniqueKeyCodec,
        varint::append_uvarint,
    },
    error::{Error, ErrorKind, ErrorOrigin},
    model::{
        FieldKind, FieldNames, INDEX_ID_LIMIT, PRIMARY_KEY_INDEX_ID, SEQUENCE_INDEX_ID,
        TableDescriptor,
    },
    table::{
        JsonValidator, TableOptions,
        engine::Table,
        index::{SecondaryCodec, SecondaryIndex},
    },
    traits::Message,
};
use std::collections::BTreeMap;

/// `prefix ++ uvarint(id)` for a table or singleton id.
pub(super) fn table_prefix<M: Message>(prefix: &[u8], id: u32) -> Result<Vec<u8>, Error> {
    if id == 0 {
        return Err(Error::new(
            ErrorKind::InvalidTableId,
            ErrorOrigin::Table,
            format!("table id must be non-zero on {}", M::MESSAGE_NAME),
        ));
    }

    Ok(append_uvarint(prefix, id))
}

/// Pick the table descriptor out of `options`, rejecting singletons.
pub(super) fn table_descriptor<M: Message>(
    options: &TableOptions<M>,
) -> Result<TableDescriptor, Error> {
    if options.resolved_singleton_descriptor().is_some() {
        return Err(Error::invalid_table(format!(
            "{} is declared as a singleton",
            M::MESSAGE_NAME
        )));
    }

    options.resolved_table_descriptor().ok_or_else(|| {
        Error::invalid_table(format!("missing table descriptor for {}", M::MESSAGE_NAME))
    })
}

fn index_error(kind: ErrorKind, message: String) -> Error {
    Error::new(kind, ErrorOrigin::Table, message)
}

impl<M: Message> Table<M> {
    /// Validate `descriptor` and build every codec the table needs.
    pub(super) fn from_descriptor(
        prefix: &[u8],
        descriptor: &TableDescriptor,
        json_validator: Option<JsonValidator<M>>,
    ) -> Result<Self, Error> {
        let name = M::MESSAGE_NAME;
        let prefix = table_prefix::<M>(prefix, descriptor.id)?;

        let pk_fields = FieldNames::parse(&descriptor.primary_key.fields)?;
        if pk_fields.is_empty() {
            return Err(index_error(
                ErrorKind::MissingPrimaryKey,
                format!("{name} declares no primary key fields"),
            ));
        }
        let primary = PrimaryKeyCodec::new(
            append_uvarint(&prefix, PRIMARY_KEY_INDEX_ID),
            &pk_fields,
        )?;

        let seq = if descriptor.primary_key.auto_increment {
            check_auto_increment_key(&primary)?;
            Some(SeqCodec::new(append_uvarint(&prefix, SEQUENCE_INDEX_ID)))
        } else {
            None
        };

        let mut indexes = Vec::with_capacity(descriptor.indexes.len());
        let mut by_id = BTreeMap::new();
        let mut by_fields = BTreeMap::new();
        for desc in &descriptor.indexes {
            if desc.id == PRIMARY_KEY_INDEX_ID || desc.id >= INDEX_ID_LIMIT {
                return Err(index_error(
                    ErrorKind::InvalidIndexId,
                    format!(
                        "index id {} on {name} must be in 1..{INDEX_ID_LIMIT}",
                        desc.id
                    ),
                ));
            }
            let fields = FieldNames::parse(&desc.fields)?;
            if fields.is_empty() {
                return Err(Error::invalid_table(format!(
                    "index {} on {name} declares no fields",
                    desc.id
                )));
            }
            if by_id.contains_key(&desc.id) {
                return Err(index_error(
                    ErrorKind::DuplicateIndexId,
                    format!("duplicate index id {} on {name}", desc.id),
                ));
            }
            if fields == pk_fields || by_fields.contains_key(&fields) {
                return Err(index_error(
                    ErrorKind::DuplicateIndexFields,
                    format!("duplicate index fields {fields} on {name}"),
                ));
            }

            if desc.unique && pk_fields.names().iter().all(|f| fields.contains(f)) {
                return Err(Error::invalid_table(format!(
                    "unique index {fields} on {name} already covers the primary key"
                )));
            }

            let index_prefix = append_uvarint(&prefix, desc.id);
            let codec = if desc.unique {
                SecondaryCodec::Unique(UniqueKeyCodec::new(index_prefix, &fields, &pk_fields)?)
            } else {
                SecondaryCodec::NonUnique(IndexKeyCodec::new(index_prefix, &fields, &pk_fields)?)
            };

            by_id.insert(desc.id, indexes.len());
            by_fields.insert(fields.clone(), indexes.len());
            indexes.push(SecondaryIndex {
                id: desc.id,
                fields,
                codec,
            });
        }

        Ok(Self {
            id: descriptor.id,
            prefix,
            pk_fields,
            primary,
            indexes,
            by_id,
            by_fields,
            seq,
            json_validator,
        })
    }
}

// Auto-increment keys are exactly one uint64 field.
fn check_auto_increment_key<M: Message>(primary: &PrimaryKeyCodec<M>) -> Result<(), Error> {
    match primary.key_codec().fields() {
        [field] if field.kind == FieldKind::Uint64 => Ok(()),
        _ => Err(Error::new(
            ErrorKind::InvalidAutoIncrementKey,
            ErrorOrigin::Table,
            format!(
                "auto-increment primary key on {} must be a single uint64 field, got {}",
                M::MESSAGE_NAME,
                primary.key_codec().field_names()
            ),
        )),
    }
}
