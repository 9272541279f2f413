use crate::error::Error;
use derive_more::{Deref, IntoIterator};
use std::{fmt, str::FromStr};

///
/// FieldNames
///
/// Ordered list of field names parsed from a comma-separated string.
/// Used as the identity of an index within a table.
///

#[derive(Clone, Debug, Default, Deref, Eq, Hash, IntoIterator, Ord, PartialEq, PartialOrd)]
#[into_iterator(owned, ref)]
pub struct FieldNames(Vec<String>);

impl FieldNames {
    /// Parse `"a,b,c"`. Whitespace around names is ignored; an empty string
    /// yields an empty list.
    pub fn parse(fields: &str) -> Result<Self, Error> {
        if fields.trim().is_empty() {
            return Ok(Self::default());
        }

        let names = fields
            .split(',')
            .map(|name| {
                let name = name.trim();
                if is_valid_name(name) {
                    Ok(name.to_string())
                } else {
                    Err(Error::invalid_key_field(format!(
                        "invalid field name {name:?} in {fields:?}"
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(names))
    }

    #[must_use]
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self(names.iter().map(|n| n.as_ref().to_string()).collect())
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

impl fmt::Display for FieldNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl FromStr for FieldNames {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
