//! Module: value
//! Responsibility: the scalar values that key fields carry, and their canonical order.
//! Does not own: byte encodings (see `encoding::field`).
//! Boundary: messages hand `Value`s to codecs through the `Message` accessors.

mod time;

pub use time::{Duration, Timestamp};

use crate::model::FieldKind;
use std::{cmp::Ordering, fmt};

///
/// Value
///
/// A single key-eligible field value.
/// `Timestamp(None)` / `Duration(None)` mark an absent well-known value.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Value {
    Bool(bool),
    Bytes(Vec<u8>),
    String(String),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Enum(i32),
    Timestamp(Option<Timestamp>),
    Duration(Option<Duration>),
}

impl Value {
    /// Zero value for a field kind, or `None` for kinds with no scalar form.
    #[must_use]
    pub const fn zero(kind: FieldKind) -> Option<Self> {
        let value = match kind {
            FieldKind::Bool => Self::Bool(false),
            FieldKind::String => Self::String(String::new()),
            FieldKind::Bytes => Self::Bytes(Vec::new()),
            FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => Self::Int32(0),
            FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => Self::Int64(0),
            FieldKind::Uint32 | FieldKind::Fixed32 => Self::Uint32(0),
            FieldKind::Uint64 | FieldKind::Fixed64 => Self::Uint64(0),
            FieldKind::Enum => Self::Enum(0),
            FieldKind::Timestamp => Self::Timestamp(None),
            FieldKind::Duration => Self::Duration(None),
            FieldKind::Float | FieldKind::Double | FieldKind::Message => return None,
        };

        Some(value)
    }

    /// True for the zero value of the variant.
    #[must_use]
    pub fn is_default(&self) -> bool {
        match self {
            Self::Bool(v) => !v,
            Self::Bytes(v) => v.is_empty(),
            Self::String(v) => v.is_empty(),
            Self::Int32(v) | Self::Enum(v) => *v == 0,
            Self::Int64(v) => *v == 0,
            Self::Uint32(v) => *v == 0,
            Self::Uint64(v) => *v == 0,
            Self::Timestamp(v) => v.is_none(),
            Self::Duration(v) => v.is_none(),
        }
    }

    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Uint32(_) => "uint32",
            Self::Uint64(_) => "uint64",
            Self::Enum(_) => "enum",
            Self::Timestamp(_) => "timestamp",
            Self::Duration(_) => "duration",
        }
    }

    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Bytes(_) => 1,
            Self::String(_) => 2,
            Self::Int32(_) => 3,
            Self::Int64(_) => 4,
            Self::Uint32(_) => 5,
            Self::Uint64(_) => 6,
            Self::Enum(_) => 7,
            Self::Timestamp(_) => 8,
            Self::Duration(_) => 9,
        }
    }
}

// Absent well-known values sort after every present one.
fn cmp_absent_last<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::Int32(a), Self::Int32(b)) | (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::Int64(a), Self::Int64(b)) => a.cmp(b),
            (Self::Uint32(a), Self::Uint32(b)) => a.cmp(b),
            (Self::Uint64(a), Self::Uint64(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => cmp_absent_last(a.as_ref(), b.as_ref()),
            (Self::Duration(a), Self::Duration(b)) => cmp_absent_last(a.as_ref(), b.as_ref()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Bytes(v) => {
                write!(f, "0x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::String(v) => write!(f, "{v}"),
            Self::Int32(v) | Self::Enum(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Uint32(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
            Self::Timestamp(Some(v)) => write!(f, "{v}"),
            Self::Duration(Some(v)) => write!(f, "{v}"),
            Self::Timestamp(None) | Self::Duration(None) => write!(f, "null"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    String => String,
    &str => String,
    i32 => Int32,
    i64 => Int64,
    u32 => Uint32,
    u64 => Uint64,
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Timestamp(Some(v))
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Self::Duration(Some(v))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_timestamp_sorts_last() {
        let absent = Value::Timestamp(None);
        let early = Value::from(Timestamp::new(Timestamp::MIN_SECONDS, 0));
        let late = Value::from(Timestamp::new(Timestamp::MAX_SECONDS, 999_999_999));

        assert!(early < late);
        assert!(late < absent);
        assert_eq!(absent.cmp(&Value::Timestamp(None)), Ordering::Equal);
    }

    #[test]
    fn strings_compare_by_bytes() {
        assert!(Value::from("abc") < Value::from("abd"));
        assert!(Value::from("ab") < Value::from("abc"));
        assert!(Value::from("Z") < Value::from("a"));
    }

    #[test]
    fn zero_values_are_default() {
        for kind in [
            FieldKind::Bool,
            FieldKind::Bytes,
            FieldKind::Sint64,
            FieldKind::Fixed32,
            FieldKind::Enum,
            FieldKind::Duration,
        ] {
            let zero = Value::zero(kind).expect("scalar kind");
            assert!(zero.is_default(), "{kind:?}");
        }
        assert!(Value::zero(FieldKind::Double).is_none());
    }

    #[test]
    fn bytes_display_as_hex() {
        assert_eq!(Value::from(vec![0xab, 0x01]).to_string(), "0xab01");
    }
}
