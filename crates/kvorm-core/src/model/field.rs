use std::fmt;

///
/// FieldKind
///
/// Scalar kind of a message field, mirroring the protobuf scalar set plus
/// the two well-known time types.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FieldKind {
    Bool,
    String,
    Bytes,
    Int32,
    Sint32,
    Sfixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint32,
    Fixed32,
    Uint64,
    Fixed64,
    Enum,
    Float,
    Double,
    Message,
    Timestamp,
    Duration,
}

impl FieldKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Int32 => "int32",
            Self::Sint32 => "sint32",
            Self::Sfixed32 => "sfixed32",
            Self::Int64 => "int64",
            Self::Sint64 => "sint64",
            Self::Sfixed64 => "sfixed64",
            Self::Uint32 => "uint32",
            Self::Fixed32 => "fixed32",
            Self::Uint64 => "uint64",
            Self::Fixed64 => "fixed64",
            Self::Enum => "enum",
            Self::Float => "float",
            Self::Double => "double",
            Self::Message => "message",
            Self::Timestamp => "timestamp",
            Self::Duration => "duration",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// FieldShape
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum FieldShape {
    #[default]
    Singular,
    Optional,
    Repeated,
    Map,
    Oneof,
}

impl FieldShape {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Singular => "singular",
            Self::Optional => "optional",
            Self::Repeated => "repeated",
            Self::Map => "map",
            Self::Oneof => "oneof",
        }
    }
}

///
/// FieldDescriptor
///
/// Static description of one message field. Messages expose a
/// `&'static [FieldDescriptor]` and codecs hold references into it.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub number: u32,
    pub kind: FieldKind,
    pub shape: FieldShape,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn new(name: &'static str, number: u32, kind: FieldKind) -> Self {
        Self {
            name,
            number,
            kind,
            shape: FieldShape::Singular,
        }
    }

    #[must_use]
    pub const fn with_shape(mut self, shape: FieldShape) -> Self {
        self.shape = shape;
        self
    }
}
