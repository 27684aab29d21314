use std::fmt;

/// IDL placeholder for opaque or unsupported values.
pub const ANY_TYPE: &str = "google.protobuf.Any";

/// The proto3 scalar types the compiler maps source types onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Double,
    Float,
    Sint32,
    Sint64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// Return the IDL keyword for this scalar.
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "double" => ScalarType::Double,
            "float" => ScalarType::Float,
            "sint32" => ScalarType::Sint32,
            "sint64" => ScalarType::Sint64,
            "bool" => ScalarType::Bool,
            "string" => ScalarType::String,
            "bytes" => ScalarType::Bytes,
            _ => return None,
        })
    }
}

/// The type position of a field line: a scalar, a reference to a generated
/// message/enum by name, or the opaque placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtoType {
    Scalar(ScalarType),
    Named(String),
    Any,
}

impl ProtoType {
    pub fn is_any(&self) -> bool {
        matches!(self, ProtoType::Any)
    }
}

impl fmt::Display for ProtoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtoType::Scalar(scalar) => f.write_str(scalar.as_str()),
            ProtoType::Named(name) => f.write_str(name),
            ProtoType::Any => f.write_str(ANY_TYPE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// `optional <type> name = n;`
    Singular(ProtoType),
    /// `repeated <type> name = n;`
    Repeated(ProtoType),
    /// `map<key, value> name = n;`
    Map { key: ProtoType, value: ProtoType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub number: u32,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<EnumValue>,
}

/// File-level options written before any definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub java_package: String,
}

/// A whole schema document.
///
/// The three definition lists are serialized in order: every enum, then every
/// message, then every synthesized array wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoFile {
    pub header: FileHeader,
    pub enums: Vec<EnumDef>,
    pub messages: Vec<MessageDef>,
    pub wrappers: Vec<MessageDef>,
}

impl ProtoFile {
    pub fn new(header: FileHeader) -> Self {
        ProtoFile {
            header,
            enums: Vec::new(),
            messages: Vec::new(),
            wrappers: Vec::new(),
        }
    }

    /// Look up a message or wrapper by name.
    pub fn message(&self, name: &str) -> Option<&MessageDef> {
        self.messages
            .iter()
            .chain(&self.wrappers)
            .find(|m| m.name == name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Names of all top-level blocks in output order.
    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.enums
            .iter()
            .map(|e| e.name.as_str())
            .chain(self.messages.iter().map(|m| m.name.as_str()))
            .chain(self.wrappers.iter().map(|m| m.name.as_str()))
    }
}
