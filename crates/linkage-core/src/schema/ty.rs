/// Storage-independent attribute types.
///
/// A foreign key always takes the type of the key it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Bool,
    I32,
    I64,
    U64,
    String,
    Uuid,
    Timestamp,
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Type::Bool => "Bool",
            Type::I32 => "I32",
            Type::I64 => "I64",
            Type::U64 => "U64",
            Type::String => "String",
            Type::Uuid => "Uuid",
            Type::Timestamp => "Timestamp",
        };
        f.write_str(name)
    }
}
