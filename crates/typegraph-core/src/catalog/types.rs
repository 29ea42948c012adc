//! Core type vocabulary for the catalog.

use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};
use typegraph_proto::current;

/// The four categories of type definition.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeCategory {
    /// Enumeration of named literals.
    Enum,
    /// Plain attribute container.
    Struct,
    /// Taggable, inheritable classification.
    Classification,
    /// Entity type.
    Entity,
}

impl TypeCategory {
    /// All categories in creation order.
    pub const ALL: [TypeCategory; 4] = [
        TypeCategory::Enum,
        TypeCategory::Struct,
        TypeCategory::Classification,
        TypeCategory::Entity,
    ];

    /// Upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCategory::Enum => "ENUM",
            TypeCategory::Struct => "STRUCT",
            TypeCategory::Classification => "CLASSIFICATION",
            TypeCategory::Entity => "ENTITY",
        }
    }

    /// Parse a category label, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "enum" => Some(TypeCategory::Enum),
            "struct" => Some(TypeCategory::Struct),
            "classification" | "trait" => Some(TypeCategory::Classification),
            "entity" | "class" => Some(TypeCategory::Entity),
            _ => None,
        }
    }

    /// Check if definitions of this category may declare supertypes.
    pub fn supports_super_types(&self) -> bool {
        matches!(self, TypeCategory::Classification | TypeCategory::Entity)
    }

    /// Single-byte tag used in storage keys.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            TypeCategory::Enum => b'E',
            TypeCategory::Struct => b'S',
            TypeCategory::Classification => b'C',
            TypeCategory::Entity => b'T',
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builtin primitive attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Boolean.
    Boolean,
    /// 8-bit integer.
    Byte,
    /// 16-bit integer.
    Short,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Arbitrary precision integer.
    BigInteger,
    /// Arbitrary precision decimal.
    BigDecimal,
    /// UTF-8 string.
    String,
    /// Date (milliseconds since epoch).
    Date,
}

impl PrimitiveType {
    /// Every primitive type.
    pub const ALL: [PrimitiveType; 11] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::BigInteger,
        PrimitiveType::BigDecimal,
        PrimitiveType::String,
        PrimitiveType::Date,
    ];

    /// Type name as used in attribute definitions.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::BigInteger => "biginteger",
            PrimitiveType::BigDecimal => "bigdecimal",
            PrimitiveType::String => "string",
            PrimitiveType::Date => "date",
        }
    }

    /// Look up a primitive by type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            PrimitiveType::Boolean | PrimitiveType::String | PrimitiveType::Date
        )
    }

    /// Parse a literal (such as an attribute default) into a current-model value.
    pub fn parse_literal(&self, literal: &str) -> Result<current::Value, String> {
        let bad = |e: &dyn fmt::Display| format!("'{}' is not a valid {}: {}", literal, self.name(), e);
        match self {
            PrimitiveType::Boolean => literal
                .parse::<bool>()
                .map(current::Value::Bool)
                .map_err(|e| bad(&e)),
            PrimitiveType::Byte => literal
                .parse::<i8>()
                .map(|v| current::Value::Int(v.into()))
                .map_err(|e| bad(&e)),
            PrimitiveType::Short => literal
                .parse::<i16>()
                .map(|v| current::Value::Int(v.into()))
                .map_err(|e| bad(&e)),
            PrimitiveType::Int => literal
                .parse::<i32>()
                .map(|v| current::Value::Int(v.into()))
                .map_err(|e| bad(&e)),
            PrimitiveType::Long | PrimitiveType::Date => literal
                .parse::<i64>()
                .map(current::Value::Int)
                .map_err(|e| bad(&e)),
            PrimitiveType::Float | PrimitiveType::Double => literal
                .parse::<f64>()
                .map(current::Value::Float)
                .map_err(|e| bad(&e)),
            PrimitiveType::BigInteger => {
                let digits = literal.strip_prefix('-').unwrap_or(literal);
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    Ok(current::Value::String(literal.to_string()))
                } else {
                    Err(bad(&"expected decimal digits"))
                }
            }
            PrimitiveType::BigDecimal => literal
                .parse::<f64>()
                .map(|_| current::Value::String(literal.to_string()))
                .map_err(|e| bad(&e)),
            PrimitiveType::String => Ok(current::Value::String(literal.to_string())),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute cardinality.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    /// Single value.
    #[default]
    Single,
    /// Ordered, duplicates allowed.
    List,
    /// Unordered, unique.
    Set,
}

/// Parsed form of a collection type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName<'a> {
    /// `array<elem>`.
    Array(&'a str),
    /// `map<key,value>`.
    Map(&'a str, &'a str),
    /// Anything else.
    Named(&'a str),
}

/// Build an `array<...>` type name.
pub fn array_type_name(element: &str) -> String {
    format!("array<{}>", element)
}

/// Build a `map<...>` type name.
pub fn map_type_name(key: &str, value: &str) -> String {
    format!("map<{},{}>", key, value)
}

impl<'a> TypeName<'a> {
    /// Split a type name into its collection structure.
    ///
    /// Returns `None` for malformed collection syntax (unbalanced brackets,
    /// missing map value, empty element).
    pub fn parse(name: &'a str) -> Option<Self> {
        let name = name.trim();
        if let Some(inner) = strip_wrapper(name, "array<") {
            if inner.trim().is_empty() || !balanced(inner) {
                return None;
            }
            return Some(TypeName::Array(inner.trim()));
        }
        if let Some(inner) = strip_wrapper(name, "map<") {
            let split = top_level_comma(inner)?;
            let (key, value) = (inner[..split].trim(), inner[split + 1..].trim());
            if key.is_empty() || value.is_empty() || !balanced(key) || !balanced(value) {
                return None;
            }
            return Some(TypeName::Map(key, value));
        }
        if name.is_empty() || name.contains('<') || name.contains('>') || name.contains(',') {
            return None;
        }
        Some(TypeName::Named(name))
    }
}

fn strip_wrapper<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)?.strip_suffix('>')
}

fn balanced(s: &str) -> bool {
    let mut depth: i32 = 0;
    for c in s.chars() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn top_level_comma(s: &str) -> Option<usize> {
    let mut depth: i32 = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}
