//! Classification of the `DataType` field of a logic file's problem type.
//!
//! Logic files store the data type either as the integer index of the
//! type enumeration or as a textual name. Hardware spec files key their ALU
//! rates by the short type code returned from [`DataType::code`].

use crate::error::{EfficiencyError, Result};
use serde_yaml::Value;
use std::fmt;

/// Element data type of a tuned kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit float
    Single,
    /// 64-bit float
    Double,
    /// Complex of two 32-bit floats
    ComplexSingle,
    /// Complex of two 64-bit floats
    ComplexDouble,
    /// 16-bit float
    Half,
    /// Four packed 8-bit integers
    Int8x4,
    /// 32-bit integer
    Int32,
    /// 16-bit brain float
    BFloat16,
    /// 8-bit integer
    Int8,
}

/// (variant, code, name, abbreviation, enum name)
type TypeInfo = (DataType, &'static str, &'static str, &'static str, &'static str);

/// Known types, in enumeration order
static TYPES: [TypeInfo; 9] = [
    (DataType::Single, "S", "single", "f32", "Float"),
    (DataType::Double, "D", "double", "f64", "Double"),
    (DataType::ComplexSingle, "C", "complexSingle", "f32c", "ComplexFloat"),
    (DataType::ComplexDouble, "Z", "complexDouble", "f64c", "ComplexDouble"),
    (DataType::Half, "H", "half", "f16", "Half"),
    (DataType::Int8x4, "4xi8", "int8x4", "i8x4", "Int8x4"),
    (DataType::Int32, "I", "int32", "i32", "Int32"),
    (DataType::BFloat16, "B", "bfloat16", "bf16", "BFloat16"),
    (DataType::Int8, "I8", "int8", "i8", "Int8"),
];

impl DataType {
    /// Look up a data type by its enumeration index
    pub fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| TYPES.get(i))
            .map(|t| t.0)
    }

    /// Parse a data type from its code, name, abbreviation or enum name,
    /// ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        TYPES
            .iter()
            .find(|(_, code, name, abbrev, enum_name)| {
                [code, name, abbrev, enum_name]
                    .iter()
                    .any(|spelling| spelling.eq_ignore_ascii_case(s))
            })
            .map(|t| t.0)
    }

    /// Classify the `DataType` value of a logic file
    pub fn from_yaml(value: &Value) -> Result<Self> {
        let parsed = match value {
            Value::Number(n) => n.as_u64().and_then(Self::from_index),
            Value::String(s) => Self::parse(s),
            _ => None,
        };
        parsed.ok_or_else(|| {
            EfficiencyError::Config(format!("unrecognized data type: {}", describe(value)))
        })
    }

    /// Short code used as the hardware spec key
    pub fn code(self) -> &'static str {
        self.entry().1
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        self.entry().2
    }

    fn entry(self) -> &'static TypeInfo {
        // every variant appears in TYPES
        TYPES
            .iter()
            .find(|t| t.0 == self)
            .unwrap_or(&TYPES[0])
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

fn describe(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{value:?}"))
}
