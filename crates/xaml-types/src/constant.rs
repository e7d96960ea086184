//! Compile-time constant values attached to literal fields

use serde::{Deserialize, Serialize};
use std::fmt;

/// Constant value of a literal field or a folded markup value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantValue {
    /// Null reference
    Null,
    /// Boolean constant
    Bool(bool),
    /// 32-bit integer constant (also the storage of most enums)
    I32(i32),
    /// 64-bit integer constant
    I64(i64),
    /// Double precision constant
    F64(f64),
    /// String constant
    String(String),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Bool(b) => write!(f, "{}", b),
            ConstantValue::I32(v) => write!(f, "{}", v),
            ConstantValue::I64(v) => write!(f, "{}L", v),
            ConstantValue::F64(v) => write!(f, "{}", v),
            ConstantValue::String(s) => write!(f, "{:?}", s),
        }
    }
}
