// パス: src/value.rs
// 役割: 実行スタックに積まれる実行時値と `Stack` 型を定義する
// 意図: 操作実装・インタプリタ・CLI が同じ値表現を共有できるようにする
// 関連ファイル: src/stack.rs, src/primitives.rs, src/interpreter.rs
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::errors::OpError;

/// 実行時値。レジストリ自身はこの中身を一切参照しない。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    List(Vec<Value>),
}

/// 操作が読み書きする実行スタック。末尾がトップ。
pub type Stack = Vec<Value>;

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Double(_) => "Double",
            Value::Str(_) => "Str",
            Value::List(_) => "List",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Double(_))
    }

    pub fn to_int(&self, op: &str) -> Result<i64, OpError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(OpError::type_mismatch(op, "Int", other.type_name())),
        }
    }

    /// Int は暗黙に Double へ拡張する。
    pub fn to_double(&self, op: &str) -> Result<f64, OpError> {
        match self {
            Value::Double(d) => Ok(*d),
            Value::Int(i) => Ok(*i as f64),
            other => Err(OpError::type_mismatch(op, "Double", other.type_name())),
        }
    }

    pub fn to_bool(&self, op: &str) -> Result<bool, OpError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(OpError::type_mismatch(op, "Bool", other.type_name())),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            // 整数値の Double も小数点付きで表示し Int と区別する
            Value::Double(d) if d.is_finite() && d.fract() == 0.0 => write!(f, "{d:.1}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_source_form() {
        let cases = [
            (Value::None, "None"),
            (Value::Bool(true), "True"),
            (Value::Int(-3), "-3"),
            (Value::Double(2.0), "2.0"),
            (Value::Double(2.5), "2.5"),
            (Value::from("abc"), "'abc'"),
            (
                Value::List(vec![Value::Int(1), Value::Double(0.5)]),
                "[1, 0.5]",
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(value.to_string(), expected);
        }
    }

    #[test]
    fn conversions_report_type_mismatch() {
        assert_eq!(Value::Int(3).to_double("t").unwrap(), 3.0);
        let err = Value::Bool(true).to_int("aten::add").unwrap_err();
        assert_eq!(err.code(), "OP002");
        assert!(err.to_string().contains("aten::add"));
    }
}
