// パス: src/primitives.rs
// 役割: 標準で提供するプリミティブ操作の一覧と実装をまとめ、レジストリへ登録する
// 意図: 操作名と分類を一元管理し、登録処理・CLI 表示で重複列挙を防ぐ
// 関連ファイル: src/registry.rs, src/stack.rs, src/value.rs
//! 組み込みプリミティブ定義モジュール
//!
//! - `PRIMITIVES` が名前と分類の唯一の一覧。`install` はこの表を順に登録するだけ。
//! - 各操作はスタック上位から引数を取り出し、結果を積み戻す。
//! - 不正な入力は `OpError` として呼び出し側へ返し、スタックの状態は保証しない。

use std::cmp::Ordering;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::errors::{OpError, RegistryError};
use crate::registry::{prim_ops, OpRegistry};
use crate::stack::{drop_n, peek, pop, pop_n, push};
use crate::value::{Stack, Value};

/// 数値演算子の種別。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericOp {
    Add,
    Sub,
    Mul,
}

/// 等価比較の種別。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EqOp {
    Eq,
    Ne,
}

/// 順序比較の種別。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrdOp {
    Lt,
    Le,
    Gt,
    Ge,
}

/// スタック操作の種別。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShuffleOp {
    Dup,
    Drop,
    Swap,
}

/// プリミティブの分類。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Numeric(NumericOp),
    TrueDiv,
    FloorDiv,
    Remainder,
    Neg,
    Eq(EqOp),
    Ord(OrdOp),
    Not,
    Len,
    Str,
    ListConstruct,
    Shuffle(ShuffleOp),
}

impl PrimitiveKind {
    /// 消費する値の個数。`ListConstruct` は実行時に決まるため `None`。
    pub fn arity(&self) -> Option<usize> {
        match self {
            PrimitiveKind::Numeric(_)
            | PrimitiveKind::TrueDiv
            | PrimitiveKind::FloorDiv
            | PrimitiveKind::Remainder
            | PrimitiveKind::Eq(_)
            | PrimitiveKind::Ord(_)
            | PrimitiveKind::Shuffle(ShuffleOp::Swap) => Some(2),
            PrimitiveKind::Neg
            | PrimitiveKind::Not
            | PrimitiveKind::Len
            | PrimitiveKind::Str
            | PrimitiveKind::Shuffle(ShuffleOp::Dup | ShuffleOp::Drop) => Some(1),
            PrimitiveKind::ListConstruct => None,
        }
    }
}

/// プリミティブ定義。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimitiveDef {
    pub name: &'static str,
    pub kind: PrimitiveKind,
}

macro_rules! primitives {
    ($( $name:literal => $kind:expr ),+ $(,)?) => {
        /// 標準で提供するプリミティブの一覧。
        pub const PRIMITIVES: &[PrimitiveDef] = &[
            $( PrimitiveDef { name: $name, kind: $kind } ),+
        ];
    };
}

primitives! {
    "aten::add" => PrimitiveKind::Numeric(NumericOp::Add),
    "aten::sub" => PrimitiveKind::Numeric(NumericOp::Sub),
    "aten::mul" => PrimitiveKind::Numeric(NumericOp::Mul),
    "aten::div" => PrimitiveKind::TrueDiv,
    "aten::floordiv" => PrimitiveKind::FloorDiv,
    "aten::remainder" => PrimitiveKind::Remainder,
    "aten::neg" => PrimitiveKind::Neg,
    "aten::eq" => PrimitiveKind::Eq(EqOp::Eq),
    "aten::ne" => PrimitiveKind::Eq(EqOp::Ne),
    "aten::lt" => PrimitiveKind::Ord(OrdOp::Lt),
    "aten::le" => PrimitiveKind::Ord(OrdOp::Le),
    "aten::gt" => PrimitiveKind::Ord(OrdOp::Gt),
    "aten::ge" => PrimitiveKind::Ord(OrdOp::Ge),
    "aten::__not__" => PrimitiveKind::Not,
    "aten::len" => PrimitiveKind::Len,
    "aten::str" => PrimitiveKind::Str,
    "prim::ListConstruct" => PrimitiveKind::ListConstruct,
    "prim::Dup" => PrimitiveKind::Shuffle(ShuffleOp::Dup),
    "prim::Drop" => PrimitiveKind::Shuffle(ShuffleOp::Drop),
    "prim::Swap" => PrimitiveKind::Shuffle(ShuffleOp::Swap),
}

/// 名前から定義を引く。
pub fn lookup(name: &str) -> Option<PrimitiveDef> {
    PRIMITIVES.iter().copied().find(|def| def.name == name)
}

/// 一覧のすべてを `registry` へ登録する。
pub fn install(registry: &OpRegistry) -> Result<(), RegistryError> {
    for def in PRIMITIVES.iter().copied() {
        registry.register(def.name, move |stack: &mut Stack| apply(def, stack))?;
    }
    info!(count = PRIMITIVES.len(), "builtin primitives installed");
    Ok(())
}

static GLOBAL_INSTALLED: OnceCell<()> = OnceCell::new();

/// 共有レジストリへ一度だけ組み込みを登録し、そのレジストリを返す。
///
/// 組み込みの登録も後勝ちで行うため、初回呼び出しより前に [`prim_ops`] へ登録した
/// 同名の実装（`aten::add` の差し替えなど）は黙って組み込みに置き換えられる。
/// 組み込みを差し替える場合は、先にこの関数を呼んでから登録すること。2 回目以降の
/// 呼び出しは何も登録しないので、差し替えはそのまま残る。
pub fn install_global() -> Result<&'static OpRegistry, RegistryError> {
    GLOBAL_INSTALLED.get_or_try_init(|| install(prim_ops()))?;
    Ok(prim_ops())
}

/// 定義に従って 1 操作を実行する。
pub fn apply(def: PrimitiveDef, stack: &mut Stack) -> Result<(), OpError> {
    let op = def.name;
    match def.kind {
        PrimitiveKind::Numeric(kind) => {
            let (a, b) = pop_pair(stack)?;
            push(stack, numeric(op, kind, a, b)?);
        }
        PrimitiveKind::TrueDiv => {
            let (a, b) = pop_pair(stack)?;
            let rhs = b.to_double(op)?;
            if rhs == 0.0 {
                return Err(OpError::division_by_zero(op));
            }
            push(stack, a.to_double(op)? / rhs);
        }
        PrimitiveKind::FloorDiv => {
            let (a, b) = pop_pair(stack)?;
            push(stack, floordiv(op, a, b)?);
        }
        PrimitiveKind::Remainder => {
            let (a, b) = pop_pair(stack)?;
            push(stack, remainder(op, a, b)?);
        }
        PrimitiveKind::Neg => {
            let v = match pop(stack)? {
                Value::Int(i) => {
                    Value::Int(i.checked_neg().ok_or_else(|| OpError::overflow(op))?)
                }
                Value::Double(d) => Value::Double(-d),
                other => return Err(OpError::type_mismatch(op, "number", other.type_name())),
            };
            push(stack, v);
        }
        PrimitiveKind::Eq(kind) => {
            let (a, b) = pop_pair(stack)?;
            let same = values_equal(&a, &b);
            push(stack, if kind == EqOp::Eq { same } else { !same });
        }
        PrimitiveKind::Ord(kind) => {
            let (a, b) = pop_pair(stack)?;
            let ord = compare(op, &a, &b)?;
            let result = match kind {
                OrdOp::Lt => ord == Ordering::Less,
                OrdOp::Le => ord != Ordering::Greater,
                OrdOp::Gt => ord == Ordering::Greater,
                OrdOp::Ge => ord != Ordering::Less,
            };
            push(stack, result);
        }
        PrimitiveKind::Not => {
            let b = pop(stack)?.to_bool(op)?;
            push(stack, !b);
        }
        PrimitiveKind::Len => {
            let n = match pop(stack)? {
                Value::List(items) => items.len(),
                Value::Str(s) => s.chars().count(),
                other => return Err(OpError::type_mismatch(op, "List or Str", other.type_name())),
            };
            let n = i64::try_from(n).map_err(|_| OpError::overflow(op))?;
            push(stack, n);
        }
        PrimitiveKind::Str => {
            let rendered = match pop(stack)? {
                Value::Str(s) => s,
                other => other.to_string(),
            };
            push(stack, Value::Str(rendered));
        }
        PrimitiveKind::ListConstruct => {
            let n = pop(stack)?.to_int(op)?;
            let n = usize::try_from(n).map_err(|_| {
                OpError::new("OP002", format!("{op}: 要素数が負です ({n})"))
            })?;
            let items = pop_n(stack, n)?;
            push(stack, Value::List(items));
        }
        PrimitiveKind::Shuffle(ShuffleOp::Dup) => {
            let top = peek(stack, 0, 1)?.clone();
            push(stack, top);
        }
        PrimitiveKind::Shuffle(ShuffleOp::Drop) => drop_n(stack, 1)?,
        PrimitiveKind::Shuffle(ShuffleOp::Swap) => {
            let (a, b) = pop_pair(stack)?;
            push(stack, b);
            push(stack, a);
        }
    }
    Ok(())
}

/// 上位 2 個を (深い方, トップ) の順で取り出す。
fn pop_pair(stack: &mut Stack) -> Result<(Value, Value), OpError> {
    let mut pair = pop_n(stack, 2)?.into_iter();
    match (pair.next(), pair.next()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(OpError::underflow(2, 0)),
    }
}

fn numeric(op: &str, kind: NumericOp, a: Value, b: Value) -> Result<Value, OpError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            let r = match kind {
                NumericOp::Add => x.checked_add(y),
                NumericOp::Sub => x.checked_sub(y),
                NumericOp::Mul => x.checked_mul(y),
            };
            r.map(Value::Int).ok_or_else(|| OpError::overflow(op))
        }
        (Value::Str(x), Value::Str(y)) if kind == NumericOp::Add => Ok(Value::Str(x + &y)),
        (Value::List(mut xs), Value::List(ys)) if kind == NumericOp::Add => {
            xs.extend(ys);
            Ok(Value::List(xs))
        }
        (x, y) => {
            let (x, y) = (x.to_double(op)?, y.to_double(op)?);
            Ok(Value::Double(match kind {
                NumericOp::Add => x + y,
                NumericOp::Sub => x - y,
                NumericOp::Mul => x * y,
            }))
        }
    }
}

// 商は負の無限大方向へ丸める
fn floordiv(op: &str, a: Value, b: Value) -> Result<Value, OpError> {
    match (a, b) {
        (Value::Int(_), Value::Int(0)) => Err(OpError::division_by_zero(op)),
        (Value::Int(x), Value::Int(y)) => {
            let q = x.checked_div(y).ok_or_else(|| OpError::overflow(op))?;
            if x % y != 0 && ((x < 0) != (y < 0)) {
                Ok(Value::Int(q - 1))
            } else {
                Ok(Value::Int(q))
            }
        }
        (x, y) => {
            let (x, y) = (x.to_double(op)?, y.to_double(op)?);
            if y == 0.0 {
                return Err(OpError::division_by_zero(op));
            }
            Ok(Value::Double((x / y).floor()))
        }
    }
}

// 余りの符号は除数に合わせる
fn remainder(op: &str, a: Value, b: Value) -> Result<Value, OpError> {
    match (a, b) {
        (Value::Int(_), Value::Int(0)) => Err(OpError::division_by_zero(op)),
        (Value::Int(x), Value::Int(y)) => {
            let r = x.checked_rem(y).ok_or_else(|| OpError::overflow(op))?;
            if r != 0 && ((r < 0) != (y < 0)) {
                Ok(Value::Int(r + y))
            } else {
                Ok(Value::Int(r))
            }
        }
        (x, y) => {
            let (x, y) = (x.to_double(op)?, y.to_double(op)?);
            if y == 0.0 {
                return Err(OpError::division_by_zero(op));
            }
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                Ok(Value::Double(r + y))
            } else {
                Ok(Value::Double(r))
            }
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Double(y)) | (Value::Double(y), Value::Int(x)) => {
            cmp_int_double(*x, *y) == Some(Ordering::Equal)
        }
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (x, y) => x == y,
    }
}

fn compare(op: &str, a: &Value, b: &Value) -> Result<Ordering, OpError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Int(x), Value::Double(y)) => {
            cmp_int_double(*x, *y).ok_or_else(|| OpError::nan_compare(op))
        }
        (Value::Double(x), Value::Int(y)) => cmp_int_double(*y, *x)
            .map(Ordering::reverse)
            .ok_or_else(|| OpError::nan_compare(op)),
        (Value::Double(x), Value::Double(y)) => {
            x.partial_cmp(y).ok_or_else(|| OpError::nan_compare(op))
        }
        (Value::List(xs), Value::List(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                let ord = compare(op, x, y)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(xs.len().cmp(&ys.len()))
        }
        (x, y) => Err(OpError::type_mismatch(op, x.type_name(), y.type_name())),
    }
}

/// 2^63。i64 の表現範囲は [-2^63, 2^63)。
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

// i64 を f64 へ丸めずに比較する。NaN のみ None
fn cmp_int_double(x: i64, y: f64) -> Option<Ordering> {
    if y.is_nan() {
        return None;
    }
    if y >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if y < -I64_BOUND {
        return Some(Ordering::Greater);
    }
    // 範囲内なので floor は i64 へ正確に変換できる
    let floor = y.floor();
    match x.cmp(&(floor as i64)) {
        Ordering::Equal if y > floor => Some(Ordering::Less),
        ord => Some(ord),
    }
}
