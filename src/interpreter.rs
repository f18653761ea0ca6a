// パス: src/interpreter.rs
// 役割: 操作名を含む命令列をレジストリで解決し、実行スタック上で実行する
// 意図: 名前解決を実行前に一度だけ行い、未登録の操作を回復可能なエラーとして扱う
// 関連ファイル: src/registry.rs, src/value.rs, src/cli.rs
//! 最小インタプリタ
//!
//! - `link` が命令列中の操作名をすべて解決し、実装をキャッシュした `LinkedProgram` を返す。
//!   信頼できない命令列でも `has` で確認してから取り出すため、未登録名で停止することはない。
//! - `LinkedProgram::run` は文字列検索をせず、キャッシュ済みの実装を順に呼び出す。
//! - 操作内部のエラーは `ExecError::Op` としてそのまま伝搬する。

use tracing::{debug, trace};

use crate::errors::ExecError;
use crate::registry::{OpFn, OpRegistry};
use crate::value::{Stack, Value};

/// 命令。
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// 定数をスタックへ積む。
    Const(Value),
    /// 名前で参照される操作を呼び出す。
    Op(String),
}

#[derive(Clone)]
enum Linked {
    Const(Value),
    Op { name: String, op: OpFn },
}

/// 名前解決済みの命令列。
#[derive(Clone)]
pub struct LinkedProgram {
    code: Vec<Linked>,
}

impl LinkedProgram {
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// 命令列を `stack` 上で実行する。
    pub fn run(&self, stack: &mut Stack) -> Result<(), ExecError> {
        for (pc, inst) in self.code.iter().enumerate() {
            match inst {
                Linked::Const(v) => stack.push(v.clone()),
                Linked::Op { name, op } => {
                    trace!(pc, op = %name, depth = stack.len(), "dispatch");
                    op(stack)?;
                }
            }
        }
        Ok(())
    }
}

/// 命令列中の操作名をすべて `registry` で解決する。
pub fn link(registry: &OpRegistry, code: &[Instruction]) -> Result<LinkedProgram, ExecError> {
    let mut linked = Vec::with_capacity(code.len());
    for inst in code {
        linked.push(match inst {
            Instruction::Const(v) => Linked::Const(v.clone()),
            Instruction::Op(name) => Linked::Op {
                name: name.clone(),
                op: resolve(registry, name)?,
            },
        });
    }
    Ok(LinkedProgram { code: linked })
}

/// 1 つの操作名を解決する。未登録は `ExecError::Unsupported`。
pub fn resolve(registry: &OpRegistry, name: &str) -> Result<OpFn, ExecError> {
    if !registry.has(name) {
        debug!(op = %name, "unsupported operation");
        return Err(ExecError::unsupported(name));
    }
    // has と get の間に他スレッドの登録が挟まっても、エントリは削除されない
    Ok(registry.get(name))
}

/// `link` してから `run` する。
pub fn run(
    registry: &OpRegistry,
    code: &[Instruction],
    stack: &mut Stack,
) -> Result<(), ExecError> {
    link(registry, code)?.run(stack)
}

/// 空白区切りのトークン列を命令列へ変換する。
///
/// - 整数 / 小数 → 数値定数
/// - `True` / `False` / `None`
/// - `'text'`（空白を含まない）→ 文字列定数
/// - `::` を含む識別子 → 操作名
pub fn parse_program(src: &str) -> Result<Vec<Instruction>, ExecError> {
    src.split_whitespace().map(parse_token).collect()
}

fn parse_token(token: &str) -> Result<Instruction, ExecError> {
    let value = match token {
        "True" => Some(Value::Bool(true)),
        "False" => Some(Value::Bool(false)),
        "None" => Some(Value::None),
        _ => None,
    };
    if let Some(v) = value {
        return Ok(Instruction::Const(v));
    }
    if let Ok(i) = token.parse::<i64>() {
        return Ok(Instruction::Const(Value::Int(i)));
    }
    let numeric_start = token.starts_with(|c: char| c.is_ascii_digit() || c == '-');
    if numeric_start && token.contains(['.', 'e', 'E']) {
        if let Ok(d) = token.parse::<f64>() {
            return Ok(Instruction::Const(Value::Double(d)));
        }
    }
    if let Some(inner) = token
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Ok(Instruction::Const(Value::Str(inner.to_string())));
    }
    if is_op_name(token) {
        return Ok(Instruction::Op(token.to_string()));
    }
    Err(ExecError::Parse {
        token: token.to_string(),
    })
}

fn is_op_name(token: &str) -> bool {
    let mut parts = token.split("::");
    let ns = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();
    let ident = |s: &str| {
        !s.is_empty()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    };
    ident(ns) && !rest.is_empty() && rest.iter().all(|s| ident(s))
}
