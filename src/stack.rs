// パス: src/stack.rs
// 役割: 操作実装がスタックを読み書きするためのヘルパーを提供する
// 意図: 不足時に panic せず OpError を返し、各操作の記述を短く保つ
// 関連ファイル: src/value.rs, src/primitives.rs
use crate::errors::OpError;
use crate::value::{Stack, Value};

pub fn push(stack: &mut Stack, value: impl Into<Value>) {
    stack.push(value.into());
}

pub fn pop(stack: &mut Stack) -> Result<Value, OpError> {
    stack.pop().ok_or_else(|| OpError::underflow(1, 0))
}

/// 上位 `n` 個を取り出す。戻り値は積まれた順（底→トップ）。
pub fn pop_n(stack: &mut Stack, n: usize) -> Result<Vec<Value>, OpError> {
    ensure(stack, n)?;
    let start = stack.len() - n;
    Ok(stack.split_off(start))
}

/// 上位 `n` 個のうち `i` 番目（0 が最も深い）を参照する。
pub fn peek(stack: &Stack, i: usize, n: usize) -> Result<&Value, OpError> {
    ensure(stack, n)?;
    if i >= n {
        return Err(OpError::new(
            "OP001",
            format!("peek: 位置 {i} は上位 {n} 個の範囲外です"),
        ));
    }
    Ok(&stack[stack.len() - n + i])
}

pub fn last_n(stack: &Stack, n: usize) -> Result<&[Value], OpError> {
    ensure(stack, n)?;
    Ok(&stack[stack.len() - n..])
}

pub fn drop_n(stack: &mut Stack, n: usize) -> Result<(), OpError> {
    ensure(stack, n)?;
    let keep = stack.len() - n;
    stack.truncate(keep);
    Ok(())
}

fn ensure(stack: &Stack, n: usize) -> Result<(), OpError> {
    if stack.len() < n {
        Err(OpError::underflow(n, stack.len()))
    } else {
        Ok(())
    }
}
