//! エラー型の定義（共通フォーマット: \[CODE\] メッセージ）。
//!
//! - `OpError`: 操作実装の内部で発生する実行時フォルト。レジストリは包まずに素通しする。
//! - `RegistryError`: 登録・解決時の契約違反。
//! - `ExecError`: インタプリタ層で利用者へ返すエラー。

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub msg: String,
}

impl ErrorInfo {
    pub fn new(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.msg)
    }
}

/// 操作実装が投げるフォルト。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpError(pub ErrorInfo);

impl OpError {
    pub fn new(code: &'static str, msg: impl Into<String>) -> Self {
        Self(ErrorInfo::new(code, msg))
    }

    pub fn code(&self) -> &'static str {
        self.0.code
    }

    /// スタックに要求数の値が積まれていない。
    pub fn underflow(needed: usize, available: usize) -> Self {
        Self::new(
            "OP001",
            format!("スタック不足: {needed} 個必要ですが {available} 個しかありません"),
        )
    }

    pub fn type_mismatch(op: &str, expected: &str, got: &str) -> Self {
        Self::new("OP002", format!("{op}: {expected} を期待しましたが {got} でした"))
    }

    pub fn division_by_zero(op: &str) -> Self {
        Self::new("OP003", format!("{op}: 0 で割ることはできません"))
    }

    pub fn overflow(op: &str) -> Self {
        Self::new("OP004", format!("{op}: 結果が Int の範囲を超えました"))
    }

    pub fn nan_compare(op: &str) -> Self {
        Self::new("OP005", format!("{op}: NaN は比較できません"))
    }
}

impl Display for OpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl StdError for OpError {}

/// レジストリの登録・解決で発生しうるエラー種別。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("[REG001] 操作名が空です")]
    EmptyName,
    #[error("[REG002] 未登録の操作です: {name}")]
    UnknownOperation { name: String },
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::EmptyName => "REG001",
            RegistryError::UnknownOperation { .. } => "REG002",
        }
    }
}

/// インタプリタ層のエラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// 命令列が参照する操作がレジストリに存在しない（回復可能）。
    #[error("[EXEC001] 未対応の操作です: {name}")]
    Unsupported { name: String },
    #[error("[EXEC002] 解釈できないトークンです: {token}")]
    Parse { token: String },
    #[error(transparent)]
    Op(#[from] OpError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ExecError {
    pub fn unsupported(name: impl Into<String>) -> Self {
        Self::Unsupported { name: name.into() }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExecError::Unsupported { .. } => "EXEC001",
            ExecError::Parse { .. } => "EXEC002",
            ExecError::Op(err) => err.code(),
            ExecError::Registry(err) => err.code(),
        }
    }
}
