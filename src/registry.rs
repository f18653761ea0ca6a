// パス: src/registry.rs
// 役割: 操作名からネイティブ実装への対応表（プリミティブ操作レジストリ）を提供する
// 意図: 起動時に登録し実行時に名前で解決する、書き込み少・読み込み多の共有表を安全に扱う
// 関連ファイル: src/primitives.rs, src/interpreter.rs, src/errors.rs
//! プリミティブ操作レジストリ
//!
//! 方針:
//! - 読み取り（`has` / `get` / `try_get`）は共有ロックのみを取り、読み手同士はブロックしない。
//! - 登録（`register`）は排他ロックで直列化し、途中状態のエントリは決して観測されない。
//! - エントリの削除は提供しない。同名の再登録は後勝ち（呼び出し側の責任として警告ログを出す）。
//! - 解決した実装は `Arc` で返すため、ロックを保持したまま操作を実行することはない。
//!
//! プロセス全体で共有する既定インスタンスは [`prim_ops`] から取得する。テストや組み込み側は
//! [`OpRegistry::new`] で独立したインスタンスを作り、インタプリタへ渡せばよい。

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::errors::{OpError, RegistryError};
use crate::value::Stack;

/// 登録される操作実装。戻り値は持たず、効果はすべてスタックの変更で表す。
pub type OpFn = Arc<dyn Fn(&mut Stack) -> Result<(), OpError> + Send + Sync>;

/// 操作名 → 実装 の対応表。
pub struct OpRegistry {
    ops: RwLock<FxHashMap<String, OpFn>>,
}

impl OpRegistry {
    /// 空のレジストリを生成する。
    pub fn new() -> Self {
        Self {
            ops: RwLock::new(FxHashMap::default()),
        }
    }

    /// クロージャを登録する。既存の同名エントリは置き換えられる。
    pub fn register<F>(&self, name: impl Into<String>, op: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut Stack) -> Result<(), OpError> + Send + Sync + 'static,
    {
        self.register_fn(name, Arc::new(op))
    }

    /// 共有済みの実装をそのまま登録する。
    ///
    /// 同名の再登録は拒否しない。組み込み操作を意図的に差し替える利用があるため、
    /// 後から登録した実装が以後の解決結果になる。
    pub fn register_fn(&self, name: impl Into<String>, op: OpFn) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let replaced = {
            let mut ops = self.ops.write();
            ops.insert(name.clone(), op).is_some()
        };
        if replaced {
            warn!(op = %name, "primitive operation overwritten");
        } else {
            debug!(op = %name, "primitive operation registered");
        }
        Ok(())
    }

    /// 指定名のエントリが存在するか。
    pub fn has(&self, name: &str) -> bool {
        self.ops.read().contains_key(name)
    }

    /// 登録済みの実装を返す。
    ///
    /// # Panics
    /// `name` が未登録の場合。未登録の操作を黙って無視すると実行中のプログラムの意味が
    /// 変わってしまうため、その場で停止させる。出所が信頼できない名前は [`has`] または
    /// [`try_get`] で先に確認すること。
    ///
    /// [`has`]: OpRegistry::has
    /// [`try_get`]: OpRegistry::try_get
    pub fn get(&self, name: &str) -> OpFn {
        match self.lookup(name) {
            Some(op) => op,
            None => panic!("primitive operation `{name}` is not registered"),
        }
    }

    /// 未登録を `RegistryError::UnknownOperation` として返す版の [`get`](OpRegistry::get)。
    pub fn try_get(&self, name: &str) -> Result<OpFn, RegistryError> {
        self.lookup(name).ok_or_else(|| {
            debug!(op = %name, "primitive operation lookup missed");
            RegistryError::UnknownOperation {
                name: name.to_string(),
            }
        })
    }

    /// 登録済みの操作名を辞書順で返す。
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ops.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.ops.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.read().is_empty()
    }

    fn lookup(&self, name: &str) -> Option<OpFn> {
        self.ops.read().get(name).cloned()
    }
}

impl Default for OpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OpRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpRegistry")
            .field("ops", &self.names())
            .finish()
    }
}

static PRIM_OPS: Lazy<OpRegistry> = Lazy::new(OpRegistry::new);

/// プロセス全体で共有するレジストリ。初回参照時に生成され、終了まで破棄されない。
pub fn prim_ops() -> &'static OpRegistry {
    &PRIM_OPS
}

pub fn register_prim_ops_fn<F>(name: impl Into<String>, op: F) -> Result<(), RegistryError>
where
    F: Fn(&mut Stack) -> Result<(), OpError> + Send + Sync + 'static,
{
    prim_ops().register(name, op)
}

pub fn has_prim_ops_fn(name: &str) -> bool {
    prim_ops().has(name)
}

/// # Panics
/// `name` が共有レジストリに未登録の場合。
pub fn get_prim_ops_fn(name: &str) -> OpFn {
    prim_ops().get(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn push_const(v: i64) -> impl Fn(&mut Stack) -> Result<(), OpError> + Send + Sync {
        move |stack: &mut Stack| {
            stack.push(Value::Int(v));
            Ok(())
        }
    }

    #[test]
    fn empty_name_is_rejected_and_nothing_is_stored() {
        let registry = OpRegistry::new();
        let err = registry.register("", push_const(1)).unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
        assert!(registry.is_empty());
        assert!(!registry.has(""));
    }

    #[test]
    fn overwrite_keeps_a_single_entry() {
        let registry = OpRegistry::new();
        registry.register("t::k", push_const(1)).unwrap();
        registry.register("t::k", push_const(2)).unwrap();
        assert_eq!(registry.len(), 1);
        let mut stack = Stack::new();
        registry.get("t::k")(&mut stack).unwrap();
        assert_eq!(stack, vec![Value::Int(2)]);
    }

    #[test]
    fn lookup_is_exact_match() {
        let registry = OpRegistry::new();
        registry.register("aten::add", push_const(0)).unwrap();
        assert!(registry.has("aten::add"));
        assert!(!registry.has("aten::Add"));
        assert!(!registry.has("aten::add "));
        assert!(!registry.has("aten"));
    }

    #[test]
    #[should_panic(expected = "`t::missing` is not registered")]
    fn get_on_missing_name_panics() {
        let registry = OpRegistry::new();
        let _ = registry.get("t::missing");
    }

    #[test]
    fn debug_lists_sorted_names() {
        let registry = OpRegistry::new();
        registry.register("b", push_const(0)).unwrap();
        registry.register("a", push_const(0)).unwrap();
        assert_eq!(format!("{registry:?}"), r#"OpRegistry { ops: ["a", "b"] }"#);
    }

    #[test]
    fn registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpRegistry>();
        assert_send_sync::<OpFn>();
    }
}
