// パス: src/lib.rs
// 役割: Crate root wiring modules and exports
// 意図: Expose the registry and its small set of collaborators
// 関連ファイル: src/registry.rs, src/errors.rs, src/interpreter.rs
//! primops ルートモジュール
//!
//! 目的:
//! - 軽量バイトコードインタプリタが命令中の操作名をネイティブ実装へ結び付けるための
//!   プリミティブ操作レジストリを提供する。
//!
//! 構成:
//! - `registry`: 名前 → 実装 の共有表（本体）。
//! - `primitives`: 標準で登録する操作の一覧。
//! - `interpreter`: 命令列の名前解決と実行。
//! - `value` / `stack`: 実行スタックとその操作ヘルパー。
//! - `cli`: `primops` コマンドの実装。

pub mod cli;
pub mod errors;
pub mod interpreter;
pub mod primitives;
pub mod registry;
pub mod stack;
pub mod value;

// 便利な再エクスポート（必要最小限）
pub use crate::errors::*;
pub use crate::registry::{
    get_prim_ops_fn, has_prim_ops_fn, prim_ops, register_prim_ops_fn, OpFn, OpRegistry,
};
pub use crate::value::{Stack, Value};
