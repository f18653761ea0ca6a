// パス: src/cli.rs
// 役割: `primops` コマンドの引数定義とサブコマンド実行を担う
// 意図: バイナリ側を薄く保ち、出力先を差し替えてテストできるようにする
// 関連ファイル: src/bin/primops.rs, src/interpreter.rs, src/primitives.rs
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::errors::ExecError;
use crate::interpreter::{parse_program, run};
use crate::primitives::{install_global, lookup};
use crate::registry::OpRegistry;
use crate::value::{Stack, Value};

#[derive(Debug, Parser)]
#[command(name = "primops", version, about = "Primitive operation registry explorer")]
pub struct Cli {
    /// 既定のログレベルを debug に上げる（PRIMOPS_LOG が優先）
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 登録済みの操作名を一覧表示する
    List {
        #[arg(long)]
        json: bool,
    },
    /// 操作が登録されているかを確認する（未登録なら終了コード 1）
    Has { name: String },
    /// トークン列を空のスタック上で実行し、最終スタックを表示する
    Run {
        #[arg(long)]
        json: bool,
        #[arg(required = true, allow_hyphen_values = true, allow_negative_numbers = true)]
        tokens: Vec<String>,
    },
}

#[derive(Serialize)]
struct ListReport<'a> {
    status: &'static str,
    count: usize,
    ops: Vec<OpEntry<'a>>,
}

#[derive(Serialize)]
struct OpEntry<'a> {
    name: &'a str,
    arity: Option<usize>,
}

#[derive(Serialize)]
struct RunReport<'a> {
    status: &'static str,
    stack: &'a [Value],
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    status: &'static str,
    code: &'static str,
    message: String,
    stack: &'a [Value],
}

/// 実行結果の終了コード。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Missing,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Ok => 0,
            Outcome::Missing => 1,
            Outcome::Failed => 2,
        }
    }
}

/// 共有レジストリに組み込みを登録してからサブコマンドを実行する。
pub fn execute<W: Write, E: Write>(cli: &Cli, out: &mut W, err: &mut E) -> io::Result<Outcome> {
    match install_global() {
        Ok(registry) => execute_with(registry, &cli.command, out, err),
        Err(e) => {
            writeln!(err, "{e}")?;
            Ok(Outcome::Failed)
        }
    }
}

pub fn execute_with<W: Write, E: Write>(
    registry: &OpRegistry,
    command: &Command,
    out: &mut W,
    err: &mut E,
) -> io::Result<Outcome> {
    match command {
        Command::List { json } => {
            let names = registry.names();
            if *json {
                let report = ListReport {
                    status: "ok",
                    count: names.len(),
                    ops: names
                        .iter()
                        .map(|name| OpEntry {
                            name,
                            arity: lookup(name).and_then(|def| def.kind.arity()),
                        })
                        .collect(),
                };
                write_json(out, &report)?;
            } else {
                for name in &names {
                    writeln!(out, "{name}")?;
                }
            }
            Ok(Outcome::Ok)
        }
        Command::Has { name } => {
            let found = registry.has(name);
            writeln!(out, "{found}")?;
            Ok(if found { Outcome::Ok } else { Outcome::Missing })
        }
        Command::Run { json, tokens } => {
            let mut stack = Stack::new();
            match parse_program(&tokens.join(" "))
                .and_then(|code| run(registry, &code, &mut stack))
            {
                Ok(()) => {
                    if *json {
                        write_json(out, &RunReport { status: "ok", stack: &stack })?;
                    } else {
                        write_stack(out, &stack)?;
                    }
                    Ok(Outcome::Ok)
                }
                Err(e) => {
                    report_error(out, err, *json, &e, &stack)?;
                    Ok(Outcome::Failed)
                }
            }
        }
    }
}

fn report_error<W: Write, E: Write>(
    out: &mut W,
    err: &mut E,
    json: bool,
    e: &ExecError,
    stack: &[Value],
) -> io::Result<()> {
    if json {
        write_json(
            out,
            &ErrorReport {
                status: "error",
                code: e.code(),
                message: e.to_string(),
                stack,
            },
        )
    } else {
        writeln!(err, "{e}")
    }
}

fn write_stack<W: Write>(out: &mut W, stack: &[Value]) -> io::Result<()> {
    let rendered: Vec<String> = stack.iter().map(Value::to_string).collect();
    writeln!(out, "[{}]", rendered.join(", "))
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)
}
