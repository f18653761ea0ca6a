// パス: src/bin/primops.rs
// 役割: Binary entrypoint for the primitive operation registry CLI
// 意図: Set up logging, parse arguments, and hand off to the library
// 関連ファイル: src/cli.rs, src/lib.rs
use std::io;
use std::process::ExitCode;

use clap::Parser;
use primops::cli::{execute, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    match execute(&cli, &mut stdout, &mut stderr) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            eprintln!("primops: 出力に失敗しました: {err}");
            ExitCode::from(2)
        }
    }
}

fn setup_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PRIMOPS_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("primops=debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
