// パス: tests/concurrency.rs
// 役割: 複数スレッドからの同時参照・参照と登録の混在を検証する
// 意図: 読み手同士が干渉せず、途中状態のエントリが観測されないことを確認する
// 関連ファイル: src/registry.rs, tests/registry.rs
#[path = "test_support.rs"]
mod support;

use std::sync::{Arc, Barrier};
use std::thread;

use primops::{OpRegistry, Stack, Value};
use support::{builtin_registry, ints};

const THREADS: usize = 8;
const ROUNDS: usize = 2_000;

#[test]
fn concurrent_readers_see_identical_results() {
    let registry = Arc::new(builtin_registry());
    let expected_names = registry.names();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..ROUNDS {
                    assert!(registry.has("aten::add"));
                    assert!(!registry.has("aten::conv2d"));
                    let mut stack = ints(&[t as i64, i as i64]);
                    registry.get("aten::add")(&mut stack).expect("add");
                    assert_eq!(stack, ints(&[(t + i) as i64]));
                }
                registry.names()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("reader thread"), expected_names);
    }
}

#[test]
fn late_registrations_interleave_with_lookups() {
    let registry = Arc::new(OpRegistry::new());
    let barrier = Arc::new(Barrier::new(THREADS + 1));

    let writer = {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for i in 0..ROUNDS {
                let v = i as i64;
                registry
                    .register(format!("lazy::op{i}"), move |s: &mut Stack| {
                        s.push(Value::Int(v));
                        Ok(())
                    })
                    .expect("register");
            }
        })
    };

    let readers: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut seen = 0;
                for i in (0..ROUNDS).cycle().take(ROUNDS * 4) {
                    let name = format!("lazy::op{i}");
                    if registry.has(&name) {
                        // 一度見えたエントリは完全な実装として呼び出せる
                        let mut stack = Stack::new();
                        registry.get(&name)(&mut stack).expect("lazy op");
                        assert_eq!(stack, ints(&[i as i64]));
                        seen += 1;
                    }
                }
                seen
            })
        })
        .collect();

    writer.join().expect("writer thread");
    for reader in readers {
        reader.join().expect("reader thread");
    }
    assert_eq!(registry.len(), ROUNDS);
}

#[test]
fn concurrent_overwrites_leave_one_complete_entry() {
    let registry = Arc::new(OpRegistry::new());
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..ROUNDS / 10 {
                    let v = t as i64;
                    registry
                        .register("shared::op", move |s: &mut Stack| {
                            s.push(Value::Int(v));
                            Ok(())
                        })
                        .expect("register");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    assert_eq!(registry.len(), 1);
    let mut stack = Stack::new();
    registry.get("shared::op")(&mut stack).expect("shared op");
    match stack.as_slice() {
        [Value::Int(v)] => assert!((0..THREADS as i64).contains(v)),
        other => panic!("unexpected stack: {other:?}"),
    }
}
