//! Interpreter benchmarks on synthetic bytecode.
//!
//! Run with: `cargo bench --bench synthetic`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use evm384::{analyze, execute, InMemoryHost, Message, Revision};

// ── Programs ──────────────────────────────────────────────────────────────────

fn asm(code: &str) -> Vec<u8> {
    hex::decode(code.split_whitespace().collect::<String>()).expect("valid hex")
}

/// Counts down from `n`: one JUMPI-terminated block per iteration.
fn countdown(n: u16) -> Vec<u8> {
    asm(&format!("61{n:04x} 5b 6001 90 03 80 6003 57 00"))
}

/// Fills the stack to its limit and drains it again, `rounds` times.
fn full_stack(rounds: u16) -> Vec<u8> {
    let push = "6001".repeat(1023);
    let pop = "50".repeat(1023);
    asm(&format!("61{rounds:04x} 5b {push} {pop} 6001 90 03 80 6003 57 00"))
}

/// Runs MULMODMONT384 `n` times over operands copied from calldata.
fn mulmont_loop(n: u16) -> Vec<u8> {
    let offsets = format!("{:032x}", 96u128 | (48u128 << 32));
    asm(&format!("36 6000 6000 37 61{n:04x} 5b 6f{offsets} c2 6001 90 03 80 6009 57 00"))
}

fn mulmont_input() -> Vec<u8> {
    let x = "38b4e652e44da7f2370d9e260e27136550a4a3a6d07f5c0c332f8b1224083fd22b902f8911e81818f8c99d5d0b33a612";
    let y = "7504d90e945de2e8f54ee781cc75f636d85099095aa300165a67036f9b540d6b8f0be21124179c3dd9f73817d92da211";
    let p = "abaafffffffffeb9ffff53b1feffab1e24f6b0f6a0d23067bf1285f3844b7764d7ac4b43b6a71b4b9ae67f39ea11011a";
    asm(&format!("{x}{y}{p}fdfffcfffcfff389"))
}

fn run(code: &[u8], input: &[u8]) -> i64 {
    let msg = Message { gas: i64::MAX / 2, input: input.to_vec(), ..Default::default() };
    execute(&mut InMemoryHost::default(), Revision::Istanbul, msg, code).gas_left
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_loops(c: &mut Criterion) {
    let mut group = c.benchmark_group("loops");
    for n in [100u16, 1000, 10000] {
        let code = countdown(n);
        group.bench_with_input(BenchmarkId::new("countdown", n), &code, |b, code| {
            b.iter(|| run(black_box(code), &[]))
        });
    }
    let code = full_stack(10);
    group.bench_function("full_stack/10", |b| b.iter(|| run(black_box(&code), &[])));
    group.finish();
}

fn bench_evm384(c: &mut Criterion) {
    let code = mulmont_loop(1000);
    let input = mulmont_input();
    c.bench_function("evm384/mulmodmont384 x1000", |b| b.iter(|| run(black_box(&code), &input)));
}

fn bench_analysis(c: &mut Criterion) {
    // 24 KiB of mixed pushes, arithmetic and jumpdests.
    let code: Vec<u8> = (0..24 * 1024u32)
        .map(|i| match i % 7 {
            0 => 0x60,
            3 => 0x5b,
            5 => 0x01,
            _ => (i % 251) as u8,
        })
        .collect();
    c.bench_function("analyze/24KiB", |b| b.iter(|| analyze(Revision::Istanbul, black_box(&code))));
}

criterion_group!(benches, bench_loops, bench_evm384, bench_analysis);
criterion_main!(benches);
