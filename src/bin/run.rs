use evm384::config::{parse_hex, to_hex};
use evm384::{Evm, EvmConfig};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: evm-run <bytecode-hex> [gas]");
        eprintln!("Example: evm-run 0x604260ff01");
        std::process::exit(1);
    }
    let code = parse_hex(&args[1]).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    let gas = args.get(2).and_then(|g| g.parse::<i64>().ok()).unwrap_or(10_000_000);
    let cfg = EvmConfig { gas_limit: gas, ..EvmConfig::default() };
    let res = Evm::new(code, cfg).run();
    println!("status: {}", res.status);
    println!("gas left: {}", res.gas_left);
    if !res.output().is_empty() {
        println!("output: 0x{}", to_hex(res.output()));
    }
    if !res.status.is_success() {
        std::process::exit(2);
    }
}
