use clap::{Args, Parser, Subcommand};
use evm384::config::{parse_h160, parse_hex, parse_u256, read_code_arg, to_hex};
use evm384::{analyze, disasm, Evm, EvmConfig, EvmError, Revision, World};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "evm", about = "Block-metered EVM interpreter with EVM384 opcodes")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Run EVM bytecode
    Run(RunArgs),
    /// Disassemble bytecode
    Disasm {
        /// Hex bytecode or @file
        code: String,
    },
    /// Show the analyzed instruction stream and its blocks
    Analyze {
        /// Hex bytecode or @file
        code: String,
        #[arg(long = "rev", visible_alias = "revision", default_value = "istanbul")]
        revision: String,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Hex bytecode (e.g., 0x6001600101) or @file
    code: String,
    /// Revision name (frontier .. berlin)
    #[arg(long = "rev", visible_alias = "revision", default_value = "istanbul")]
    revision: String,
    /// Gas limit
    #[arg(long, default_value_t = 10_000_000)]
    gas: i64,
    /// Calldata as hex
    #[arg(long, default_value = "0x")]
    calldata: String,
    /// World JSON file (accounts map)
    #[arg(long)]
    world: Option<String>,
    /// Context address (0x..)
    #[arg(long)]
    address: Option<String>,
    /// Msg caller (0x..)
    #[arg(long)]
    caller: Option<String>,
    /// Tx origin (0x..), defaults to the caller
    #[arg(long)]
    origin: Option<String>,
    /// Call value (0x.. or decimal)
    #[arg(long, default_value = "0x0")]
    value: String,
    /// Gas price (0x.. or decimal)
    #[arg(long, default_value = "0x0")]
    gas_price: String,
    /// Block coinbase (0x..)
    #[arg(long)]
    coinbase: Option<String>,
    /// Block timestamp (unix seconds)
    #[arg(long)]
    timestamp: Option<u64>,
    /// Block number
    #[arg(long)]
    number: Option<u64>,
    /// Block gas limit
    #[arg(long)]
    block_gas_limit: Option<u64>,
    /// Block difficulty (0x.. or decimal)
    #[arg(long)]
    difficulty: Option<String>,
    /// Chain id (0x.. or decimal)
    #[arg(long)]
    chainid: Option<String>,
    /// Dump final world JSON to stdout, or to a file given as @path
    #[arg(long)]
    dump_world: Option<Option<String>>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let res = match cli.cmd {
        Cmd::Run(args) => run_cmd(args),
        Cmd::Disasm { code } => disasm_cmd(&code),
        Cmd::Analyze { code, revision } => analyze_cmd(&code, &revision),
    };
    match res {
        Ok(code) => std::process::exit(code),
        Err(e) => die(&e.to_string()),
    }
}

fn opt<T>(s: Option<&str>, parse: fn(&str) -> Result<T, EvmError>) -> Result<Option<T>, EvmError> {
    s.map(parse).transpose()
}

/// Exit code 0 when execution succeeded, 2 otherwise.
fn run_cmd(args: RunArgs) -> Result<i32, EvmError> {
    let code = read_code_arg(&args.code)?;
    let mut cfg = EvmConfig {
        revision: args.revision.parse()?,
        gas_limit: args.gas,
        calldata: parse_hex(&args.calldata)?,
        address: opt(args.address.as_deref(), parse_h160)?,
        caller: opt(args.caller.as_deref(), parse_h160)?,
        origin: opt(args.origin.as_deref(), parse_h160)?,
        value: parse_u256(&args.value)?,
        gas_price: parse_u256(&args.gas_price)?,
        ..EvmConfig::default()
    };
    if let Some(cb) = opt(args.coinbase.as_deref(), parse_h160)? {
        cfg.block.coinbase = cb;
    }
    if let Some(t) = args.timestamp {
        cfg.block.timestamp = t;
    }
    if let Some(n) = args.number {
        cfg.block.number = n;
    }
    if let Some(gl) = args.block_gas_limit {
        cfg.block.gas_limit = gl;
    }
    if let Some(d) = opt(args.difficulty.as_deref(), parse_u256)? {
        cfg.block.difficulty = d;
    }
    if let Some(cid) = opt(args.chainid.as_deref(), parse_u256)? {
        cfg.block.chain_id = cid;
    }
    if let Some(path) = &args.world {
        cfg.world = Some(World::load(path)?);
    }

    let mut evm = Evm::new(code, cfg);
    let res = evm.run();
    println!("status: {}", res.status);
    if !res.output().is_empty() {
        println!("output: 0x{}", to_hex(res.output()));
    }
    println!("gas used: {}", args.gas - res.gas_left);
    println!("gas left: {}", res.gas_left);
    let logs = &evm.host().logs;
    if !logs.is_empty() {
        println!("logs: {}", logs.len());
        for (i, log) in logs.iter().enumerate() {
            let topics: Vec<String> = log.topics.iter().map(|t| format!("0x{}", to_hex(t.as_bytes()))).collect();
            println!(
                "  [{}] address=0x{} topics=[{}] data=0x{}",
                i,
                to_hex(log.address.as_bytes()),
                topics.join(", "),
                to_hex(&log.data)
            );
        }
    }
    if let Some(dw) = args.dump_world {
        let json = evm.world().to_json()?;
        match dw.as_deref().and_then(|d| d.strip_prefix('@')) {
            Some(path) => std::fs::write(path, json)?,
            None => println!("{}", json),
        }
    }
    Ok(if res.status.is_success() { 0 } else { 2 })
}

fn disasm_cmd(code_arg: &str) -> Result<i32, EvmError> {
    let code = read_code_arg(code_arg)?;
    for line in disasm::disassemble(&code) {
        println!("{}", line);
    }
    Ok(0)
}

fn analyze_cmd(code_arg: &str, revision: &str) -> Result<i32, EvmError> {
    let code = read_code_arg(code_arg)?;
    let rev: Revision = revision.parse()?;
    let analysis = analyze(rev, &code);
    for line in disasm::describe_analysis(&code, &analysis) {
        println!("{}", line);
    }
    Ok(0)
}

fn die(msg: &str) -> ! {
    eprintln!("{}", msg);
    std::process::exit(1);
}
