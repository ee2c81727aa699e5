//! Human-readable listings of raw bytecode and of its analyzed form.

use crate::analysis::{AdvancedCodeAnalysis, InstrArg};
use crate::config::to_hex;
use crate::opcodes::{PUSH1, PUSH32};
use crate::traits::TRAITS;

fn push_len(op: u8) -> usize {
    if (PUSH1..=PUSH32).contains(&op) {
        (op - PUSH1 + 1) as usize
    } else {
        0
    }
}

/// One line per opcode: `offset: MNEMONIC [immediate]`. Bytes that are no
/// instruction print as `0x..`; a truncated push shows the bytes present.
pub fn disassemble(code: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut pc = 0usize;
    while pc < code.len() {
        let op = code[pc];
        let mut line = format!("{:04x}: ", pc);
        match TRAITS[op as usize].name {
            Some(name) => line.push_str(name),
            None => line.push_str(&format!("0x{:02x}", op)),
        }
        let n = push_len(op);
        if n > 0 {
            let start = pc + 1;
            let end = (start + n).min(code.len());
            line.push_str(&format!(" 0x{}", to_hex(&code[start..end])));
        }
        out.push(line);
        pc += 1 + n;
    }
    out
}

/// The instruction stream the interpreter runs, with block requirements on
/// each header and the jump table at the end.
pub fn describe_analysis(code: &[u8], analysis: &AdvancedCodeAnalysis) -> Vec<String> {
    let mut out = Vec::with_capacity(analysis.instrs.len() + 1);
    for (i, instr) in analysis.instrs.iter().enumerate() {
        let line = match (&instr.arg, instr.code_offset) {
            (InstrArg::Block(b), at) => {
                let mut s = format!(
                    "[{:4}] BEGINBLOCK gas={} req={} growth={}",
                    i, b.gas_cost, b.stack_req, b.stack_max_growth
                );
                if let Some(at) = at {
                    s.push_str(&format!(" @{:04x}", at));
                }
                s
            }
            (_, None) => format!("[{:4}] STOP (implicit)", i),
            (arg, Some(at)) => {
                let op = code.get(at).copied().unwrap_or_default();
                let name = TRAITS[op as usize].name.unwrap_or("UNDEFINED");
                match arg {
                    InstrArg::SmallPush(v) => format!("[{:4}] {:04x}: {} 0x{:x}", i, at, name, v),
                    InstrArg::FullPush(v) => format!("[{:4}] {:04x}: {} 0x{:x}", i, at, name, **v),
                    InstrArg::Number(n) => format!("[{:4}] {:04x}: {} ({})", i, at, name, n),
                    _ => format!("[{:4}] {:04x}: {}", i, at, name),
                }
            }
        };
        out.push(line);
    }
    let targets: Vec<String> = analysis
        .jumpdest_offsets
        .iter()
        .zip(&analysis.jumpdest_targets)
        .map(|(off, idx)| format!("{:04x}->{}", off, idx))
        .collect();
    out.push(format!("jumpdests: {}", targets.join(" ")));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::revision::Revision;

    #[test]
    fn lists_mnemonics() {
        let code = [0x60, 0x01, 0x5b, 0xc0, 0x0c, 0x7f, 0xaa];
        assert_eq!(
            disassemble(&code),
            vec!["0000: PUSH1 0x01", "0002: JUMPDEST", "0003: ADDMOD384", "0004: 0x0c", "0005: PUSH32 0xaa"]
        );
    }

    #[test]
    fn analysis_listing() {
        // PUSH1 3 JUMP JUMPDEST STOP
        let code = [0x60, 0x03, 0x56, 0x5b, 0x00];
        let analysis = analyze(Revision::Istanbul, &code);
        let lines = describe_analysis(&code, &analysis);
        assert!(lines[0].contains("BEGINBLOCK gas=11 req=0 growth=1"));
        assert!(lines[1].ends_with("0000: PUSH1 0x3"));
        assert!(lines.iter().any(|l| l.contains("@0003")));
        assert!(lines.last().is_some_and(|l| l.starts_with("jumpdests: 0003->")));
    }

    #[test]
    fn analysis_listing_wide_push() {
        let mut code = vec![0x7f];
        code.extend_from_slice(&[0x11; 32]);
        code.push(0x00);
        let analysis = analyze(Revision::Istanbul, &code);
        let lines = describe_analysis(&code, &analysis);
        assert_eq!(lines[1], format!("[   1] 0000: PUSH32 0x{}", "11".repeat(32)));
    }
}
