//! Turns bytecode into a stream of pre-decoded instructions grouped into
//! basic blocks, each headed by an instruction carrying the block's total
//! static gas cost and stack bounds.

use std::fmt;

use primitive_types::U256;
use tracing::trace;

use crate::host::Host;
use crate::opcodes::*;
use crate::revision::Revision;
use crate::state::{Control, ExecutionState};
use crate::tables::op_table;

/// Instruction handler: gets its instruction and index, returns what to run
/// next.
pub type OpFn = fn(&Instruction, usize, &mut ExecutionState<'_>, &mut dyn Host) -> Control;

/// Requirements checked once on entry to a basic block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockInfo {
    /// Sum of the static costs of all instructions in the block.
    pub gas_cost: i64,
    /// Stack items the block needs to find on entry.
    pub stack_req: i32,
    /// Highest stack growth reached anywhere inside the block.
    pub stack_max_growth: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrArg {
    None,
    /// PC offset, or the running block cost for dynamically priced ops.
    Number(i64),
    SmallPush(u64),
    FullPush(Box<U256>),
    Block(BlockInfo),
}

pub struct Instruction {
    pub op: OpFn,
    pub arg: InstrArg,
    /// Bytecode offset of the opcode this was decoded from. `None` for the
    /// headers and the final STOP the analyzer inserts.
    pub code_offset: Option<usize>,
}

impl Instruction {
    fn new(op: OpFn, code_offset: Option<usize>) -> Self {
        Self { op, arg: InstrArg::None, code_offset }
    }

    pub fn block(&self) -> Option<&BlockInfo> {
        match &self.arg {
            InstrArg::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn number(&self) -> i64 {
        match self.arg {
            InstrArg::Number(n) => n,
            _ => 0,
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruction").field("arg", &self.arg).field("code_offset", &self.code_offset).finish()
    }
}

#[derive(Debug, Default)]
pub struct AdvancedCodeAnalysis {
    pub instrs: Vec<Instruction>,
    /// Sorted bytecode offsets of valid jump destinations.
    pub jumpdest_offsets: Vec<usize>,
    /// Instruction index for each entry of `jumpdest_offsets`.
    pub jumpdest_targets: Vec<usize>,
}

impl AdvancedCodeAnalysis {
    /// Instruction index of the JUMPDEST at bytecode `offset`.
    pub fn find_jumpdest(&self, offset: usize) -> Option<usize> {
        self.jumpdest_offsets.binary_search(&offset).ok().map(|i| self.jumpdest_targets[i])
    }

    pub fn blocks(&self) -> impl Iterator<Item = (usize, &BlockInfo)> {
        self.instrs.iter().enumerate().filter_map(|(i, instr)| instr.block().map(|b| (i, b)))
    }
}

#[derive(Default)]
struct BlockAnalysis {
    gas_cost: i64,
    stack_req: i32,
    stack_change: i32,
    stack_max_growth: i32,
    /// Index of the header instruction.
    begin: usize,
}

impl BlockAnalysis {
    fn new(begin: usize) -> Self {
        Self { begin, ..Default::default() }
    }

    fn close(&self) -> BlockInfo {
        BlockInfo { gas_cost: self.gas_cost, stack_req: self.stack_req, stack_max_growth: self.stack_max_growth }
    }
}

fn is_terminator(opcode: u8) -> bool {
    matches!(opcode, JUMP | JUMPI | STOP | RETURN | REVERT | SELFDESTRUCT)
}

/// Big-endian immediate of `n` bytes starting at `start`; bytes past the end
/// of `code` read as zero.
fn push_bytes(code: &[u8], start: usize, n: usize) -> [u8; 32] {
    let mut buf = [0u8; 32];
    let avail = code.len().saturating_sub(start).min(n);
    buf[32 - n..32 - n + avail].copy_from_slice(&code[start..start + avail]);
    buf
}

pub fn analyze(rev: Revision, code: &[u8]) -> AdvancedCodeAnalysis {
    let table = op_table(rev);
    let begin_block = table[JUMPDEST as usize].op;

    let mut analysis = AdvancedCodeAnalysis { instrs: Vec::with_capacity(code.len() + 2), ..Default::default() };
    analysis.instrs.push(Instruction::new(begin_block, None));
    let mut block = BlockAnalysis::new(0);

    let mut i = 0;
    while i < code.len() {
        let opcode = code[i];
        let entry = &table[opcode as usize];

        if opcode == JUMPDEST {
            let header_is_empty = block.begin + 1 == analysis.instrs.len()
                && analysis.instrs[block.begin].code_offset.is_none();
            if header_is_empty {
                analysis.instrs[block.begin].code_offset = Some(i);
            } else {
                analysis.instrs[block.begin].arg = InstrArg::Block(block.close());
                analysis.instrs.push(Instruction::new(begin_block, Some(i)));
                block = BlockAnalysis::new(analysis.instrs.len() - 1);
            }
            analysis.jumpdest_offsets.push(i);
            analysis.jumpdest_targets.push(block.begin);
        } else {
            analysis.instrs.push(Instruction::new(entry.op, Some(i)));
        }

        let req = entry.stack_req as i32;
        let change = entry.stack_change as i32;
        block.stack_req = block.stack_req.max(req - block.stack_change);
        block.stack_change += change;
        block.stack_max_growth = block.stack_max_growth.max(block.stack_change);
        block.gas_cost += entry.gas_cost as i64;

        let arg = match opcode {
            PUSH1..=PUSH8 => {
                let n = push_size(opcode);
                let buf = push_bytes(code, i + 1, n);
                let mut v = [0u8; 8];
                v.copy_from_slice(&buf[24..]);
                i += n;
                InstrArg::SmallPush(u64::from_be_bytes(v))
            }
            PUSH9..=PUSH32 => {
                let n = push_size(opcode);
                let buf = push_bytes(code, i + 1, n);
                i += n;
                InstrArg::FullPush(Box::new(U256::from_big_endian(&buf)))
            }
            GAS | CALL | CALLCODE | DELEGATECALL | STATICCALL | CREATE | CREATE2 | SSTORE => {
                InstrArg::Number(block.gas_cost)
            }
            PC => InstrArg::Number(i as i64),
            _ => InstrArg::None,
        };
        if opcode != JUMPDEST {
            if let Some(last) = analysis.instrs.last_mut() {
                last.arg = arg;
            }
        }

        if is_terminator(opcode) {
            analysis.instrs[block.begin].arg = InstrArg::Block(block.close());
            analysis.instrs.push(Instruction::new(begin_block, None));
            block = BlockAnalysis::new(analysis.instrs.len() - 1);
        }

        i += 1;
    }

    analysis.instrs[block.begin].arg = InstrArg::Block(block.close());
    analysis.instrs.push(Instruction::new(table[STOP as usize].op, None));

    trace!(
        code_size = code.len(),
        instrs = analysis.instrs.len(),
        jumpdests = analysis.jumpdest_offsets.len(),
        "analyzed code"
    );
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(a: &AdvancedCodeAnalysis) -> Vec<BlockInfo> {
        a.blocks().map(|(_, b)| *b).collect()
    }

    #[test]
    fn empty_code() {
        let a = analyze(Revision::Istanbul, &[]);
        assert_eq!(a.instrs.len(), 2);
        assert_eq!(headers(&a), vec![BlockInfo::default()]);
        assert!(a.jumpdest_offsets.is_empty());
    }

    #[test]
    fn block_accounting() {
        // PUSH1 1 PUSH1 2 ADD POP
        let a = analyze(Revision::Frontier, &[PUSH1, 1, PUSH1, 2, ADD, POP]);
        assert_eq!(a.instrs.len(), 6);
        assert_eq!(headers(&a), vec![BlockInfo { gas_cost: 11, stack_req: 0, stack_max_growth: 2 }]);

        // POP POP needs two items on entry.
        let a = analyze(Revision::Frontier, &[POP, POP]);
        assert_eq!(headers(&a)[0].stack_req, 2);
        assert_eq!(headers(&a)[0].stack_max_growth, 0);
    }

    #[test]
    fn jumpdest_reuses_empty_header() {
        let a = analyze(Revision::Istanbul, &[JUMPDEST, STOP]);
        // header(JUMPDEST), STOP, header, STOP
        assert_eq!(a.instrs.len(), 4);
        assert_eq!(a.instrs[0].code_offset, Some(0));
        assert_eq!(a.find_jumpdest(0), Some(0));
        assert_eq!(headers(&a)[0].gas_cost, 1);
    }

    #[test]
    fn jumpdest_splits_block() {
        let a = analyze(Revision::Istanbul, &[PUSH1, 0, JUMPDEST, POP]);
        let blocks = headers(&a);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], BlockInfo { gas_cost: 3, stack_req: 0, stack_max_growth: 1 });
        assert_eq!(blocks[1], BlockInfo { gas_cost: 3, stack_req: 1, stack_max_growth: 0 });
        assert_eq!(a.find_jumpdest(2), Some(2));
        assert_eq!(a.find_jumpdest(0), None);
    }

    #[test]
    fn jumpdest_in_push_data_is_not_indexed() {
        let a = analyze(Revision::Istanbul, &[PUSH2, JUMPDEST, JUMPDEST, JUMPDEST]);
        assert_eq!(a.jumpdest_offsets, vec![3]);
    }

    #[test]
    fn push_immediates() {
        let a = analyze(Revision::Istanbul, &[PUSH2, 0x12, 0x34, PUSH9, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(a.instrs[1].arg, InstrArg::SmallPush(0x1234));
        let expected = U256::from_big_endian(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(a.instrs[2].arg, InstrArg::FullPush(Box::new(expected)));
    }

    #[test]
    fn truncated_push_pads_right() {
        let a = analyze(Revision::Istanbul, &[PUSH4, 0xaa, 0xbb]);
        assert_eq!(a.instrs[1].arg, InstrArg::SmallPush(0xaabb_0000));
        let a = analyze(Revision::Istanbul, &[PUSH32]);
        assert_eq!(a.instrs[1].arg, InstrArg::FullPush(Box::new(U256::zero())));
    }

    #[test]
    fn dynamic_ops_record_running_cost() {
        // PUSH1 0 GAS PC
        let a = analyze(Revision::Istanbul, &[PUSH1, 0, GAS, PC]);
        assert_eq!(a.instrs[2].arg, InstrArg::Number(5));
        assert_eq!(a.instrs[3].arg, InstrArg::Number(3));
    }

    #[test]
    fn terminators_open_new_blocks() {
        let a = analyze(Revision::Istanbul, &[PUSH1, 0, PUSH1, 0, JUMPI, STOP]);
        let starts: Vec<usize> = a.blocks().map(|(i, _)| i).collect();
        assert_eq!(starts, vec![0, 4, 6]);
        assert!(a.instrs.last().is_some_and(|s| s.code_offset.is_none()));
    }

    #[test]
    fn undefined_opcode_is_free_in_analysis() {
        let a = analyze(Revision::Istanbul, &[0x0c]);
        assert_eq!(headers(&a)[0], BlockInfo::default());
        assert_eq!(a.instrs[1].code_offset, Some(0));
    }
}
