//! Per-revision dispatch tables and the handlers that sit in them.
//!
//! Handlers wrap the semantics in [`crate::instructions`] and own the parts
//! that need the instruction stream: block entry checks, jumps, immediates,
//! and the gas correction around dynamically priced instructions.

use once_cell::sync::Lazy;
use primitive_types::U256;
use tracing::trace;

use crate::analysis::{Instruction, InstrArg, OpFn};
use crate::error::StatusCode;
use crate::host::{CallKind, Host};
use crate::instructions::{self as ins, OpResult};
use crate::opcodes::*;
use crate::revision::Revision;
use crate::stack::STACK_LIMIT;
use crate::state::{Control, ExecutionState, PendingCall};
use crate::traits::{gas_costs, TRAITS, UNDEFINED};

#[derive(Clone, Copy)]
pub struct OpTableEntry {
    pub op: OpFn,
    pub gas_cost: i16,
    pub stack_req: i8,
    pub stack_change: i8,
}

pub type OpTable = [OpTableEntry; 256];

static OP_TABLES: Lazy<[OpTable; 9]> = Lazy::new(|| Revision::ALL.map(build_op_table));

/// Dispatch table of `rev`. Undefined opcodes map to a handler that fails
/// with [`StatusCode::UndefinedInstruction`] and cost nothing up front.
pub fn op_table(rev: Revision) -> &'static OpTable {
    &OP_TABLES[rev.index()]
}

fn build_op_table(rev: Revision) -> OpTable {
    let costs = gas_costs(rev);
    let fns = implementations();
    let undefined = OpTableEntry { op: op_undefined, gas_cost: 0, stack_req: 0, stack_change: 0 };
    let mut table = [undefined; 256];
    for (op, entry) in table.iter_mut().enumerate() {
        if costs[op] == UNDEFINED {
            continue;
        }
        *entry = OpTableEntry {
            op: fns[op],
            gas_cost: costs[op],
            stack_req: TRAITS[op].stack_height_required,
            stack_change: TRAITS[op].stack_height_change,
        };
    }
    table
}

macro_rules! stack_ops {
    ($($name:ident => $f:path),* $(,)?) => {$(
        fn $name(_: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
            $f(&mut state.stack);
            Control::Continue(index + 1)
        }
    )*};
}

macro_rules! state_ops {
    ($($name:ident => $f:path),* $(,)?) => {$(
        fn $name(_: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
            let r = $f(state);
            next(index, state, r)
        }
    )*};
}

macro_rules! host_ops {
    ($($name:ident => $f:path),* $(,)?) => {$(
        fn $name(_: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
            let r = $f(state, host);
            next(index, state, r)
        }
    )*};
}

fn next(index: usize, state: &mut ExecutionState<'_>, r: OpResult) -> Control {
    match r {
        Ok(()) => Control::Continue(index + 1),
        Err(status) => state.exit(status),
    }
}

stack_ops! {
    op_add => ins::add, op_mul => ins::mul, op_sub => ins::sub, op_div => ins::div,
    op_sdiv => ins::sdiv, op_mod => ins::modulo, op_smod => ins::smod,
    op_addmod => ins::addmod, op_mulmod => ins::mulmod, op_signextend => ins::signextend,
    op_lt => ins::lt, op_gt => ins::gt, op_slt => ins::slt, op_sgt => ins::sgt, op_eq => ins::eq,
    op_iszero => ins::iszero, op_and => ins::and, op_or => ins::or, op_xor => ins::xor,
    op_not => ins::not, op_byte => ins::byte, op_shl => ins::shl, op_shr => ins::shr,
    op_sar => ins::sar, op_pop => ins::pop,
}

state_ops! {
    op_exp => ins::exp, op_sha3 => ins::sha3, op_address => ins::address,
    op_caller => ins::caller, op_callvalue => ins::callvalue,
    op_calldataload => ins::calldataload, op_calldatasize => ins::calldatasize,
    op_calldatacopy => ins::calldatacopy, op_codesize => ins::codesize,
    op_codecopy => ins::codecopy, op_returndatasize => ins::returndatasize,
    op_returndatacopy => ins::returndatacopy, op_mload => ins::mload, op_mstore => ins::mstore,
    op_mstore8 => ins::mstore8, op_msize => ins::msize,
    op_addmod384 => ins::addmod384, op_submod384 => ins::submod384,
    op_mulmodmont384 => ins::mulmodmont384,
}

host_ops! {
    op_balance => ins::balance, op_origin => ins::origin, op_gasprice => ins::gasprice,
    op_extcodesize => ins::extcodesize, op_extcodecopy => ins::extcodecopy,
    op_extcodehash => ins::extcodehash, op_blockhash => ins::blockhash,
    op_coinbase => ins::coinbase, op_timestamp => ins::timestamp, op_number => ins::number,
    op_difficulty => ins::difficulty, op_gaslimit => ins::gaslimit, op_chainid => ins::chainid,
    op_selfbalance => ins::selfbalance, op_sload => ins::sload,
}

/// Charges a whole basic block and checks its stack bounds up front.
fn op_begin_block(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    let block = match &instr.arg {
        InstrArg::Block(b) => *b,
        _ => Default::default(),
    };
    state.gas_left -= block.gas_cost;
    if state.gas_left < 0 {
        trace!(index, cost = block.gas_cost, "block out of gas");
        return state.exit(StatusCode::OutOfGas);
    }
    let height = state.stack.len() as i32;
    if height < block.stack_req {
        trace!(index, height, required = block.stack_req, "block stack underflow");
        return state.exit(StatusCode::StackUnderflow);
    }
    if height + block.stack_max_growth > STACK_LIMIT as i32 {
        trace!(index, height, growth = block.stack_max_growth, "block stack overflow");
        return state.exit(StatusCode::StackOverflow);
    }
    state.current_block_cost = block.gas_cost;
    Control::Continue(index + 1)
}

fn op_stop(_: &Instruction, _: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    state.exit(StatusCode::Success)
}

fn op_invalid(_: &Instruction, _: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    state.exit(StatusCode::InvalidInstruction)
}

fn op_undefined(_: &Instruction, _: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    state.exit(StatusCode::UndefinedInstruction)
}

fn jump_to(state: &mut ExecutionState<'_>, dst: U256) -> Control {
    if dst > U256::from(i32::MAX) {
        return state.exit(StatusCode::BadJumpDestination);
    }
    match state.analysis.find_jumpdest(dst.low_u64() as usize) {
        Some(target) => Control::Continue(target),
        None => state.exit(StatusCode::BadJumpDestination),
    }
}

fn op_jump(_: &Instruction, _: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    let dst = state.stack.pop();
    jump_to(state, dst)
}

/// The fall-through target is always a block header.
fn op_jumpi(_: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    let dst = state.stack.pop();
    let condition = state.stack.pop();
    if condition.is_zero() {
        Control::Continue(index + 1)
    } else {
        jump_to(state, dst)
    }
}

fn op_pc(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    state.stack.push(U256::from(instr.number()));
    Control::Continue(index + 1)
}

fn op_gas(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    let correction = state.current_block_cost - instr.number();
    let gas = (state.gas_left + correction) as u64;
    state.stack.push(U256::from(gas));
    Control::Continue(index + 1)
}

fn op_push_small(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    let v = match instr.arg {
        InstrArg::SmallPush(v) => U256::from(v),
        _ => U256::zero(),
    };
    state.stack.push(v);
    Control::Continue(index + 1)
}

fn op_push_full(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    let v = match &instr.arg {
        InstrArg::FullPush(v) => **v,
        _ => U256::zero(),
    };
    state.stack.push(v);
    Control::Continue(index + 1)
}

fn op_dup<const N: usize>(_: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    state.stack.dup(N);
    Control::Continue(index + 1)
}

fn op_swap<const N: usize>(_: &Instruction, index: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    state.stack.swap(N);
    Control::Continue(index + 1)
}

fn op_log<const N: usize>(_: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    let r = ins::log(state, host, N);
    next(index, state, r)
}

fn op_sstore(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    let correction = state.credit_correction(instr);
    if let Err(status) = ins::sstore(state, host) {
        return state.exit(status);
    }
    if !state.debit_correction(correction) {
        return state.exit(StatusCode::OutOfGas);
    }
    Control::Continue(index + 1)
}

fn op_return<const REVERT: bool>(_: &Instruction, _: usize, state: &mut ExecutionState<'_>, _: &mut dyn Host) -> Control {
    let offset = state.stack.peek(0);
    let size = state.stack.peek(1);
    if !state.check_memory(offset, size) {
        return state.exit(StatusCode::OutOfGas);
    }
    state.output_size = size.low_u64() as usize;
    if state.output_size != 0 {
        state.output_offset = offset.low_u64() as usize;
    }
    state.exit(if REVERT { StatusCode::Revert } else { StatusCode::Success })
}

fn op_selfdestruct(_: &Instruction, _: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    let status = match ins::selfdestruct(state, host) {
        Ok(()) => StatusCode::Success,
        Err(status) => status,
    };
    state.exit(status)
}

/// Suspends the frame on a prepared nested call, or settles the correction
/// right away when the call never reaches the callee.
fn dispatch_call(
    index: usize,
    state: &mut ExecutionState<'_>,
    correction: i64,
    prepared: Result<Option<PendingCall>, StatusCode>,
) -> Control {
    match prepared {
        Err(status) => state.exit(status),
        Ok(Some(mut pending)) => {
            pending.correction = correction;
            pending.resume = index + 1;
            Control::Call(Box::new(pending))
        }
        Ok(None) => {
            if !state.debit_correction(correction) {
                return state.exit(StatusCode::OutOfGas);
            }
            Control::Continue(index + 1)
        }
    }
}

fn call_op(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host, kind: CallKind, is_static: bool) -> Control {
    let correction = state.credit_correction(instr);
    let prepared = ins::prepare_call(state, host, kind, is_static);
    dispatch_call(index, state, correction, prepared)
}

fn op_call(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    call_op(instr, index, state, host, CallKind::Call, false)
}

fn op_callcode(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    call_op(instr, index, state, host, CallKind::CallCode, false)
}

fn op_delegatecall(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    call_op(instr, index, state, host, CallKind::DelegateCall, false)
}

fn op_staticcall(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    call_op(instr, index, state, host, CallKind::Call, true)
}

fn create_op(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host, kind: CallKind) -> Control {
    let correction = state.credit_correction(instr);
    let prepared = ins::prepare_create(state, host, kind);
    dispatch_call(index, state, correction, prepared)
}

fn op_create(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    create_op(instr, index, state, host, CallKind::Create)
}

fn op_create2(instr: &Instruction, index: usize, state: &mut ExecutionState<'_>, host: &mut dyn Host) -> Control {
    create_op(instr, index, state, host, CallKind::Create2)
}

const DUPS: [OpFn; 16] = [
    op_dup::<1>, op_dup::<2>, op_dup::<3>, op_dup::<4>, op_dup::<5>, op_dup::<6>, op_dup::<7>, op_dup::<8>,
    op_dup::<9>, op_dup::<10>, op_dup::<11>, op_dup::<12>, op_dup::<13>, op_dup::<14>, op_dup::<15>, op_dup::<16>,
];

const SWAPS: [OpFn; 16] = [
    op_swap::<1>, op_swap::<2>, op_swap::<3>, op_swap::<4>, op_swap::<5>, op_swap::<6>, op_swap::<7>, op_swap::<8>,
    op_swap::<9>, op_swap::<10>, op_swap::<11>, op_swap::<12>, op_swap::<13>, op_swap::<14>, op_swap::<15>, op_swap::<16>,
];

const LOGS: [OpFn; 5] = [op_log::<0>, op_log::<1>, op_log::<2>, op_log::<3>, op_log::<4>];

/// Handler for every opcode known to some revision.
fn implementations() -> [OpFn; 256] {
    let mut t = [op_undefined as OpFn; 256];

    t[STOP as usize] = op_stop;
    t[ADD as usize] = op_add;
    t[MUL as usize] = op_mul;
    t[SUB as usize] = op_sub;
    t[DIV as usize] = op_div;
    t[SDIV as usize] = op_sdiv;
    t[MOD as usize] = op_mod;
    t[SMOD as usize] = op_smod;
    t[ADDMOD as usize] = op_addmod;
    t[MULMOD as usize] = op_mulmod;
    t[EXP as usize] = op_exp;
    t[SIGNEXTEND as usize] = op_signextend;

    t[LT as usize] = op_lt;
    t[GT as usize] = op_gt;
    t[SLT as usize] = op_slt;
    t[SGT as usize] = op_sgt;
    t[EQ as usize] = op_eq;
    t[ISZERO as usize] = op_iszero;
    t[AND as usize] = op_and;
    t[OR as usize] = op_or;
    t[XOR as usize] = op_xor;
    t[NOT as usize] = op_not;
    t[BYTE as usize] = op_byte;
    t[SHL as usize] = op_shl;
    t[SHR as usize] = op_shr;
    t[SAR as usize] = op_sar;
    t[SHA3 as usize] = op_sha3;

    t[ADDRESS as usize] = op_address;
    t[BALANCE as usize] = op_balance;
    t[ORIGIN as usize] = op_origin;
    t[CALLER as usize] = op_caller;
    t[CALLVALUE as usize] = op_callvalue;
    t[CALLDATALOAD as usize] = op_calldataload;
    t[CALLDATASIZE as usize] = op_calldatasize;
    t[CALLDATACOPY as usize] = op_calldatacopy;
    t[CODESIZE as usize] = op_codesize;
    t[CODECOPY as usize] = op_codecopy;
    t[GASPRICE as usize] = op_gasprice;
    t[EXTCODESIZE as usize] = op_extcodesize;
    t[EXTCODECOPY as usize] = op_extcodecopy;
    t[RETURNDATASIZE as usize] = op_returndatasize;
    t[RETURNDATACOPY as usize] = op_returndatacopy;
    t[EXTCODEHASH as usize] = op_extcodehash;

    t[BLOCKHASH as usize] = op_blockhash;
    t[COINBASE as usize] = op_coinbase;
    t[TIMESTAMP as usize] = op_timestamp;
    t[NUMBER as usize] = op_number;
    t[DIFFICULTY as usize] = op_difficulty;
    t[GASLIMIT as usize] = op_gaslimit;
    t[CHAINID as usize] = op_chainid;
    t[SELFBALANCE as usize] = op_selfbalance;

    t[POP as usize] = op_pop;
    t[MLOAD as usize] = op_mload;
    t[MSTORE as usize] = op_mstore;
    t[MSTORE8 as usize] = op_mstore8;
    t[SLOAD as usize] = op_sload;
    t[SSTORE as usize] = op_sstore;
    t[JUMP as usize] = op_jump;
    t[JUMPI as usize] = op_jumpi;
    t[PC as usize] = op_pc;
    t[MSIZE as usize] = op_msize;
    t[GAS as usize] = op_gas;
    t[JUMPDEST as usize] = op_begin_block;

    for op in PUSH1..=PUSH32 {
        t[op as usize] = if op <= PUSH8 { op_push_small } else { op_push_full };
    }
    for i in 0..16 {
        t[DUP1 as usize + i] = DUPS[i];
        t[SWAP1 as usize + i] = SWAPS[i];
    }
    for i in 0..5 {
        t[LOG0 as usize + i] = LOGS[i];
    }

    t[ADDMOD384 as usize] = op_addmod384;
    t[SUBMOD384 as usize] = op_submod384;
    t[MULMODMONT384 as usize] = op_mulmodmont384;

    t[CREATE as usize] = op_create;
    t[CALL as usize] = op_call;
    t[CALLCODE as usize] = op_callcode;
    t[RETURN as usize] = op_return::<false>;
    t[DELEGATECALL as usize] = op_delegatecall;
    t[CREATE2 as usize] = op_create2;
    t[STATICCALL as usize] = op_staticcall;
    t[REVERT as usize] = op_return::<true>;
    t[INVALID as usize] = op_invalid;
    t[SELFDESTRUCT as usize] = op_selfdestruct;
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_entries_cost_nothing() {
        let t = op_table(Revision::Frontier);
        assert_eq!(t[REVERT as usize].gas_cost, 0);
        assert_eq!(t[REVERT as usize].op as usize, op_undefined as OpFn as usize);
        assert_eq!(t[0x0c].stack_req, 0);
        assert_eq!(op_table(Revision::Byzantium)[REVERT as usize].stack_req, 2);
    }

    #[test]
    fn entries_follow_traits_and_costs() {
        let t = op_table(Revision::Istanbul);
        assert_eq!(t[SLOAD as usize].gas_cost, 800);
        assert_eq!(t[CALL as usize].stack_req, 7);
        assert_eq!(t[CALL as usize].stack_change, -6);
        assert_eq!(t[MULMODMONT384 as usize].gas_cost, 24);
        assert_eq!(t[JUMPDEST as usize].op as usize, op_begin_block as OpFn as usize);
    }

    #[test]
    fn tables_are_shared() {
        assert!(std::ptr::eq(op_table(Revision::Berlin), op_table(Revision::Berlin)));
    }
}
