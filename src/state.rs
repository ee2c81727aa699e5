use std::borrow::Cow;
use std::rc::Rc;

use primitive_types::U256;

use crate::analysis::{analyze, AdvancedCodeAnalysis, Instruction};
use crate::error::StatusCode;
use crate::host::{ExecutionResult, Host, Message, TxContext};
use crate::memory::Memory;
use crate::revision::Revision;
use crate::stack::Stack;

/// Offsets and sizes above this fail the memory check outright.
const MAX_BUFFER_SIZE: u64 = u32::MAX as u64;

/// What a handler asks the dispatch loop to do next.
#[derive(Debug)]
pub enum Control {
    /// Run the instruction at this index.
    Continue(usize),
    /// The frame halted; the status is in [`ExecutionState::status`].
    Exit,
    /// Suspend the frame until the nested call completes.
    Call(Box<PendingCall>),
}

/// A nested call a suspended frame is waiting on.
#[derive(Debug)]
pub struct PendingCall {
    pub msg: Message,
    /// Caller memory region receiving the callee output (calls only).
    pub output_offset: usize,
    pub output_size: usize,
    /// Block-cost correction credited before the call, debited on return.
    pub correction: i64,
    /// Instruction to continue from.
    pub resume: usize,
}

/// Mutable state of one frame.
#[derive(Debug)]
pub struct ExecutionState<'a> {
    pub gas_left: i64,
    pub stack: Stack,
    pub memory: Memory,
    pub msg: Message,
    pub rev: Revision,
    /// Output of the most recent nested call.
    pub return_data: Vec<u8>,
    pub code: Cow<'a, [u8]>,
    pub analysis: Rc<AdvancedCodeAnalysis>,
    pub status: StatusCode,
    pub output_offset: usize,
    pub output_size: usize,
    /// Static cost of the block being executed, set by its header.
    pub current_block_cost: i64,
    tx_context: Option<TxContext>,
}

impl<'a> ExecutionState<'a> {
    pub fn new(msg: Message, rev: Revision, code: Cow<'a, [u8]>) -> Self {
        let analysis = Rc::new(analyze(rev, &code));
        Self {
            gas_left: msg.gas,
            stack: Stack::new(),
            memory: Memory::new(),
            msg,
            rev,
            return_data: Vec::new(),
            code,
            analysis,
            status: StatusCode::Success,
            output_offset: 0,
            output_size: 0,
            current_block_cost: 0,
            tx_context: None,
        }
    }

    /// Records the terminal status.
    pub fn exit(&mut self, status: StatusCode) -> Control {
        self.status = status;
        Control::Exit
    }

    pub fn consume_gas(&mut self, cost: i64) -> Result<(), StatusCode> {
        self.gas_left -= cost;
        if self.gas_left < 0 {
            return Err(StatusCode::OutOfGas);
        }
        Ok(())
    }

    /// Makes `[offset, offset + size)` addressable, charging for expansion.
    /// A zero size always succeeds and touches nothing.
    pub fn check_memory(&mut self, offset: U256, size: U256) -> bool {
        if size.is_zero() {
            return true;
        }
        if offset > U256::from(MAX_BUFFER_SIZE) || size > U256::from(MAX_BUFFER_SIZE) {
            return false;
        }
        let end = offset.low_u64() + size.low_u64();
        match self.memory.expansion_cost(end) {
            None => true,
            Some((cost, new_len)) => {
                self.gas_left -= cost;
                if self.gas_left < 0 {
                    return false;
                }
                self.memory.grow(new_len);
                true
            }
        }
    }

    /// [`check_memory`](Self::check_memory) returning the region as
    /// indices; `(0, 0)` for an empty region.
    pub fn memory_region(&mut self, offset: U256, size: U256) -> Result<(usize, usize), StatusCode> {
        if !self.check_memory(offset, size) {
            return Err(StatusCode::OutOfGas);
        }
        if size.is_zero() {
            return Ok((0, 0));
        }
        Ok((offset.low_u64() as usize, size.low_u64() as usize))
    }

    /// Credits the static cost of the rest of the block, which the header
    /// already charged, so a dynamically priced instruction sees the gas
    /// actually left at its position.
    pub fn credit_correction(&mut self, instr: &Instruction) -> i64 {
        let correction = self.current_block_cost - instr.number();
        self.gas_left += correction;
        correction
    }

    /// Takes back a correction; false when that exhausts the gas.
    pub fn debit_correction(&mut self, correction: i64) -> bool {
        self.gas_left -= correction;
        self.gas_left >= 0
    }

    /// Transaction context, fetched from the host once per frame.
    pub fn tx_context(&mut self, host: &dyn Host) -> &TxContext {
        self.tx_context.get_or_insert_with(|| host.get_tx_context())
    }

    /// Final result. Gas is only reported back for success and revert.
    pub fn into_result(self) -> ExecutionResult {
        let gas_left = if self.status.refunds_gas() { self.gas_left } else { 0 };
        ExecutionResult::from_buffer(
            self.status,
            gas_left,
            self.memory.into_vec(),
            self.output_offset,
            self.output_size,
        )
    }
}
