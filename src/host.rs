//! The callback surface an execution uses to reach account state, logs and
//! nested calls, plus the message and result types that cross it.

use primitive_types::{H160, H256, U256};
use tiny_keccak::{Hasher, Keccak};

use crate::error::StatusCode;

pub type Address = H160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    Create,
    Create2,
}

impl CallKind {
    pub fn is_create(self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2)
    }
}

/// One frame's call parameters.
///
/// `destination` is the account whose storage and balance the code runs
/// against; `code_address` is where the code was loaded from. They differ for
/// CALLCODE and DELEGATECALL. For creates the host fills in `destination`
/// once the new address is known.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: CallKind,
    pub is_static: bool,
    pub depth: i32,
    pub gas: i64,
    pub destination: Address,
    pub code_address: Address,
    pub sender: Address,
    pub input: Vec<u8>,
    pub value: U256,
    pub create2_salt: U256,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            kind: CallKind::Call,
            is_static: false,
            depth: 0,
            gas: 0,
            destination: Address::zero(),
            code_address: Address::zero(),
            sender: Address::zero(),
            input: Vec::new(),
            value: U256::zero(),
            create2_salt: U256::zero(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockEnv {
    pub coinbase: Address,
    pub timestamp: u64,
    pub number: u64,
    pub gas_limit: u64,
    pub difficulty: U256,
    pub chain_id: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxContext {
    pub gas_price: U256,
    pub origin: Address,
    pub block: BlockEnv,
}

/// Effect of an SSTORE on a slot, relative to its value at the start of the
/// transaction and its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    /// Value unchanged.
    Unchanged,
    /// First change of a nonzero slot to another nonzero value.
    Modified,
    /// Slot already changed earlier in the transaction.
    ModifiedAgain,
    /// Zero slot set to nonzero.
    Added,
    /// Nonzero slot set to zero.
    Deleted,
}

/// Final outcome of a frame.
///
/// The output is a window into an owned buffer, which for RETURN and REVERT
/// is the frame's whole memory, so handing it over needs no copy.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub status: StatusCode,
    pub gas_left: i64,
    pub create_address: Option<Address>,
    buffer: Vec<u8>,
    output_offset: usize,
    output_size: usize,
}

impl ExecutionResult {
    pub fn new(status: StatusCode, gas_left: i64, output: Vec<u8>) -> Self {
        let output_size = output.len();
        Self { status, gas_left, create_address: None, buffer: output, output_offset: 0, output_size }
    }

    /// Result with no gas left and no output.
    pub fn failure(status: StatusCode) -> Self {
        Self::new(status, 0, Vec::new())
    }

    /// Takes ownership of `buffer` and exposes `[offset, offset + size)`.
    pub(crate) fn from_buffer(status: StatusCode, gas_left: i64, buffer: Vec<u8>, offset: usize, size: usize) -> Self {
        debug_assert!(size == 0 || offset + size <= buffer.len());
        Self { status, gas_left, create_address: None, buffer, output_offset: offset, output_size: size }
    }

    pub fn output(&self) -> &[u8] {
        if self.output_size == 0 {
            return &[];
        }
        &self.buffer[self.output_offset..self.output_offset + self.output_size]
    }

    pub fn set_output(&mut self, output: Vec<u8>) {
        self.output_offset = 0;
        self.output_size = output.len();
        self.buffer = output;
    }
}

/// A host's answer to a nested call.
#[derive(Debug)]
pub enum CallAction {
    /// Finished without running EVM code: precompile, empty account, a
    /// failed precondition.
    Done(ExecutionResult),
    /// Run `code` in a new frame for `msg`. The host may have rewritten the
    /// message (e.g. the destination of a create).
    Execute { msg: Message, code: Vec<u8> },
}

pub trait Host {
    fn account_exists(&self, addr: &Address) -> bool;
    fn get_storage(&self, addr: &Address, key: &U256) -> U256;
    fn set_storage(&mut self, addr: &Address, key: &U256, value: U256) -> StorageStatus;
    fn get_balance(&self, addr: &Address) -> U256;
    fn get_code_size(&self, addr: &Address) -> usize;
    fn get_code_hash(&self, addr: &Address) -> H256;
    /// Copies code of `addr` starting at `offset` into `buf`; returns the
    /// number of bytes written.
    fn copy_code(&self, addr: &Address, offset: usize, buf: &mut [u8]) -> usize;
    fn selfdestruct(&mut self, addr: &Address, beneficiary: &Address);
    fn call(&mut self, msg: &Message) -> CallAction;
    /// Called once for every `call`, after the callee halted, with the
    /// message that ran. Hosts commit or roll back state here.
    fn finish_call(&mut self, _msg: &Message, result: ExecutionResult) -> ExecutionResult {
        result
    }
    fn get_tx_context(&self) -> TxContext;
    fn get_block_hash(&self, number: u64) -> H256;
    fn emit_log(&mut self, addr: &Address, data: &[u8], topics: &[H256]);
}

pub fn keccak256(data: &[u8]) -> H256 {
    let mut out = [0u8; 32];
    let mut k = Keccak::v256();
    k.update(data);
    k.finalize(&mut out);
    H256(out)
}

pub fn address_to_u256(a: &Address) -> U256 {
    U256::from_big_endian(a.as_bytes())
}

pub fn u256_to_address(v: U256) -> Address {
    let mut buf = [0u8; 32];
    v.to_big_endian(&mut buf);
    Address::from_slice(&buf[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty() {
        assert_eq!(
            hex::encode(keccak256(&[]).as_bytes()),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn address_word_conversion() {
        let a = Address::from_low_u64_be(0xdead_beef);
        assert_eq!(address_to_u256(&a), U256::from(0xdead_beef_u64));
        let high = (U256::one() << 200) | U256::from(7);
        assert_eq!(u256_to_address(high), Address::from_low_u64_be(7));
    }

    #[test]
    fn result_output_window() {
        let r = ExecutionResult::from_buffer(StatusCode::Success, 5, vec![1, 2, 3, 4], 1, 2);
        assert_eq!(r.output(), &[2, 3]);
        let empty = ExecutionResult::from_buffer(StatusCode::Success, 5, Vec::new(), 99, 0);
        assert!(empty.output().is_empty());
        assert_eq!(ExecutionResult::failure(StatusCode::OutOfGas).gas_left, 0);
    }
}
