//! Instruction semantics. Stack-only operations take the [`Stack`]; the rest
//! take the frame state (and the host when they need one) and report a
//! failing status as `Err`.
//!
//! Stack depth is guaranteed by the block header, so nothing here checks it.

use primitive_types::{H256, U256, U512};

use crate::bigint384::{self, Limbs, BYTES};
use crate::error::StatusCode;
use crate::host::{address_to_u256, keccak256, u256_to_address, CallKind, Host, Message, StorageStatus};
use crate::memory::num_words;
use crate::revision::Revision;
use crate::stack::{Stack, STACK_LIMIT};
use crate::state::{ExecutionState, PendingCall};

pub type OpResult = Result<(), StatusCode>;

const CALL_DEPTH_LIMIT: i32 = STACK_LIMIT as i32;
const COPY_WORD_COST: i64 = 3;

fn bool_word(b: bool) -> U256 {
    if b {
        U256::one()
    } else {
        U256::zero()
    }
}

fn is_negative(v: &U256) -> bool {
    v.bit(255)
}

fn negate(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

fn abs(v: U256) -> U256 {
    if is_negative(&v) {
        negate(v)
    } else {
        v
    }
}

fn low_u256(v: U512) -> U256 {
    let U512(ref limbs) = v;
    U256([limbs[0], limbs[1], limbs[2], limbs[3]])
}

fn clamp_usize(v: U256) -> usize {
    if v > U256::from(u32::MAX) {
        u32::MAX as usize
    } else {
        v.low_u64() as usize
    }
}

// --- arithmetic ---

pub fn add(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = a.overflowing_add(*b).0;
}

pub fn mul(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = a.overflowing_mul(*b).0;
}

pub fn sub(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = a.overflowing_sub(*b).0;
}

pub fn div(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = if b.is_zero() { U256::zero() } else { a / *b };
}

pub fn sdiv(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = if b.is_zero() {
        U256::zero()
    } else {
        let q = abs(a) / abs(*b);
        if is_negative(&a) != is_negative(b) {
            negate(q)
        } else {
            q
        }
    };
}

pub fn modulo(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = if b.is_zero() { U256::zero() } else { a % *b };
}

pub fn smod(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = if b.is_zero() {
        U256::zero()
    } else {
        let r = abs(a) % abs(*b);
        if is_negative(&a) {
            negate(r)
        } else {
            r
        }
    };
}

pub fn addmod(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.pop();
    let m = stack.top_mut();
    *m = if m.is_zero() {
        U256::zero()
    } else {
        low_u256((U512::from(a) + U512::from(b)) % U512::from(*m))
    };
}

pub fn mulmod(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.pop();
    let m = stack.top_mut();
    *m = if m.is_zero() { U256::zero() } else { low_u256(a.full_mul(b) % U512::from(*m)) };
}

pub fn exp(state: &mut ExecutionState<'_>) -> OpResult {
    let base = state.stack.pop();
    let exponent = state.stack.peek(0);
    let per_byte = if state.rev >= Revision::SpuriousDragon { 50 } else { 10 };
    let exponent_bytes = (exponent.bits() as i64 + 7) / 8;
    state.consume_gas(exponent_bytes * per_byte)?;
    *state.stack.top_mut() = base.overflowing_pow(exponent).0;
    Ok(())
}

pub fn signextend(stack: &mut Stack) {
    let ext = stack.pop();
    let x = stack.top_mut();
    if ext < U256::from(31) {
        let sign_bit = ext.low_u64() as usize * 8 + 7;
        let mask = (U256::one() << sign_bit) - U256::one();
        *x = if x.bit(sign_bit) { *x | !mask } else { *x & mask };
    }
}

// --- comparison and bitwise ---

pub fn lt(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = bool_word(a < *b);
}

pub fn gt(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = bool_word(a > *b);
}

fn signed_lt(a: &U256, b: &U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

pub fn slt(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = bool_word(signed_lt(&a, b));
}

pub fn sgt(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = bool_word(signed_lt(b, &a));
}

pub fn eq(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = bool_word(a == *b);
}

pub fn iszero(stack: &mut Stack) {
    let a = stack.top_mut();
    *a = bool_word(a.is_zero());
}

pub fn and(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = a & *b;
}

pub fn or(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = a | *b;
}

pub fn xor(stack: &mut Stack) {
    let a = stack.pop();
    let b = stack.top_mut();
    *b = a ^ *b;
}

pub fn not(stack: &mut Stack) {
    let a = stack.top_mut();
    *a = !*a;
}

pub fn byte(stack: &mut Stack) {
    let i = stack.pop();
    let x = stack.top_mut();
    *x = if i < U256::from(32) {
        U256::from(x.byte(31 - i.low_u64() as usize))
    } else {
        U256::zero()
    };
}

pub fn shl(stack: &mut Stack) {
    let shift = stack.pop();
    let v = stack.top_mut();
    *v = if shift < U256::from(256) { *v << shift.low_u64() as usize } else { U256::zero() };
}

pub fn shr(stack: &mut Stack) {
    let shift = stack.pop();
    let v = stack.top_mut();
    *v = if shift < U256::from(256) { *v >> shift.low_u64() as usize } else { U256::zero() };
}

pub fn sar(stack: &mut Stack) {
    let shift = stack.pop();
    let v = stack.top_mut();
    let negative = is_negative(v);
    *v = if shift >= U256::from(256) {
        if negative {
            U256::MAX
        } else {
            U256::zero()
        }
    } else {
        let s = shift.low_u64() as usize;
        if negative {
            !((!*v) >> s)
        } else {
            *v >> s
        }
    };
}

pub fn sha3(state: &mut ExecutionState<'_>) -> OpResult {
    let offset = state.stack.pop();
    let size = state.stack.peek(0);
    let (offset, size) = state.memory_region(offset, size)?;
    state.consume_gas(num_words(size as u64) * 6)?;
    let hash = keccak256(if size == 0 { &[][..] } else { state.memory.slice(offset, size) });
    *state.stack.top_mut() = U256::from_big_endian(hash.as_bytes());
    Ok(())
}

// --- environment ---

pub fn address(state: &mut ExecutionState<'_>) -> OpResult {
    let a = address_to_u256(&state.msg.destination);
    state.stack.push(a);
    Ok(())
}

pub fn balance(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let addr = u256_to_address(state.stack.peek(0));
    *state.stack.top_mut() = host.get_balance(&addr);
    Ok(())
}

pub fn origin(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let origin = address_to_u256(&state.tx_context(host).origin);
    state.stack.push(origin);
    Ok(())
}

pub fn caller(state: &mut ExecutionState<'_>) -> OpResult {
    let a = address_to_u256(&state.msg.sender);
    state.stack.push(a);
    Ok(())
}

pub fn callvalue(state: &mut ExecutionState<'_>) -> OpResult {
    let v = state.msg.value;
    state.stack.push(v);
    Ok(())
}

pub fn calldataload(state: &mut ExecutionState<'_>) -> OpResult {
    let index = state.stack.peek(0);
    let input = &state.msg.input;
    let word = if index >= U256::from(input.len()) {
        U256::zero()
    } else {
        let start = index.low_u64() as usize;
        let mut buf = [0u8; 32];
        let n = (input.len() - start).min(32);
        buf[..n].copy_from_slice(&input[start..start + n]);
        U256::from_big_endian(&buf)
    };
    *state.stack.top_mut() = word;
    Ok(())
}

pub fn calldatasize(state: &mut ExecutionState<'_>) -> OpResult {
    let n = U256::from(state.msg.input.len());
    state.stack.push(n);
    Ok(())
}

/// Pops the (memory, source, size) operands of a copy instruction and pays
/// for memory and the copy. Returns (dst, src, len) when `len > 0`.
fn copy_operands(state: &mut ExecutionState<'_>) -> Result<Option<(usize, usize, usize)>, StatusCode> {
    let mem_index = state.stack.pop();
    let input_index = state.stack.pop();
    let size = state.stack.pop();
    let (dst, len) = state.memory_region(mem_index, size)?;
    state.consume_gas(num_words(len as u64) * COPY_WORD_COST)?;
    Ok((len > 0).then(|| (dst, clamp_usize(input_index), len)))
}

pub fn calldatacopy(state: &mut ExecutionState<'_>) -> OpResult {
    if let Some((dst, src, len)) = copy_operands(state)? {
        let input = &state.msg.input;
        let src = src.min(input.len());
        state.memory.copy_padded(dst, len, &input[src..]);
    }
    Ok(())
}

pub fn codesize(state: &mut ExecutionState<'_>) -> OpResult {
    let n = U256::from(state.code.len());
    state.stack.push(n);
    Ok(())
}

pub fn codecopy(state: &mut ExecutionState<'_>) -> OpResult {
    if let Some((dst, src, len)) = copy_operands(state)? {
        let code: &[u8] = &state.code;
        let src = src.min(code.len());
        state.memory.copy_padded(dst, len, &code[src..]);
    }
    Ok(())
}

pub fn gasprice(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let price = state.tx_context(host).gas_price;
    state.stack.push(price);
    Ok(())
}

pub fn extcodesize(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let addr = u256_to_address(state.stack.peek(0));
    *state.stack.top_mut() = U256::from(host.get_code_size(&addr));
    Ok(())
}

pub fn extcodecopy(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let addr = u256_to_address(state.stack.pop());
    if let Some((dst, src, len)) = copy_operands(state)? {
        let buf = state.memory.slice_mut(dst, len);
        let copied = host.copy_code(&addr, src, buf);
        buf[copied..].fill(0);
    }
    Ok(())
}

pub fn returndatasize(state: &mut ExecutionState<'_>) -> OpResult {
    let n = U256::from(state.return_data.len());
    state.stack.push(n);
    Ok(())
}

pub fn returndatacopy(state: &mut ExecutionState<'_>) -> OpResult {
    let mem_index = state.stack.pop();
    let input_index = state.stack.pop();
    let size = state.stack.pop();
    let (dst, len) = state.memory_region(mem_index, size)?;

    let available = U256::from(state.return_data.len());
    if input_index > available || input_index.saturating_add(size) > available {
        return Err(StatusCode::InvalidMemoryAccess);
    }
    state.consume_gas(num_words(len as u64) * COPY_WORD_COST)?;
    if len > 0 {
        let src = input_index.low_u64() as usize;
        state.memory.slice_mut(dst, len).copy_from_slice(&state.return_data[src..src + len]);
    }
    Ok(())
}

pub fn extcodehash(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let addr = u256_to_address(state.stack.peek(0));
    *state.stack.top_mut() = U256::from_big_endian(host.get_code_hash(&addr).as_bytes());
    Ok(())
}

// --- block ---

pub fn blockhash(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let number = state.stack.peek(0);
    let upper = state.tx_context(host).block.number;
    let lower = upper.saturating_sub(256);
    let hash = if number < U256::from(upper) && number >= U256::from(lower) {
        host.get_block_hash(number.low_u64())
    } else {
        H256::zero()
    };
    *state.stack.top_mut() = U256::from_big_endian(hash.as_bytes());
    Ok(())
}

pub fn coinbase(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let v = address_to_u256(&state.tx_context(host).block.coinbase);
    state.stack.push(v);
    Ok(())
}

pub fn timestamp(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let v = U256::from(state.tx_context(host).block.timestamp);
    state.stack.push(v);
    Ok(())
}

pub fn number(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let v = U256::from(state.tx_context(host).block.number);
    state.stack.push(v);
    Ok(())
}

pub fn difficulty(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let v = state.tx_context(host).block.difficulty;
    state.stack.push(v);
    Ok(())
}

pub fn gaslimit(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let v = U256::from(state.tx_context(host).block.gas_limit);
    state.stack.push(v);
    Ok(())
}

pub fn chainid(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let v = state.tx_context(host).block.chain_id;
    state.stack.push(v);
    Ok(())
}

pub fn selfbalance(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let v = host.get_balance(&state.msg.destination);
    state.stack.push(v);
    Ok(())
}

// --- stack, memory, storage ---

pub fn pop(stack: &mut Stack) {
    stack.pop();
}

pub fn mload(state: &mut ExecutionState<'_>) -> OpResult {
    let index = state.stack.peek(0);
    let (offset, _) = state.memory_region(index, U256::from(32))?;
    *state.stack.top_mut() = state.memory.load_word(offset);
    Ok(())
}

pub fn mstore(state: &mut ExecutionState<'_>) -> OpResult {
    let index = state.stack.pop();
    let value = state.stack.pop();
    let (offset, _) = state.memory_region(index, U256::from(32))?;
    state.memory.store_word(offset, value);
    Ok(())
}

pub fn mstore8(state: &mut ExecutionState<'_>) -> OpResult {
    let index = state.stack.pop();
    let value = state.stack.pop();
    let (offset, _) = state.memory_region(index, U256::one())?;
    state.memory.store_byte(offset, value.byte(0));
    Ok(())
}

pub fn sload(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    let key = state.stack.peek(0);
    *state.stack.top_mut() = host.get_storage(&state.msg.destination, &key);
    Ok(())
}

/// Net gas metering: priced from the status the host reports for the write.
fn sstore_cost(rev: Revision, status: StorageStatus) -> i64 {
    match status {
        StorageStatus::Added => 20000,
        StorageStatus::Modified | StorageStatus::Deleted => 5000,
        StorageStatus::Unchanged | StorageStatus::ModifiedAgain => {
            if rev >= Revision::Istanbul {
                800
            } else {
                200
            }
        }
    }
}

fn net_metered(rev: Revision) -> bool {
    rev == Revision::Constantinople || rev >= Revision::Istanbul
}

pub fn sstore(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    if state.msg.is_static {
        return Err(StatusCode::StaticModeViolation);
    }
    // EIP-2200 sentry.
    if state.rev >= Revision::Istanbul && state.gas_left <= 2300 {
        return Err(StatusCode::OutOfGas);
    }
    let key = state.stack.pop();
    let value = state.stack.pop();
    if !net_metered(state.rev) {
        // Only the current value matters: zero to non-zero is a new slot.
        let current = host.get_storage(&state.msg.destination, &key);
        host.set_storage(&state.msg.destination, &key, value);
        let cost = if current.is_zero() && !value.is_zero() { 20000 } else { 5000 };
        return state.consume_gas(cost);
    }
    let status = host.set_storage(&state.msg.destination, &key, value);
    state.consume_gas(sstore_cost(state.rev, status))
}

pub fn msize(state: &mut ExecutionState<'_>) -> OpResult {
    let n = U256::from(state.memory.len());
    state.stack.push(n);
    Ok(())
}

pub fn log(state: &mut ExecutionState<'_>, host: &mut dyn Host, num_topics: usize) -> OpResult {
    if state.msg.is_static {
        return Err(StatusCode::StaticModeViolation);
    }
    let offset = state.stack.pop();
    let size = state.stack.pop();
    let (offset, len) = state.memory_region(offset, size)?;
    let topics: Vec<H256> = (0..num_topics)
        .map(|_| {
            let mut t = H256::zero();
            state.stack.pop().to_big_endian(t.as_bytes_mut());
            t
        })
        .collect();
    state.consume_gas(len as i64 * 8)?;
    let data = if len == 0 { &[][..] } else { state.memory.slice(offset, len) };
    host.emit_log(&state.msg.destination, data, &topics);
    Ok(())
}

// --- system ---

pub fn selfdestruct(state: &mut ExecutionState<'_>, host: &mut dyn Host) -> OpResult {
    if state.msg.is_static {
        return Err(StatusCode::StaticModeViolation);
    }
    let beneficiary = u256_to_address(state.stack.pop());
    if state.rev >= Revision::TangerineWhistle
        && (state.rev == Revision::TangerineWhistle || !host.get_balance(&state.msg.destination).is_zero())
        && !host.account_exists(&beneficiary)
    {
        state.consume_gas(25000)?;
    }
    host.selfdestruct(&state.msg.destination, &beneficiary);
    Ok(())
}

fn input_from_memory(state: &ExecutionState<'_>, offset: usize, len: usize) -> Vec<u8> {
    if len == 0 {
        Vec::new()
    } else {
        state.memory.slice(offset, len).to_vec()
    }
}

/// Pops the operands of a call-family instruction and charges its dynamic
/// cost. Returns the nested call to run, or `None` when the call fails
/// before reaching the callee (depth limit, insufficient balance). In both
/// cases a 0 is left on the stack.
pub fn prepare_call(
    state: &mut ExecutionState<'_>,
    host: &mut dyn Host,
    kind: CallKind,
    is_static: bool,
) -> Result<Option<PendingCall>, StatusCode> {
    let gas = state.stack.pop();
    let dst = u256_to_address(state.stack.pop());
    let value =
        if is_static || kind == CallKind::DelegateCall { U256::zero() } else { state.stack.pop() };
    let has_value = !value.is_zero();
    let input_offset = state.stack.pop();
    let input_size = state.stack.pop();
    let output_offset = state.stack.pop();
    let output_size = state.stack.pop();

    state.stack.push(U256::zero());

    let (input_offset, input_size) = state.memory_region(input_offset, input_size)?;
    let (output_offset, output_size) = state.memory_region(output_offset, output_size)?;

    let (destination, sender, msg_value) = match kind {
        CallKind::Call => (dst, state.msg.destination, value),
        CallKind::CallCode => (state.msg.destination, state.msg.destination, value),
        _ => (state.msg.destination, state.msg.sender, state.msg.value),
    };

    let mut cost = if has_value { 9000 } else { 0 };
    if kind == CallKind::Call {
        if has_value && state.msg.is_static {
            return Err(StatusCode::StaticModeViolation);
        }
        if (has_value || state.rev < Revision::SpuriousDragon) && !host.account_exists(&dst) {
            cost += 25000;
        }
    }
    state.consume_gas(cost)?;

    let mut msg_gas = if gas > U256::from(i64::MAX) { i64::MAX } else { gas.low_u64() as i64 };
    if state.rev >= Revision::TangerineWhistle {
        msg_gas = msg_gas.min(state.gas_left - state.gas_left / 64);
    } else if msg_gas > state.gas_left {
        return Err(StatusCode::OutOfGas);
    }

    if has_value {
        msg_gas += 2300;
        state.gas_left += 2300;
    }

    state.return_data.clear();

    if state.msg.depth >= CALL_DEPTH_LIMIT {
        return Ok(None);
    }
    if has_value && host.get_balance(&state.msg.destination) < value {
        return Ok(None);
    }

    let msg = Message {
        kind,
        is_static: is_static || state.msg.is_static,
        depth: state.msg.depth + 1,
        gas: msg_gas,
        destination,
        code_address: dst,
        sender,
        input: input_from_memory(state, input_offset, input_size),
        value: msg_value,
        create2_salt: U256::zero(),
    };
    Ok(Some(PendingCall { msg, output_offset, output_size, correction: 0, resume: 0 }))
}

/// Create-family counterpart of [`prepare_call`].
pub fn prepare_create(
    state: &mut ExecutionState<'_>,
    host: &mut dyn Host,
    kind: CallKind,
) -> Result<Option<PendingCall>, StatusCode> {
    if state.msg.is_static {
        return Err(StatusCode::StaticModeViolation);
    }
    let endowment = state.stack.pop();
    let init_code_offset = state.stack.pop();
    let init_code_size = state.stack.pop();
    let (offset, len) = state.memory_region(init_code_offset, init_code_size)?;

    let mut salt = U256::zero();
    if kind == CallKind::Create2 {
        salt = state.stack.pop();
        state.consume_gas(num_words(len as u64) * 6)?;
    }

    state.stack.push(U256::zero());
    state.return_data.clear();

    if state.msg.depth >= CALL_DEPTH_LIMIT {
        return Ok(None);
    }
    if !endowment.is_zero() && host.get_balance(&state.msg.destination) < endowment {
        return Ok(None);
    }

    let mut gas = state.gas_left;
    if state.rev >= Revision::TangerineWhistle {
        gas -= gas / 64;
    }

    let msg = Message {
        kind,
        is_static: false,
        depth: state.msg.depth + 1,
        gas,
        destination: Default::default(),
        code_address: Default::default(),
        sender: state.msg.destination,
        input: input_from_memory(state, offset, len),
        value: endowment,
        create2_salt: salt,
    };
    Ok(Some(PendingCall { msg, output_offset: 0, output_size: 0, correction: 0, resume: 0 }))
}

// --- EVM384 ---

/// Memory offsets packed into the low 128 bits of an EVM384 operand word,
/// least significant first: modulus, y, x, result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evm384Offsets {
    pub modulus: u32,
    pub y: u32,
    pub x: u32,
    pub out: u32,
}

impl Evm384Offsets {
    pub fn unpack(word: U256) -> Self {
        let packed = word.low_u128();
        Self { modulus: packed as u32, y: (packed >> 32) as u32, x: (packed >> 64) as u32, out: (packed >> 96) as u32 }
    }

    pub fn pack(self) -> U256 {
        U256::from(
            self.modulus as u128
                | (self.y as u128) << 32
                | (self.x as u128) << 64
                | (self.out as u128) << 96,
        )
    }

    fn max(self) -> u32 {
        self.modulus.max(self.y).max(self.x).max(self.out)
    }
}

/// Pops the packed offsets and makes `max_offset + span` bytes addressable.
fn evm384_operands(state: &mut ExecutionState<'_>, span: u64) -> Result<(Evm384Offsets, Limbs, Limbs, Limbs), StatusCode> {
    let offsets = Evm384Offsets::unpack(state.stack.pop());
    state.memory_region(U256::from(offsets.max()), U256::from(span))?;
    let load = |off: u32| bigint384::load_limbs(state.memory.slice(off as usize, BYTES));
    Ok((offsets, load(offsets.x), load(offsets.y), load(offsets.modulus)))
}

fn evm384_store(state: &mut ExecutionState<'_>, out: u32, value: &Limbs) {
    bigint384::store_limbs(state.memory.slice_mut(out as usize, BYTES), value);
}

pub fn addmod384(state: &mut ExecutionState<'_>) -> OpResult {
    let (offsets, x, y, m) = evm384_operands(state, BYTES as u64)?;
    evm384_store(state, offsets.out, &bigint384::addmod384(&x, &y, &m));
    Ok(())
}

pub fn submod384(state: &mut ExecutionState<'_>) -> OpResult {
    let (offsets, x, y, m) = evm384_operands(state, BYTES as u64)?;
    evm384_store(state, offsets.out, &bigint384::submod384(&x, &y, &m));
    Ok(())
}

/// The 64-bit Montgomery inverse sits right after the modulus, so the
/// checked span is 56 bytes.
pub fn mulmodmont384(state: &mut ExecutionState<'_>) -> OpResult {
    let (offsets, x, y, m) = evm384_operands(state, BYTES as u64 + 8)?;
    let mut inv = [0u8; 8];
    inv.copy_from_slice(state.memory.slice(offsets.modulus as usize + BYTES, 8));
    let r = bigint384::mulmodmont384(&x, &y, &m, u64::from_le_bytes(inv));
    evm384_store(state, offsets.out, &r);
    Ok(())
}
