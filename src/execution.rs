use std::borrow::Cow;
use std::rc::Rc;

use primitive_types::U256;
use tracing::debug;

use crate::error::StatusCode;
use crate::host::{address_to_u256, CallAction, ExecutionResult, Host, Message};
use crate::revision::Revision;
use crate::state::{Control, ExecutionState, PendingCall};

struct Frame<'a> {
    state: ExecutionState<'a>,
    /// The nested call this frame is suspended on.
    pending: Option<Box<PendingCall>>,
}

/// Runs instructions of one frame from `pc` until it halts or calls out.
fn run(state: &mut ExecutionState<'_>, mut pc: usize, host: &mut dyn Host) -> Control {
    let analysis = Rc::clone(&state.analysis);
    loop {
        let instr = &analysis.instrs[pc];
        match (instr.op)(instr, pc, state, host) {
            Control::Continue(next) => pc = next,
            other => return other,
        }
    }
}

/// Applies a finished nested call to the suspended caller and says where the
/// caller continues.
fn resume(state: &mut ExecutionState<'_>, pending: PendingCall, result: ExecutionResult) -> Control {
    let output = result.output();
    state.return_data = output.to_vec();

    if pending.msg.kind.is_create() {
        if result.status.is_success() {
            let addr = result.create_address.unwrap_or_default();
            *state.stack.top_mut() = address_to_u256(&addr);
        }
    } else {
        *state.stack.top_mut() = if result.status.is_success() { U256::one() } else { U256::zero() };
        let n = pending.output_size.min(output.len());
        if n > 0 {
            state.memory.slice_mut(pending.output_offset, n).copy_from_slice(&output[..n]);
        }
    }

    state.gas_left -= pending.msg.gas - result.gas_left;

    if !state.debit_correction(pending.correction) {
        return state.exit(StatusCode::OutOfGas);
    }
    Control::Continue(pending.resume)
}

/// Executes `code` for `msg`, running every nested call the host asks for on
/// an explicit frame stack.
pub fn execute(host: &mut dyn Host, rev: Revision, msg: Message, code: &[u8]) -> ExecutionResult {
    let mut frames = vec![Frame { state: ExecutionState::new(msg, rev, Cow::Borrowed(code)), pending: None }];
    let mut control = Control::Continue(0);

    loop {
        let Some(top) = frames.last_mut() else {
            return ExecutionResult::failure(StatusCode::Failure);
        };
        control = match control {
            Control::Continue(pc) => run(&mut top.state, pc, host),

            Control::Call(pending) => match host.call(&pending.msg) {
                CallAction::Done(result) => {
                    let result = host.finish_call(&pending.msg, result);
                    resume(&mut top.state, *pending, result)
                }
                CallAction::Execute { msg, code } => {
                    debug!(depth = msg.depth, kind = ?msg.kind, gas = msg.gas, "entering frame");
                    top.pending = Some(pending);
                    let state = ExecutionState::new(msg, rev, Cow::Owned(code));
                    frames.push(Frame { state, pending: None });
                    Control::Continue(0)
                }
            },

            Control::Exit => {
                let Some(done) = frames.pop() else {
                    return ExecutionResult::failure(StatusCode::Failure);
                };
                let msg = done.state.msg.clone();
                let result = done.state.into_result();
                let Some(parent) = frames.last_mut() else {
                    debug!(status = %result.status, gas_left = result.gas_left, "execution finished");
                    return result;
                };
                debug!(depth = msg.depth, status = %result.status, gas_left = result.gas_left, "leaving frame");
                let result = host.finish_call(&msg, result);
                match parent.pending.take() {
                    Some(pending) => resume(&mut parent.state, *pending, result),
                    None => parent.state.exit(StatusCode::Failure),
                }
            }
        };
    }
}
