//! One-shot execution of a piece of bytecode against an in-memory world.

use primitive_types::U256;

use crate::execution::execute;
use crate::host::{Address, BlockEnv, CallKind, ExecutionResult, Message, TxContext};
use crate::revision::Revision;
use crate::world::{InMemoryHost, World};

#[derive(Debug, Clone)]
pub struct EvmConfig {
    pub revision: Revision,
    pub gas_limit: i64,
    pub calldata: Vec<u8>,
    // Unset addresses are the zero address; origin falls back to caller.
    pub address: Option<Address>,
    pub caller: Option<Address>,
    pub origin: Option<Address>,
    pub value: U256,
    pub gas_price: U256,
    pub block: BlockEnv,
    pub world: Option<World>,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            revision: Revision::Istanbul,
            gas_limit: 10_000_000,
            calldata: Vec::new(),
            address: None,
            caller: None,
            origin: None,
            value: U256::zero(),
            gas_price: U256::zero(),
            block: BlockEnv::default(),
            world: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Evm {
    pub code: Vec<u8>,
    pub revision: Revision,
    msg: Message,
    host: InMemoryHost,
}

impl Evm {
    pub fn new(code: Vec<u8>, cfg: EvmConfig) -> Self {
        let address = cfg.address.unwrap_or_default();
        let caller = cfg.caller.unwrap_or_default();
        let msg = Message {
            kind: CallKind::Call,
            gas: cfg.gas_limit,
            destination: address,
            code_address: address,
            sender: caller,
            input: cfg.calldata,
            value: cfg.value,
            ..Default::default()
        };
        let tx = TxContext {
            gas_price: cfg.gas_price,
            origin: cfg.origin.or(cfg.caller).unwrap_or_default(),
            block: cfg.block,
        };
        Self {
            code,
            revision: cfg.revision,
            msg,
            host: InMemoryHost::new(cfg.world.unwrap_or_default(), tx),
        }
    }

    /// Executes the code as the top-level frame. World changes of a
    /// successful run stay in [`Evm::host`]; a failed or reverted run
    /// discards them, logs included.
    pub fn run(&mut self) -> ExecutionResult {
        self.host.begin_transaction();
        let res = execute(&mut self.host, self.revision, self.msg.clone(), &self.code);
        self.host.end_transaction(res.status);
        res
    }

    pub fn host(&self) -> &InMemoryHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut InMemoryHost {
        &mut self.host
    }

    pub fn world(&self) -> &World {
        &self.host.world
    }
}
