pub mod opcodes;
pub mod revision;
pub mod traits;
pub mod error;
pub mod config;
pub mod bigint384;
pub mod stack;
pub mod memory;
pub mod host;
pub mod analysis;
pub mod state;
pub mod instructions;
pub mod tables;
pub mod execution;
pub mod world;
pub mod machine;
pub mod disasm;

pub use analysis::{analyze, AdvancedCodeAnalysis, BlockInfo};
pub use error::{EvmError, StatusCode};
pub use execution::execute;
pub use host::{Address, BlockEnv, CallAction, CallKind, ExecutionResult, Host, Message, StorageStatus, TxContext};
pub use machine::{Evm, EvmConfig};
pub use revision::Revision;
pub use world::{Account, InMemoryHost, LogEntry, World};
