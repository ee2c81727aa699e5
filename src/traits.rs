//! Static per-opcode metadata: mnemonic, stack effect and the base gas cost
//! of every revision.

use crate::opcodes::*;
use crate::revision::Revision;

/// Marks an opcode that does not exist in a revision's cost table.
pub const UNDEFINED: i16 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionTraits {
    /// `None` for bytes that are not an instruction in any revision.
    pub name: Option<&'static str>,
    pub stack_height_required: i8,
    pub stack_height_change: i8,
}

impl InstructionTraits {
    const UNKNOWN: InstructionTraits =
        InstructionTraits { name: None, stack_height_required: 0, stack_height_change: 0 };

    const fn new(name: &'static str, required: i8, change: i8) -> Self {
        InstructionTraits { name: Some(name), stack_height_required: required, stack_height_change: change }
    }
}

const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
    "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
    "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
    "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];
const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
    "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];
const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
    "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];
const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

pub static TRAITS: [InstructionTraits; 256] = build_traits();

const fn build_traits() -> [InstructionTraits; 256] {
    use InstructionTraits as T;
    let mut t = [T::UNKNOWN; 256];

    t[STOP as usize] = T::new("STOP", 0, 0);
    t[ADD as usize] = T::new("ADD", 2, -1);
    t[MUL as usize] = T::new("MUL", 2, -1);
    t[SUB as usize] = T::new("SUB", 2, -1);
    t[DIV as usize] = T::new("DIV", 2, -1);
    t[SDIV as usize] = T::new("SDIV", 2, -1);
    t[MOD as usize] = T::new("MOD", 2, -1);
    t[SMOD as usize] = T::new("SMOD", 2, -1);
    t[ADDMOD as usize] = T::new("ADDMOD", 3, -2);
    t[MULMOD as usize] = T::new("MULMOD", 3, -2);
    t[EXP as usize] = T::new("EXP", 2, -1);
    t[SIGNEXTEND as usize] = T::new("SIGNEXTEND", 2, -1);

    t[LT as usize] = T::new("LT", 2, -1);
    t[GT as usize] = T::new("GT", 2, -1);
    t[SLT as usize] = T::new("SLT", 2, -1);
    t[SGT as usize] = T::new("SGT", 2, -1);
    t[EQ as usize] = T::new("EQ", 2, -1);
    t[ISZERO as usize] = T::new("ISZERO", 1, 0);
    t[AND as usize] = T::new("AND", 2, -1);
    t[OR as usize] = T::new("OR", 2, -1);
    t[XOR as usize] = T::new("XOR", 2, -1);
    t[NOT as usize] = T::new("NOT", 1, 0);
    t[BYTE as usize] = T::new("BYTE", 2, -1);
    t[SHL as usize] = T::new("SHL", 2, -1);
    t[SHR as usize] = T::new("SHR", 2, -1);
    t[SAR as usize] = T::new("SAR", 2, -1);

    t[SHA3 as usize] = T::new("SHA3", 2, -1);

    t[ADDRESS as usize] = T::new("ADDRESS", 0, 1);
    t[BALANCE as usize] = T::new("BALANCE", 1, 0);
    t[ORIGIN as usize] = T::new("ORIGIN", 0, 1);
    t[CALLER as usize] = T::new("CALLER", 0, 1);
    t[CALLVALUE as usize] = T::new("CALLVALUE", 0, 1);
    t[CALLDATALOAD as usize] = T::new("CALLDATALOAD", 1, 0);
    t[CALLDATASIZE as usize] = T::new("CALLDATASIZE", 0, 1);
    t[CALLDATACOPY as usize] = T::new("CALLDATACOPY", 3, -3);
    t[CODESIZE as usize] = T::new("CODESIZE", 0, 1);
    t[CODECOPY as usize] = T::new("CODECOPY", 3, -3);
    t[GASPRICE as usize] = T::new("GASPRICE", 0, 1);
    t[EXTCODESIZE as usize] = T::new("EXTCODESIZE", 1, 0);
    t[EXTCODECOPY as usize] = T::new("EXTCODECOPY", 4, -4);
    t[RETURNDATASIZE as usize] = T::new("RETURNDATASIZE", 0, 1);
    t[RETURNDATACOPY as usize] = T::new("RETURNDATACOPY", 3, -3);
    t[EXTCODEHASH as usize] = T::new("EXTCODEHASH", 1, 0);

    t[BLOCKHASH as usize] = T::new("BLOCKHASH", 1, 0);
    t[COINBASE as usize] = T::new("COINBASE", 0, 1);
    t[TIMESTAMP as usize] = T::new("TIMESTAMP", 0, 1);
    t[NUMBER as usize] = T::new("NUMBER", 0, 1);
    t[DIFFICULTY as usize] = T::new("DIFFICULTY", 0, 1);
    t[GASLIMIT as usize] = T::new("GASLIMIT", 0, 1);
    t[CHAINID as usize] = T::new("CHAINID", 0, 1);
    t[SELFBALANCE as usize] = T::new("SELFBALANCE", 0, 1);

    t[POP as usize] = T::new("POP", 1, -1);
    t[MLOAD as usize] = T::new("MLOAD", 1, 0);
    t[MSTORE as usize] = T::new("MSTORE", 2, -2);
    t[MSTORE8 as usize] = T::new("MSTORE8", 2, -2);
    t[SLOAD as usize] = T::new("SLOAD", 1, 0);
    t[SSTORE as usize] = T::new("SSTORE", 2, -2);
    t[JUMP as usize] = T::new("JUMP", 1, -1);
    t[JUMPI as usize] = T::new("JUMPI", 2, -2);
    t[PC as usize] = T::new("PC", 0, 1);
    t[MSIZE as usize] = T::new("MSIZE", 0, 1);
    t[GAS as usize] = T::new("GAS", 0, 1);
    t[JUMPDEST as usize] = T::new("JUMPDEST", 0, 0);

    let mut i = 0;
    while i < 32 {
        t[PUSH1 as usize + i] = T::new(PUSH_NAMES[i], 0, 1);
        i += 1;
    }
    let mut i = 0;
    while i < 16 {
        t[DUP1 as usize + i] = T::new(DUP_NAMES[i], i as i8 + 1, 1);
        t[SWAP1 as usize + i] = T::new(SWAP_NAMES[i], i as i8 + 2, 0);
        i += 1;
    }
    let mut i = 0;
    while i < 5 {
        t[LOG0 as usize + i] = T::new(LOG_NAMES[i], i as i8 + 2, -(i as i8 + 2));
        i += 1;
    }

    // Each EVM384 opcode pops one word of packed memory offsets.
    t[ADDMOD384 as usize] = T::new("ADDMOD384", 1, -1);
    t[SUBMOD384 as usize] = T::new("SUBMOD384", 1, -1);
    t[MULMODMONT384 as usize] = T::new("MULMODMONT384", 1, -1);

    t[CREATE as usize] = T::new("CREATE", 3, -2);
    t[CALL as usize] = T::new("CALL", 7, -6);
    t[CALLCODE as usize] = T::new("CALLCODE", 7, -6);
    t[RETURN as usize] = T::new("RETURN", 2, -2);
    t[DELEGATECALL as usize] = T::new("DELEGATECALL", 6, -5);
    t[CREATE2 as usize] = T::new("CREATE2", 4, -3);
    t[STATICCALL as usize] = T::new("STATICCALL", 6, -5);
    t[REVERT as usize] = T::new("REVERT", 2, -2);
    t[INVALID as usize] = T::new("INVALID", 0, 0);
    t[SELFDESTRUCT as usize] = T::new("SELFDESTRUCT", 1, -1);

    t
}

const fn frontier() -> [i16; 256] {
    let mut t = [UNDEFINED; 256];

    t[STOP as usize] = 0;
    t[ADD as usize] = 3;
    t[MUL as usize] = 5;
    t[SUB as usize] = 3;
    t[DIV as usize] = 5;
    t[SDIV as usize] = 5;
    t[MOD as usize] = 5;
    t[SMOD as usize] = 5;
    t[ADDMOD as usize] = 8;
    t[MULMOD as usize] = 8;
    t[EXP as usize] = 10;
    t[SIGNEXTEND as usize] = 5;
    t[LT as usize] = 3;
    t[GT as usize] = 3;
    t[SLT as usize] = 3;
    t[SGT as usize] = 3;
    t[EQ as usize] = 3;
    t[ISZERO as usize] = 3;
    t[AND as usize] = 3;
    t[OR as usize] = 3;
    t[XOR as usize] = 3;
    t[NOT as usize] = 3;
    t[BYTE as usize] = 3;
    t[SHA3 as usize] = 30;
    t[ADDRESS as usize] = 2;
    t[BALANCE as usize] = 20;
    t[ORIGIN as usize] = 2;
    t[CALLER as usize] = 2;
    t[CALLVALUE as usize] = 2;
    t[CALLDATALOAD as usize] = 3;
    t[CALLDATASIZE as usize] = 2;
    t[CALLDATACOPY as usize] = 3;
    t[CODESIZE as usize] = 2;
    t[CODECOPY as usize] = 3;
    t[GASPRICE as usize] = 2;
    t[EXTCODESIZE as usize] = 20;
    t[EXTCODECOPY as usize] = 20;
    t[BLOCKHASH as usize] = 20;
    t[COINBASE as usize] = 2;
    t[TIMESTAMP as usize] = 2;
    t[NUMBER as usize] = 2;
    t[DIFFICULTY as usize] = 2;
    t[GASLIMIT as usize] = 2;
    t[POP as usize] = 2;
    t[MLOAD as usize] = 3;
    t[MSTORE as usize] = 3;
    t[MSTORE8 as usize] = 3;
    t[SLOAD as usize] = 50;
    t[SSTORE as usize] = 0;
    t[JUMP as usize] = 8;
    t[JUMPI as usize] = 10;
    t[PC as usize] = 2;
    t[MSIZE as usize] = 2;
    t[GAS as usize] = 2;
    t[JUMPDEST as usize] = 1;

    let mut op = PUSH1 as usize;
    while op <= SWAP16 as usize {
        t[op] = 3;
        op += 1;
    }
    let mut i = 0;
    while i < 5 {
        t[LOG0 as usize + i] = (1 + i as i16) * 375;
        i += 1;
    }

    t[CREATE as usize] = 32000;
    t[CALL as usize] = 40;
    t[CALLCODE as usize] = 40;
    t[RETURN as usize] = 0;
    t[INVALID as usize] = 0;
    t[SELFDESTRUCT as usize] = 0;
    t
}

const fn homestead() -> [i16; 256] {
    let mut t = frontier();
    t[DELEGATECALL as usize] = 40;
    t
}

const fn tangerine_whistle() -> [i16; 256] {
    let mut t = homestead();
    t[BALANCE as usize] = 400;
    t[EXTCODESIZE as usize] = 700;
    t[EXTCODECOPY as usize] = 700;
    t[SLOAD as usize] = 200;
    t[CALL as usize] = 700;
    t[CALLCODE as usize] = 700;
    t[DELEGATECALL as usize] = 700;
    t[SELFDESTRUCT as usize] = 5000;
    t
}

const fn spurious_dragon() -> [i16; 256] {
    tangerine_whistle()
}

const fn byzantium() -> [i16; 256] {
    let mut t = spurious_dragon();
    t[RETURNDATASIZE as usize] = 2;
    t[RETURNDATACOPY as usize] = 3;
    t[STATICCALL as usize] = 700;
    t[REVERT as usize] = 0;
    t
}

const fn constantinople() -> [i16; 256] {
    let mut t = byzantium();
    t[SHL as usize] = 3;
    t[SHR as usize] = 3;
    t[SAR as usize] = 3;
    t[EXTCODEHASH as usize] = 400;
    t[CREATE2 as usize] = 32000;
    t
}

const fn petersburg() -> [i16; 256] {
    constantinople()
}

const fn istanbul() -> [i16; 256] {
    let mut t = petersburg();
    t[BALANCE as usize] = 700;
    t[CHAINID as usize] = 2;
    t[EXTCODEHASH as usize] = 700;
    t[SELFBALANCE as usize] = 5;
    t[SLOAD as usize] = 800;
    t[ADDMOD384 as usize] = 8;
    t[SUBMOD384 as usize] = 8;
    t[MULMODMONT384 as usize] = 24;
    t
}

const fn berlin() -> [i16; 256] {
    istanbul()
}

static GAS_COSTS: [[i16; 256]; 9] = [
    frontier(),
    homestead(),
    tangerine_whistle(),
    spurious_dragon(),
    byzantium(),
    constantinople(),
    petersburg(),
    istanbul(),
    berlin(),
];

/// Base gas cost table of `rev`; undefined opcodes hold [`UNDEFINED`].
pub fn gas_costs(rev: Revision) -> &'static [i16; 256] {
    &GAS_COSTS[rev.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_defined_opcode_has_a_name() {
        for rev in Revision::ALL {
            for (op, cost) in gas_costs(rev).iter().enumerate() {
                if *cost != UNDEFINED {
                    assert!(TRAITS[op].name.is_some(), "0x{op:02x} in {rev}");
                }
            }
        }
    }

    #[test]
    fn revision_deltas() {
        assert_eq!(gas_costs(Revision::Frontier)[DELEGATECALL as usize], UNDEFINED);
        assert_eq!(gas_costs(Revision::Homestead)[DELEGATECALL as usize], 40);
        assert_eq!(gas_costs(Revision::TangerineWhistle)[SLOAD as usize], 200);
        assert_eq!(gas_costs(Revision::SpuriousDragon)[REVERT as usize], UNDEFINED);
        assert_eq!(gas_costs(Revision::Byzantium)[REVERT as usize], 0);
        assert_eq!(gas_costs(Revision::Byzantium)[SHL as usize], UNDEFINED);
        assert_eq!(gas_costs(Revision::Constantinople)[CREATE2 as usize], 32000);
        assert_eq!(gas_costs(Revision::Petersburg)[ADDMOD384 as usize], UNDEFINED);
        assert_eq!(gas_costs(Revision::Istanbul)[SLOAD as usize], 800);
        assert_eq!(gas_costs(Revision::Istanbul)[MULMODMONT384 as usize], 24);
        assert_eq!(gas_costs(Revision::Berlin), gas_costs(Revision::Istanbul));
    }

    #[test]
    fn stack_traits() {
        assert_eq!(TRAITS[DUP16 as usize].stack_height_required, 16);
        assert_eq!(TRAITS[SWAP16 as usize].stack_height_required, 17);
        assert_eq!(TRAITS[LOG4 as usize].stack_height_change, -6);
        assert_eq!(TRAITS[CALL as usize].stack_height_change, -6);
        assert_eq!(TRAITS[0x0c].name, None);
    }
}
