//! Parsing of the textual inputs an execution is configured from: hex
//! bytecode, addresses and 256-bit numbers.

use primitive_types::{H160, U256};

use crate::error::EvmError;

/// Decodes hex with an optional `0x` prefix; the empty string is no bytes.
pub fn parse_hex(s: &str) -> Result<Vec<u8>, EvmError> {
    let t = s.trim();
    let t = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t);
    if t.len() % 2 != 0 {
        return Err(EvmError::InvalidHex(s.to_string()));
    }
    (0..t.len())
        .step_by(2)
        .map(|i| {
            t.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| EvmError::InvalidHex(s.to_string()))
        })
        .collect()
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

pub fn parse_h160(s: &str) -> Result<H160, EvmError> {
    match parse_hex(s) {
        Ok(b) if b.len() == 20 => Ok(H160::from_slice(&b)),
        _ => Err(EvmError::InvalidAddress(s.to_string())),
    }
}

/// `0x`-prefixed hex of any length up to 64 digits, or decimal.
pub fn parse_u256(s: &str) -> Result<U256, EvmError> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(digits) if !digits.is_empty() && digits.len() <= 64 => U256::from_str_radix(digits, 16).ok(),
        Some(_) => None,
        None => U256::from_dec_str(t).ok(),
    };
    parsed.ok_or_else(|| EvmError::InvalidNumber(s.to_string()))
}

/// Bytecode from a command-line argument: hex, or `@path` for a file of raw
/// bytes.
pub fn read_code_arg(arg: &str) -> Result<Vec<u8>, EvmError> {
    match arg.strip_prefix('@') {
        Some(path) => Ok(std::fs::read(path)?),
        None => parse_hex(arg),
    }
}
