use std::fmt;

use thiserror::Error;

/// Terminal status of a frame.
///
/// Statuses are values rather than `Err`s: success and revert are terminal
/// too, and every status travels back to the parent frame the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusCode {
    #[default]
    Success,
    /// Generic failure reported by a host (e.g. an address collision on create).
    Failure,
    Revert,
    OutOfGas,
    InvalidInstruction,
    UndefinedInstruction,
    StackOverflow,
    StackUnderflow,
    BadJumpDestination,
    InvalidMemoryAccess,
    StaticModeViolation,
}

impl StatusCode {
    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    /// Success and revert hand the remaining gas back to the caller; every
    /// other status consumes it.
    pub fn refunds_gas(self) -> bool {
        matches!(self, StatusCode::Success | StatusCode::Revert)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Success => "success",
            StatusCode::Failure => "failure",
            StatusCode::Revert => "revert",
            StatusCode::OutOfGas => "out of gas",
            StatusCode::InvalidInstruction => "invalid instruction",
            StatusCode::UndefinedInstruction => "undefined instruction",
            StatusCode::StackOverflow => "stack overflow",
            StatusCode::StackUnderflow => "stack underflow",
            StatusCode::BadJumpDestination => "bad jump destination",
            StatusCode::InvalidMemoryAccess => "invalid memory access",
            StatusCode::StaticModeViolation => "static mode violation",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while preparing an execution: parsing inputs, loading a
/// world file, picking a revision.
#[derive(Debug, Error)]
pub enum EvmError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("unknown revision: {0}")]
    UnknownRevision(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("world json: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_and_revert_refund() {
        assert!(StatusCode::Success.refunds_gas());
        assert!(StatusCode::Revert.refunds_gas());
        assert!(!StatusCode::OutOfGas.refunds_gas());
        assert!(!StatusCode::UndefinedInstruction.refunds_gas());
    }

    #[test]
    fn error_messages() {
        assert_eq!(StatusCode::BadJumpDestination.to_string(), "bad jump destination");
        let e = EvmError::UnknownRevision("paris".into());
        assert_eq!(e.to_string(), "unknown revision: paris");
    }
}
