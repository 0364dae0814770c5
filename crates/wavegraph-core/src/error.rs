//! Stable wire-protocol return codes.
//!
//! These mirror `elem::ReturnCode` in the original runtime: a small set of
//! integers that cross the control/audio boundary and the host API boundary
//! unchanged, so callers in any language can match on the numeric value
//! without linking against this crate's types.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ReturnCode {
    Ok = 0,
    UnknownNodeType = 1,
    NodeNotFound = 2,
    NodeAlreadyExists = 3,
    NodeTypeAlreadyExists = 4,
    InvalidPropertyType = 5,
    InvalidPropertyValue = 6,
    InvariantViolation = 7,
    InvalidInstructionFormat = 8,
}

impl ReturnCode {
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, ReturnCode::Ok)
    }

    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            ReturnCode::Ok => "Ok",
            ReturnCode::UnknownNodeType => "Unknown node type",
            ReturnCode::NodeNotFound => "Node not found",
            ReturnCode::NodeAlreadyExists => "Node already exists",
            ReturnCode::NodeTypeAlreadyExists => "Node type already exists",
            ReturnCode::InvalidPropertyType => "Invalid property type",
            ReturnCode::InvalidPropertyValue => "Invalid property value",
            ReturnCode::InvariantViolation => "Invariant violation",
            ReturnCode::InvalidInstructionFormat => "Invalid instruction format",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.describe(), self.code())
    }
}

impl Error for ReturnCode {}
