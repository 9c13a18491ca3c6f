//! Error kinds returned by the address engines and the planner.

use thiserror::Error;

/// Every engine operation returns one of these instead of panicking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubnetError {
    /// Malformed address text (field count, non-numeric, out of range, bad `::`).
    #[error("invalid address format: {0:?}")]
    InvalidFormat(String),
    /// Prefix length outside the range of the address family.
    #[error("invalid prefix {prefix:?} (expected /0../{max})")]
    InvalidPrefix { prefix: String, max: u8 },
    /// Dotted mask whose bits are not a contiguous run of leading ones.
    #[error("invalid subnet mask: {0:?}")]
    InvalidMask(String),
    /// Non-positive host or subnet count, or an empty batch.
    #[error("invalid requirement: {0}")]
    InvalidRequirement(String),
    /// An entry of a batch (route list) failed to parse.
    #[error("invalid network #{index} {entry:?}: {source}")]
    InvalidNetwork {
        index: usize,
        entry: String,
        #[source]
        source: Box<SubnetError>,
    },
    /// Allocation or arithmetic ran past the representable address range.
    #[error("address space exhausted: {0}")]
    AddressSpaceExhausted(String),
}

impl SubnetError {
    pub(crate) fn prefix(prefix: impl ToString, max: u8) -> SubnetError {
        SubnetError::InvalidPrefix {
            prefix: prefix.to_string(),
            max,
        }
    }

    /// Short, stable name of the error kind, for callers that map kinds to messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SubnetError::InvalidFormat(_) => "InvalidFormat",
            SubnetError::InvalidPrefix { .. } => "InvalidPrefix",
            SubnetError::InvalidMask(_) => "InvalidMask",
            SubnetError::InvalidRequirement(_) => "InvalidRequirement",
            SubnetError::InvalidNetwork { .. } => "InvalidNetwork",
            SubnetError::AddressSpaceExhausted(_) => "AddressSpaceExhausted",
        }
    }
}

pub type Result<T> = std::result::Result<T, SubnetError>;
