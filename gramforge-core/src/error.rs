//! Error types for gramforge

use thiserror::Error;

/// Result type alias for gramforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gramforge
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed IPv4 address string
    #[error("Invalid IPv4 string: '{0}'")]
    InvalidIpv4String(String),

    /// Malformed MAC address string
    #[error("Invalid MAC string: '{0}'")]
    InvalidMacString(String),

    /// CIDR prefix too large for subnet expansion
    #[error("CIDR prefix /{0} too large (maximum /31)")]
    CidrTooLarge(u8),

    /// Malformed port or port range string
    #[error("Invalid port string: '{0}'")]
    InvalidPortString(String),

    /// Malformed numeric range string
    #[error("Invalid range string: '{0}'")]
    InvalidRangeString(String),

    /// Not enough bytes to parse a record
    #[error("Insufficient bytes: need {needed}, have {have}")]
    InsufficientBytes { needed: usize, have: usize },

    /// Discriminator does not match any variant arm
    #[error("Unknown variant tag: {0}")]
    UnknownVariantTag(String),

    /// Unknown header tag in datagram construction
    #[error("Invalid header tag: '{0}'")]
    InvalidHeader(String),

    /// Unknown footer tag in datagram construction
    #[error("Invalid footer tag: '{0}'")]
    InvalidFooter(String),

    /// Field value does not fit its declared bit width
    #[error("Value {value:#x} does not fit in {width} bits")]
    InvalidWidth { value: u64, width: u32 },

    /// Byte-string field at a non-byte-aligned bit position
    #[error("Byte payload at unaligned bit position {0}")]
    UnalignedPayload(usize),

    /// A header was expected to contribute derived fields but has no calc method
    #[error("{0} has no derived-field method for this layering")]
    NoCalcMethod(&'static str),
}

impl Error {
    /// Create an invalid-header error with a custom tag
    pub fn invalid_header<S: Into<String>>(tag: S) -> Self {
        Error::InvalidHeader(tag.into())
    }

    /// Create an invalid-footer error with a custom tag
    pub fn invalid_footer<S: Into<String>>(tag: S) -> Self {
        Error::InvalidFooter(tag.into())
    }

    /// Create an insufficient-bytes error
    pub fn insufficient(needed: usize, have: usize) -> Self {
        Error::InsufficientBytes { needed, have }
    }
}
