//! ICMP header record
//!
//! Fixed 8-byte header: type, code, checksum, and the 32-bit rest-of-header
//! word whose meaning depends on the message type. The checksum covers the
//! header and the message payload with no pseudo-header (RFC 792).

use gramforge_core::{BitFieldGroup, BitReader, Field, GroupKind, Result};

use crate::checksum::{internet_checksum, validate_checksum};

/// ICMP header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    /// Message type
    pub icmp_type: u8,
    /// Message code
    pub code: u8,
    /// Checksum over header and payload, derived
    pub checksum: u16,
    /// Rest of header (identifier/sequence for echo, unused otherwise)
    pub rest: u32,
}

impl IcmpHeader {
    /// Header size on the wire
    pub const WIRE_SIZE: usize = 8;

    /// Echo Reply type (0)
    pub const ECHO_REPLY: u8 = 0;

    /// Destination Unreachable type (3)
    pub const DESTINATION_UNREACHABLE: u8 = 3;

    /// Echo Request type (8)
    pub const ECHO_REQUEST: u8 = 8;

    /// Time Exceeded type (11)
    pub const TIME_EXCEEDED: u8 = 11;

    /// Create a header with a zero checksum
    pub fn new(icmp_type: u8, code: u8, rest: u32) -> Self {
        IcmpHeader {
            icmp_type,
            code,
            checksum: 0,
            rest,
        }
    }

    /// Create an Echo Request header with the given identifier and sequence
    pub fn echo_request(identifier: u16, sequence: u16) -> Self {
        Self::new(
            Self::ECHO_REQUEST,
            0,
            (identifier as u32) << 16 | sequence as u32,
        )
    }

    /// Derive the checksum from `payload`
    ///
    /// RFC 1071 over the header (checksum field zeroed) followed by the
    /// payload; no pseudo-header.
    pub fn calc_checksum(&mut self, payload: &[u8]) -> Result<()> {
        self.checksum = 0;
        let mut region = self.as_net_bytes()?;
        region.extend_from_slice(payload);
        self.checksum = internet_checksum(&region);
        Ok(())
    }

    /// Check the stored checksum against `payload`
    pub fn verify_checksum(&self, payload: &[u8]) -> Result<bool> {
        let mut region = self.as_net_bytes()?;
        region.extend_from_slice(payload);
        Ok(validate_checksum(&region))
    }

    /// Parse the 8-byte wire image
    pub fn from_net_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        Ok(IcmpHeader {
            icmp_type: reader.get_uint(8)? as u8,
            code: reader.get_uint(8)? as u8,
            checksum: reader.get_uint(16)? as u16,
            rest: reader.get_uint(32)? as u32,
        })
    }
}

impl BitFieldGroup for IcmpHeader {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Header
    }

    fn layer(&self) -> u8 {
        3
    }

    fn display_name(&self) -> &str {
        "ICMP Header"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::uint("type", self.icmp_type as u64, 8),
            Field::uint("code", self.code as u64, 8),
            Field::uint("checksum", self.checksum as u64, 16),
            Field::uint("rest", self.rest as u64, 32),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_request_rest_word() {
        let header = IcmpHeader::echo_request(0x1234, 0x0001);
        assert_eq!(header.icmp_type, IcmpHeader::ECHO_REQUEST);
        assert_eq!(header.rest, 0x1234_0001);
    }

    #[test]
    fn test_checksum_over_header_and_payload() {
        let mut header = IcmpHeader::echo_request(1, 1);
        header.calc_checksum(b"ping payload").unwrap();
        assert_ne!(header.checksum, 0);
        assert!(header.verify_checksum(b"ping payload").unwrap());
        assert!(!header.verify_checksum(b"other payload").unwrap());
    }

    #[test]
    fn test_header_roundtrip() {
        let mut header = IcmpHeader::new(IcmpHeader::TIME_EXCEEDED, 1, 0);
        header.calc_checksum(&[]).unwrap();
        let wire = header.as_net_bytes().unwrap();
        assert_eq!(wire.len(), IcmpHeader::WIRE_SIZE);
        assert_eq!(IcmpHeader::from_net_bytes(&wire).unwrap(), header);
    }
}
