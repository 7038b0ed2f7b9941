//! IPv4 header record
//!
//! Optionless 20-byte header with the RFC 791 field layout and the
//! length/header-checksum derivation the datagram aggregator invokes.

use std::fmt;
use std::net::Ipv4Addr;

use gramforge_core::{BitFieldGroup, BitReader, Field, GroupKind, Result};

use crate::checksum::internet_checksum;

/// IP protocol numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    /// ICMP (1)
    Icmp,
    /// TCP (6)
    Tcp,
    /// UDP (17)
    Udp,
    /// Any other protocol number
    Custom(u8),
}

impl IpProtocol {
    /// Convert to the wire value
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::Icmp => 1,
            IpProtocol::Tcp => 6,
            IpProtocol::Udp => 17,
            IpProtocol::Custom(value) => value,
        }
    }

    /// Convert from the wire value
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::Icmp,
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            value => IpProtocol::Custom(value),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::Icmp => write!(f, "ICMP"),
            IpProtocol::Tcp => write!(f, "TCP"),
            IpProtocol::Udp => write!(f, "UDP"),
            IpProtocol::Custom(value) => write!(f, "proto {value}"),
        }
    }
}

/// IP header flags (3 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpFlags {
    /// Reserved bit (must be 0)
    pub reserved: bool,
    /// Don't Fragment
    pub dont_fragment: bool,
    /// More Fragments
    pub more_fragments: bool,
}

impl IpFlags {
    /// No flags set
    pub const NONE: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: false,
        more_fragments: false,
    };

    /// Don't Fragment set
    pub const DONT_FRAGMENT: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: true,
        more_fragments: false,
    };

    /// Convert to the 3-bit wire value
    pub fn to_u8(self) -> u8 {
        (self.reserved as u8) << 2 | (self.dont_fragment as u8) << 1 | self.more_fragments as u8
    }

    /// Convert from the 3-bit wire value
    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            reserved: value & 0b100 != 0,
            dont_fragment: value & 0b010 != 0,
            more_fragments: value & 0b001 != 0,
        }
    }
}

/// IPv4 header without options (20 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    /// Version (always 4)
    pub version: u8,
    /// Header length in 32-bit words (always 5 without options)
    pub ihl: u8,
    /// Type of Service / DSCP
    pub tos: u8,
    /// Total length of header plus payload, derived
    pub total_length: u16,
    /// Identification
    pub identification: u16,
    /// Flags
    pub flags: IpFlags,
    /// Fragment offset in 8-byte blocks (13 bits)
    pub fragment_offset: u16,
    /// Time to Live
    pub ttl: u8,
    /// Encapsulated protocol
    pub protocol: IpProtocol,
    /// Header checksum, derived
    pub checksum: u16,
    /// Source address
    pub source: Ipv4Addr,
    /// Destination address
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    /// Header size on the wire
    pub const WIRE_SIZE: usize = 20;

    /// Create a header with common defaults (TTL 64, Don't Fragment)
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: IpProtocol) -> Self {
        Ipv4Header {
            version: 4,
            ihl: 5,
            tos: 0,
            total_length: Self::WIRE_SIZE as u16,
            identification: 0,
            flags: IpFlags::DONT_FRAGMENT,
            fragment_offset: 0,
            ttl: 64,
            protocol,
            checksum: 0,
            source,
            destination,
        }
    }

    /// Set the Time to Live
    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the Type of Service
    pub fn with_tos(mut self, tos: u8) -> Self {
        self.tos = tos;
        self
    }

    /// Set the identification field
    pub fn with_identification(mut self, identification: u16) -> Self {
        self.identification = identification;
        self
    }

    /// Set the flags
    pub fn with_flags(mut self, flags: IpFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Derive `total_length` and the header checksum from `payload`
    ///
    /// The total length covers the header and the payload; the checksum is
    /// computed over the header alone with its checksum field zeroed.
    pub fn calc_length_and_header_checksum(&mut self, payload: &[u8]) -> Result<()> {
        self.total_length = (Self::WIRE_SIZE + payload.len()) as u16;
        self.checksum = 0;
        let header = self.as_net_bytes()?;
        self.checksum = internet_checksum(&header);
        Ok(())
    }

    /// Check the stored header checksum
    pub fn verify_checksum(&self) -> Result<bool> {
        let header = self.as_net_bytes()?;
        Ok(crate::checksum::validate_checksum(&header))
    }

    /// Parse the 20-byte wire image
    pub fn from_net_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        Ok(Ipv4Header {
            version: reader.get_uint(4)? as u8,
            ihl: reader.get_uint(4)? as u8,
            tos: reader.get_uint(8)? as u8,
            total_length: reader.get_uint(16)? as u16,
            identification: reader.get_uint(16)? as u16,
            flags: IpFlags::from_u8(reader.get_uint(3)? as u8),
            fragment_offset: reader.get_uint(13)? as u16,
            ttl: reader.get_uint(8)? as u8,
            protocol: IpProtocol::from_u8(reader.get_uint(8)? as u8),
            checksum: reader.get_uint(16)? as u16,
            source: Ipv4Addr::from(reader.get_uint(32)? as u32),
            destination: Ipv4Addr::from(reader.get_uint(32)? as u32),
        })
    }
}

impl BitFieldGroup for Ipv4Header {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Header
    }

    fn layer(&self) -> u8 {
        3
    }

    fn display_name(&self) -> &str {
        "IPv4 Header"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::uint("version", self.version as u64, 4),
            Field::uint("ihl", self.ihl as u64, 4),
            Field::uint("tos", self.tos as u64, 8),
            Field::uint("total_length", self.total_length as u64, 16),
            Field::uint("identification", self.identification as u64, 16),
            Field::uint("flags", self.flags.to_u8() as u64, 3),
            Field::uint("fragment_offset", self.fragment_offset as u64, 13),
            Field::uint("ttl", self.ttl as u64, 8),
            Field::uint("protocol", self.protocol.to_u8() as u64, 8),
            Field::uint("checksum", self.checksum as u64, 16),
            Field::uint("source", u32::from(self.source) as u64, 32),
            Field::uint("destination", u32::from(self.destination) as u64, 32),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ipv4Header {
        Ipv4Header::new(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            IpProtocol::Udp,
        )
    }

    #[test]
    fn test_protocol_conversion() {
        assert_eq!(IpProtocol::Udp.to_u8(), 17);
        assert_eq!(IpProtocol::from_u8(6), IpProtocol::Tcp);
        assert_eq!(IpProtocol::from_u8(89), IpProtocol::Custom(89));
    }

    #[test]
    fn test_flags_bits() {
        assert_eq!(IpFlags::DONT_FRAGMENT.to_u8(), 0b010);
        let flags = IpFlags::from_u8(0b011);
        assert!(flags.dont_fragment);
        assert!(flags.more_fragments);
        assert!(!flags.reserved);
    }

    #[test]
    fn test_header_width_and_first_byte() {
        let header = sample();
        assert_eq!(header.bit_width(), 160);

        let wire = header.as_net_bytes().unwrap();
        assert_eq!(wire.len(), Ipv4Header::WIRE_SIZE);
        // Version 4, IHL 5 share the first byte
        assert_eq!(wire[0], 0x45);
        assert_eq!(wire[9], 17);
        assert_eq!(&wire[12..16], &[10, 0, 0, 1]);
        assert_eq!(&wire[16..20], &[10, 0, 0, 2]);
    }

    #[test]
    fn test_checksum_vector() {
        let mut header = sample();
        header.calc_length_and_header_checksum(&[0u8; 12]).unwrap();
        assert_eq!(header.total_length, 32);
        assert_eq!(header.checksum, 0x26CB);
        assert!(header.verify_checksum().unwrap());
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut header = sample();
        header.calc_length_and_header_checksum(&[]).unwrap();
        header.ttl = 63;
        assert!(!header.verify_checksum().unwrap());
    }

    #[test]
    fn test_header_roundtrip() {
        let mut header = sample().with_ttl(128).with_identification(0x1234);
        header.calc_length_and_header_checksum(b"payload").unwrap();

        let wire = header.as_net_bytes().unwrap();
        let parsed = Ipv4Header::from_net_bytes(&wire).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_builder_setters() {
        let header = sample().with_tos(0x10).with_flags(IpFlags::NONE);
        assert_eq!(header.tos, 0x10);
        assert_eq!(header.flags, IpFlags::NONE);
    }
}
