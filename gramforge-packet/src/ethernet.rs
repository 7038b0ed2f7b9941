//! Ethernet II header and frame check sequence records

use std::fmt;

use gramforge_core::{BitFieldGroup, BitReader, Field, GroupKind, MacAddr, Result};

use crate::checksum::crc32_ieee;

/// Common EtherType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    Ipv4,
    /// ARP (0x0806)
    Arp,
    /// VLAN-tagged frame (0x8100)
    Vlan,
    /// IPv6 (0x86DD)
    Ipv6,
    /// ICMP carried directly in the frame, without an IPv4 header.
    /// No EtherType is assigned for this, so the IEEE local experimental
    /// value (0x88B5) is used.
    Icmp,
    /// Any other EtherType
    Custom(u16),
}

impl EtherType {
    /// Convert to the wire value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::Ipv4 => 0x0800,
            EtherType::Arp => 0x0806,
            EtherType::Vlan => 0x8100,
            EtherType::Ipv6 => 0x86DD,
            EtherType::Icmp => 0x88B5,
            EtherType::Custom(value) => value,
        }
    }

    /// Convert from the wire value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::Ipv4,
            0x0806 => EtherType::Arp,
            0x8100 => EtherType::Vlan,
            0x86DD => EtherType::Ipv6,
            0x88B5 => EtherType::Icmp,
            value => EtherType::Custom(value),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::Ipv4 => write!(f, "IPv4"),
            EtherType::Arp => write!(f, "ARP"),
            EtherType::Vlan => write!(f, "VLAN"),
            EtherType::Ipv6 => write!(f, "IPv6"),
            EtherType::Icmp => write!(f, "ICMP"),
            EtherType::Custom(value) => write!(f, "0x{value:04X}"),
        }
    }
}

/// Ethernet II header (14 bytes): destination, source, EtherType
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetHeader {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// EtherType of the encapsulated protocol
    pub ethertype: EtherType,
}

impl EthernetHeader {
    /// Header size on the wire
    pub const WIRE_SIZE: usize = 14;

    /// Create a new header
    pub fn new(destination: MacAddr, source: MacAddr, ethertype: EtherType) -> Self {
        EthernetHeader {
            destination,
            source,
            ethertype,
        }
    }

    /// Parse the 14-byte wire image
    pub fn from_net_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        let destination = MacAddr::from_u64(reader.get_uint(48)?);
        let source = MacAddr::from_u64(reader.get_uint(48)?);
        let ethertype = EtherType::from_u16(reader.get_uint(16)? as u16);
        Ok(EthernetHeader {
            destination,
            source,
            ethertype,
        })
    }
}

impl BitFieldGroup for EthernetHeader {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Header
    }

    fn layer(&self) -> u8 {
        2
    }

    fn display_name(&self) -> &str {
        "Ethernet Header"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::uint("destination", self.destination.to_u64(), 48),
            Field::uint("source", self.source.to_u64(), 48),
            Field::uint("ethertype", self.ethertype.to_u16() as u64, 16),
        ]
    }
}

/// Frame check sequence trailer (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FcsTrailer {
    /// CRC-32 over the frame bytes preceding the trailer
    pub crc: u32,
}

impl FcsTrailer {
    /// Trailer size on the wire
    pub const WIRE_SIZE: usize = 4;

    /// Create a trailer with a zero CRC
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the 4-byte wire image
    pub fn from_net_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        Ok(FcsTrailer {
            crc: reader.get_uint(32)? as u32,
        })
    }

    /// Compute the CRC over `frame` (everything preceding the trailer)
    pub fn calc_crc(&mut self, frame: &[u8]) {
        self.crc = crc32_ieee(frame);
    }

    /// Check the stored CRC against `frame`
    pub fn verify(&self, frame: &[u8]) -> bool {
        self.crc == crc32_ieee(frame)
    }
}

impl BitFieldGroup for FcsTrailer {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Header
    }

    fn layer(&self) -> u8 {
        2
    }

    fn display_name(&self) -> &str {
        "Frame Check Sequence"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::uint("crc", self.crc as u64, 32)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gramforge_core::Error;

    #[test]
    fn test_ethertype_conversion() {
        assert_eq!(EtherType::Ipv4.to_u16(), 0x0800);
        assert_eq!(EtherType::from_u16(0x0806), EtherType::Arp);
        assert_eq!(EtherType::from_u16(0x88B5), EtherType::Icmp);
        assert_eq!(EtherType::from_u16(0x1234), EtherType::Custom(0x1234));
    }

    #[test]
    fn test_header_wire_image() {
        let header = EthernetHeader::new(
            MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            EtherType::Ipv4,
        );
        assert_eq!(header.bit_width(), 112);

        let wire = header.as_net_bytes().unwrap();
        assert_eq!(wire.len(), EthernetHeader::WIRE_SIZE);
        assert_eq!(&wire[0..6], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(&wire[6..12], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(&wire[12..14], &[0x08, 0x00]);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = EthernetHeader::new(
            MacAddr::BROADCAST,
            MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]),
            EtherType::Custom(0x88B5),
        );
        let wire = header.as_net_bytes().unwrap();
        assert_eq!(EthernetHeader::from_net_bytes(&wire).unwrap(), header);
    }

    #[test]
    fn test_header_parse_short_input() {
        let err = EthernetHeader::from_net_bytes(&[0u8; 13]).unwrap_err();
        assert!(matches!(err, Error::InsufficientBytes { .. }));
    }

    #[test]
    fn test_fcs_zero_body_vector() {
        let mut fcs = FcsTrailer::new();
        fcs.calc_crc(&[0u8; 60]);
        assert_eq!(fcs.crc, 0x0412_8908);
        assert!(fcs.verify(&[0u8; 60]));
        assert!(!fcs.verify(&[1u8; 60]));
    }

    #[test]
    fn test_fcs_roundtrip() {
        let mut fcs = FcsTrailer::new();
        fcs.calc_crc(b"some frame bytes");
        let wire = fcs.as_net_bytes().unwrap();
        assert_eq!(wire.len(), FcsTrailer::WIRE_SIZE);
        assert_eq!(FcsTrailer::from_net_bytes(&wire).unwrap(), fcs);
    }
}
