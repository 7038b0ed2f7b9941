//! UDP header record
//!
//! 8-byte header with the length and pseudo-header checksum derivation of
//! RFC 768.

use std::net::Ipv4Addr;

use gramforge_core::{BitFieldGroup, BitReader, Field, GroupKind, Port, Result};

use crate::checksum::pseudo_header_checksum;
use crate::ip::IpProtocol;

/// UDP header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    /// Source port
    pub source_port: Port,
    /// Destination port
    pub destination_port: Port,
    /// Length of header plus payload, derived
    pub length: u16,
    /// Checksum over pseudo-header, header, and payload, derived
    pub checksum: u16,
}

impl UdpHeader {
    /// Header size on the wire
    pub const WIRE_SIZE: usize = 8;

    /// Create a header with derived fields zeroed
    pub fn new(source_port: Port, destination_port: Port) -> Self {
        UdpHeader {
            source_port,
            destination_port,
            length: Self::WIRE_SIZE as u16,
            checksum: 0,
        }
    }

    /// Derive the length and checksum from `payload`
    ///
    /// The length covers the header and the payload. The checksum is
    /// computed over the RFC 768 pseudo-header plus the header (checksum
    /// field zeroed) plus the payload; a result of zero is transmitted as
    /// 0xFFFF because an all-zero field means "no checksum".
    pub fn calc_length_and_checksum(
        &mut self,
        source: Ipv4Addr,
        destination: Ipv4Addr,
        payload: &[u8],
    ) -> Result<()> {
        self.length = (Self::WIRE_SIZE + payload.len()) as u16;
        self.checksum = 0;

        let mut segment = self.as_net_bytes()?;
        segment.extend_from_slice(payload);
        let sum = pseudo_header_checksum(source, destination, IpProtocol::Udp.to_u8(), &segment);
        self.checksum = if sum == 0 { 0xFFFF } else { sum };
        Ok(())
    }

    /// Check the stored checksum against `payload`
    ///
    /// A zero stored checksum means the sender did not compute one and
    /// always validates.
    pub fn verify_checksum(
        &self,
        source: Ipv4Addr,
        destination: Ipv4Addr,
        payload: &[u8],
    ) -> Result<bool> {
        if self.checksum == 0 {
            return Ok(true);
        }
        let mut segment = self.as_net_bytes()?;
        segment.extend_from_slice(payload);
        let sum = pseudo_header_checksum(source, destination, IpProtocol::Udp.to_u8(), &segment);
        Ok(sum == 0 || sum == 0xFFFF)
    }

    /// Parse the 8-byte wire image
    pub fn from_net_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);
        Ok(UdpHeader {
            source_port: Port(reader.get_uint(16)? as u16),
            destination_port: Port(reader.get_uint(16)? as u16),
            length: reader.get_uint(16)? as u16,
            checksum: reader.get_uint(16)? as u16,
        })
    }
}

impl BitFieldGroup for UdpHeader {
    fn group_kind(&self) -> GroupKind {
        GroupKind::Header
    }

    fn layer(&self) -> u8 {
        4
    }

    fn display_name(&self) -> &str {
        "UDP Header"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::uint("source_port", self.source_port.to_u16() as u64, 16),
            Field::uint("destination_port", self.destination_port.to_u16() as u64, 16),
            Field::uint("length", self.length as u64, 16),
            Field::uint("checksum", self.checksum as u64, 16),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_wire_image() {
        let header = UdpHeader::new(Port(12345), Port::DNS);
        let wire = header.as_net_bytes().unwrap();
        assert_eq!(wire.len(), UdpHeader::WIRE_SIZE);
        assert_eq!(u16::from_be_bytes([wire[0], wire[1]]), 12345);
        assert_eq!(u16::from_be_bytes([wire[2], wire[3]]), 53);
    }

    #[test]
    fn test_checksum_vector() {
        // 10.0.0.1 -> 10.0.0.2, 1024 -> 1025, payload "abcd"
        let mut header = UdpHeader::new(Port(1024), Port(1025));
        header
            .calc_length_and_checksum(
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
                b"abcd",
            )
            .unwrap();
        assert_eq!(header.length, 12);
        assert_eq!(header.checksum, 0x1F0C);
    }

    #[test]
    fn test_checksum_validates() {
        let src = Ipv4Addr::new(192, 168, 1, 1);
        let dst = Ipv4Addr::new(192, 168, 1, 2);
        let mut header = UdpHeader::new(Port(40000), Port::NTP);
        header.calc_length_and_checksum(src, dst, b"payload").unwrap();

        assert!(header.verify_checksum(src, dst, b"payload").unwrap());
        assert!(!header.verify_checksum(src, dst, b"tampered").unwrap());
    }

    #[test]
    fn test_zero_checksum_always_validates() {
        let src = Ipv4Addr::new(192, 168, 1, 1);
        let dst = Ipv4Addr::new(192, 168, 1, 2);
        let header = UdpHeader::new(Port(1), Port(2));
        assert_eq!(header.checksum, 0);
        assert!(header.verify_checksum(src, dst, b"anything").unwrap());
    }

    #[test]
    fn test_header_roundtrip() {
        let mut header = UdpHeader::new(Port(5353), Port(5353));
        header
            .calc_length_and_checksum(
                Ipv4Addr::new(172, 16, 0, 1),
                Ipv4Addr::new(172, 16, 0, 2),
                b"mdns",
            )
            .unwrap();
        let wire = header.as_net_bytes().unwrap();
        assert_eq!(UdpHeader::from_net_bytes(&wire).unwrap(), header);
    }
}
